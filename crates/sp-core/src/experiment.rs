//! Experiment aggregation.
//!
//! An experiment collects one host's per-group summary statistics for a
//! given satellite count. Groups are discovered from the M31 files in a
//! directory and every group must have an MW counterpart, so the two
//! experiments of an [`ExperimentPair`] always have the same points in the
//! same order.
//!
//! Two shapes are produced:
//! - [`Experiment`] (summary mode): four series per observable, each with one
//!   entry per group.
//! - [`DetailedExperiment`] (full-detail mode): the physical value per group
//!   plus every randomized control value, group-major.

use std::collections::BTreeMap;
use std::path::Path;

use regex::Regex;
use serde::Serialize;
use sp_common::{Error, Host, Observable, Result, SeriesComponent, SeriesKey};
use sp_config::AnalysisConfig;
use sp_math::Moments;

use crate::logging::event_names;
use crate::record::{load_summary, summary_path, SummaryRecord};

/// Whether to reduce controls to mean/std or keep every sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMode {
    #[default]
    Summary,
    FullDetail,
}

/// Summary statistics of one observable for one group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GroupStatistics {
    pub value: f64,
    /// Spread of the single physical value; zero by construction.
    pub sigma: f64,
    pub random: f64,
    pub random_sigma: f64,
}

impl GroupStatistics {
    /// Reduce a physical value and its controls (population std, ddof 0).
    pub fn from_samples(physical: f64, controls: &[f64]) -> Self {
        let physical_moments = Moments::of(&[physical]);
        let control_moments = Moments::of(controls);
        GroupStatistics {
            value: physical_moments.mean,
            sigma: physical_moments.std,
            random: control_moments.mean,
            random_sigma: control_moments.std,
        }
    }

    fn component(&self, component: SeriesComponent) -> f64 {
        match component {
            SeriesComponent::Value => self.value,
            SeriesComponent::Sigma => self.sigma,
            SeriesComponent::Random => self.random,
            SeriesComponent::RandomSigma => self.random_sigma,
        }
    }
}

/// Summary-mode experiment for one host.
///
/// Every series has exactly [`Experiment::points`] entries.
#[derive(Debug, Clone, PartialEq)]
pub struct Experiment {
    host: Host,
    n_sat: u32,
    fields: Vec<Observable>,
    group_ids: Vec<u64>,
    series: BTreeMap<SeriesKey, Vec<f64>>,
}

impl Experiment {
    pub fn host(&self) -> Host {
        self.host
    }

    pub fn n_sat(&self) -> u32 {
        self.n_sat
    }

    /// Group ids in point order.
    pub fn group_ids(&self) -> &[u64] {
        &self.group_ids
    }

    /// Number of groups (points) in the experiment.
    pub fn points(&self) -> usize {
        self.group_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.group_ids.is_empty()
    }

    /// Aggregated observables, in the order the builder was given.
    pub fn fields(&self) -> &[Observable] {
        &self.fields
    }

    pub fn has_field(&self, field: Observable) -> bool {
        self.series
            .contains_key(&SeriesKey::new(field, SeriesComponent::Value))
    }

    /// One series by key.
    pub fn series(&self, key: SeriesKey) -> Option<&[f64]> {
        self.series.get(&key).map(Vec::as_slice)
    }

    /// Shorthand for `series(SeriesKey::new(field, component))`.
    pub fn values(&self, field: Observable, component: SeriesComponent) -> Option<&[f64]> {
        self.series(SeriesKey::new(field, component))
    }

    /// Every series key, e.g. `width`, `width_sigma`, `width_random`, `width_random_sigma`.
    pub fn series_keys(&self) -> impl Iterator<Item = SeriesKey> + '_ {
        self.series.keys().copied()
    }

    /// Series keyed by their string names, for serialization.
    pub fn named_series(&self) -> BTreeMap<String, &[f64]> {
        self.series
            .iter()
            .map(|(k, v)| (k.to_string(), v.as_slice()))
            .collect()
    }

    /// Copy the experiment, optionally leaving out one point.
    ///
    /// `None` returns an equal copy. `Some(i)` drops entry `i` from every
    /// series and from the group id list; `i >= points()` is an error.
    pub fn copy_experiment(&self, id_to_remove: Option<usize>) -> Result<Experiment> {
        let Some(skip) = id_to_remove else {
            return Ok(self.clone());
        };
        if skip >= self.points() {
            return Err(Error::IndexOutOfRange {
                index: skip,
                points: self.points(),
            });
        }

        let drop_one = |values: &[f64]| -> Vec<f64> {
            values
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != skip)
                .map(|(_, v)| *v)
                .collect()
        };

        let mut group_ids = self.group_ids.clone();
        group_ids.remove(skip);

        Ok(Experiment {
            host: self.host,
            n_sat: self.n_sat,
            fields: self.fields.clone(),
            group_ids,
            series: self
                .series
                .iter()
                .map(|(k, v)| (*k, drop_one(v)))
                .collect(),
        })
    }
}

/// Pre-sized, append-only builder for [`Experiment`].
#[derive(Debug)]
pub struct ExperimentBuilder {
    host: Host,
    n_sat: u32,
    fields: Vec<Observable>,
    group_ids: Vec<u64>,
    series: BTreeMap<SeriesKey, Vec<f64>>,
}

impl ExperimentBuilder {
    pub fn new(host: Host, n_sat: u32, fields: &[Observable], n_groups: usize) -> Self {
        let mut series = BTreeMap::new();
        for &field in fields {
            for component in SeriesComponent::ALL {
                series.insert(
                    SeriesKey::new(field, component),
                    Vec::with_capacity(n_groups),
                );
            }
        }
        ExperimentBuilder {
            host,
            n_sat,
            fields: fields.to_vec(),
            group_ids: Vec::with_capacity(n_groups),
            series,
        }
    }

    /// Append one group; `stats` is asked once per aggregated field.
    pub fn push_group(
        &mut self,
        group_id: u64,
        mut stats: impl FnMut(Observable) -> Result<GroupStatistics>,
    ) -> Result<()> {
        let mut row = Vec::with_capacity(self.fields.len());
        for &field in &self.fields {
            row.push((field, stats(field)?));
        }
        for (field, s) in row {
            for component in SeriesComponent::ALL {
                if let Some(values) = self.series.get_mut(&SeriesKey::new(field, component)) {
                    values.push(s.component(component));
                }
            }
        }
        self.group_ids.push(group_id);
        Ok(())
    }

    /// Append one group from a parsed summary record.
    pub fn push_record(
        &mut self,
        group_id: u64,
        record: &SummaryRecord,
        n_controls: usize,
    ) -> Result<()> {
        self.push_group(group_id, |field| {
            let controls = record.control_values(field, n_controls)?;
            Ok(GroupStatistics::from_samples(
                record.physical.get(field),
                &controls,
            ))
        })
    }

    /// Finish, checking that every series has one entry per group.
    pub fn finish(self) -> Result<Experiment> {
        let n = self.group_ids.len();
        if let Some((key, values)) = self.series.iter().find(|(_, v)| v.len() != n) {
            return Err(Error::InsufficientData(format!(
                "series {} has {} entries for {} groups",
                key,
                values.len(),
                n
            )));
        }
        Ok(Experiment {
            host: self.host,
            n_sat: self.n_sat,
            fields: self.fields,
            group_ids: self.group_ids,
            series: self.series,
        })
    }
}

/// Physical and control samples of one observable, all groups.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailedSeries {
    /// One value per group.
    pub physical: Vec<f64>,
    /// `n_controls` values per group, group-major then sample order.
    pub controls: Vec<f64>,
}

/// Full-detail experiment for one host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailedExperiment {
    host: Host,
    n_sat: u32,
    n_controls: usize,
    fields: Vec<Observable>,
    group_ids: Vec<u64>,
    series: BTreeMap<Observable, DetailedSeries>,
}

impl DetailedExperiment {
    pub fn host(&self) -> Host {
        self.host
    }

    pub fn n_sat(&self) -> u32 {
        self.n_sat
    }

    pub fn n_controls(&self) -> usize {
        self.n_controls
    }

    /// Aggregated observables, in the order the builder was given.
    pub fn fields(&self) -> &[Observable] {
        &self.fields
    }

    pub fn group_ids(&self) -> &[u64] {
        &self.group_ids
    }

    pub fn points(&self) -> usize {
        self.group_ids.len()
    }

    pub fn series(&self, field: Observable) -> Option<&DetailedSeries> {
        self.series.get(&field)
    }

    /// The control samples of one group.
    pub fn group_controls(&self, field: Observable, group_index: usize) -> Option<&[f64]> {
        let start = group_index.checked_mul(self.n_controls)?;
        self.series
            .get(&field)?
            .controls
            .get(start..start + self.n_controls)
    }

    /// Reduce to the summary-mode experiment.
    pub fn summarize(&self) -> Result<Experiment> {
        let mut builder = ExperimentBuilder::new(self.host, self.n_sat, &self.fields, self.points());
        for (g, &group_id) in self.group_ids.iter().enumerate() {
            builder.push_group(group_id, |field| {
                let physical = self.series[&field].physical[g];
                let controls = self.group_controls(field, g).unwrap_or(&[]);
                Ok(GroupStatistics::from_samples(physical, controls))
            })?;
        }
        builder.finish()
    }
}

/// Pre-sized, append-only builder for [`DetailedExperiment`].
#[derive(Debug)]
pub struct DetailedExperimentBuilder {
    host: Host,
    n_sat: u32,
    n_controls: usize,
    fields: Vec<Observable>,
    group_ids: Vec<u64>,
    series: BTreeMap<Observable, DetailedSeries>,
}

impl DetailedExperimentBuilder {
    pub fn new(
        host: Host,
        n_sat: u32,
        fields: &[Observable],
        n_groups: usize,
        n_controls: usize,
    ) -> Self {
        let series = fields
            .iter()
            .map(|&field| {
                (
                    field,
                    DetailedSeries {
                        physical: Vec::with_capacity(n_groups),
                        controls: Vec::with_capacity(n_groups * n_controls),
                    },
                )
            })
            .collect();
        DetailedExperimentBuilder {
            host,
            n_sat,
            n_controls,
            fields: fields.to_vec(),
            group_ids: Vec::with_capacity(n_groups),
            series,
        }
    }

    /// Append one group from a parsed summary record.
    pub fn push_record(&mut self, group_id: u64, record: &SummaryRecord) -> Result<()> {
        let mut columns = Vec::with_capacity(self.fields.len());
        for &field in &self.fields {
            columns.push((field, record.control_values(field, self.n_controls)?));
        }
        for (field, controls) in columns {
            if let Some(series) = self.series.get_mut(&field) {
                series.physical.push(record.physical.get(field));
                series.controls.extend_from_slice(&controls);
            }
        }
        self.group_ids.push(group_id);
        Ok(())
    }

    /// Finish, checking `controls.len() == physical.len() * n_controls`.
    pub fn finish(self) -> Result<DetailedExperiment> {
        let n = self.group_ids.len();
        for (field, series) in &self.series {
            if series.physical.len() != n || series.controls.len() != n * self.n_controls {
                return Err(Error::InsufficientData(format!(
                    "{} has {} physical and {} control values for {} groups of {} controls",
                    field,
                    series.physical.len(),
                    series.controls.len(),
                    n,
                    self.n_controls
                )));
            }
        }
        Ok(DetailedExperiment {
            host: self.host,
            n_sat: self.n_sat,
            n_controls: self.n_controls,
            fields: self.fields,
            group_ids: self.group_ids,
            series: self.series,
        })
    }
}

/// The M31 and MW experiments built from one directory.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentPair<E> {
    pub m31: E,
    pub mw: E,
}

impl<E> ExperimentPair<E> {
    pub fn get(&self, host: Host) -> &E {
        match host {
            Host::M31 => &self.m31,
            Host::Mw => &self.mw,
        }
    }

    /// Both experiments in report order.
    pub fn iter(&self) -> impl Iterator<Item = (Host, &E)> {
        [(Host::M31, &self.m31), (Host::Mw, &self.mw)].into_iter()
    }
}

/// Result of [`load_experiment`].
#[derive(Debug, Clone, PartialEq)]
pub enum LoadedExperiments {
    Summary(ExperimentPair<Experiment>),
    Detailed(ExperimentPair<DetailedExperiment>),
}

/// Group ids with an M31 summary file for `n_sat`, sorted and de-duplicated.
///
/// Other hosts and other satellite counts in the same directory are ignored.
pub fn discover_groups(dir: &Path, n_sat: u32) -> Result<Vec<u64>> {
    let pattern = Regex::new(&format!(
        r"^{}_group_(\d+)_nsat_{}\.dat$",
        Host::M31.label(),
        n_sat
    ))
    .map_err(|e| Error::Config(format!("invalid group pattern: {}", e)))?;

    let entries = std::fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;
    let mut ids = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if let Some(id) = pattern
            .captures(name)
            .and_then(|caps| caps[1].parse::<u64>().ok())
        {
            ids.push(id);
        }
    }
    ids.sort_unstable();
    ids.dedup();

    tracing::debug!(
        target: event_names::LOAD_GROUPS_DISCOVERED,
        dir = %dir.display(),
        n_sat,
        groups = ids.len(),
        "Discovered groups"
    );
    Ok(ids)
}

/// Load both hosts' experiments from a directory.
pub fn load_experiment(
    dir: &Path,
    n_sat: u32,
    detail: AggregationMode,
    config: &AnalysisConfig,
) -> Result<LoadedExperiments> {
    match detail {
        AggregationMode::Summary => {
            load_summary_experiments(dir, n_sat, config).map(LoadedExperiments::Summary)
        }
        AggregationMode::FullDetail => {
            load_detailed_experiments(dir, n_sat, config).map(LoadedExperiments::Detailed)
        }
    }
}

/// Summary-mode experiments for both hosts.
pub fn load_summary_experiments(
    dir: &Path,
    n_sat: u32,
    config: &AnalysisConfig,
) -> Result<ExperimentPair<Experiment>> {
    let groups = discover_groups(dir, n_sat)?;
    let fields = &config.aggregated_fields;
    let mut m31 = ExperimentBuilder::new(Host::M31, n_sat, fields, groups.len());
    let mut mw = ExperimentBuilder::new(Host::Mw, n_sat, fields, groups.len());

    for &group_id in &groups {
        let (m31_record, mw_record) = load_group(dir, group_id, n_sat)?;
        m31.push_record(group_id, &m31_record, config.n_controls)
            .map_err(|e| with_path(e, &summary_path(dir, Host::M31, group_id, n_sat)))?;
        mw.push_record(group_id, &mw_record, config.n_controls)
            .map_err(|e| with_path(e, &summary_path(dir, Host::Mw, group_id, n_sat)))?;
    }

    let pair = ExperimentPair {
        m31: m31.finish()?,
        mw: mw.finish()?,
    };
    log_finished(dir, n_sat, groups.len());
    Ok(pair)
}

/// Full-detail experiments for both hosts.
pub fn load_detailed_experiments(
    dir: &Path,
    n_sat: u32,
    config: &AnalysisConfig,
) -> Result<ExperimentPair<DetailedExperiment>> {
    let groups = discover_groups(dir, n_sat)?;
    let fields = &config.aggregated_fields;
    let n_controls = config.n_controls;
    let mut m31 = DetailedExperimentBuilder::new(Host::M31, n_sat, fields, groups.len(), n_controls);
    let mut mw = DetailedExperimentBuilder::new(Host::Mw, n_sat, fields, groups.len(), n_controls);

    for &group_id in &groups {
        let (m31_record, mw_record) = load_group(dir, group_id, n_sat)?;
        m31.push_record(group_id, &m31_record)
            .map_err(|e| with_path(e, &summary_path(dir, Host::M31, group_id, n_sat)))?;
        mw.push_record(group_id, &mw_record)
            .map_err(|e| with_path(e, &summary_path(dir, Host::Mw, group_id, n_sat)))?;
    }

    let pair = ExperimentPair {
        m31: m31.finish()?,
        mw: mw.finish()?,
    };
    log_finished(dir, n_sat, groups.len());
    Ok(pair)
}

fn load_group(dir: &Path, group_id: u64, n_sat: u32) -> Result<(SummaryRecord, SummaryRecord)> {
    let m31 = load_summary(&summary_path(dir, Host::M31, group_id, n_sat))?;

    let mw_path = summary_path(dir, Host::Mw, group_id, n_sat);
    if !mw_path.is_file() {
        return Err(Error::MissingCounterpart {
            host: Host::Mw,
            group_id,
            n_sat,
            path: mw_path,
        });
    }
    let mw = load_summary(&mw_path)?;

    tracing::debug!(
        target: event_names::AGGREGATE_GROUP_LOADED,
        group_id,
        n_sat,
        m31_rows = m31.rows(),
        mw_rows = mw.rows(),
        "Loaded group"
    );
    Ok((m31, mw))
}

fn with_path(err: Error, path: &Path) -> Error {
    match err {
        Error::InsufficientData(msg) => {
            Error::InsufficientData(format!("{}: {}", path.display(), msg))
        }
        other => other,
    }
}

fn log_finished(dir: &Path, n_sat: u32, groups: usize) {
    if groups == 0 {
        tracing::warn!(
            target: event_names::AGGREGATE_EMPTY,
            dir = %dir.display(),
            n_sat,
            "No groups found; experiments are empty"
        );
    } else {
        tracing::info!(
            target: event_names::AGGREGATE_FINISHED,
            dir = %dir.display(),
            n_sat,
            groups,
            "Aggregated experiments"
        );
    }
}
