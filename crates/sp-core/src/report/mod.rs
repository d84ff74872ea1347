//! Numeric reports built on top of the statistics pipeline.
//!
//! Each builder returns a serializable value; [`render`] turns it into
//! pretty JSON or a Markdown table. Range builders walk an n_sat range and
//! skip satellite counts whose directory holds no groups (logged at WARN);
//! any other failure aborts the whole report.

pub mod markdown;

use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use sp_common::{Error, Host, Observable, OutputFormat, Result, SeriesComponent};
use sp_config::AnalysisConfig;
use sp_math::Moments;

use crate::experiment::{
    discover_groups, load_detailed_experiments, load_summary_experiments, AggregationMode,
    DetailedExperiment, Experiment,
};
use crate::gaussian::{GaussianModel, ModelComparison};
use crate::jackknife::{jackknife_covariance, JackknifeView};
use crate::logging::event_names;
use crate::normalize::{normalize, normalized_value, NormalizedView};

pub use markdown::ToMarkdown;

/// Report schema version, bumped on breaking layout changes.
pub const REPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Common wrapper for every command payload.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    pub schema_version: &'static str,
    pub run_id: String,
    pub command: String,
    pub generated_at: DateTime<Utc>,
    /// SHA-256 of the configuration that produced the report.
    pub config_hash: String,
    pub report: T,
}

impl<T> Envelope<T> {
    pub fn new(
        run_id: impl Into<String>,
        command: impl Into<String>,
        config_hash: impl Into<String>,
        report: T,
    ) -> Self {
        Envelope {
            schema_version: REPORT_SCHEMA_VERSION,
            run_id: run_id.into(),
            command: command.into(),
            generated_at: Utc::now(),
            config_hash: config_hash.into(),
            report,
        }
    }
}

/// Render a report as pretty JSON or Markdown.
pub fn render<T: Serialize + ToMarkdown>(report: &Envelope<T>, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Md => Ok(report.to_markdown()),
    }
}

// ============================================================================
// observe
// ============================================================================

/// One host's aggregated series and normalized observation.
#[derive(Debug, Clone, Serialize)]
pub struct HostObservation {
    pub host: Host,
    pub group_ids: Vec<u64>,
    /// `<field>[_sigma|_random|_random_sigma]` → one value per group.
    pub series: std::collections::BTreeMap<String, Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized: Option<NormalizedView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detailed: Option<DetailedExperiment>,
}

/// Aggregated experiments of one directory.
#[derive(Debug, Clone, Serialize)]
pub struct ObservationReport {
    pub n_sat: u32,
    pub mode: AggregationMode,
    pub hosts: Vec<HostObservation>,
}

/// Aggregate a directory and normalize the configured fields.
///
/// An empty directory yields hosts with no series and no normalized data.
pub fn observe(
    dir: &Path,
    n_sat: u32,
    mode: AggregationMode,
    config: &AnalysisConfig,
) -> Result<ObservationReport> {
    let selection = config.field_selection();
    let mut hosts = Vec::with_capacity(Host::ALL.len());

    match mode {
        AggregationMode::Summary => {
            let pair = load_summary_experiments(dir, n_sat, config)?;
            for (host, exp) in pair.iter() {
                hosts.push(host_observation(host, exp, None, &selection)?);
            }
        }
        AggregationMode::FullDetail => {
            let pair = load_detailed_experiments(dir, n_sat, config)?;
            for (host, detailed) in pair.iter() {
                let exp = detailed.summarize()?;
                hosts.push(host_observation(host, &exp, Some(detailed.clone()), &selection)?);
            }
        }
    }

    Ok(ObservationReport { n_sat, mode, hosts })
}

fn host_observation(
    host: Host,
    exp: &Experiment,
    detailed: Option<DetailedExperiment>,
    selection: &sp_config::FieldSelection,
) -> Result<HostObservation> {
    let normalized = if exp.is_empty() {
        None
    } else {
        Some(normalize(exp, selection)?.to_view())
    };
    Ok(HostObservation {
        host,
        group_ids: exp.group_ids().to_vec(),
        series: exp
            .named_series()
            .into_iter()
            .map(|(k, v)| (k, v.to_vec()))
            .collect(),
        normalized,
        detailed,
    })
}

// ============================================================================
// shape-obs
// ============================================================================

/// Observed shape of one field for one host (first group of the directory).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ObservationShapeRow {
    pub field: Observable,
    pub host: Host,
    pub physical: f64,
    pub random: f64,
    pub random_sigma: f64,
    pub normalized: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationShape {
    pub n_sat: u32,
    pub rows: Vec<ObservationShapeRow>,
}

/// Physical value, control baseline and normalized value of the observed
/// system for every aggregated field.
pub fn observation_shape(dir: &Path, n_sat: u32, config: &AnalysisConfig) -> Result<ObservationShape> {
    let pair = load_summary_experiments(dir, n_sat, config)?;
    if pair.m31.is_empty() {
        return Err(Error::InsufficientData(format!(
            "no observed groups in {} for n_sat={}",
            dir.display(),
            n_sat
        )));
    }

    let mut rows = Vec::new();
    for &field in &config.aggregated_fields {
        for (host, exp) in pair.iter() {
            let first = |component| {
                exp.values(field, component)
                    .and_then(|v| v.first().copied())
                    .ok_or_else(|| Error::Config(format!("field {} was not aggregated", field)))
            };
            let physical = first(SeriesComponent::Value)?;
            let random = first(SeriesComponent::Random)?;
            let random_sigma = first(SeriesComponent::RandomSigma)?;
            rows.push(ObservationShapeRow {
                field,
                host,
                physical,
                random,
                random_sigma,
                normalized: normalized_value(field, 0, physical, random, random_sigma)?,
            });
        }
    }
    Ok(ObservationShape { n_sat, rows })
}

/// [`observation_shape`] for every n_sat of a range that has groups.
pub fn observation_shapes(
    dir: &Path,
    n_sat_range: RangeInclusive<u32>,
    config: &AnalysisConfig,
) -> Result<Vec<ObservationShape>> {
    let mut shapes = Vec::new();
    for n_sat in n_sat_range {
        if !has_groups(dir, n_sat)? {
            continue;
        }
        shapes.push(observation_shape(dir, n_sat, config)?);
    }
    Ok(shapes)
}

// ============================================================================
// shape-sim
// ============================================================================

/// A named simulation data directory, written `NAME=DIR` on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationSource {
    pub name: String,
    pub dir: PathBuf,
}

impl std::str::FromStr for SimulationSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (name, dir) = s
            .split_once('=')
            .ok_or_else(|| format!("expected NAME=DIR, got '{}'", s))?;
        let name = name.trim();
        if name.is_empty() || dir.is_empty() {
            return Err(format!("expected NAME=DIR, got '{}'", s));
        }
        Ok(SimulationSource {
            name: name.to_string(),
            dir: PathBuf::from(dir),
        })
    }
}

/// Spread of one field's physical values across a simulation's groups.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationShapeRow {
    pub source: String,
    pub host: Host,
    pub field: Observable,
    pub groups: usize,
    pub mean: f64,
    /// Population std (ddof 0).
    pub std: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationShape {
    pub n_sat: u32,
    pub rows: Vec<SimulationShapeRow>,
}

/// Mean and population std of every aggregated field per source and host.
///
/// Sources with no groups for `n_sat` are left out.
pub fn simulation_shape(
    sources: &[SimulationSource],
    n_sat: u32,
    config: &AnalysisConfig,
) -> Result<SimulationShape> {
    let mut rows = Vec::new();
    for source in sources {
        if !has_groups(&source.dir, n_sat)? {
            continue;
        }
        let pair = load_summary_experiments(&source.dir, n_sat, config)?;
        for &field in &config.aggregated_fields {
            for (host, exp) in pair.iter() {
                let values = exp.values(field, SeriesComponent::Value).ok_or_else(|| {
                    Error::Config(format!("field {} was not aggregated", field))
                })?;
                let moments = Moments::of(values);
                rows.push(SimulationShapeRow {
                    source: source.name.clone(),
                    host,
                    field,
                    groups: values.len(),
                    mean: moments.mean,
                    std: moments.std,
                });
            }
        }
    }
    Ok(SimulationShape { n_sat, rows })
}

/// [`simulation_shape`] over a range; n_sat values where no source has
/// groups are omitted.
pub fn simulation_shapes(
    sources: &[SimulationSource],
    n_sat_range: RangeInclusive<u32>,
    config: &AnalysisConfig,
) -> Result<Vec<SimulationShape>> {
    let mut shapes = Vec::new();
    for n_sat in n_sat_range {
        let shape = simulation_shape(sources, n_sat, config)?;
        if !shape.rows.is_empty() {
            shapes.push(shape);
        }
    }
    Ok(shapes)
}

// ============================================================================
// n-dependence
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DependencePoint {
    pub n_sat: u32,
    pub m31: f64,
    pub mw: f64,
}

/// Normalized observation of one field as the satellite count varies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedDependence {
    pub field_index: usize,
    pub field: Observable,
    pub points: Vec<DependencePoint>,
}

/// Normalized value of row `field_index` (first group) for each n_sat.
pub fn normalized_dependence(
    dir: &Path,
    n_sat_range: RangeInclusive<u32>,
    field_index: usize,
    config: &AnalysisConfig,
) -> Result<NormalizedDependence> {
    let selection = config.field_selection();
    let field = selection.get(field_index).ok_or_else(|| {
        Error::Config(format!(
            "field index {} out of range for {} selected fields",
            field_index,
            selection.len()
        ))
    })?;

    let mut points = Vec::new();
    for n_sat in n_sat_range {
        if !has_groups(dir, n_sat)? {
            continue;
        }
        let pair = load_summary_experiments(dir, n_sat, config)?;
        let value = |exp: &Experiment| -> Result<f64> {
            let obs = normalize(exp, &selection)?;
            Ok(obs.data()[(field_index, 0)])
        };
        points.push(DependencePoint {
            n_sat,
            m31: value(&pair.m31)?,
            mw: value(&pair.mw)?,
        });
    }

    Ok(NormalizedDependence {
        field_index,
        field,
        points,
    })
}

// ============================================================================
// covariance
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostCovariance {
    pub host: Host,
    pub estimate: JackknifeView,
}

/// Jackknife estimates of both hosts of a simulation directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CovarianceReport {
    pub n_sat: u32,
    pub hosts: Vec<HostCovariance>,
}

pub fn covariance_report(sim_dir: &Path, n_sat: u32, config: &AnalysisConfig) -> Result<CovarianceReport> {
    let selection = config.field_selection();
    let pair = load_summary_experiments(sim_dir, n_sat, config)?;
    let hosts = pair
        .iter()
        .map(|(host, exp)| {
            jackknife_covariance(exp, &selection, config.mean_error_divisor).map(|estimate| {
                HostCovariance {
                    host,
                    estimate: estimate.to_view(),
                }
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(CovarianceReport { n_sat, hosts })
}

// ============================================================================
// model
// ============================================================================

/// Gaussian model of one host compared against its observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostModel {
    pub host: Host,
    pub estimate: JackknifeView,
    /// Normalized observation (first observed group), in field order.
    pub observation: Vec<f64>,
    pub comparison: ModelComparison,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GaussianComparison {
    pub simulation: String,
    pub n_sat: u32,
    pub sample_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub hosts: Vec<HostModel>,
}

/// Fit a Gaussian to each host's simulated jackknife estimate, draw
/// `config.sample_count` samples and compare them with the observation.
pub fn gaussian_comparison<R: Rng + ?Sized>(
    sim_dir: &Path,
    obs_dir: &Path,
    simulation: &str,
    n_sat: u32,
    config: &AnalysisConfig,
    rng: &mut R,
) -> Result<GaussianComparison> {
    validate_simulation_name(simulation)?;
    let selection = config.field_selection();
    let sim = load_summary_experiments(sim_dir, n_sat, config)?;
    let obs = load_summary_experiments(obs_dir, n_sat, config)?;

    let mut hosts = Vec::with_capacity(Host::ALL.len());
    for host in Host::ALL {
        let estimate = jackknife_covariance(sim.get(host), &selection, config.mean_error_divisor)?;
        let observation = normalize(obs.get(host), &selection)?
            .column(0)
            .ok_or_else(|| Error::InsufficientData(format!("no observed group for {}", host)))?;

        let model = GaussianModel::from_estimate(&estimate)?;
        let draws = model.sample(config.sample_count, rng);
        let comparison = model.compare(&draws, &observation, &config.quantiles)?;

        hosts.push(HostModel {
            host,
            estimate: estimate.to_view(),
            observation,
            comparison,
        });
    }

    Ok(GaussianComparison {
        simulation: simulation.to_string(),
        n_sat,
        sample_count: config.sample_count,
        seed: config.seed,
        hosts,
    })
}

/// `gaussian_model_<simulation>_<HOST>_n_<n_sat>.json`
pub fn artifact_file_name(simulation: &str, host: Host, n_sat: u32) -> String {
    format!("gaussian_model_{}_{}_n_{}.json", simulation, host.label(), n_sat)
}

/// Write one JSON artifact per host, overwriting earlier runs.
pub fn write_model_artifacts(report: &GaussianComparison, out_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir).map_err(|e| Error::io(out_dir, e))?;

    let mut written = Vec::with_capacity(report.hosts.len());
    for host_model in &report.hosts {
        let path = out_dir.join(artifact_file_name(&report.simulation, host_model.host, report.n_sat));
        let artifact = serde_json::json!({
            "schema_version": REPORT_SCHEMA_VERSION,
            "simulation": report.simulation,
            "n_sat": report.n_sat,
            "sample_count": report.sample_count,
            "seed": report.seed,
            "model": host_model,
        });
        let body = serde_json::to_string_pretty(&artifact)?;
        fs::write(&path, body).map_err(|e| Error::io(&path, e))?;
        tracing::info!(
            target: event_names::REPORT_ARTIFACT_WRITTEN,
            path = %path.display(),
            host = %host_model.host,
            "Wrote model artifact"
        );
        written.push(path);
    }
    Ok(written)
}

fn validate_simulation_name(name: &str) -> Result<()> {
    let ok = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if ok {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "simulation name '{}' must be non-empty and use only [A-Za-z0-9_.-]",
            name
        )))
    }
}

fn has_groups(dir: &Path, n_sat: u32) -> Result<bool> {
    let found = !discover_groups(dir, n_sat)?.is_empty();
    if !found {
        tracing::warn!(
            target: event_names::REPORT_NSAT_SKIPPED,
            dir = %dir.display(),
            n_sat,
            "No groups for n_sat; skipped"
        );
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::fmt::Write as _;
    use tempfile::TempDir;

    /// Write a summary file whose physical row is `phys` in every column and
    /// whose controls alternate `base ± 1` (mean `base`, population std 1).
    fn write_group(dir: &Path, host: Host, id: u64, n_sat: u32, phys: f64, base: f64, n_controls: usize) {
        let mut body = String::new();
        let _ = writeln!(body, "{}", [phys; 8].map(|v| v.to_string()).join(" "));
        for i in 0..n_controls {
            let v = if i % 2 == 0 { base - 1.0 } else { base + 1.0 };
            let _ = writeln!(body, "{}", [v; 8].map(|v| v.to_string()).join(" "));
        }
        fs::write(
            dir.join(format!("{}_group_{}_nsat_{}.dat", host.label(), id, n_sat)),
            body,
        )
        .unwrap();
    }

    fn small_config() -> AnalysisConfig {
        AnalysisConfig {
            n_controls: 4,
            sample_count: 2_000,
            seed: Some(11),
            ..AnalysisConfig::default()
        }
    }

    #[test]
    fn observation_shape_uses_first_group() {
        let tmp = TempDir::new().unwrap();
        write_group(tmp.path(), Host::M31, 1, 11, 3.0, 1.0, 4);
        write_group(tmp.path(), Host::Mw, 1, 11, 0.0, 1.0, 4);

        let shape = observation_shape(tmp.path(), 11, &small_config()).unwrap();
        assert_eq!(shape.rows.len(), 10);

        let m31_width = shape
            .rows
            .iter()
            .find(|r| r.host == Host::M31 && r.field == Observable::Width)
            .unwrap();
        assert_eq!(m31_width.physical, 3.0);
        assert_eq!(m31_width.random, 1.0);
        assert_eq!(m31_width.random_sigma, 1.0);
        assert_eq!(m31_width.normalized, 2.0);

        let mw_width = shape
            .rows
            .iter()
            .find(|r| r.host == Host::Mw && r.field == Observable::Width)
            .unwrap();
        assert_eq!(mw_width.normalized, -1.0);
    }

    #[test]
    fn observation_shapes_skip_empty_n_sat() {
        let tmp = TempDir::new().unwrap();
        write_group(tmp.path(), Host::M31, 1, 12, 3.0, 1.0, 4);
        write_group(tmp.path(), Host::Mw, 1, 12, 3.0, 1.0, 4);

        let shapes = observation_shapes(tmp.path(), 11..=15, &small_config()).unwrap();
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].n_sat, 12);
    }

    #[test]
    fn simulation_shape_is_population_std() {
        let tmp = TempDir::new().unwrap();
        write_group(tmp.path(), Host::M31, 1, 11, 1.0, 0.0, 4);
        write_group(tmp.path(), Host::Mw, 1, 11, 1.0, 0.0, 4);
        write_group(tmp.path(), Host::M31, 2, 11, 3.0, 0.0, 4);
        write_group(tmp.path(), Host::Mw, 2, 11, 3.0, 0.0, 4);

        let sources = vec![SimulationSource {
            name: "elvis".to_string(),
            dir: tmp.path().to_path_buf(),
        }];
        let shape = simulation_shape(&sources, 11, &small_config()).unwrap();
        let row = &shape.rows[0];
        assert_eq!(row.source, "elvis");
        assert_eq!(row.groups, 2);
        assert_eq!(row.mean, 2.0);
        assert_eq!(row.std, 1.0);

        let empty = simulation_shapes(&sources, 12..=13, &small_config()).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn simulation_source_parses() {
        let src: SimulationSource = "illustris=/data/illustris".parse().unwrap();
        assert_eq!(src.name, "illustris");
        assert_eq!(src.dir, PathBuf::from("/data/illustris"));
        assert!("no-separator".parse::<SimulationSource>().is_err());
        assert!("=dir".parse::<SimulationSource>().is_err());
    }

    #[test]
    fn dependence_tracks_n_sat() {
        let tmp = TempDir::new().unwrap();
        write_group(tmp.path(), Host::M31, 1, 11, 3.0, 1.0, 4);
        write_group(tmp.path(), Host::Mw, 1, 11, 2.0, 1.0, 4);
        write_group(tmp.path(), Host::M31, 1, 13, 5.0, 1.0, 4);
        write_group(tmp.path(), Host::Mw, 1, 13, 1.0, 1.0, 4);

        let dep = normalized_dependence(tmp.path(), 11..=15, 0, &small_config()).unwrap();
        assert_eq!(dep.field, Observable::Width);
        assert_eq!(
            dep.points,
            vec![
                DependencePoint { n_sat: 11, m31: 2.0, mw: 1.0 },
                DependencePoint { n_sat: 13, m31: 4.0, mw: 0.0 },
            ]
        );

        assert!(matches!(
            normalized_dependence(tmp.path(), 11..=15, 3, &small_config()),
            Err(Error::Config(_))
        ));
    }

    fn model_fixture() -> (TempDir, TempDir) {
        let sim = TempDir::new().unwrap();
        for (id, phys) in [(1, 0.5), (2, 1.5), (3, 2.5), (4, 4.0)] {
            write_group(sim.path(), Host::M31, id, 11, phys, 0.0, 4);
            write_group(sim.path(), Host::Mw, id, 11, -phys, 0.0, 4);
        }
        let obs = TempDir::new().unwrap();
        write_group(obs.path(), Host::M31, 1, 11, 2.0, 0.0, 4);
        write_group(obs.path(), Host::Mw, 1, 11, -2.0, 0.0, 4);
        (sim, obs)
    }

    #[test]
    fn gaussian_comparison_is_reproducible_with_seed() {
        let (sim, obs) = model_fixture();
        let config = small_config();
        let a = gaussian_comparison(
            sim.path(),
            obs.path(),
            "elvis",
            11,
            &config,
            &mut StdRng::seed_from_u64(5),
        )
        .unwrap();
        let b = gaussian_comparison(
            sim.path(),
            obs.path(),
            "elvis",
            11,
            &config,
            &mut StdRng::seed_from_u64(5),
        )
        .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.hosts.len(), 2);
        assert_eq!(a.hosts[0].observation, vec![2.0, 2.0, 2.0]);
        assert_eq!(a.hosts[0].comparison.n_samples, 2_000);
        assert_eq!(a.hosts[0].comparison.fields[0].quantiles.len(), 3);
    }

    #[test]
    fn artifacts_are_named_per_host() {
        let (sim, obs) = model_fixture();
        let out = TempDir::new().unwrap();
        let report = gaussian_comparison(
            sim.path(),
            obs.path(),
            "elvis",
            11,
            &small_config(),
            &mut StdRng::seed_from_u64(9),
        )
        .unwrap();

        let written = write_model_artifacts(&report, out.path()).unwrap();
        assert_eq!(
            written,
            vec![
                out.path().join("gaussian_model_elvis_M31_n_11.json"),
                out.path().join("gaussian_model_elvis_MW_n_11.json"),
            ]
        );
        let body: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&written[1]).unwrap()).unwrap();
        assert_eq!(body["model"]["host"], "MW");
        assert_eq!(body["n_sat"], 11);

        // A second run overwrites in place
        let again = write_model_artifacts(&report, out.path()).unwrap();
        assert_eq!(again, written);
    }

    #[test]
    fn bad_simulation_name_is_rejected() {
        let (sim, obs) = model_fixture();
        let err = gaussian_comparison(
            sim.path(),
            obs.path(),
            "../escape",
            11,
            &small_config(),
            &mut StdRng::seed_from_u64(1),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn covariance_report_covers_both_hosts() {
        let (sim, _obs) = model_fixture();
        let report = covariance_report(sim.path(), 11, &small_config()).unwrap();
        assert_eq!(report.hosts.len(), 2);
        assert_eq!(report.hosts[0].host, Host::M31);
        assert_eq!(report.hosts[0].estimate.n_groups, 4);
        assert_eq!(report.hosts[1].estimate.covariance.len(), 3);
    }

    #[test]
    fn observe_full_detail_keeps_controls() {
        let tmp = TempDir::new().unwrap();
        write_group(tmp.path(), Host::M31, 1, 11, 3.0, 1.0, 4);
        write_group(tmp.path(), Host::Mw, 1, 11, 3.0, 1.0, 4);

        let report = observe(tmp.path(), 11, AggregationMode::FullDetail, &small_config()).unwrap();
        let m31 = &report.hosts[0];
        let detailed = m31.detailed.as_ref().unwrap();
        assert_eq!(detailed.series(Observable::Width).unwrap().controls.len(), 4);
        assert_eq!(m31.series["width_random"], vec![1.0]);
        assert_eq!(m31.normalized.as_ref().unwrap().rows[0], vec![2.0]);
    }

    #[test]
    fn observe_empty_dir_has_no_normalized_data() {
        let tmp = TempDir::new().unwrap();
        let report = observe(tmp.path(), 11, AggregationMode::Summary, &small_config()).unwrap();
        assert!(report.hosts.iter().all(|h| h.normalized.is_none() && h.group_ids.is_empty()));
    }
}
