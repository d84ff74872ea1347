//! Randomized-baseline normalization.
//!
//! Each selected field of each group is expressed as the number of control
//! standard deviations the physical value sits away from the control mean:
//! `(value - random) / random_sigma`.

use std::collections::BTreeMap;

use nalgebra::DMatrix;
use serde::Serialize;
use sp_common::{Error, Observable, Result, SeriesComponent};
use sp_config::FieldSelection;

use crate::experiment::Experiment;
use crate::logging::event_names;

/// Normalized values, one row per selected field and one column per group.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedObservation {
    data: DMatrix<f64>,
    fields: BTreeMap<usize, Observable>,
}

impl NormalizedObservation {
    /// `n_fields × n_groups` matrix.
    pub fn data(&self) -> &DMatrix<f64> {
        &self.data
    }

    /// Row index → field mapping used to build the matrix.
    pub fn fields(&self) -> &BTreeMap<usize, Observable> {
        &self.fields
    }

    pub fn n_fields(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_groups(&self) -> usize {
        self.data.ncols()
    }

    /// All groups' normalized values of one row.
    pub fn row(&self, index: usize) -> Option<Vec<f64>> {
        (index < self.n_fields()).then(|| self.data.row(index).iter().copied().collect())
    }

    /// Normalized values of one group across the selected fields.
    pub fn column(&self, group_index: usize) -> Option<Vec<f64>> {
        (group_index < self.n_groups())
            .then(|| self.data.column(group_index).iter().copied().collect())
    }

    /// Serializable view with field names and row-major data.
    pub fn to_view(&self) -> NormalizedView {
        NormalizedView {
            fields: self.fields.values().copied().collect(),
            rows: (0..self.n_fields())
                .filter_map(|i| self.row(i))
                .collect(),
        }
    }
}

/// Row-major JSON form of a [`NormalizedObservation`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedView {
    pub fields: Vec<Observable>,
    pub rows: Vec<Vec<f64>>,
}

/// Normalize the selected fields of an experiment.
///
/// Fails with `InsufficientData` for an empty experiment, `Config` when a
/// selected field was not aggregated, `DivideByZero` when a group's control
/// spread is zero or not finite, and `NumericalInstability` when a
/// normalized value is not finite.
pub fn normalize(experiment: &Experiment, selection: &FieldSelection) -> Result<NormalizedObservation> {
    let n = experiment.points();
    if n == 0 {
        return Err(Error::InsufficientData(format!(
            "no groups to normalize for {} (n_sat={})",
            experiment.host(),
            experiment.n_sat()
        )));
    }

    let mut data = DMatrix::zeros(selection.len(), n);
    for (row, &field) in selection.fields().iter().enumerate() {
        let series = |component| {
            experiment.values(field, component).ok_or_else(|| {
                Error::Config(format!("field {} was not aggregated", field))
            })
        };
        let value = series(SeriesComponent::Value)?;
        let random = series(SeriesComponent::Random)?;
        let random_sigma = series(SeriesComponent::RandomSigma)?;

        for g in 0..n {
            data[(row, g)] = normalized_value(field, g, value[g], random[g], random_sigma[g])?;
        }
    }

    tracing::trace!(
        target: event_names::NORMALIZE_FINISHED,
        host = %experiment.host(),
        fields = selection.len(),
        groups = n,
        "Normalized experiment"
    );

    Ok(NormalizedObservation {
        data,
        fields: selection.field_index_map(),
    })
}

/// `(value - random) / random_sigma` for one group's field.
///
/// The result is always finite.
pub fn normalized_value(
    field: Observable,
    group_index: usize,
    value: f64,
    random: f64,
    random_sigma: f64,
) -> Result<f64> {
    if random_sigma == 0.0 || !random_sigma.is_finite() {
        return Err(Error::DivideByZero { field, group_index });
    }
    let normalized = (value - random) / random_sigma;
    if !normalized.is_finite() {
        return Err(Error::NumericalInstability(format!(
            "normalized {} of group index {} is not finite \
             (value={}, random={}, random_sigma={})",
            field, group_index, value, random, random_sigma
        )));
    }
    Ok(normalized)
}
