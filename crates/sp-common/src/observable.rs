//! Observable plane-shape statistics and the per-group series derived from them.

use serde::{Deserialize, Serialize};

/// A plane-shape statistic aggregated per group.
///
/// Declaration order is the aggregation order used in every report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Observable {
    /// Plane width (kpc).
    Width,
    /// Mean of the satellite distribution along the plane normal.
    Mu,
    /// Major axis length.
    A,
    /// Intermediate-to-major axis ratio.
    BaRatio,
    /// Minor-to-major axis ratio.
    CaRatio,
}

impl Observable {
    /// Every observable, in aggregation order.
    pub const ALL: [Observable; 5] = [
        Observable::Width,
        Observable::Mu,
        Observable::A,
        Observable::BaRatio,
        Observable::CaRatio,
    ];

    /// Column name in summary files and series keys.
    pub fn name(self) -> &'static str {
        match self {
            Observable::Width => "width",
            Observable::Mu => "mu",
            Observable::A => "a",
            Observable::BaRatio => "ba_ratio",
            Observable::CaRatio => "ca_ratio",
        }
    }

    /// Human label used in tables.
    pub fn label(self) -> &'static str {
        match self {
            Observable::Width => "Plane width (kpc)",
            Observable::Mu => "Plane offset",
            Observable::A => "Major axis",
            Observable::BaRatio => "b/a ratio",
            Observable::CaRatio => "c/a ratio",
        }
    }
}

impl std::fmt::Display for Observable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Observable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Observable::ALL
            .into_iter()
            .find(|o| o.name() == s)
            .ok_or_else(|| format!("unknown observable: {}", s))
    }
}

/// Which per-group series of an observable a key refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesComponent {
    /// Physical value.
    Value,
    /// Spread of the physical value (always zero: one physical realization).
    Sigma,
    /// Mean over the randomized controls.
    Random,
    /// Population std over the randomized controls.
    RandomSigma,
}

impl SeriesComponent {
    pub const ALL: [SeriesComponent; 4] = [
        SeriesComponent::Value,
        SeriesComponent::Sigma,
        SeriesComponent::Random,
        SeriesComponent::RandomSigma,
    ];

    fn suffix(self) -> &'static str {
        match self {
            SeriesComponent::Value => "",
            SeriesComponent::Sigma => "_sigma",
            SeriesComponent::Random => "_random",
            SeriesComponent::RandomSigma => "_random_sigma",
        }
    }
}

/// Key of one series inside an experiment, e.g. `width_random_sigma`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeriesKey {
    pub field: Observable,
    pub component: SeriesComponent,
}

impl SeriesKey {
    pub fn new(field: Observable, component: SeriesComponent) -> Self {
        SeriesKey { field, component }
    }
}

impl std::fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.field.name(), self.component.suffix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_parse_back() {
        for field in Observable::ALL {
            assert_eq!(field.name().parse::<Observable>().unwrap(), field);
        }
        assert!("minr".parse::<Observable>().is_err());
    }

    #[test]
    fn serde_uses_column_names() {
        assert_eq!(
            serde_json::to_string(&Observable::BaRatio).unwrap(),
            "\"ba_ratio\""
        );
        let parsed: Observable = serde_json::from_str("\"ca_ratio\"").unwrap();
        assert_eq!(parsed, Observable::CaRatio);
    }

    #[test]
    fn series_key_names() {
        let key = SeriesKey::new(Observable::Width, SeriesComponent::RandomSigma);
        assert_eq!(key.to_string(), "width_random_sigma");
        let key = SeriesKey::new(Observable::CaRatio, SeriesComponent::Value);
        assert_eq!(key.to_string(), "ca_ratio");
        let key = SeriesKey::new(Observable::Mu, SeriesComponent::Sigma);
        assert_eq!(key.to_string(), "mu_sigma");
    }
}
