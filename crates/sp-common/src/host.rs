//! Host galaxy identities.

use serde::{Deserialize, Serialize};

/// One of the two host systems compared in every analysis.
///
/// Host A is the M31 analog and drives group discovery; host B is the
/// MW analog and is located by substituting the label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Host {
    #[serde(rename = "M31")]
    M31,
    #[serde(rename = "MW")]
    Mw,
}

impl Host {
    /// Both hosts in report order.
    pub const ALL: [Host; 2] = [Host::M31, Host::Mw];

    /// Filename label (`M31` or `MW`).
    pub fn label(self) -> &'static str {
        match self {
            Host::M31 => "M31",
            Host::Mw => "MW",
        }
    }

    /// The other host of the pair.
    pub fn counterpart(self) -> Host {
        match self {
            Host::M31 => Host::Mw,
            Host::Mw => Host::M31,
        }
    }
}

impl std::fmt::Display for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Host {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "M31" => Ok(Host::M31),
            "MW" => Ok(Host::Mw),
            _ => Err(format!("unknown host: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip_through_from_str() {
        for host in Host::ALL {
            assert_eq!(host.label().parse::<Host>().unwrap(), host);
        }
        assert_eq!("mw".parse::<Host>().unwrap(), Host::Mw);
        assert!("LMC".parse::<Host>().is_err());
    }

    #[test]
    fn counterpart_swaps_hosts() {
        assert_eq!(Host::M31.counterpart(), Host::Mw);
        assert_eq!(Host::Mw.counterpart(), Host::M31);
    }

    #[test]
    fn serializes_as_label() {
        assert_eq!(serde_json::to_string(&Host::Mw).unwrap(), "\"MW\"");
        assert_eq!(serde_json::to_string(&Host::M31).unwrap(), "\"M31\"");
    }
}
