//! Platform network-quality hints.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DeliveryError;

/// Effective connection class reported by the client platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionClass {
    #[serde(rename = "slow-2g")]
    Slow2g,
    #[serde(rename = "2g")]
    G2,
    #[serde(rename = "3g")]
    G3,
    #[serde(rename = "4g")]
    G4,
}

impl ConnectionClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionClass::Slow2g => "slow-2g",
            ConnectionClass::G2 => "2g",
            ConnectionClass::G3 => "3g",
            ConnectionClass::G4 => "4g",
        }
    }

    /// Conservative lower bound for the class, in Mbps.
    pub fn floor_mbps(&self) -> f64 {
        match self {
            ConnectionClass::Slow2g => 0.05,
            ConnectionClass::G2 => 0.25,
            ConnectionClass::G3 => 1.0,
            ConnectionClass::G4 => 5.0,
        }
    }
}

impl fmt::Display for ConnectionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionClass {
    type Err = DeliveryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "slow-2g" => Ok(ConnectionClass::Slow2g),
            "2g" => Ok(ConnectionClass::G2),
            "3g" => Ok(ConnectionClass::G3),
            "4g" => Ok(ConnectionClass::G4),
            other => Err(DeliveryError::InvalidConnectionType(other.to_string())),
        }
    }
}

/// What the client platform says about its connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkHint {
    pub effective_type: Option<ConnectionClass>,
    /// Platform downlink estimate in Mbps.
    pub downlink_mbps: Option<f64>,
}

impl NetworkHint {
    pub fn new(effective_type: Option<ConnectionClass>, downlink_mbps: Option<f64>) -> Self {
        Self {
            effective_type,
            downlink_mbps,
        }
    }

    /// Speed implied by the hint, or `None` when it carries nothing usable.
    ///
    /// The class floor is a minimum: a platform under-reporting its downlink
    /// never drags the speed below its class.
    pub fn speed_mbps(&self) -> Option<f64> {
        let downlink = self.downlink_mbps.filter(|d| d.is_finite() && *d > 0.0);
        match (self.effective_type, downlink) {
            (Some(class), Some(d)) => Some(d.max(class.floor_mbps())),
            (Some(class), None) => Some(class.floor_mbps()),
            (None, Some(d)) => Some(d),
            (None, None) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_wins_over_low_downlink() {
        let hint = NetworkHint::new(Some(ConnectionClass::G4), Some(1.2));
        assert_eq!(hint.speed_mbps(), Some(5.0));
        let hint = NetworkHint::new(Some(ConnectionClass::G3), Some(7.5));
        assert_eq!(hint.speed_mbps(), Some(7.5));
    }

    #[test]
    fn test_partial_hints() {
        assert_eq!(
            NetworkHint::new(Some(ConnectionClass::Slow2g), None).speed_mbps(),
            Some(0.05)
        );
        assert_eq!(NetworkHint::new(None, Some(2.5)).speed_mbps(), Some(2.5));
        assert_eq!(NetworkHint::new(None, Some(f64::NAN)).speed_mbps(), None);
        assert_eq!(NetworkHint::default().speed_mbps(), None);
    }

    #[test]
    fn test_parse() {
        assert_eq!("Slow-2G".parse::<ConnectionClass>().unwrap(), ConnectionClass::Slow2g);
        assert!("5g".parse::<ConnectionClass>().is_err());
        let hint: NetworkHint =
            serde_json::from_str(r#"{"effectiveType":"3g","downlinkMbps":0.4}"#).unwrap();
        assert_eq!(hint.speed_mbps(), Some(1.0));
    }
}
