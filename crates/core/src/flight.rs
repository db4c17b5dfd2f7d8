//! Flight identity and status codes

use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

use crate::Principal;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlightStatusError {
    #[error("Unknown flight status code: {0}")]
    UnknownCode(u8),
}

/// Flight status as reported by oracles
///
/// Numeric codes are part of the external contract with oracle agents.
/// Only [`FlightStatus::LateAirline`] is an insurable cause.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString, EnumIter, Default,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlightStatus {
    #[default]
    Unknown,
    OnTime,
    LateAirline,
    LateWeather,
    LateTechnical,
    LateOther,
}

impl FlightStatus {
    pub fn code(&self) -> u8 {
        match self {
            FlightStatus::Unknown => 0,
            FlightStatus::OnTime => 10,
            FlightStatus::LateAirline => 20,
            FlightStatus::LateWeather => 30,
            FlightStatus::LateTechnical => 40,
            FlightStatus::LateOther => 50,
        }
    }

    /// True for the single status that triggers insurance payouts
    pub fn is_insurable(&self) -> bool {
        matches!(self, FlightStatus::LateAirline)
    }

    /// A flight is finalized once its status leaves `Unknown`
    pub fn is_final(&self) -> bool {
        !matches!(self, FlightStatus::Unknown)
    }
}

impl TryFrom<u8> for FlightStatus {
    type Error = FlightStatusError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            0 => FlightStatus::Unknown,
            10 => FlightStatus::OnTime,
            20 => FlightStatus::LateAirline,
            30 => FlightStatus::LateWeather,
            40 => FlightStatus::LateTechnical,
            50 => FlightStatus::LateOther,
            other => return Err(FlightStatusError::UnknownCode(other)),
        })
    }
}

/// Composite key of a flight: (airline, designator, scheduled timestamp)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FlightKey {
    pub airline: Principal,
    pub designator: String,
    /// Scheduled departure, unix milliseconds
    pub timestamp: u64,
}

impl FlightKey {
    pub fn new(airline: Principal, designator: impl Into<String>, timestamp: u64) -> Self {
        Self {
            airline,
            designator: designator.into(),
            timestamp,
        }
    }
}

impl fmt::Display for FlightKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}@{}", self.airline, self.designator, self.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_status_codes_roundtrip() {
        for status in FlightStatus::iter() {
            assert_eq!(FlightStatus::try_from(status.code()).unwrap(), status);
        }
        assert_eq!(FlightStatus::LateAirline.code(), 20);
    }

    #[test]
    fn test_unknown_code_rejected() {
        assert_eq!(
            FlightStatus::try_from(25),
            Err(FlightStatusError::UnknownCode(25))
        );
    }

    #[test]
    fn test_only_late_airline_is_insurable() {
        let insurable: Vec<_> = FlightStatus::iter().filter(|s| s.is_insurable()).collect();
        assert_eq!(insurable, vec![FlightStatus::LateAirline]);
        assert!(!FlightStatus::Unknown.is_final());
        assert!(FlightStatus::OnTime.is_final());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("LATE_AIRLINE".parse::<FlightStatus>().unwrap(), FlightStatus::LateAirline);
        assert_eq!(FlightStatus::OnTime.to_string(), "ON_TIME");
    }

    #[test]
    fn test_flight_key_display() {
        let key = FlightKey::new(Principal::from("0xA1"), "ND1309", 1624103191959);
        assert_eq!(key.to_string(), "0xA1:ND1309@1624103191959");
    }
}
