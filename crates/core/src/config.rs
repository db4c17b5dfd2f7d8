//! Surety configuration
//!
//! Every fee, threshold and quorum size is configurable via file.
//! Missing fields fall back to the defaults below.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::Amount;

/// Top-level configuration, one section per engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuretyConfig {
    #[serde(default)]
    pub governance: GovernanceConfig,

    #[serde(default)]
    pub policy: PolicyConfig,

    #[serde(default)]
    pub oracle: OracleConfig,
}

/// Airline admission and funding rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// Admission is immediate while fewer airlines than this are registered
    #[serde(default = "default_bootstrap_airlines")]
    pub bootstrap_airlines: usize,

    /// Votes required = ceil(registered / consensus_divisor)
    #[serde(default = "default_consensus_divisor")]
    pub consensus_divisor: usize,

    /// Minimum contribution per funding call, and cumulative activation threshold
    #[serde(default = "default_minimum_participation_fee")]
    pub minimum_participation_fee: Amount,
}

/// Insurance purchase and payout rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Cap on the cumulative premium of one policy
    #[serde(default = "default_max_premium")]
    pub max_premium: Amount,

    #[serde(default = "default_payout_numerator")]
    pub payout_numerator: u32,

    #[serde(default = "default_payout_denominator")]
    pub payout_denominator: u32,
}

/// Oracle registration and quorum rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleConfig {
    #[serde(default = "default_registration_fee")]
    pub registration_fee: Amount,

    /// Distinct indexes assigned to each oracle
    #[serde(default = "default_indexes_per_oracle")]
    pub indexes_per_oracle: usize,

    /// Indexes are drawn from `0..index_range`
    #[serde(default = "default_index_range")]
    pub index_range: u8,

    /// Matching responses from distinct oracles needed to resolve a request
    #[serde(default = "default_quorum")]
    pub quorum: usize,
}

fn default_bootstrap_airlines() -> usize {
    4
}

fn default_consensus_divisor() -> usize {
    2
}

fn default_minimum_participation_fee() -> Amount {
    Amount::units(10)
}

fn default_max_premium() -> Amount {
    Amount::units(1)
}

fn default_payout_numerator() -> u32 {
    3
}

fn default_payout_denominator() -> u32 {
    2
}

fn default_registration_fee() -> Amount {
    Amount::units(1)
}

fn default_indexes_per_oracle() -> usize {
    3
}

fn default_index_range() -> u8 {
    10
}

fn default_quorum() -> usize {
    3
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            bootstrap_airlines: default_bootstrap_airlines(),
            consensus_divisor: default_consensus_divisor(),
            minimum_participation_fee: default_minimum_participation_fee(),
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            max_premium: default_max_premium(),
            payout_numerator: default_payout_numerator(),
            payout_denominator: default_payout_denominator(),
        }
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            registration_fee: default_registration_fee(),
            indexes_per_oracle: default_indexes_per_oracle(),
            index_range: default_index_range(),
            quorum: default_quorum(),
        }
    }
}

impl GovernanceConfig {
    /// Votes needed to admit a candidate when `registered` airlines exist
    pub fn votes_required(&self, registered: usize) -> usize {
        let divisor = self.consensus_divisor.max(1);
        registered.div_ceil(divisor)
    }
}

impl SuretyConfig {
    /// Load configuration from JSON file
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}
