use thiserror::Error;

use crate::types::{Season, Year};

/// Failures that abort the current run. Downstream years depend on the
/// factor history written by earlier ones, so none of these are recoverable
/// mid-stream.
#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    #[error("no landings recorded for {0}")]
    EmptyYear(Year),

    #[error("{year}: landings are not in date order")]
    UnorderedLandings { year: Year },

    #[error("vessel {name} ({coop}) missing from the credit-factor history")]
    MissingHistory { name: String, coop: String },

    #[error("{year} season {season}: no vessels qualify for rate statistics")]
    UndefinedSeasonStats { year: Year, season: Season },
}
