use thiserror::Error;

/// Contract violations detected at the boundary of the engine.
///
/// The merging itself never fails, degenerate inputs turn into
/// empty spectra. These errors only come out of constructors and
/// validation routines, invalid inputs are rejected before merging.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpecMergeError {
    #[error("Invalid value for `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("Invalid peak {index} in scan {scan_id}: ({mz}, {intensity})")]
    InvalidPeak {
        scan_id: u32,
        index: usize,
        mz: f64,
        intensity: f64,
    },

    #[error("Invalid precursor m/z {mz} for the feature in {raw_file}")]
    InvalidFeature { raw_file: String, mz: f64 },
}

impl SpecMergeError {
    pub fn invalid_config(field: &'static str, reason: impl std::fmt::Display) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SpecMergeError>;
