//! Error types for topology derivation

use thiserror::Error;

/// Errors that can occur while deriving a cluster topology
///
/// Every variant is fail-fast: the pipeline aborts on the first error and
/// never retries on its own.
#[derive(Error, Debug)]
pub enum Error {
    /// Requested version pair is not in the compatibility table
    #[error("Postgres {postgres} with BDR {bdr} is not supported")]
    UnsupportedCombination { postgres: String, bdr: String },

    /// A referenced region has no known availability-zone list
    #[error("region {0:?} has no configured availability zones")]
    RegionNotConfigured(String),

    /// An operation requires at least one prior instance and none exists
    #[error("{0} requires at least one existing instance")]
    EmptyTopology(&'static str),

    /// Instances cannot be laid out without a location to place them in
    #[error("cannot build an instance layout with no locations")]
    NoLocations,

    /// Image lookup returned zero matches
    #[error("no image found matching {name:?} in {region}")]
    ImageNotFound { name: String, region: String },

    /// Image lookup returned more than one match
    #[error("expected 1 image matching {name:?} in {region}, found {count}")]
    AmbiguousImageMatch {
        name: String,
        region: String,
        count: usize,
    },

    /// External image lookup could not be performed at all
    #[error("image lookup failed: {0}")]
    Lookup(String),

    /// A pipeline stage failed; carries the stage name for diagnostics
    #[error("{stage}: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Attach a pipeline stage name to this error
    ///
    /// Already-staged errors are left untouched so nested calls don't
    /// stack stage prefixes.
    pub fn with_stage(self, stage: &'static str) -> Self {
        match self {
            Self::Stage { .. } => self,
            other => Self::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }
}

/// Result type for topology operations
pub type Result<T> = std::result::Result<T, Error>;
