//! Data source adapters
//!
//! Each adapter scrapes one schedule page and yields a list of listings.
//! Results are opaque JSON to the rest of the system; they are cached and
//! served as-is.

pub mod football;
pub mod page;
pub mod traits;
pub mod volleyball;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use football::{FootballMatch, FootballSource, StreamLink};
pub use page::PageClient;
pub use traits::ScheduleSource;
#[cfg(test)]
pub use traits::MockScheduleSource;
pub use volleyball::{VolleyballMatch, VolleyballSource};

/// Which schedule a listing (and its cache slot) belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Football,
    Volleyball,
}

impl SourceKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Football => "football",
            Self::Volleyball => "volleyball",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
