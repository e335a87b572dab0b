// Schedule source trait
//
// Seam between the HTTP layer (and its cache) and whatever produces listings

use async_trait::async_trait;
use serde_json::Value;

use super::SourceKind;
use crate::Result;

/// Produces the current listings for one source.
///
/// Implementations may fail or return an empty list; callers treat both as
/// ordinary outcomes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScheduleSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    async fn fetch(&self) -> Result<Vec<Value>>;
}
