//! Resolution errors.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ResolveError>;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveError {
    /// Cancellation was requested before the resolution finished. No
    /// partial result is produced.
    #[error("resolution abandoned: cancellation requested")]
    Abandoned,
}
