//! Editor construction errors.
use thiserror::Error;

/// Errors that can stop an editor from being built.
///
/// Everything after construction clamps out-of-range input instead of failing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    #[error("no text measurement function was provided")]
    MissingTextMeasurement,
}

pub type EditorResult<T> = Result<T, EditorError>;
