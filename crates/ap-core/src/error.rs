//! Core error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` as one
//! variant via `#[from]`.

use thiserror::Error;

use crate::{GeoPoint, PointId};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("point {0} not found")]
    PointNotFound(PointId),

    #[error("coordinate {0} is outside WGS-84 range")]
    InvalidCoordinate(GeoPoint),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),
}

/// Shorthand result type for `ap-core`.
pub type CoreResult<T> = Result<T, CoreError>;
