use ap_core::{CoreError, NetworkType};
use ap_spatial::SpatialError;
use thiserror::Error;

/// Failure reported by an external data source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("place {0:?} is not known to the source")]
    UnknownPlace(String),

    #[error("source backend failed: {0}")]
    Backend(String),

    #[error(transparent)]
    Spatial(#[from] SpatialError),
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("no access points available for {place:?}")]
    NoPointsAvailable { place: String },

    #[error("no usable {network} network for {place:?}")]
    GraphUnavailable { place: String, network: NetworkType },

    #[error("query superseded by a newer one")]
    Superseded,

    #[error("data source error: {0}")]
    Source(#[from] SourceError),

    #[error("spatial error: {0}")]
    Spatial(#[from] SpatialError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type QueryResult<T> = Result<T, QueryError>;
