//! Spatial-subsystem error type.

use thiserror::Error;

use ap_core::{GeoPoint, NodeId};

/// Errors produced by `ap-spatial`.
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("no route from {from} to {to}")]
    NoRoute { from: NodeId, to: NodeId },

    #[error("node {0} not found in network")]
    NodeNotFound(NodeId),

    /// Snapping failed because the network has no nodes.
    #[error("network has no nodes to snap to")]
    NoNodeFound,

    /// Non-finite or out-of-range coordinate given to a spatial query.
    #[error("invalid coordinate {0}")]
    InvalidPosition(GeoPoint),

    #[cfg(feature = "osm")]
    #[error("OSM parse error: {0}")]
    Osm(String),
}

pub type SpatialResult<T> = Result<T, SpatialError>;
