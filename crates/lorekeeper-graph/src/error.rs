use lorekeeper_core::{CatalogError, ErrorKind, RelationshipType};
use thiserror::Error;
use uuid::Uuid;

use crate::client::GraphError;

/// Failures surfaced by relationship operations.
#[derive(Error, Debug)]
pub enum RelationshipError {
    #[error(transparent)]
    Invalid(#[from] CatalogError),

    #[error("Query parameter \"type\" (relationship type) is required for deletion.")]
    MissingRelationshipType,

    #[error("{label} with ID {id} not found.")]
    NodeNotFound { label: &'static str, id: Uuid },

    #[error("Relationship '{rel_type}' not found between the specified nodes.")]
    RelationshipNotFound { rel_type: RelationshipType },

    #[error("{0}")]
    Forbidden(&'static str),

    /// Authorization passed but the write matched nothing.
    #[error("Failed to {0} relationship.")]
    Unapplied(&'static str),

    /// Store or driver failure. The detail stays in the source chain for logs.
    #[error("Internal graph error")]
    Store(#[source] GraphError),
}

impl RelationshipError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Invalid(_) | Self::MissingRelationshipType => ErrorKind::BadRequest,
            Self::NodeNotFound { .. } | Self::RelationshipNotFound { .. } => ErrorKind::NotFound,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::Unapplied(_) | Self::Store(_) => ErrorKind::Internal,
        }
    }
}

impl From<GraphError> for RelationshipError {
    fn from(e: GraphError) -> Self {
        tracing::error!(error = %e, "Graph store failure");
        Self::Store(e)
    }
}

pub type Result<T> = std::result::Result<T, RelationshipError>;
