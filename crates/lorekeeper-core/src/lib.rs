//! lorekeeper-core: Shared types, relationship catalog, configuration, and
//! error handling for the Lorekeeper worldbuilding graph.
//!
//! This crate provides the foundational types used by the relationship engine:
//! - Node kinds and the resource-token registry
//! - The closed catalog of relationship types
//! - The authenticated principal and endpoint descriptors
//! - Cypher token sanitizing
//! - Configuration management
//! - Common error types

pub mod catalog;
pub mod config;
pub mod error;
pub mod sanitize;
pub mod types;

pub use catalog::RelationshipType;
pub use error::{CatalogError, ErrorKind};
pub use types::{
    Direction, Endpoint, NodeKind, ObservedDirection, OwnershipPath, Principal, PropertyBag,
};
