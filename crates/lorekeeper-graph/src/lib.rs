//! Lorekeeper Graph: the relationship engine for the worldbuilding graph.
//!
//! This crate is the single mutation point for relationships between
//! catalog nodes in Neo4j. Every create, delete, and traversal flows
//! through here so that relationship types stay inside the closed catalog
//! and every operation is authorized against the acting principal's world
//! ownership before it touches data.

pub mod access;
pub mod client;
pub mod error;
pub mod marshal;
pub mod mutations;
pub mod queries;

pub use client::{GraphClient, GraphConfig, GraphError};
pub use error::RelationshipError;
pub use mutations::{CreatedRelationship, DeletedRelationship, LinkRequest, UnlinkRequest};
pub use queries::{EdgeRecord, NodeRecord, RelatedNode, RelatedQuery};
