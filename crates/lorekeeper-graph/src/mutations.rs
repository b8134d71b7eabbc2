//! Relationship writes.
//!
//! Creation uses MERGE, so repeating a create for the same pair and type
//! updates the one existing relationship instead of adding a second.
//! Every write is authorized against the principal before it runs.

use neo4rs::{query, BoltType};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use lorekeeper_core::{Endpoint, Principal, PropertyBag, RelationshipType};

use crate::access::{END_ID, START_ID};
use crate::client::{column, GraphClient, GraphError};
use crate::error::{RelationshipError, Result};
use crate::marshal;

const CREATE_DENIED: &str =
    "Permission denied to create relationship or nodes not in an accessible world.";
const DELETE_DENIED: &str =
    "Permission denied to delete relationship or nodes not in an accessible world.";

// ── Requests ─────────────────────────────────────────────────────

/// A validated request to create or update a relationship.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkRequest {
    pub start: Endpoint,
    pub end: Endpoint,
    pub rel_type: RelationshipType,
    pub properties: Option<PropertyBag>,
}

impl LinkRequest {
    /// Validate raw boundary tokens. Nothing is sent to the store.
    pub fn parse(
        start_kind: &str,
        start_id: Uuid,
        end_kind: &str,
        end_id: Uuid,
        rel_type: &str,
        properties: Option<PropertyBag>,
    ) -> Result<Self> {
        Ok(Self {
            start: Endpoint::resolve(start_kind, start_id)?,
            end: Endpoint::resolve(end_kind, end_id)?,
            rel_type: rel_type.parse()?,
            properties,
        })
    }
}

/// A validated request to delete a relationship.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnlinkRequest {
    pub start: Endpoint,
    pub end: Endpoint,
    pub rel_type: RelationshipType,
}

impl UnlinkRequest {
    /// Validate raw boundary tokens. The relationship type is mandatory.
    pub fn parse(
        start_kind: &str,
        start_id: Uuid,
        end_kind: &str,
        end_id: Uuid,
        rel_type: Option<&str>,
    ) -> Result<Self> {
        let rel_type = rel_type
            .filter(|t| !t.is_empty())
            .ok_or(RelationshipError::MissingRelationshipType)?;
        Ok(Self {
            start: Endpoint::resolve(start_kind, start_id)?,
            end: Endpoint::resolve(end_kind, end_id)?,
            rel_type: rel_type.parse()?,
        })
    }
}

// ── Results ──────────────────────────────────────────────────────

/// The relationship as it stands after a create or update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedRelationship {
    #[serde(rename = "type")]
    pub rel_type: String,
    /// Display name of the start node, if it has one.
    pub from: Option<String>,
    /// Display name of the end node, if it has one.
    pub to: Option<String>,
    pub properties: PropertyBag,
}

/// Outcome of a successful delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletedRelationship {
    pub deleted: i64,
    pub message: String,
}

// ── Cypher ───────────────────────────────────────────────────────

/// MERGE the relationship and optionally merge properties into it.
pub fn upsert_cypher(request: &LinkRequest, has_properties: bool) -> String {
    let set = if has_properties {
        "SET r += $props\n"
    } else {
        ""
    };
    format!(
        "MATCH (s:{start} {{id: ${START_ID}}})\n\
         MATCH (e:{end} {{id: ${END_ID}}})\n\
         MERGE (s)-[r:{rel}]->(e)\n\
         {set}\
         RETURN r, s.name AS from_name, e.name AS to_name",
        start = request.start.kind.label(),
        end = request.end.kind.label(),
        rel = request.rel_type.as_str(),
    )
}

/// Delete at most one relationship of the given type and count it.
pub fn delete_cypher(request: &UnlinkRequest) -> String {
    format!(
        "MATCH (s:{start} {{id: ${START_ID}}})-[r:{rel}]->(e:{end} {{id: ${END_ID}}})\n\
         WITH r LIMIT 1\n\
         DELETE r\n\
         RETURN count(r) AS deleted",
        start = request.start.kind.label(),
        end = request.end.kind.label(),
        rel = request.rel_type.as_str(),
    )
}

pub fn delete_message(request: &UnlinkRequest) -> String {
    format!(
        "Relationship '{}' from {} to {} deleted successfully.",
        request.rel_type, request.start, request.end
    )
}

/// An endpoint's `name`, or `None` when it is absent or not a string.
fn display_name(row: &neo4rs::Row, col: &'static str) -> Option<String> {
    name_or_warn(col, column::<Option<String>>(row, col))
}

fn name_or_warn(
    col: &'static str,
    decoded: std::result::Result<Option<String>, GraphError>,
) -> Option<String> {
    decoded.unwrap_or_else(|e| {
        tracing::warn!(column = col, error = %e, "Endpoint name is not a string");
        None
    })
}

// ── Operations ───────────────────────────────────────────────────

impl GraphClient {
    /// Create the relationship, or update the existing one of the same type.
    ///
    /// Properties are merged into the relationship: keys not supplied keep
    /// their stored values. A `null` value is sent as null; Neo4j does not
    /// store nulls, so the key is removed and reads back as absent.
    pub async fn create_relationship(
        &self,
        request: &LinkRequest,
        principal: &Principal,
    ) -> Result<CreatedRelationship> {
        let props = match &request.properties {
            Some(bag) if !bag.is_empty() => Some(marshal::pack_properties(bag)?),
            _ => None,
        };

        self.authorize_pair(
            &request.start,
            &request.end,
            request.rel_type,
            principal,
            CREATE_DENIED,
        )
        .await?;

        let cypher = upsert_cypher(request, props.is_some());
        let mut q = query(&cypher)
            .param(START_ID, request.start.id.to_string())
            .param(END_ID, request.end.id.to_string());
        if let Some(props) = props {
            q = q.param("props", BoltType::from(props));
        }

        let row = self
            .query_one(q)
            .await?
            .ok_or(RelationshipError::Unapplied("create"))?;

        let rel: neo4rs::Relation = column(&row, "r")?;
        let created = CreatedRelationship {
            rel_type: rel.typ().to_string(),
            from: display_name(&row, "from_name"),
            to: display_name(&row, "to_name"),
            properties: marshal::read_properties(&rel),
        };

        tracing::info!(
            start = %request.start,
            end = %request.end,
            rel_type = %request.rel_type,
            "Relationship created or updated"
        );
        Ok(created)
    }

    /// Delete one relationship of the given type from start to end.
    pub async fn delete_relationship(
        &self,
        request: &UnlinkRequest,
        principal: &Principal,
    ) -> Result<DeletedRelationship> {
        self.authorize_pair(
            &request.start,
            &request.end,
            request.rel_type,
            principal,
            DELETE_DENIED,
        )
        .await?;

        let cypher = delete_cypher(request);
        let q = query(&cypher)
            .param(START_ID, request.start.id.to_string())
            .param(END_ID, request.end.id.to_string());

        let deleted = match self.query_one(q).await? {
            Some(row) => column::<i64>(&row, "deleted")?,
            None => 0,
        };

        if deleted == 0 {
            tracing::info!(
                start = %request.start,
                end = %request.end,
                rel_type = %request.rel_type,
                "No relationship to delete"
            );
            return Err(RelationshipError::RelationshipNotFound {
                rel_type: request.rel_type,
            });
        }

        tracing::info!(
            start = %request.start,
            end = %request.end,
            rel_type = %request.rel_type,
            "Relationship deleted"
        );
        Ok(DeletedRelationship {
            deleted,
            message: delete_message(request),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lorekeeper_core::{CatalogError, ErrorKind, NodeKind};

    fn link(rel: &str) -> Result<LinkRequest> {
        LinkRequest::parse(
            "characters",
            Uuid::new_v4(),
            "factions",
            Uuid::new_v4(),
            rel,
            None,
        )
    }

    #[test]
    fn test_link_request_validates_tokens() {
        let req = link("MEMBER_OF").unwrap();
        assert_eq!(req.start.kind, NodeKind::Character);
        assert_eq!(req.end.kind, NodeKind::Faction);
        assert_eq!(req.rel_type, RelationshipType::MemberOf);

        let err = link("MEMBER_OF]->(x) DETACH DELETE x //").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert!(matches!(
            err,
            RelationshipError::Invalid(CatalogError::InvalidRelationshipType(_))
        ));

        let err = LinkRequest::parse(
            "dragons",
            Uuid::new_v4(),
            "factions",
            Uuid::new_v4(),
            "MEMBER_OF",
            None,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid node type specified: dragons");
    }

    #[test]
    fn test_unlink_requires_type() {
        for missing in [None, Some("")] {
            let err = UnlinkRequest::parse(
                "characters",
                Uuid::new_v4(),
                "characters",
                Uuid::new_v4(),
                missing,
            )
            .unwrap_err();
            assert!(matches!(err, RelationshipError::MissingRelationshipType));
            assert_eq!(err.kind(), ErrorKind::BadRequest);
        }
    }

    #[test]
    fn test_upsert_cypher() {
        let req = link("MEMBER_OF").unwrap();
        let cypher = upsert_cypher(&req, true);
        assert!(cypher.contains("MATCH (s:Character {id: $start_id})"));
        assert!(cypher.contains("MATCH (e:Faction {id: $end_id})"));
        assert!(cypher.contains("MERGE (s)-[r:MEMBER_OF]->(e)"));
        assert!(cypher.contains("SET r += $props"));
        assert!(!upsert_cypher(&req, false).contains("SET"));
    }

    #[test]
    fn test_delete_cypher_limits_to_one() {
        let req = UnlinkRequest::parse(
            "characters",
            Uuid::new_v4(),
            "locations",
            Uuid::new_v4(),
            Some("BORN_IN"),
        )
        .unwrap();
        let cypher = delete_cypher(&req);
        assert!(cypher.starts_with(
            "MATCH (s:Character {id: $start_id})-[r:BORN_IN]->(e:Location {id: $end_id})"
        ));
        assert!(cypher.contains("WITH r LIMIT 1"));
        assert!(cypher.ends_with("RETURN count(r) AS deleted"));
    }

    #[test]
    fn test_delete_message() {
        let a = Uuid::nil();
        let b = Uuid::new_v4();
        let req = UnlinkRequest {
            start: Endpoint::new(NodeKind::Character, a),
            end: Endpoint::new(NodeKind::Character, b),
            rel_type: RelationshipType::Knows,
        };
        assert_eq!(
            delete_message(&req),
            format!("Relationship 'KNOWS' from characters {a} to characters {b} deleted successfully.")
        );
    }

    #[test]
    fn test_created_relationship_serializes_type_key() {
        let created = CreatedRelationship {
            rel_type: "KNOWS".into(),
            from: Some("Aria".into()),
            to: None,
            properties: PropertyBag::new(),
        };
        let json = serde_json::to_value(&created).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "KNOWS", "from": "Aria", "to": null, "properties": {}})
        );
    }

    #[test]
    fn test_non_string_name_becomes_none() {
        assert_eq!(
            name_or_warn("from_name", Ok(Some("Aria".into()))),
            Some("Aria".into())
        );
        assert_eq!(name_or_warn("to_name", Ok(None)), None);

        let bad_type = GraphError::Decode {
            column: "from_name",
            message: "invalid type: integer `7`, expected a string".into(),
        };
        assert_eq!(name_or_warn("from_name", Err(bad_type)), None);
    }
}
