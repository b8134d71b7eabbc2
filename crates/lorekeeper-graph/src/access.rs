//! Ownership-based authorization predicates.
//!
//! Every relationship operation first proves that the principal may touch
//! the endpoints involved. A node is accessible when:
//! - it is the principal's own `User` node
//! - it is a `World` the principal `OWNS`
//! - it `BELONGS_TO_WORLD` a world the principal `OWNS`
//!
//! When both endpoints of a pair resolve to a world, the worlds must be the
//! same node. Linking the principal's own user node to a world with `OWNS`
//! only requires that both nodes exist.
//!
//! A predicate that matches nothing is then classified by probing endpoint
//! existence, start before end, so callers see NotFound for missing nodes
//! and Forbidden for everything else.

use neo4rs::query;

use lorekeeper_core::{Endpoint, NodeKind, OwnershipPath, Principal, RelationshipType};

use crate::client::{column, GraphClient, GraphError};
use crate::error::{RelationshipError, Result};

pub(crate) const START_ID: &str = "start_id";
pub(crate) const END_ID: &str = "end_id";
pub(crate) const PRINCIPAL_ID: &str = "principal_id";

// ── Predicate Builders ───────────────────────────────────────────

/// MATCH clause binding `var` to an endpoint visible to the principal.
///
/// Returns the clause and, when the endpoint resolves to a world, the
/// variable that world is bound to.
fn scope_clause(kind: NodeKind, var: &str, id_param: &str) -> (String, Option<String>) {
    let label = kind.label();
    match kind.ownership_path() {
        OwnershipPath::SelfIdentity => (
            format!("MATCH ({var}:{label} {{id: ${id_param}}}) WHERE {var}.id = ${PRINCIPAL_ID}"),
            None,
        ),
        OwnershipPath::OwnedWorld => (
            format!("MATCH ({var}:{label} {{id: ${id_param}}})<-[:OWNS]-(:User {{id: ${PRINCIPAL_ID}}})"),
            Some(var.to_string()),
        ),
        OwnershipPath::WorldMember => {
            let world = format!("{var}w");
            (
                format!(
                    "MATCH ({var}:{label} {{id: ${id_param}}})-[:BELONGS_TO_WORLD]->({world}:World)<-[:OWNS]-(:User {{id: ${PRINCIPAL_ID}}})"
                ),
                Some(world),
            )
        }
    }
}

/// Whether a pair is the principal founding ownership of a world.
pub fn is_world_founding(
    start: &Endpoint,
    end: &Endpoint,
    rel_type: RelationshipType,
    principal: &Principal,
) -> bool {
    rel_type.is_world_ownership()
        && ((start.is_principal(principal) && end.kind == NodeKind::World)
            || (end.is_principal(principal) && start.kind == NodeKind::World))
}

/// Cypher that returns one row iff the principal may link `start` and `end`.
///
/// Binds `$start_id`, `$end_id` and `$principal_id`.
pub fn pair_predicate(
    start: &Endpoint,
    end: &Endpoint,
    rel_type: RelationshipType,
    principal: &Principal,
) -> String {
    if is_world_founding(start, end, rel_type, principal) {
        let (user_var, user_param) = if start.kind == NodeKind::User {
            ("s", START_ID)
        } else {
            ("e", END_ID)
        };
        return format!(
            "MATCH (s:{start} {{id: ${START_ID}}})\n\
             MATCH (e:{end} {{id: ${END_ID}}})\n\
             WHERE {user_var}.id = ${PRINCIPAL_ID} AND ${user_param} = ${PRINCIPAL_ID}\n\
             RETURN s.id AS start_id, e.id AS end_id",
            start = start.kind.label(),
            end = end.kind.label(),
        );
    }

    let (start_clause, start_world) = scope_clause(start.kind, "s", START_ID);
    let (end_clause, end_world) = scope_clause(end.kind, "e", END_ID);

    let mut cypher = format!("{start_clause}\n{end_clause}\n");
    if let (Some(sw), Some(ew)) = (start_world, end_world) {
        cypher.push_str(&format!("WITH * WHERE {sw} = {ew}\n"));
    }
    cypher.push_str("RETURN s.id AS start_id, e.id AS end_id");
    cypher
}

/// Cypher that returns one row iff the principal may read `endpoint`.
///
/// Binds `$start_id` and `$principal_id`.
pub fn node_predicate(endpoint: &Endpoint) -> String {
    let (clause, _) = scope_clause(endpoint.kind, "s", START_ID);
    format!("{clause}\nRETURN s.id AS start_id")
}

/// Cypher probing whether a node of `kind` exists. Binds `$id`.
pub fn existence_query(kind: NodeKind) -> String {
    format!(
        "MATCH (n:{label} {{id: $id}}) RETURN count(n) > 0 AS found",
        label = kind.label()
    )
}

// ── Enforcement ──────────────────────────────────────────────────

impl GraphClient {
    /// Ensure the principal may link or unlink `start` and `end`.
    ///
    /// Fails with NotFound for a missing endpoint (start checked first) and
    /// with `denied` otherwise.
    pub async fn authorize_pair(
        &self,
        start: &Endpoint,
        end: &Endpoint,
        rel_type: RelationshipType,
        principal: &Principal,
        denied: &'static str,
    ) -> Result<()> {
        let cypher = pair_predicate(start, end, rel_type, principal);
        tracing::debug!(%start, %end, %rel_type, %cypher, "Checking pair access");

        let q = query(&cypher)
            .param(START_ID, start.id.to_string())
            .param(END_ID, end.id.to_string())
            .param(PRINCIPAL_ID, principal.user_id().to_string());

        if self.query_one(q).await?.is_some() {
            return Ok(());
        }
        Err(self.classify_denial(&[start, end], denied).await?)
    }

    /// Ensure the principal may read relationships of `endpoint`.
    pub async fn authorize_node(
        &self,
        endpoint: &Endpoint,
        principal: &Principal,
        denied: &'static str,
    ) -> Result<()> {
        let cypher = node_predicate(endpoint);
        tracing::debug!(%endpoint, "Checking node access");

        let q = query(&cypher)
            .param(START_ID, endpoint.id.to_string())
            .param(PRINCIPAL_ID, principal.user_id().to_string());

        if self.query_one(q).await?.is_some() {
            return Ok(());
        }
        Err(self.classify_denial(&[endpoint], denied).await?)
    }

    /// Whether the node an endpoint addresses exists, regardless of access.
    pub async fn node_exists(&self, endpoint: &Endpoint) -> std::result::Result<bool, GraphError> {
        let cypher = existence_query(endpoint.kind);
        let q = query(&cypher).param("id", endpoint.id.to_string());
        match self.query_one(q).await? {
            Some(row) => column::<bool>(&row, "found"),
            None => Ok(false),
        }
    }

    async fn classify_denial(
        &self,
        endpoints: &[&Endpoint],
        denied: &'static str,
    ) -> std::result::Result<RelationshipError, GraphError> {
        for endpoint in endpoints {
            if !self.node_exists(endpoint).await? {
                tracing::info!(%endpoint, "Relationship endpoint not found");
                return Ok(RelationshipError::NodeNotFound {
                    label: endpoint.kind.label(),
                    id: endpoint.id,
                });
            }
        }
        tracing::warn!(
            endpoints = ?endpoints.iter().map(|e| e.to_string()).collect::<Vec<_>>(),
            "Relationship access denied"
        );
        Ok(RelationshipError::Forbidden(denied))
    }
}
