//! Relationship traversal: the neighbours of one node.

use neo4rs::query;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use lorekeeper_core::sanitize::sanitize;
use lorekeeper_core::{
    Direction, Endpoint, NodeKind, ObservedDirection, Principal, PropertyBag, RelationshipType,
};

use crate::access::START_ID;
use crate::client::{column, GraphClient};
use crate::error::Result;
use crate::marshal;

const VIEW_DENIED: &str = "You do not have permission to view relationships for this node.";

/// A neighbouring node as returned by a traversal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    pub labels: Vec<String>,
    pub properties: PropertyBag,
}

/// The relationship connecting the start node to a neighbour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    /// Store-internal identity, rendered as a decimal string.
    pub id: String,
    #[serde(rename = "type")]
    pub rel_type: String,
    pub properties: PropertyBag,
}

/// One traversal result: neighbour, connecting edge, and which way it points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedNode {
    pub node: NodeRecord,
    pub relationship: EdgeRecord,
    pub direction: ObservedDirection,
}

/// A validated traversal request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelatedQuery {
    pub start: Endpoint,
    pub direction: Direction,
    pub rel_type: Option<RelationshipType>,
    pub end_kind: Option<NodeKind>,
}

impl RelatedQuery {
    /// Validate raw boundary tokens. Empty filters count as absent and the
    /// direction defaults to outgoing.
    pub fn parse(
        start_kind: &str,
        start_id: Uuid,
        direction: Option<&str>,
        rel_type: Option<&str>,
        end_kind: Option<&str>,
    ) -> Result<Self> {
        let present = |s: &&str| !s.is_empty();
        Ok(Self {
            start: Endpoint::resolve(start_kind, start_id)?,
            direction: match direction.filter(present) {
                Some(d) => d.parse::<Direction>()?,
                None => Direction::default(),
            },
            rel_type: rel_type.filter(present).map(str::parse::<RelationshipType>).transpose()?,
            end_kind: end_kind.filter(present).map(NodeKind::resolve).transpose()?,
        })
    }
}

/// Build the traversal Cypher. Binds `$start_id`.
///
/// Filter tokens are already catalog members; they are still stripped to
/// identifier characters before being spliced into the pattern.
pub fn related_cypher(request: &RelatedQuery) -> String {
    let rel_filter = request
        .rel_type
        .map(|t| format!(":{}", sanitize(t.as_str())))
        .unwrap_or_default();
    let node_filter = request
        .end_kind
        .map(|k| format!(":{}", sanitize(k.label())))
        .unwrap_or_default();

    let pattern = match request.direction {
        Direction::Outgoing => format!("-[r{rel_filter}]->"),
        Direction::Incoming => format!("<-[r{rel_filter}]-"),
        Direction::Both => format!("-[r{rel_filter}]-"),
    };

    format!(
        "MATCH (s:{start} {{id: ${START_ID}}}){pattern}(n{node_filter})\n\
         RETURN id(s) AS origin, r, n",
        start = request.start.kind.label(),
    )
}

impl GraphClient {
    /// List the neighbours of a node the principal can access.
    ///
    /// Only the start node is authorized; neighbours are returned as found.
    /// Result order is unspecified.
    pub async fn related(
        &self,
        request: &RelatedQuery,
        principal: &Principal,
    ) -> Result<Vec<RelatedNode>> {
        self.authorize_node(&request.start, principal, VIEW_DENIED)
            .await?;

        let cypher = related_cypher(request);
        tracing::debug!(%cypher, "Traversal query");
        let q = query(&cypher).param(START_ID, request.start.id.to_string());
        let rows = self.query_rows(q).await?;

        let mut results = Vec::with_capacity(rows.len());
        for row in &rows {
            let origin: i64 = column(row, "origin")?;
            let rel: neo4rs::Relation = column(row, "r")?;
            let node: neo4rs::Node = column(row, "n")?;

            results.push(RelatedNode {
                direction: request.direction.observe(rel.start_node_id(), origin),
                node: node_to_record(&node),
                relationship: EdgeRecord {
                    id: rel.id().to_string(),
                    rel_type: rel.typ().to_string(),
                    properties: marshal::read_properties(&rel),
                },
            });
        }

        tracing::debug!(
            start = %request.start,
            direction = %request.direction,
            count = results.len(),
            "Related nodes fetched"
        );
        Ok(results)
    }
}

fn node_to_record(node: &neo4rs::Node) -> NodeRecord {
    let id: String = node.get("id").unwrap_or_else(|_| {
        tracing::warn!(identity = node.id(), "Related node has no id property");
        String::new()
    });

    NodeRecord {
        id,
        labels: node.labels().into_iter().map(|l| l.to_string()).collect(),
        properties: marshal::read_properties(node),
    }
}
