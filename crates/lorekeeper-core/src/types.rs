//! Core domain types for the worldbuilding graph.
//!
//! These types describe what the relationship engine addresses: node kinds
//! and their ownership paths, the acting principal, endpoint descriptors,
//! and traversal directions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CatalogError;

/// An open string-keyed property map attached to a node or relationship.
pub type PropertyBag = serde_json::Map<String, serde_json::Value>;

// ── Node Kinds ────────────────────────────────────────────────────

/// Every kind of node the relationship engine can link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    User,
    World,
    Location,
    Character,
    Faction,
    Item,
    Event,
    Concept,
    DateEntry,
}

/// How a node reaches the user it is accessible to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnershipPath {
    /// A user node, accessible only to that same user.
    SelfIdentity,
    /// A world, accessible to the user that owns it.
    OwnedWorld,
    /// A node that belongs to a world, accessible to the world's owner.
    WorldMember,
}

impl NodeKind {
    pub const ALL: [NodeKind; 9] = [
        NodeKind::User,
        NodeKind::World,
        NodeKind::Location,
        NodeKind::Character,
        NodeKind::Faction,
        NodeKind::Item,
        NodeKind::Event,
        NodeKind::Concept,
        NodeKind::DateEntry,
    ];

    /// Resolve an external resource token such as `characters` or
    /// `date-entries`. Matching ignores case.
    pub fn resolve(token: &str) -> Result<Self, CatalogError> {
        match token.to_lowercase().as_str() {
            "users" => Ok(Self::User),
            "worlds" => Ok(Self::World),
            "locations" => Ok(Self::Location),
            "characters" => Ok(Self::Character),
            "factions" => Ok(Self::Faction),
            "items" => Ok(Self::Item),
            "events" => Ok(Self::Event),
            "concepts" => Ok(Self::Concept),
            "date-entries" => Ok(Self::DateEntry),
            _ => Err(CatalogError::InvalidNodeType(token.to_string())),
        }
    }

    /// The graph label nodes of this kind carry.
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::World => "World",
            Self::Location => "Location",
            Self::Character => "Character",
            Self::Faction => "Faction",
            Self::Item => "Item",
            Self::Event => "Event",
            Self::Concept => "Concept",
            Self::DateEntry => "DateEntry",
        }
    }

    /// The external resource token for this kind.
    pub fn token(self) -> &'static str {
        match self {
            Self::User => "users",
            Self::World => "worlds",
            Self::Location => "locations",
            Self::Character => "characters",
            Self::Faction => "factions",
            Self::Item => "items",
            Self::Event => "events",
            Self::Concept => "concepts",
            Self::DateEntry => "date-entries",
        }
    }

    pub fn ownership_path(self) -> OwnershipPath {
        match self {
            Self::User => OwnershipPath::SelfIdentity,
            Self::World => OwnershipPath::OwnedWorld,
            Self::Location
            | Self::Character
            | Self::Faction
            | Self::Item
            | Self::Event
            | Self::Concept
            | Self::DateEntry => OwnershipPath::WorldMember,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for NodeKind {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::resolve(s)
    }
}

// ── Principal ─────────────────────────────────────────────────────

/// The authenticated user an operation runs on behalf of.
///
/// Built by the authentication layer from a verified token subject and
/// handed to every engine call. Not `Deserialize`: request data never
/// produces one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Principal {
    user_id: Uuid,
}

impl Principal {
    pub fn from_verified_subject(user_id: Uuid) -> Self {
        Self { user_id }
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }
}

// ── Endpoints ─────────────────────────────────────────────────────

/// One end of a relationship: a node kind plus the node's external id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Endpoint {
    pub kind: NodeKind,
    pub id: Uuid,
}

impl Endpoint {
    pub fn new(kind: NodeKind, id: Uuid) -> Self {
        Self { kind, id }
    }

    /// Build an endpoint from an external resource token and id.
    pub fn resolve(token: &str, id: Uuid) -> Result<Self, CatalogError> {
        Ok(Self::new(NodeKind::resolve(token)?, id))
    }

    /// Whether this endpoint is the principal's own user node.
    pub fn is_principal(&self, principal: &Principal) -> bool {
        self.kind == NodeKind::User && self.id == principal.user_id()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.token(), self.id)
    }
}

// ── Directions ────────────────────────────────────────────────────

/// Which relationships of a node a traversal follows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Outgoing,
    Incoming,
    Both,
}

/// The direction a single returned relationship actually points,
/// seen from the traversal's start node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObservedDirection {
    Outgoing,
    Incoming,
}

impl Direction {
    /// Resolve the observed direction of one relationship.
    ///
    /// `Both` compares the relationship's recorded start node identity with
    /// the traversal origin's identity. A self-loop starts at the origin and
    /// therefore reports `Outgoing`.
    pub fn observe(self, rel_start_identity: i64, origin_identity: i64) -> ObservedDirection {
        match self {
            Self::Outgoing => ObservedDirection::Outgoing,
            Self::Incoming => ObservedDirection::Incoming,
            Self::Both if rel_start_identity == origin_identity => ObservedDirection::Outgoing,
            Self::Both => ObservedDirection::Incoming,
        }
    }
}

impl FromStr for Direction {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "outgoing" => Ok(Self::Outgoing),
            "incoming" => Ok(Self::Incoming),
            "both" => Ok(Self::Both),
            _ => Err(CatalogError::InvalidDirection(s.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Outgoing => "outgoing",
            Self::Incoming => "incoming",
            Self::Both => "both",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_resolves_every_token() {
        for kind in NodeKind::ALL {
            assert_eq!(NodeKind::resolve(kind.token()).unwrap(), kind);
        }
        assert_eq!(NodeKind::resolve("date-entries").unwrap().label(), "DateEntry");
    }

    #[test]
    fn test_registry_ignores_case() {
        assert_eq!(NodeKind::resolve("Characters").unwrap(), NodeKind::Character);
        assert_eq!(NodeKind::resolve("DATE-ENTRIES").unwrap(), NodeKind::DateEntry);
    }

    #[test]
    fn test_registry_rejects_unknown_tokens() {
        for bad in ["character", "Character", "dateentries", "", "worlds;"] {
            assert_eq!(
                NodeKind::resolve(bad).unwrap_err(),
                CatalogError::InvalidNodeType(bad.to_string())
            );
        }
    }

    #[test]
    fn test_ownership_paths() {
        assert_eq!(NodeKind::User.ownership_path(), OwnershipPath::SelfIdentity);
        assert_eq!(NodeKind::World.ownership_path(), OwnershipPath::OwnedWorld);
        for kind in &NodeKind::ALL[2..] {
            assert_eq!(kind.ownership_path(), OwnershipPath::WorldMember);
        }
    }

    #[test]
    fn test_endpoint_is_principal() {
        let me = Uuid::new_v4();
        let principal = Principal::from_verified_subject(me);
        assert!(Endpoint::new(NodeKind::User, me).is_principal(&principal));
        assert!(!Endpoint::new(NodeKind::User, Uuid::new_v4()).is_principal(&principal));
        assert!(!Endpoint::new(NodeKind::World, me).is_principal(&principal));
    }

    #[test]
    fn test_direction_parsing() {
        assert_eq!("both".parse::<Direction>().unwrap(), Direction::Both);
        assert_eq!("Incoming".parse::<Direction>().unwrap(), Direction::Incoming);
        assert_eq!(Direction::default(), Direction::Outgoing);
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn test_observed_direction_for_both() {
        assert_eq!(Direction::Both.observe(7, 7), ObservedDirection::Outgoing);
        assert_eq!(Direction::Both.observe(3, 7), ObservedDirection::Incoming);
        assert_eq!(Direction::Outgoing.observe(3, 7), ObservedDirection::Outgoing);
        assert_eq!(Direction::Incoming.observe(7, 7), ObservedDirection::Incoming);
    }
}
