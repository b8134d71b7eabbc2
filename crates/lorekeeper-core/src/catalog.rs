//! The closed catalog of relationship types.
//!
//! Names are grouped by the entity kinds they usually connect, but the
//! grouping is descriptive only: membership is a flat set and the store
//! accepts any member between any two nodes.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

macro_rules! relationship_types {
    ($($variant:ident => $name:literal,)+) => {
        /// A relationship type permitted between two nodes.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum RelationshipType {
            $(
                #[serde(rename = $name)]
                $variant,
            )+
        }

        impl RelationshipType {
            /// Every member of the catalog, in declaration order.
            pub const ALL: &'static [RelationshipType] = &[$(RelationshipType::$variant,)+];

            /// The Cypher relationship type name.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(RelationshipType::$variant => $name,)+
                }
            }

            /// Look up a catalog member by its exact name.
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(RelationshipType::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

relationship_types! {
    // ── Character → Faction ──────────────────────────────────────
    MemberOf => "MEMBER_OF",
    AlliedWithFaction => "ALLIED_WITH_FACTION",
    EnemyOfFaction => "ENEMY_OF_FACTION",
    FoundedFaction => "FOUNDED_FACTION",
    // ── Character → Character ────────────────────────────────────
    Knows => "KNOWS",
    AllyOfCharacter => "ALLY_OF_CHARACTER",
    EnemyOfCharacter => "ENEMY_OF_CHARACTER",
    FamilyRelationshipIs => "FAMILY_RELATIONSHIP_IS",
    ProfessionalRelationshipIs => "PROFESSIONAL_RELATIONSHIP_IS",
    // ── Character → Location ─────────────────────────────────────
    BornIn => "BORN_IN",
    DiedIn => "DIED_IN",
    ResidesIn => "RESIDES_IN",
    Visited => "VISITED",
    RulesOverLocation => "RULES_OVER_LOCATION",
    // ── Character → Event ────────────────────────────────────────
    ParticipatedIn => "PARTICIPATED_IN",
    Witnessed => "WITNESSED",
    CausedEvent => "CAUSED_EVENT",
    VictimOfEvent => "VICTIM_OF_EVENT",
    // ── Character → Item ─────────────────────────────────────────
    OwnsItem => "OWNS_ITEM",
    WieldsItem => "WIELDS_ITEM",
    CreatedItem => "CREATED_ITEM",
    SeeksItem => "SEEKS_ITEM",
    // ── Character → Concept ──────────────────────────────────────
    BelievesIn => "BELIEVES_IN",
    StudiedConcept => "STUDIED_CONCEPT",
    MasteredConcept => "MASTERED_CONCEPT",
    // ── Faction → Character ──────────────────────────────────────
    HasLeader => "HAS_LEADER",
    // ── Faction → Faction ────────────────────────────────────────
    AlliedWithFactionToFaction => "ALLIED_WITH_FACTION_TO_FACTION",
    EnemyOfFactionToFaction => "ENEMY_OF_FACTION_TO_FACTION",
    SubgroupOf => "SUBGROUP_OF",
    TradeAgreementWith => "TRADE_AGREEMENT_WITH",
    // ── Faction → Event ──────────────────────────────────────────
    ParticipatedInEventByFaction => "PARTICIPATED_IN_EVENT_BY_FACTION",
    InitiatedEventByFaction => "INITIATED_EVENT_BY_FACTION",
    AffectedByEventAsFaction => "AFFECTED_BY_EVENT_AS_FACTION",
    // ── Faction → Concept ────────────────────────────────────────
    AdheresToConceptByFaction => "ADHERES_TO_CONCEPT_BY_FACTION",
    PromotesConceptByFaction => "PROMOTES_CONCEPT_BY_FACTION",
    BannedConceptByFaction => "BANNED_CONCEPT_BY_FACTION",
    // ── Location → Location ──────────────────────────────────────
    LocatedIn => "LOCATED_IN",
    AdjacentTo => "ADJACENT_TO",
    ContainsLocation => "CONTAINS_LOCATION",
    ConnectedToLocation => "CONNECTED_TO_LOCATION",
    // ── Location → Event ─────────────────────────────────────────
    SiteOfEvent => "SITE_OF_EVENT",
    // ── Location → Faction ───────────────────────────────────────
    ControlledByFaction => "CONTROLLED_BY_FACTION",
    HeadquartersOfFaction => "HEADQUARTERS_OF_FACTION",
    TerritoryOfFaction => "TERRITORY_OF_FACTION",
    // ── Item → Location ──────────────────────────────────────────
    FoundInLocation => "FOUND_IN_LOCATION",
    StoredAtLocation => "STORED_AT_LOCATION",
    OriginatesFromLocation => "ORIGINATES_FROM_LOCATION",
    // ── Item → Event ─────────────────────────────────────────────
    UsedInEvent => "USED_IN_EVENT",
    CreatedDuringEventAsItem => "CREATED_DURING_EVENT_AS_ITEM",
    DestroyedDuringEventAsItem => "DESTROYED_DURING_EVENT_AS_ITEM",
    KeyObjectInEvent => "KEY_OBJECT_IN_EVENT",
    // ── Item → Concept ───────────────────────────────────────────
    EmbodiesConceptAsItem => "EMBODIES_CONCEPT_AS_ITEM",
    PoweredByConceptAsItem => "POWERED_BY_CONCEPT_AS_ITEM",
    // ── Event → Event ────────────────────────────────────────────
    PrecedesEvent => "PRECEDES_EVENT",
    FollowsEvent => "FOLLOWS_EVENT",
    CausedByEventAsEvent => "CAUSED_BY_EVENT_AS_EVENT",
    PartOfEvent => "PART_OF_EVENT",
    // ── Event → Concept ──────────────────────────────────────────
    DemonstratesConceptAsEvent => "DEMONSTRATES_CONCEPT_AS_EVENT",
    LedToCreationOfConceptByEvent => "LED_TO_CREATION_OF_CONCEPT_BY_EVENT",
    // ── Event → DateEntry ────────────────────────────────────────
    OccurredDuringEra => "OCCURRED_DURING_ERA",
    // ── Concept → Concept ────────────────────────────────────────
    RelatedToConcept => "RELATED_TO_CONCEPT",
    DerivedFromConcept => "DERIVED_FROM_CONCEPT",
    OpposesConcept => "OPPOSES_CONCEPT",
    PrerequisiteForConcept => "PREREQUISITE_FOR_CONCEPT",
    // ── Concept → Faction ────────────────────────────────────────
    CreatedByFactionAsConcept => "CREATED_BY_FACTION_AS_CONCEPT",
    // ── DateEntry → DateEntry ────────────────────────────────────
    ContainsPeriod => "CONTAINS_PERIOD",
    OverlapsWithEra => "OVERLAPS_WITH_ERA",
    PrecedesEraAsDate => "PRECEDES_ERA_AS_DATE",
    FollowsEraAsDate => "FOLLOWS_ERA_AS_DATE",
    // ── User → World ─────────────────────────────────────────────
    Owns => "OWNS",
}

impl RelationshipType {
    /// Whether `token` names a catalog member. Matching is exact.
    pub fn is_allowed(token: &str) -> bool {
        Self::from_name(token).is_some()
    }

    /// Whether this is the world-ownership type.
    pub fn is_world_ownership(self) -> bool {
        matches!(self, Self::Owns)
    }
}

impl FromStr for RelationshipType {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| CatalogError::InvalidRelationshipType(s.to_string()))
    }
}

impl std::fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
