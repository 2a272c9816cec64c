//! Relation kinds and the compiled pairing of two models.

use serde::{Deserialize, Serialize};

/// Declared kind of a relation, including its directionality.
///
/// Bidirectional kinds expose a reciprocal field on the target model;
/// unidirectional kinds do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationType {
    UniOneToOne,
    UniManyToOne,
    UniOneToMany,
    BiOneToOne,
    BiOneToMany,
    BiManyToMany,
}

impl RelationType {
    /// Returns true if the target model exposes a reciprocal field.
    pub fn is_bidirectional(&self) -> bool {
        matches!(
            self,
            Self::BiOneToOne | Self::BiOneToMany | Self::BiManyToMany
        )
    }

    /// The structural kind that selects the relation engine implementation.
    pub fn ship(&self) -> RelationShip {
        match self {
            Self::UniOneToOne | Self::BiOneToOne => RelationShip::OneToOne,
            Self::UniManyToOne | Self::UniOneToMany | Self::BiOneToMany => RelationShip::OneToMany,
            Self::BiManyToMany => RelationShip::ManyToMany,
        }
    }
}

/// Structural relation kind, orthogonal to directionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationShip {
    OneToOne,
    OneToMany,
    ManyToMany,
}

/// One end of a [`ModelRelation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Source,
    Target,
}

impl Side {
    /// The other end of the relation.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Source => Self::Target,
            Self::Target => Self::Source,
        }
    }
}

/// Two models paired through one relation, with its storage layout resolved.
///
/// Built once by [`Schema::new`](crate::Schema::new).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRelation {
    pub relation_type: RelationType,
    /// Relation name shared by both fields of a bidirectional pair.
    pub name: Option<String>,
    pub source: String,
    pub source_field: String,
    pub target: String,
    /// Present only for bidirectional relations.
    pub target_field: Option<String>,
    /// Foreign-key field for one-to-one and one-to-many relations, or the
    /// source-side reference array for many-to-many.
    pub foreign_key: String,
    /// The target-side reference array of a many-to-many relation.
    pub target_foreign_key: Option<String>,
    /// Which side's records store `foreign_key`.
    pub key_holder: Side,
}

impl ModelRelation {
    /// Model name at the given side.
    pub fn model(&self, side: Side) -> &str {
        match side {
            Side::Source => &self.source,
            Side::Target => &self.target,
        }
    }

    /// Exposed field name at the given side, if that side exposes one.
    pub fn field(&self, side: Side) -> Option<&str> {
        match side {
            Side::Source => Some(&self.source_field),
            Side::Target => self.target_field.as_deref(),
        }
    }

    pub fn ship(&self) -> RelationShip {
        self.relation_type.ship()
    }
}
