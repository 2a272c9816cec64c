use crate::many_to_many::ManyToMany;
use crate::one_to_many::OneToMany;
use crate::one_to_one::OneToOne;
use crate::store::SideStore;
use grove_hooks::MutationResult;
use grove_model::{ModelRelation, RelationShip, Side};
use grove_storage::{Record, RequestContext};
use serde_json::Value;

/// A relation's link operations, selected once by structural kind.
///
/// Every operation takes the `side` it is issued from: `self_id` is a record
/// of that side's model, `other_id` a record of the opposite side.
pub enum RelationEngine {
    OneToOne(OneToOne),
    OneToMany(OneToMany),
    ManyToMany(ManyToMany),
}

impl RelationEngine {
    pub fn new(relation: ModelRelation, source: SideStore, target: SideStore) -> Self {
        match relation.ship() {
            RelationShip::OneToOne => Self::OneToOne(OneToOne::new(relation, source, target)),
            RelationShip::OneToMany => Self::OneToMany(OneToMany::new(relation, source, target)),
            RelationShip::ManyToMany => Self::ManyToMany(ManyToMany::new(relation, source, target)),
        }
    }

    pub fn relation(&self) -> &ModelRelation {
        match self {
            Self::OneToOne(r) => r.relation(),
            Self::OneToMany(r) => r.relation(),
            Self::ManyToMany(r) => r.relation(),
        }
    }

    /// Storage binding of `side`'s model.
    pub fn store(&self, side: Side) -> &SideStore {
        match self {
            Self::OneToOne(r) => r.keys().at(side),
            Self::OneToMany(r) => r.keys().at(side),
            Self::ManyToMany(r) => r.at(side),
        }
    }

    /// Whether `side`'s field addresses many records.
    pub fn is_list(&self, side: Side) -> bool {
        match self {
            Self::OneToOne(_) => false,
            Self::OneToMany(r) => side != r.many_side(),
            Self::ManyToMany(_) => true,
        }
    }

    /// Whether `side`'s own records store the scalar foreign key.
    pub fn holds_key(&self, side: Side) -> bool {
        match self {
            Self::OneToOne(r) => side == r.owner(),
            Self::OneToMany(r) => side == r.many_side(),
            Self::ManyToMany(_) => false,
        }
    }

    pub async fn link(
        &self,
        side: Side,
        self_id: &str,
        other_id: &str,
        ctx: &RequestContext,
    ) -> MutationResult<()> {
        match self {
            Self::OneToOne(r) => r.keys().link(side, self_id, other_id, ctx).await,
            Self::OneToMany(r) => r.keys().link(side, self_id, other_id, ctx).await,
            Self::ManyToMany(r) => r.link(side, self_id, other_id, ctx).await,
        }
    }

    pub async fn unlink(
        &self,
        side: Side,
        self_id: &str,
        other_id: &str,
        ctx: &RequestContext,
    ) -> MutationResult<()> {
        match self {
            Self::OneToOne(r) => r.keys().unlink(side, self_id, other_id, ctx).await,
            Self::OneToMany(r) => r.keys().unlink(side, self_id, other_id, ctx).await,
            Self::ManyToMany(r) => r.unlink(side, self_id, other_id, ctx).await,
        }
    }

    /// Creates a record on the opposite side and links it to `self_id`.
    pub async fn create_and_link(
        &self,
        side: Side,
        self_id: &str,
        payload: &Record,
        ctx: &RequestContext,
    ) -> MutationResult<Record> {
        match self {
            Self::OneToOne(r) => r.keys().create_and_link(side, self_id, payload, ctx).await,
            Self::OneToMany(r) => r.keys().create_and_link(side, self_id, payload, ctx).await,
            Self::ManyToMany(r) => r.create_and_link(side, self_id, payload, ctx).await,
        }
    }

    /// Deletes `other_id`, then removes the reference left behind.
    pub async fn delete_and_unlink(
        &self,
        side: Side,
        self_id: &str,
        other_id: &str,
        ctx: &RequestContext,
    ) -> MutationResult<()> {
        match self {
            Self::OneToOne(r) => r.keys().delete_and_unlink(side, self_id, other_id, ctx).await,
            Self::OneToMany(r) => r.keys().delete_and_unlink(side, self_id, other_id, ctx).await,
            Self::ManyToMany(r) => r.delete_and_unlink(side, self_id, other_id, ctx).await,
        }
    }

    /// Ids of the opposite-side records `parent` is linked to.
    pub async fn linked_ids(
        &self,
        side: Side,
        parent: &Record,
        ctx: &RequestContext,
    ) -> MutationResult<Vec<String>> {
        match self {
            Self::OneToOne(r) => r.keys().linked_ids(side, parent, ctx).await,
            Self::OneToMany(r) => r.keys().linked_ids(side, parent, ctx).await,
            Self::ManyToMany(r) => Ok(r.linked_ids(side, parent)),
        }
    }

    /// Resolves the relation field of `parent`: a record or null for to-one
    /// sides, an array for to-many sides.
    pub async fn join(
        &self,
        side: Side,
        parent: &Record,
        ctx: &RequestContext,
    ) -> MutationResult<Value> {
        match self {
            Self::OneToOne(r) => r.join(side, parent, ctx).await,
            Self::OneToMany(r) => r.join(side, parent, ctx).await,
            Self::ManyToMany(r) => r.join(side, parent, ctx).await,
        }
    }
}
