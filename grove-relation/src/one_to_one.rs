use crate::keyed::ForeignKey;
use crate::store::SideStore;
use grove_hooks::MutationResult;
use grove_model::{ModelRelation, Side};
use grove_storage::{Record, RequestContext};
use serde_json::Value;

/// One-to-one: the owning side's records hold the other side's id.
pub struct OneToOne {
    keys: ForeignKey,
}

impl OneToOne {
    pub fn new(relation: ModelRelation, source: SideStore, target: SideStore) -> Self {
        Self {
            keys: ForeignKey::new(relation, source, target),
        }
    }

    pub fn relation(&self) -> &ModelRelation {
        &self.keys.relation
    }

    /// The side whose records store the key.
    pub fn owner(&self) -> Side {
        self.keys.holder()
    }

    pub(crate) fn keys(&self) -> &ForeignKey {
        &self.keys
    }

    /// Both sides resolve to a single record or null.
    pub async fn join(
        &self,
        side: Side,
        parent: &Record,
        ctx: &RequestContext,
    ) -> MutationResult<Value> {
        self.keys.join_one(side, parent, ctx).await
    }
}
