use crate::keyed::ForeignKey;
use crate::store::SideStore;
use grove_hooks::MutationResult;
use grove_model::{ModelRelation, Side};
use grove_storage::{Record, RequestContext};
use serde_json::Value;

/// One-to-many: every record of the many side holds the id of its one.
pub struct OneToMany {
    keys: ForeignKey,
}

impl OneToMany {
    pub fn new(relation: ModelRelation, source: SideStore, target: SideStore) -> Self {
        Self {
            keys: ForeignKey::new(relation, source, target),
        }
    }

    pub fn relation(&self) -> &ModelRelation {
        &self.keys.relation
    }

    /// The side whose records carry the key.
    pub fn many_side(&self) -> Side {
        self.keys.holder()
    }

    pub(crate) fn keys(&self) -> &ForeignKey {
        &self.keys
    }

    /// The many side resolves to its one record, the one side to a list.
    pub async fn join(
        &self,
        side: Side,
        parent: &Record,
        ctx: &RequestContext,
    ) -> MutationResult<Value> {
        if side == self.many_side() {
            self.keys.join_one(side, parent, ctx).await
        } else {
            self.keys.join_many(side, parent, ctx).await
        }
    }
}
