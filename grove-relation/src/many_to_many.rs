//! Many-to-many over two embedded reference arrays.
//!
//! Each side keeps the opposite side's ids in an array field of its own
//! records. A link is two independent writes, one per side. Nothing ties
//! them together: a failure between them leaves the pair half-linked.

use crate::store::{held_ids, record_id, SideStore};
use grove_hooks::MutationResult;
use grove_model::{ModelRelation, Side};
use grove_storage::{Record, RequestContext, Where};
use serde_json::Value;
use tracing::debug;

pub struct ManyToMany {
    relation: ModelRelation,
    source: SideStore,
    target: SideStore,
}

impl ManyToMany {
    pub fn new(relation: ModelRelation, source: SideStore, target: SideStore) -> Self {
        Self {
            relation,
            source,
            target,
        }
    }

    pub fn relation(&self) -> &ModelRelation {
        &self.relation
    }

    pub(crate) fn at(&self, side: Side) -> &SideStore {
        match side {
            Side::Source => &self.source,
            Side::Target => &self.target,
        }
    }

    /// Reference array field on `side`'s records.
    pub fn array_field(&self, side: Side) -> &str {
        match side {
            Side::Source => &self.relation.foreign_key,
            Side::Target => self
                .relation
                .target_foreign_key
                .as_deref()
                .unwrap_or(&self.relation.foreign_key),
        }
    }

    pub async fn link(
        &self,
        side: Side,
        self_id: &str,
        other_id: &str,
        ctx: &RequestContext,
    ) -> MutationResult<()> {
        let other = side.opposite();
        debug!(relation = ?self.relation.name, self_id, other_id, "link many-to-many");
        self.at(side)
            .source()
            .add_reference(self_id, self.array_field(side), other_id, ctx)
            .await?;
        self.at(other)
            .source()
            .add_reference(other_id, self.array_field(other), self_id, ctx)
            .await?;
        Ok(())
    }

    pub async fn unlink(
        &self,
        side: Side,
        self_id: &str,
        other_id: &str,
        ctx: &RequestContext,
    ) -> MutationResult<()> {
        let other = side.opposite();
        debug!(relation = ?self.relation.name, self_id, other_id, "unlink many-to-many");
        self.at(side)
            .source()
            .remove_reference(self_id, self.array_field(side), other_id, ctx)
            .await?;
        self.at(other)
            .source()
            .remove_reference(other_id, self.array_field(other), self_id, ctx)
            .await?;
        Ok(())
    }

    /// Creates the other record, then links both arrays.
    pub async fn create_and_link(
        &self,
        side: Side,
        self_id: &str,
        payload: &Record,
        ctx: &RequestContext,
    ) -> MutationResult<Record> {
        let store = self.at(side.opposite());
        let created = store.create(&store.create_mutation(payload)?, ctx).await?;
        self.link(side, self_id, record_id(&created)?, ctx).await?;
        store
            .find_by_id(record_id(&created)?, ctx)
            .await
            .map(|found| found.unwrap_or(created))
    }

    /// Deletes the other record, then drops its id from this side's array.
    ///
    /// Arrays on third records still referencing the deleted id are not
    /// cleaned up.
    pub async fn delete_and_unlink(
        &self,
        side: Side,
        self_id: &str,
        other_id: &str,
        ctx: &RequestContext,
    ) -> MutationResult<()> {
        self.at(side.opposite())
            .delete(&Where::by_id(other_id), ctx)
            .await?;
        self.at(side)
            .source()
            .remove_reference(self_id, self.array_field(side), other_id, ctx)
            .await?;
        Ok(())
    }

    pub fn linked_ids(&self, side: Side, parent: &Record) -> Vec<String> {
        held_ids(parent.get(self.array_field(side)))
    }

    pub async fn join(
        &self,
        side: Side,
        parent: &Record,
        ctx: &RequestContext,
    ) -> MutationResult<Value> {
        let ids = self.linked_ids(side, parent);
        if ids.is_empty() {
            return Ok(Value::Array(Vec::new()));
        }
        let filter = Where::by_ids(ids.iter().map(String::as_str));
        let records = self
            .at(side.opposite())
            .source()
            .find(&filter, None, ctx)
            .await?;
        Ok(Value::Array(records.into_iter().map(Value::Object).collect()))
    }
}
