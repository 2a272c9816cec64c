//! Single foreign-key layout shared by one-to-one and one-to-many.
//!
//! Records of the holder side store the other side's id under one key.
//! Every link or unlink is a single write on a holder record.

use crate::store::{held_ids, record_id, SideStore};
use grove_hooks::MutationResult;
use grove_model::{ModelRelation, Side};
use grove_storage::{Record, RequestContext, Where};
use serde_json::Value;
use tracing::debug;

pub(crate) struct ForeignKey {
    pub(crate) relation: ModelRelation,
    source: SideStore,
    target: SideStore,
}

impl ForeignKey {
    pub(crate) fn new(relation: ModelRelation, source: SideStore, target: SideStore) -> Self {
        Self {
            relation,
            source,
            target,
        }
    }

    pub(crate) fn at(&self, side: Side) -> &SideStore {
        match side {
            Side::Source => &self.source,
            Side::Target => &self.target,
        }
    }

    pub(crate) fn holder(&self) -> Side {
        self.relation.key_holder
    }

    fn key(&self) -> &str {
        &self.relation.foreign_key
    }

    /// (holder record id, id it references) for a pair seen from `side`.
    fn orient<'a>(&self, side: Side, self_id: &'a str, other_id: &'a str) -> (&'a str, &'a str) {
        if side == self.holder() {
            (self_id, other_id)
        } else {
            (other_id, self_id)
        }
    }

    pub(crate) async fn link(
        &self,
        side: Side,
        self_id: &str,
        other_id: &str,
        ctx: &RequestContext,
    ) -> MutationResult<()> {
        let (holder_id, referenced) = self.orient(side, self_id, other_id);
        debug!(relation = ?self.relation.name, key = self.key(), holder_id, referenced, "link");
        self.at(self.holder())
            .set_key(&Where::by_id(holder_id), self.key(), referenced.into(), ctx)
            .await
    }

    /// Clears the key only where it still references the pair; an unlinked
    /// pair is left untouched.
    pub(crate) async fn unlink(
        &self,
        side: Side,
        self_id: &str,
        other_id: &str,
        ctx: &RequestContext,
    ) -> MutationResult<()> {
        let (holder_id, referenced) = self.orient(side, self_id, other_id);
        debug!(relation = ?self.relation.name, key = self.key(), holder_id, referenced, "unlink");
        let filter = Where::by_id(holder_id).eq(self.key(), referenced.into());
        self.at(self.holder())
            .set_key_if_present(&filter, self.key(), Value::Null, ctx)
            .await
    }

    pub(crate) async fn create_and_link(
        &self,
        side: Side,
        self_id: &str,
        payload: &Record,
        ctx: &RequestContext,
    ) -> MutationResult<Record> {
        let other = self.at(side.opposite());
        if side == self.holder() {
            let created = other.create(&other.create_mutation(payload)?, ctx).await?;
            self.link(side, self_id, record_id(&created)?, ctx).await?;
            Ok(created)
        } else {
            // the new record holds the key, so one write links it
            let mutation = other
                .create_mutation(payload)?
                .set(self.key(), self_id.into());
            other.create(&mutation, ctx).await
        }
    }

    pub(crate) async fn delete_and_unlink(
        &self,
        side: Side,
        self_id: &str,
        other_id: &str,
        ctx: &RequestContext,
    ) -> MutationResult<()> {
        let other = self.at(side.opposite());
        if side == self.holder() {
            other.delete(&Where::by_id(other_id), ctx).await?;
            self.at(side)
                .set_key(&Where::by_id(self_id), self.key(), Value::Null, ctx)
                .await
        } else {
            let filter = Where::by_id(other_id).eq(self.key(), self_id.into());
            other.delete(&filter, ctx).await
        }
    }

    /// Ids of the records `parent` (a `side` record) is linked to.
    pub(crate) async fn linked_ids(
        &self,
        side: Side,
        parent: &Record,
        ctx: &RequestContext,
    ) -> MutationResult<Vec<String>> {
        if side == self.holder() {
            return Ok(held_ids(parent.get(self.key())));
        }
        let filter = Where::new().eq(self.key(), record_id(parent)?.into());
        self.at(self.holder()).find_ids(&filter, ctx).await
    }

    pub(crate) async fn join_one(
        &self,
        side: Side,
        parent: &Record,
        ctx: &RequestContext,
    ) -> MutationResult<Value> {
        let ids = self.linked_ids(side, parent, ctx).await?;
        let Some(id) = ids.first() else {
            return Ok(Value::Null);
        };
        let found = self.at(side.opposite()).find_by_id(id, ctx).await?;
        Ok(found.map(Value::Object).unwrap_or(Value::Null))
    }

    /// Holder records referencing `parent`; `side` must be the non-holder.
    pub(crate) async fn join_many(
        &self,
        side: Side,
        parent: &Record,
        ctx: &RequestContext,
    ) -> MutationResult<Value> {
        let filter = Where::new().eq(self.key(), record_id(parent)?.into());
        let records = self
            .at(side.opposite())
            .source()
            .find(&filter, None, ctx)
            .await?;
        Ok(Value::Array(records.into_iter().map(Value::Object).collect()))
    }
}
