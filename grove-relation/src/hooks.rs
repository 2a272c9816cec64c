//! Hook contributions that apply nested relation payloads.
//!
//! For every exposed relation field the wrapper takes the field out of the
//! incoming data, lets the inner chain write the parent record, then applies
//! the nested operations against the stored parent. The parent write and the
//! nested writes are not atomic.

use crate::engine::RelationEngine;
use crate::payload::{parse_to_many, parse_to_one, ToMany, ToOne};
use crate::store::record_id;
use futures::future::{join_all, try_join_all};
use grove_filter::compile_unique_where;
use grove_hooks::{
    resolver, CreateContext, Hook, MutationError, MutationResult, Next, UpdateContext,
};
use grove_model::Side;
use grove_storage::{Record, RequestContext};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

enum Nested {
    One(ToOne),
    Many(ToMany),
}

/// The relation hook of one side's field.
struct FieldHook {
    engine: Arc<RelationEngine>,
    side: Side,
    model: String,
    field: String,
}

impl FieldHook {
    fn parse(&self, data: &mut Record) -> MutationResult<Option<Nested>> {
        let Some(value) = data.remove(&self.field) else {
            return Ok(None);
        };
        if self.engine.is_list(self.side) {
            let payload = parse_to_many(&self.field, &value)?;
            Ok((!payload.is_empty()).then_some(Nested::Many(payload)))
        } else {
            Ok(parse_to_one(&self.field, &value)?.map(Nested::One))
        }
    }

    fn invalid(&self, op: &str) -> MutationError {
        MutationError::InvalidPayload(format!(
            "'{op}' on {}.{} is not allowed when creating",
            self.model, self.field
        ))
    }

    /// Id of the opposite-side record a unique where addresses.
    async fn resolve(&self, unique: &Record, ctx: &RequestContext) -> MutationResult<String> {
        let filter = compile_unique_where(unique)?;
        let other = self.engine.store(self.side.opposite());
        match other.source().find_one(&filter, ctx).await? {
            Some(record) => Ok(record_id(&record)?.to_owned()),
            None => Err(MutationError::not_found(other.model(), &filter)),
        }
    }

    async fn resolve_all(
        &self,
        uniques: &[Record],
        ctx: &RequestContext,
    ) -> MutationResult<Vec<String>> {
        try_join_all(uniques.iter().map(|u| self.resolve(u, ctx))).await
    }

    /// Runs one group of nested operations concurrently. Every operation runs
    /// to completion; failures are reported together afterwards.
    async fn batch<Fut, T>(&self, op: &str, operations: Vec<Fut>) -> MutationResult<()>
    where
        Fut: Future<Output = MutationResult<T>>,
    {
        if operations.is_empty() {
            return Ok(());
        }
        debug!(model = %self.model, field = %self.field, op, count = operations.len(), "nested batch");
        match MutationError::from_batch(join_all(operations).await) {
            Some(err) => {
                warn!(model = %self.model, field = %self.field, op, error = %err, "nested batch partially applied");
                Err(err)
            }
            None => Ok(()),
        }
    }

    async fn reread(&self, self_id: &str, ctx: &RequestContext) -> MutationResult<Option<Record>> {
        self.engine.store(self.side).find_by_id(self_id, ctx).await
    }

    /// Drops every current link of a to-one field before it is repointed.
    async fn release(&self, parent: &Record, ctx: &RequestContext) -> MutationResult<()> {
        let self_id = record_id(parent)?;
        for other_id in self.engine.linked_ids(self.side, parent, ctx).await? {
            self.engine.unlink(self.side, self_id, &other_id, ctx).await?;
        }
        Ok(())
    }

    async fn wrap_create(
        &self,
        ctx: &mut CreateContext,
        next: Next<'_, CreateContext>,
    ) -> MutationResult<()> {
        let Some(nested) = self.parse(&mut ctx.data)? else {
            return next.run(ctx).await;
        };

        let mut connect = Vec::new();
        match &nested {
            Nested::One(ToOne::Disconnect) => return Err(self.invalid("disconnect")),
            Nested::One(ToOne::Delete) => return Err(self.invalid("delete")),
            Nested::One(ToOne::Connect(unique)) => {
                let other_id = self.resolve(unique, &ctx.request).await?;
                if self.engine.holds_key(self.side) {
                    // the parent write carries the key itself
                    let key = self.engine.relation().foreign_key.clone();
                    ctx.data.insert(key, other_id.into());
                } else {
                    connect.push(other_id);
                }
            }
            Nested::One(ToOne::Create(_)) => {}
            Nested::Many(many) => {
                if !many.disconnect.is_empty() {
                    return Err(self.invalid("disconnect"));
                }
                if !many.delete.is_empty() {
                    return Err(self.invalid("delete"));
                }
                connect = self.resolve_all(&many.connect, &ctx.request).await?;
            }
        }

        next.run(ctx).await?;
        let Some(response) = ctx.response.as_ref() else {
            return Ok(());
        };
        let self_id = record_id(response)?.to_owned();
        let request = &ctx.request;

        let creates: &[Record] = match &nested {
            Nested::One(ToOne::Create(payload)) => std::slice::from_ref(payload),
            Nested::Many(many) => &many.create,
            _ => &[],
        };
        self.batch(
            "connect",
            connect
                .iter()
                .map(|other_id| self.engine.link(self.side, &self_id, other_id, request))
                .collect(),
        )
        .await?;
        self.batch(
            "create",
            creates
                .iter()
                .map(|payload| self.engine.create_and_link(self.side, &self_id, payload, request))
                .collect(),
        )
        .await?;

        if let Some(fresh) = self.reread(&self_id, request).await? {
            ctx.response = Some(fresh);
        }
        Ok(())
    }

    async fn wrap_update(
        &self,
        ctx: &mut UpdateContext,
        next: Next<'_, UpdateContext>,
    ) -> MutationResult<()> {
        let Some(nested) = self.parse(&mut ctx.data)? else {
            return next.run(ctx).await;
        };

        // resolve every unique where before the parent write
        let (connect, disconnect, delete) = match &nested {
            Nested::One(ToOne::Connect(unique)) => {
                (vec![self.resolve(unique, &ctx.request).await?], Vec::new(), Vec::new())
            }
            Nested::One(_) => (Vec::new(), Vec::new(), Vec::new()),
            Nested::Many(many) => {
                let request = &ctx.request;
                (
                    self.resolve_all(&many.connect, request).await?,
                    self.resolve_all(&many.disconnect, request).await?,
                    self.resolve_all(&many.delete, request).await?,
                )
            }
        };

        next.run(ctx).await?;
        let Some(response) = ctx.response.clone() else {
            return Ok(());
        };
        let self_id = record_id(&response)?.to_owned();
        let request = &ctx.request;
        let side = self.side;
        let engine = &self.engine;

        match &nested {
            Nested::One(op) => {
                match op {
                    ToOne::Connect(_) => {
                        if !engine.holds_key(side) {
                            self.release(&response, request).await?;
                        }
                        for other_id in &connect {
                            engine.link(side, &self_id, other_id, request).await?;
                        }
                    }
                    ToOne::Create(payload) => {
                        if !engine.holds_key(side) {
                            self.release(&response, request).await?;
                        }
                        engine.create_and_link(side, &self_id, payload, request).await?;
                    }
                    ToOne::Disconnect => {
                        // an unlinked field has nothing to drop
                        for other_id in engine.linked_ids(side, &response, request).await? {
                            engine.unlink(side, &self_id, &other_id, request).await?;
                        }
                    }
                    ToOne::Delete => {
                        for other_id in engine.linked_ids(side, &response, request).await? {
                            engine.delete_and_unlink(side, &self_id, &other_id, request).await?;
                        }
                    }
                }
            }
            Nested::Many(many) => {
                self.batch(
                    "connect",
                    connect
                        .iter()
                        .map(|other_id| engine.link(side, &self_id, other_id, request))
                        .collect(),
                )
                .await?;
                self.batch(
                    "create",
                    many.create
                        .iter()
                        .map(|payload| engine.create_and_link(side, &self_id, payload, request))
                        .collect(),
                )
                .await?;
                self.batch(
                    "disconnect",
                    disconnect
                        .iter()
                        .map(|other_id| engine.unlink(side, &self_id, other_id, request))
                        .collect(),
                )
                .await?;
                self.batch(
                    "delete",
                    delete
                        .iter()
                        .map(|other_id| engine.delete_and_unlink(side, &self_id, other_id, request))
                        .collect(),
                )
                .await?;
            }
        }

        if let Some(fresh) = self.reread(&self_id, request).await? {
            ctx.response = Some(fresh);
        }
        Ok(())
    }
}

/// Hook contributions for a relation: one map per exposed field, keyed by
/// the model that field belongs to.
///
/// A self-relation exposes both fields on the same model, so the sides are
/// returned as separate contributions for [`grove_hooks::merge_hooks`].
pub fn relation_hooks(engine: Arc<RelationEngine>) -> Vec<HashMap<String, Hook>> {
    [Side::Source, Side::Target]
        .into_iter()
        .filter_map(|side| {
            let relation = engine.relation();
            let field = relation.field(side)?.to_owned();
            let model = relation.model(side).to_owned();
            Some(side_hook(Arc::clone(&engine), side, model, field))
        })
        .collect()
}

fn side_hook(
    engine: Arc<RelationEngine>,
    side: Side,
    model: String,
    field: String,
) -> HashMap<String, Hook> {
    let join = {
        let engine = Arc::clone(&engine);
        resolver(move |parent, request| {
            let engine = Arc::clone(&engine);
            Box::pin(async move { engine.join(side, parent, request).await })
        })
    };
    let field_hook = Arc::new(FieldHook {
        engine,
        side,
        model: model.clone(),
        field: field.clone(),
    });
    let on_create = Arc::clone(&field_hook);
    let on_update = field_hook;

    let hook = Hook::new()
        .on_create(move |ctx, next| {
            let hook = Arc::clone(&on_create);
            Box::pin(async move { hook.wrap_create(ctx, next).await })
        })
        .on_update(move |ctx, next| {
            let hook = Arc::clone(&on_update);
            Box::pin(async move { hook.wrap_update(ctx, next).await })
        })
        .with_resolver(&field, join);

    HashMap::from([(model, hook)])
}
