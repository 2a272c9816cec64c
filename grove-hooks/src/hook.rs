//! Hook contributions and their one-time merge into per-model chains.

use crate::chain::{wrap, BoxFuture, Chain, Next, WrapFn};
use crate::context::{CreateContext, DeleteContext, UpdateContext};
use crate::error::MutationResult;
use grove_storage::{Record, RequestContext};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Resolves one field of a parent record when reading.
pub type FieldResolver = Arc<
    dyn for<'x> Fn(&'x Record, &'x RequestContext) -> BoxFuture<'x, MutationResult<Value>>
        + Send
        + Sync,
>;

/// Builds a resolver from a closure.
pub fn resolver<F>(f: F) -> FieldResolver
where
    F: for<'x> Fn(&'x Record, &'x RequestContext) -> BoxFuture<'x, MutationResult<Value>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

/// One extension's contribution for one model.
#[derive(Clone, Default)]
pub struct Hook {
    pub wrap_create: Option<WrapFn<CreateContext>>,
    pub wrap_update: Option<WrapFn<UpdateContext>>,
    pub wrap_delete: Option<WrapFn<DeleteContext>>,
    pub resolve_fields: HashMap<String, FieldResolver>,
}

impl Hook {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on_create<F>(mut self, f: F) -> Self
    where
        F: for<'x> Fn(
                &'x mut CreateContext,
                Next<'x, CreateContext>,
            ) -> BoxFuture<'x, MutationResult<()>>
            + Send
            + Sync
            + 'static,
    {
        self.wrap_create = Some(wrap(f));
        self
    }

    #[must_use]
    pub fn on_update<F>(mut self, f: F) -> Self
    where
        F: for<'x> Fn(
                &'x mut UpdateContext,
                Next<'x, UpdateContext>,
            ) -> BoxFuture<'x, MutationResult<()>>
            + Send
            + Sync
            + 'static,
    {
        self.wrap_update = Some(wrap(f));
        self
    }

    #[must_use]
    pub fn on_delete<F>(mut self, f: F) -> Self
    where
        F: for<'x> Fn(
                &'x mut DeleteContext,
                Next<'x, DeleteContext>,
            ) -> BoxFuture<'x, MutationResult<()>>
            + Send
            + Sync
            + 'static,
    {
        self.wrap_delete = Some(wrap(f));
        self
    }

    #[must_use]
    pub fn with_resolver(mut self, field: &str, resolver: FieldResolver) -> Self {
        self.resolve_fields.insert(field.into(), resolver);
        self
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("wrap_create", &self.wrap_create.is_some())
            .field("wrap_update", &self.wrap_update.is_some())
            .field("wrap_delete", &self.wrap_delete.is_some())
            .field("resolve_fields", &self.resolve_fields.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// The effective hook of one model after merging every contribution.
#[derive(Clone, Default)]
pub struct MergedHook {
    pub create: Chain<CreateContext>,
    pub update: Chain<UpdateContext>,
    pub delete: Chain<DeleteContext>,
    pub resolve_fields: HashMap<String, FieldResolver>,
}

impl MergedHook {
    pub fn resolver(&self, field: &str) -> Option<&FieldResolver> {
        self.resolve_fields.get(field)
    }
}

impl fmt::Debug for MergedHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MergedHook")
            .field("create", &self.create)
            .field("update", &self.update)
            .field("delete", &self.delete)
            .field("resolve_fields", &self.resolve_fields.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[derive(Default)]
struct Pending {
    create: Vec<WrapFn<CreateContext>>,
    update: Vec<WrapFn<UpdateContext>>,
    delete: Vec<WrapFn<DeleteContext>>,
    resolve_fields: HashMap<String, FieldResolver>,
}

/// Merges hook contributions into one [`MergedHook`] per model.
///
/// Wrappers keep contribution order, so the first contribution's wrapper is
/// outermost. Resolvers for the same field overwrite each other; the last
/// contribution wins.
pub fn merge_hooks(
    contributions: impl IntoIterator<Item = HashMap<String, Hook>>,
) -> HashMap<String, MergedHook> {
    let mut pending: HashMap<String, Pending> = HashMap::new();
    for contribution in contributions {
        for (model, hook) in contribution {
            let entry = pending.entry(model).or_default();
            entry.create.extend(hook.wrap_create);
            entry.update.extend(hook.wrap_update);
            entry.delete.extend(hook.wrap_delete);
            entry.resolve_fields.extend(hook.resolve_fields);
        }
    }

    pending
        .into_iter()
        .map(|(model, p)| {
            debug!(
                model = %model,
                create = p.create.len(),
                update = p.update.len(),
                delete = p.delete.len(),
                resolvers = p.resolve_fields.len(),
                "merged hooks"
            );
            let merged = MergedHook {
                create: Chain::new(p.create),
                update: Chain::new(p.update),
                delete: Chain::new(p.delete),
                resolve_fields: p.resolve_fields,
            };
            (model, merged)
        })
        .collect()
}
