//! Hook pipeline for grove.
//!
//! Extensions (and the relation engine) contribute a [`Hook`] per model:
//! optional create/update/delete wrappers plus field resolvers.
//! [`merge_hooks`] folds every contribution into one [`MergedHook`] per model
//! at schema-compile time; requests only run the composed chains.

mod chain;
mod context;
mod error;
mod hook;

pub use chain::{terminal, wrap, BoxFuture, Chain, Next, Terminal, WrapFn};
pub use context::{CreateContext, DeleteContext, UpdateContext};
pub use error::{MutationError, MutationResult};
pub use hook::{merge_hooks, resolver, FieldResolver, Hook, MergedHook};
