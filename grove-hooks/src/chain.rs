//! Onion composition of wrapper layers.
//!
//! A [`Chain`] is built once from an ordered list of layers. The first layer
//! is outermost; each layer receives a [`Next`] that runs the remaining
//! layers and finally the terminal operation. A layer that never calls
//! [`Next::run`] short-circuits everything inside it.

use crate::error::MutationResult;
pub use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;

/// One middleware layer over a context type.
pub type WrapFn<C> =
    Arc<dyn for<'x> Fn(&'x mut C, Next<'x, C>) -> BoxFuture<'x, MutationResult<()>> + Send + Sync>;

/// The innermost operation a chain runs.
pub type Terminal<C> =
    dyn for<'x> Fn(&'x mut C) -> BoxFuture<'x, MutationResult<()>> + Send + Sync;

/// Builds a layer from a closure.
///
/// ```ignore
/// let layer = wrap(|ctx: &mut CreateContext, next| Box::pin(async move {
///     ctx.data.remove("draft");
///     next.run(ctx).await
/// }));
/// ```
pub fn wrap<C, F>(f: F) -> WrapFn<C>
where
    F: for<'x> Fn(&'x mut C, Next<'x, C>) -> BoxFuture<'x, MutationResult<()>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

/// Builds a terminal from a closure.
pub fn terminal<C, F>(f: F) -> Box<Terminal<C>>
where
    F: for<'x> Fn(&'x mut C) -> BoxFuture<'x, MutationResult<()>> + Send + Sync + 'static,
{
    Box::new(f)
}

/// The rest of a chain, as seen from one layer.
pub struct Next<'a, C> {
    layers: &'a [WrapFn<C>],
    terminal: &'a Terminal<C>,
}

impl<C: Send> Next<'_, C> {
    /// Runs the next inner layer, or the terminal when none remain.
    pub async fn run(self, ctx: &mut C) -> MutationResult<()> {
        match self.layers.split_first() {
            Some((layer, rest)) => {
                let next = Next {
                    layers: rest,
                    terminal: self.terminal,
                };
                layer(ctx, next).await
            }
            None => (self.terminal)(ctx).await,
        }
    }
}

/// An ordered, composed list of layers.
pub struct Chain<C> {
    layers: Arc<[WrapFn<C>]>,
}

impl<C: Send> Chain<C> {
    pub fn new(layers: Vec<WrapFn<C>>) -> Self {
        Self {
            layers: layers.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Runs every layer around `terminal`.
    pub async fn run(&self, ctx: &mut C, terminal: &Terminal<C>) -> MutationResult<()> {
        Next {
            layers: &self.layers,
            terminal,
        }
        .run(ctx)
        .await
    }
}

impl<C> Clone for Chain<C> {
    fn clone(&self) -> Self {
        Self {
            layers: Arc::clone(&self.layers),
        }
    }
}

impl<C> Default for Chain<C> {
    fn default() -> Self {
        Self {
            layers: Arc::from(Vec::new()),
        }
    }
}

impl<C> fmt::Debug for Chain<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("layers", &self.layers.len())
            .finish()
    }
}
