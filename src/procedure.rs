//! Procedures: a [`Contract`] joined with the middleware and handler that implement it.

mod builder;
mod meta;

use std::{fmt, sync::Arc};

use futures::future::BoxFuture;

use crate::{Context, Contract, Error, Middleware, Value};

pub use builder::ProcedureBuilder;
pub use meta::Meta;

pub(crate) type HandlerFn =
    Arc<dyn Fn(Value, Context, Meta) -> BoxFuture<'static, Result<Value, Error>> + Send + Sync>;

/// A single callable operation.
///
/// Procedures are immutable and cheap to clone, so the same procedure can be mounted at more than
/// one place in a [`Router`](crate::Router).
#[derive(Clone)]
pub struct Procedure {
    pub(crate) contract: Contract,
    pub(crate) middlewares: Arc<[Middleware]>,
    pub(crate) handler: HandlerFn,
}

impl fmt::Debug for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Procedure")
            .field("contract", &self.contract)
            .field("middlewares", &self.middlewares.len())
            .finish()
    }
}

impl Procedure {
    pub fn builder() -> ProcedureBuilder {
        ProcedureBuilder::new()
    }

    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    pub fn middlewares(&self) -> &[Middleware] {
        &self.middlewares
    }

    /// A copy of this procedure with `prefix` prepended to its path. See [`Contract::prefix`].
    pub fn prefix(&self, prefix: &str) -> Self {
        Self {
            contract: self.contract.prefix(prefix),
            middlewares: self.middlewares.clone(),
            handler: self.handler.clone(),
        }
    }

    pub(crate) async fn invoke(
        &self,
        input: Value,
        ctx: Context,
        meta: Meta,
    ) -> Result<Value, Error> {
        (self.handler)(input, ctx, meta).await
    }
}
