use std::{borrow::Cow, fmt, future::Future, sync::Arc};

use futures::FutureExt;
use serde::{de::DeserializeOwned, Serialize};

use crate::{Context, Contract, Error, ErrorCode, HttpMethod, Middleware, Schema, Value};

use super::{Meta, Procedure};

/// Build a [`Procedure`] by declaring its contract and middleware, then its handler.
///
/// ```rust
/// use rspc_contract::{HttpMethod, Procedure, Schema, Value};
///
/// let find = Procedure::builder()
///     .route(HttpMethod::Get, "/planets/{id}")
///     .input(Schema::object([("id", Schema::number())]))
///     .handler(|input: Value, _ctx, _meta| async move { Ok(input) });
/// ```
#[derive(Default)]
pub struct ProcedureBuilder {
    contract: Contract,
    middlewares: Vec<Middleware>,
}

impl fmt::Debug for ProcedureBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcedureBuilder")
            .field("contract", &self.contract)
            .finish()
    }
}

impl ProcedureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing contract.
    pub fn from_contract(contract: Contract) -> Self {
        Self {
            contract,
            middlewares: Vec::new(),
        }
    }

    pub fn input(mut self, schema: Schema) -> Self {
        self.contract = self.contract.input(schema);
        self
    }

    pub fn output(mut self, schema: Schema) -> Self {
        self.contract = self.contract.output(schema);
        self
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.contract = self.contract.method(method);
        self
    }

    pub fn path(mut self, path: impl Into<Cow<'static, str>>) -> Self {
        self.contract = self.contract.path(path);
        self
    }

    pub fn route(mut self, method: HttpMethod, path: impl Into<Cow<'static, str>>) -> Self {
        self.contract = self.contract.route(method, path);
        self
    }

    /// Add a middleware. Middleware run in the order they are added.
    pub fn use_middleware(mut self, middleware: Middleware) -> Self {
        self.middlewares.push(middleware);
        self
    }

    pub fn handler<F, Fut, R>(self, handler: F) -> Procedure
    where
        F: Fn(Value, Context, Meta) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, Error>> + Send + 'static,
        R: Into<Value>,
    {
        Procedure {
            contract: self.contract,
            middlewares: self.middlewares.into(),
            handler: Arc::new(move |input, ctx, meta| {
                handler(input, ctx, meta).map(|r| r.map(Into::into)).boxed()
            }),
        }
    }

    /// Like [`ProcedureBuilder::handler`] but the validated input is deserialized into `I` and the
    /// result serialized from `O`.
    pub fn typed_handler<F, Fut, I, O>(self, handler: F) -> Procedure
    where
        F: Fn(I, Context, Meta) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, Error>> + Send + 'static,
        I: DeserializeOwned + Send + 'static,
        O: Serialize + Send + 'static,
    {
        let handler = Arc::new(handler);
        self.handler(move |input: Value, ctx, meta| {
            let handler = handler.clone();
            async move {
                let input = input.deserialize_into::<I>().map_err(|err| {
                    Error::with_cause(
                        ErrorCode::BadRequest,
                        "error deserializing procedure arguments",
                        err,
                    )
                })?;

                let output = (*handler)(input, ctx, meta).await?;
                Value::from_serialize(&output).map_err(|err| {
                    Error::with_cause(
                        ErrorCode::InternalServerError,
                        "error serializing procedure result",
                        err,
                    )
                })
            }
        })
    }
}
