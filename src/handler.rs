//! The dispatch pipeline.
//!
//! Every call, internal or over HTTP, goes through the same steps:
//!  1. resolve the procedure (by router keys or by HTTP method and path)
//!  2. merge the path parameters into the input
//!  3. coerce (when asked to) and validate the input
//!  4. run the middleware in order, merging each returned context into the running one
//!  5. run the handler
//!  6. validate the output
//!
//! The first failure aborts the call.

use std::{any::Any, fmt, panic::AssertUnwindSafe, sync::Arc};

use futures::FutureExt;
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    coerce::{coerce, CoerceOptions},
    matcher::{CompiledMatcher, LinearMatcher, Matcher, Params},
    value::Object,
    BuildError, Config, Context, Error, ErrorCode, Meta, Procedure, Router, Schema, Value,
};

/// Options for a single call to [`RouterHandler::handle`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CallOptions {
    /// Resolve the procedure from the router keys in [`Meta::path`] instead of by HTTP route.
    pub internal: bool,
    /// Coerce the input into the shape of the input schema before validating it.
    pub coerce: Option<CoerceOptions>,
    /// Coerce the path parameters with bracket notation before they're merged into the input.
    /// Use this when the input itself is strictly typed (a JSON body) but the path is not.
    pub coerce_params: bool,
}

impl CallOptions {
    pub fn internal() -> Self {
        Self {
            internal: true,
            ..Default::default()
        }
    }
}

/// Dispatches calls to the procedures of a [`Router`].
///
/// A handler is immutable once built and can be shared between any number of concurrent requests.
#[derive(Clone)]
pub struct RouterHandler {
    router: Arc<Router>,
    matcher: Arc<dyn Matcher<Procedure>>,
}

impl fmt::Debug for RouterHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterHandler")
            .field("router", &self.router)
            .finish()
    }
}

/// Build a [`RouterHandler`] with the default [`Config`].
#[track_caller]
pub fn create_router_handler(router: Router) -> Result<RouterHandler, Vec<BuildError>> {
    RouterHandler::new(router, Config::new())
}

impl RouterHandler {
    /// Build the route index for `router`.
    ///
    /// Returns every problem found with the router, including those collected while it was being
    /// declared.
    #[track_caller]
    pub fn new(mut router: Router, config: Config) -> Result<Self, Vec<BuildError>> {
        let mut errors = router.take_errors();
        if !errors.is_empty() {
            #[cfg(feature = "tracing")]
            tracing::error!("failed to build router with {} errors", errors.len());

            return Err(errors);
        }

        let mut matcher: Box<dyn Matcher<Procedure>> = match config.serverless {
            true => Box::new(LinearMatcher::default()),
            false => Box::new(CompiledMatcher::default()),
        };

        for route in router.flatten() {
            let name = route.keys.join(".");

            #[cfg(feature = "tracing")]
            tracing::debug!("registering route {} {} for '{}'", route.method, route.path, name);

            if let Err(err) = matcher.add(route.method, &route.path, route.procedure) {
                errors.push(BuildError::new(err.into(), name.into()));
            }
        }

        if !errors.is_empty() {
            #[cfg(feature = "tracing")]
            tracing::error!("failed to build router with {} errors", errors.len());

            return Err(errors);
        }

        Ok(Self {
            router: Arc::new(router),
            matcher: Arc::from(matcher),
        })
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Dispatch a single call.
    pub async fn handle(
        &self,
        input: Value,
        ctx: Context,
        meta: Meta,
        options: CallOptions,
    ) -> Result<Value, Error> {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            "dispatching {} {} (internal: {})",
            meta.method,
            meta.path,
            options.internal
        );

        let (procedure, params) = self.resolve(&meta, options.internal)?;
        let params = params_to_object(params);
        let params = match procedure.contract().input_schema() {
            Some(schema) if options.coerce_params && !params.is_empty() => {
                coerce_params(schema, params)
            }
            _ => params,
        };
        let input = merge_object(input, params);

        let result = AssertUnwindSafe(execute(procedure, input, ctx, meta, options.coerce))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(Error::panicked(panic_message(panic.as_ref()))));

        #[cfg(feature = "tracing")]
        if let Err(err) = &result {
            if err.code() == ErrorCode::InternalServerError {
                tracing::error!("procedure failed: {:?}", err.cause());
            }
        }

        result
    }

    /// Call the procedure at `keys` with typed input and output.
    ///
    /// ```rust
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// use rspc_contract::{create_router_handler, Context, Procedure, Router};
    ///
    /// let router = Router::new().procedure(
    ///     "double",
    ///     Procedure::builder().typed_handler(|n: i32, _, _| async move { Ok(n * 2) }),
    /// );
    /// let handler = create_router_handler(router).unwrap();
    ///
    /// let result: i32 = handler.call(&["double"], &21, Context::new()).await.unwrap();
    /// assert_eq!(result, 42);
    /// # }
    /// ```
    pub async fn call<I, O, S>(&self, keys: &[S], input: &I, ctx: Context) -> Result<O, Error>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
        S: AsRef<str>,
    {
        let input = Value::from_serialize(input).map_err(|err| {
            Error::with_cause(
                ErrorCode::InternalServerError,
                "error serializing procedure arguments",
                err,
            )
        })?;

        self.handle(input, ctx, Meta::internal(keys), CallOptions::internal())
            .await?
            .deserialize_into()
            .map_err(|err| {
                Error::with_cause(
                    ErrorCode::InternalServerError,
                    "error deserializing procedure result",
                    err,
                )
            })
    }

    fn resolve(&self, meta: &Meta, internal: bool) -> Result<(&Procedure, Params), Error> {
        if internal {
            let keys = meta.segments().collect::<Vec<_>>();
            return self.router.get(keys.as_slice()).map(|p| (p, Params::new()));
        }

        self.matcher
            .find(meta.method, &meta.path)
            .ok_or_else(|| Error::not_found("Not found"))
    }
}

/// Combine the raw input with the parameters captured from the path.
///
/// Object inputs win over path parameters on conflicting keys. Undefined input becomes the path
/// parameters (if there are any) and any other input is left as is.
pub fn merge_input(input: Value, params: Params) -> Value {
    merge_object(input, params_to_object(params))
}

fn params_to_object(params: Params) -> Object {
    params
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect()
}

fn merge_object(input: Value, params: Object) -> Value {
    match input {
        Value::Undefined if !params.is_empty() => Value::Object(params),
        Value::Object(input) => {
            let mut merged = params;
            merged.extend(input);
            Value::Object(merged)
        }
        input => input,
    }
}

/// Coerce the path parameters against the input schema, keeping only the parameter keys.
fn coerce_params(schema: &Schema, params: Object) -> Object {
    match coerce(schema, Value::Object(params.clone()), CoerceOptions::bracket_notation()) {
        Value::Object(mut coerced) => {
            coerced.retain(|k, _| params.contains_key(k));
            coerced
        }
        _ => params,
    }
}

async fn execute(
    procedure: &Procedure,
    input: Value,
    mut ctx: Context,
    meta: Meta,
    coerce_options: Option<CoerceOptions>,
) -> Result<Value, Error> {
    let contract = procedure.contract();

    let input = match contract.input_schema() {
        Some(schema) => {
            let input = match coerce_options {
                Some(options) => coerce(schema, input, options),
                None => input,
            };
            schema.safe_parse(&input).map_err(Error::input_validation)?
        }
        None => input,
    };

    for middleware in procedure.middlewares() {
        let result = middleware.exec(&input, ctx.clone(), meta.clone()).await?;
        if let Some(extra) = result.context {
            ctx = ctx.merge(&extra);
        }
    }

    let output = procedure.invoke(input, ctx, meta).await?;

    match contract.output_schema() {
        Some(schema) => schema.safe_parse(&output).map_err(Error::output_validation),
        None => Ok(output),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".into()
    }
}
