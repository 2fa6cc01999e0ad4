use std::{fmt, future::Future, sync::Arc};

use futures::{future::BoxFuture, FutureExt};

use crate::{Context, Error, Meta, Value};

/// What a middleware hands back to the pipeline.
///
/// If `context` is set it's shallow merged into the running context before the next middleware
/// (or the handler) runs.
#[derive(Debug, Clone, Default)]
pub struct MiddlewareResult {
    pub context: Option<Context>,
}

impl From<()> for MiddlewareResult {
    fn from(_: ()) -> Self {
        Self::default()
    }
}

impl From<Context> for MiddlewareResult {
    fn from(context: Context) -> Self {
        Self {
            context: Some(context),
        }
    }
}

impl From<Option<Context>> for MiddlewareResult {
    fn from(context: Option<Context>) -> Self {
        Self { context }
    }
}

type MiddlewareFn = Arc<
    dyn Fn(Value, Context, Meta) -> BoxFuture<'static, Result<MiddlewareResult, Error>>
        + Send
        + Sync,
>;

type InputMapper = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// A function which runs before a procedure's handler and can add to its context.
///
/// Middleware can't replace the input or end the request early, other than by returning an
/// [`Error`] which aborts the whole dispatch.
///
/// ```rust
/// use rspc_contract::{Context, Middleware};
///
/// let auth = Middleware::new(|_input, ctx: Context, _meta| async move {
///     let user = ctx.get::<String>("token").map(|t| format!("user-for-{t}"));
///     Ok(Context::new().with("user", user))
/// });
/// ```
#[derive(Clone)]
pub struct Middleware {
    func: MiddlewareFn,
    map_input: Option<InputMapper>,
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Middleware")
            .field("map_input", &self.map_input.is_some())
            .finish()
    }
}

impl Middleware {
    pub fn new<F, Fut, R>(func: F) -> Self
    where
        F: Fn(Value, Context, Meta) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, Error>> + Send + 'static,
        R: Into<MiddlewareResult>,
    {
        Self {
            func: Arc::new(move |input, ctx, meta| {
                func(input, ctx, meta).map(|r| r.map(Into::into)).boxed()
            }),
            map_input: None,
        }
    }

    /// Change the input this middleware sees. The input given to later middleware and the
    /// handler is not affected.
    pub fn map_input(mut self, mapper: impl Fn(&Value) -> Value + Send + Sync + 'static) -> Self {
        self.map_input = Some(Arc::new(mapper));
        self
    }

    pub(crate) async fn exec(
        &self,
        input: &Value,
        ctx: Context,
        meta: Meta,
    ) -> Result<MiddlewareResult, Error> {
        let input = match &self.map_input {
            Some(mapper) => mapper(input),
            None => input.clone(),
        };

        (self.func)(input, ctx, meta).await
    }
}
