#![allow(dead_code)]

use rspc_contract::{
    create_router_handler, CallOptions, Context, Error, HttpMethod, Meta, Procedure, Router,
    RouterHandler, Value,
};

/// A procedure which returns the router keys it was called with.
pub fn keys_procedure() -> Procedure {
    Procedure::builder().handler(|_, _, meta: Meta| {
        let keys = meta.segments().map(String::from).collect::<Vec<_>>();
        async move { Ok(Value::array(keys)) }
    })
}

/// A procedure which returns its validated input.
pub fn echo() -> Procedure {
    Procedure::builder().handler(|input: Value, _, _| async move { Ok(input) })
}

pub fn build(router: Router) -> RouterHandler {
    create_router_handler(router).expect("router should build")
}

pub async fn call(handler: &RouterHandler, path: &str, input: Value) -> Result<Value, Error> {
    handler
        .handle(
            input,
            Context::new(),
            Meta::new(HttpMethod::Post, path.to_string()),
            CallOptions::internal(),
        )
        .await
}

pub async fn request(
    handler: &RouterHandler,
    method: HttpMethod,
    path: &str,
    input: Value,
) -> Result<Value, Error> {
    handler
        .handle(
            input,
            Context::new(),
            Meta::new(method, path.to_string()),
            CallOptions::default(),
        )
        .await
}
