//! rspc-contract: Contract-first procedures which can be called directly or served over HTTP.
//!
//! A [`Procedure`] pairs a [`Contract`] (input and output schemas, HTTP method and path) with
//! middleware and a handler. Procedures are grouped into a [`Router`] which a [`RouterHandler`]
//! dispatches to, either by router keys for internal calls or by HTTP route.
//!
#![warn(
    clippy::all,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::panic,
    clippy::todo,
    clippy::panic_in_result_fn,
    // missing_docs
)]
#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod config;
mod context;
mod contract;
mod error;
mod handler;
mod middleware;
mod procedure;
mod router;
mod value;

pub mod coerce;
pub mod fetch;
pub mod matcher;
pub mod schema;

pub use config::Config;
pub use context::Context;
pub use contract::{standardize_path, Contract, HttpMethod, UnsupportedMethod};
pub use error::{Cause, Error, ErrorCode};
pub use handler::{create_router_handler, merge_input, CallOptions, RouterHandler};
pub use middleware::{Middleware, MiddlewareResult};
pub use procedure::{Meta, Procedure, ProcedureBuilder};
pub use router::{BuildError, BuildErrorCause, RouteEntry, Router, RouterNode};
pub use schema::{Issue, PathSegment, Schema, SchemaKind, ValidationError, Validator};
pub use value::{Object, Value};
