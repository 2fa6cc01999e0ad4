//! A tree of procedures keyed by name.

mod error;

use std::{borrow::Cow, fmt};

use crate::{matcher::Pattern, standardize_path, Error, HttpMethod, Procedure};

pub use error::{BuildError, BuildErrorCause};
pub(crate) use error::is_valid_name;

/// A node in a [`Router`].
#[derive(Debug, Clone)]
pub enum RouterNode {
    Procedure(Procedure),
    Router(Router),
}

/// A procedure together with the HTTP route it's served on.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub method: HttpMethod,
    pub path: String,
    /// The keys leading to this procedure from the root router.
    pub keys: Vec<Cow<'static, str>>,
    pub procedure: Procedure,
}

/// A tree of procedures.
///
/// Invalid or duplicate keys don't panic. They are collected and reported when the router is
/// turned into a [`RouterHandler`](crate::RouterHandler).
///
/// ```rust
/// use rspc_contract::{Procedure, Router};
///
/// let ping = Procedure::builder().handler(|_, _, _| async { Ok("pong") });
///
/// let router = Router::new()
///     .procedure("ping", ping.clone())
///     .nest("nested", Router::new().procedure("ping", ping));
///
/// assert!(router.get(&["nested", "ping"]).is_ok());
/// assert!(router.get(&["nested"]).is_err());
/// ```
#[derive(Clone, Default)]
pub struct Router {
    nodes: Vec<(Cow<'static, str>, RouterNode)>,
    errors: Vec<BuildError>,
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.nodes.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    #[track_caller]
    pub fn procedure(self, key: impl Into<Cow<'static, str>>, procedure: Procedure) -> Self {
        let key = key.into();
        let path_error = procedure
            .contract
            .http_path()
            .and_then(|path| Pattern::parse(path).err());

        let mut this = self.insert(key.clone(), RouterNode::Procedure(procedure));
        if let Some(err) = path_error {
            this.errors.push(BuildError::new(err.into(), key));
        }
        this
    }

    /// Mount `router` under `key`.
    #[track_caller]
    pub fn nest(self, key: impl Into<Cow<'static, str>>, mut router: Router) -> Self {
        let key = key.into();
        let errors = std::mem::take(&mut router.errors);

        let mut this = self.insert(key.clone(), RouterNode::Router(router));
        this.errors
            .extend(errors.into_iter().map(|err| err.nested(&key)));
        this
    }

    #[track_caller]
    fn insert(mut self, key: Cow<'static, str>, node: RouterNode) -> Self {
        if let Some(cause) = is_valid_name(&key) {
            self.errors.push(BuildError::new(cause, key.clone()));
        }

        if self.nodes.iter().any(|(k, _)| *k == key) {
            self.errors.push(BuildError::new(
                BuildErrorCause::DuplicateName(key.to_string()),
                key,
            ));
            return self;
        }

        self.nodes.push((key, node));
        self
    }

    /// A copy of this router where every procedure (at any depth) has `prefix` prepended to its
    /// path.
    pub fn prefix(&self, prefix: &str) -> Self {
        Self {
            nodes: self
                .nodes
                .iter()
                .map(|(key, node)| {
                    let node = match node {
                        RouterNode::Procedure(p) => RouterNode::Procedure(p.prefix(prefix)),
                        RouterNode::Router(r) => RouterNode::Router(r.prefix(prefix)),
                    };
                    (key.clone(), node)
                })
                .collect(),
            errors: self.errors.clone(),
        }
    }

    pub fn errors(&self) -> &[BuildError] {
        &self.errors
    }

    pub(crate) fn take_errors(&mut self) -> Vec<BuildError> {
        std::mem::take(&mut self.errors)
    }

    /// Look up a procedure by its keys.
    ///
    /// Fails with `NOT_FOUND` if a key is missing or the keys lead to a router instead of a
    /// procedure.
    pub fn get<S: AsRef<str>>(&self, keys: &[S]) -> Result<&Procedure, Error> {
        let mut router = self;
        let mut keys = keys.iter().map(AsRef::as_ref).peekable();

        while let Some(key) = keys.next() {
            let node = router
                .nodes
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, node)| node);

            match (node, keys.peek()) {
                (Some(RouterNode::Procedure(procedure)), None) => return Ok(procedure),
                (Some(RouterNode::Router(inner)), Some(_)) => router = inner,
                _ => break,
            }
        }

        Err(Error::not_found("Not found"))
    }

    /// Every procedure in the tree, depth first in the order they were declared.
    pub fn procedures(&self) -> Vec<(Vec<Cow<'static, str>>, &Procedure)> {
        let mut out = Vec::new();
        self.walk(&mut Vec::new(), &mut |keys, procedure| {
            out.push((keys.to_vec(), procedure))
        });
        out
    }

    /// Resolve the HTTP route of every procedure.
    ///
    /// Procedures without a method are served on `POST`. Procedures without a path are served on
    /// their keys joined by `/`, so `nested.ping` becomes `/nested/ping`.
    pub fn flatten(&self) -> Vec<RouteEntry> {
        self.procedures()
            .into_iter()
            .map(|(keys, procedure)| {
                let contract = procedure.contract();
                let path = match contract.http_path() {
                    Some(path) => standardize_path(path),
                    None => standardize_path(&keys.join("/")),
                };

                RouteEntry {
                    method: contract.http_method().unwrap_or(HttpMethod::Post),
                    path,
                    keys,
                    procedure: procedure.clone(),
                }
            })
            .collect()
    }

    fn walk<'a>(
        &'a self,
        keys: &mut Vec<Cow<'static, str>>,
        f: &mut impl FnMut(&[Cow<'static, str>], &'a Procedure),
    ) {
        for (key, node) in &self.nodes {
            keys.push(key.clone());
            match node {
                RouterNode::Procedure(procedure) => f(keys, procedure),
                RouterNode::Router(router) => router.walk(keys, f),
            }
            keys.pop();
        }
    }
}
