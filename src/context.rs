use std::{any::Any, borrow::Cow, fmt, sync::Arc};

use indexmap::IndexMap;

type Entry = Arc<dyn Any + Send + Sync + 'static>;

/// The per-request context passed to middleware and handlers.
///
/// A context is a map of named values of any type. It is created fresh for each request by the
/// caller and grown by middleware with [`Context::merge`], where later keys replace earlier ones.
/// Cloning is cheap as every value is reference counted.
#[derive(Clone, Default)]
pub struct Context(IndexMap<Cow<'static, str>, Entry>);

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Context").field(&self.0.keys()).finish()
    }
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: Send + Sync + 'static>(&mut self, key: impl Into<Cow<'static, str>>, t: T) {
        self.0.insert(key.into(), Arc::new(t));
    }

    /// Builder form of [`Context::insert`].
    pub fn with<T: Send + Sync + 'static>(
        mut self,
        key: impl Into<Cow<'static, str>>,
        t: T,
    ) -> Self {
        self.insert(key, t);
        self
    }

    /// Get the value at `key`. Returns `None` if it's missing or not a `T`.
    pub fn get<T: Send + Sync + 'static>(&self, key: &str) -> Option<&T> {
        self.0.get(key).and_then(|v| v.downcast_ref::<T>())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_ref())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Shallow merge `other` into a copy of this context. Keys in `other` win.
    pub fn merge(&self, other: &Context) -> Self {
        let mut merged = self.0.clone();
        for (key, value) in &other.0 {
            merged.insert(key.clone(), value.clone());
        }
        Self(merged)
    }
}
