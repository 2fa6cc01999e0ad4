//! Structural schemas used to validate procedure input and output.
//!
//! A contract only needs something implementing [`Validator`]. [`Schema`] is the built-in
//! implementation and is also what the [coercion adapter](crate::coerce) walks, so its set of
//! shapes ([`SchemaKind`]) is closed. Any other validator can be plugged in with [`Schema::custom`].

mod issue;
mod validate;

use std::{borrow::Cow, fmt, sync::Arc};

use indexmap::IndexMap;

use crate::Value;

pub use issue::{Issue, PathSegment, ValidationError};

/// Anything which can check (and possibly transform) a [`Value`].
///
/// Implementations must report failures through the returned [`ValidationError`] and never panic.
pub trait Validator: Send + Sync + 'static {
    fn safe_parse(&self, value: &Value) -> Result<Value, ValidationError>;
}

impl<F> Validator for F
where
    F: Fn(&Value) -> Result<Value, ValidationError> + Send + Sync + 'static,
{
    fn safe_parse(&self, value: &Value) -> Result<Value, ValidationError> {
        (self)(value)
    }
}

pub type TransformFn = Arc<dyn Fn(Value) -> Result<Value, String> + Send + Sync>;
pub type LazyFn = Arc<dyn Fn() -> Schema + Send + Sync>;

/// The shape of a [`Schema`].
#[non_exhaustive]
pub enum SchemaKind {
    String,
    Number,
    NaN,
    Boolean,
    Null,
    Undefined,
    Void,
    Date,
    BigInt,
    Any,
    Unknown,
    Never,
    Literal(Value),
    Enum(Vec<String>),
    NativeEnum(Vec<Value>),
    Array(Schema),
    Tuple(Vec<Schema>),
    Set(Schema),
    Map(Schema, Schema),
    Object {
        shape: IndexMap<String, Schema>,
        catchall: Option<Schema>,
    },
    Record(Schema, Schema),
    Union(Vec<Schema>),
    DiscriminatedUnion {
        discriminator: String,
        options: Vec<Schema>,
    },
    Intersection(Schema, Schema),
    Optional(Schema),
    Nullable(Schema),
    Default(Schema, Value),
    Catch(Schema, Value),
    Branded(Schema, Cow<'static, str>),
    Readonly(Schema),
    Effects(Schema, TransformFn),
    Pipeline(Schema, Schema),
    Lazy(LazyFn),
    Custom(Arc<dyn Validator>),
}

impl fmt::Debug for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "String"),
            Self::Number => write!(f, "Number"),
            Self::NaN => write!(f, "NaN"),
            Self::Boolean => write!(f, "Boolean"),
            Self::Null => write!(f, "Null"),
            Self::Undefined => write!(f, "Undefined"),
            Self::Void => write!(f, "Void"),
            Self::Date => write!(f, "Date"),
            Self::BigInt => write!(f, "BigInt"),
            Self::Any => write!(f, "Any"),
            Self::Unknown => write!(f, "Unknown"),
            Self::Never => write!(f, "Never"),
            Self::Literal(v) => f.debug_tuple("Literal").field(v).finish(),
            Self::Enum(v) => f.debug_tuple("Enum").field(v).finish(),
            Self::NativeEnum(v) => f.debug_tuple("NativeEnum").field(v).finish(),
            Self::Array(s) => f.debug_tuple("Array").field(s).finish(),
            Self::Tuple(s) => f.debug_tuple("Tuple").field(s).finish(),
            Self::Set(s) => f.debug_tuple("Set").field(s).finish(),
            Self::Map(k, v) => f.debug_tuple("Map").field(k).field(v).finish(),
            Self::Object { shape, catchall } => f
                .debug_struct("Object")
                .field("shape", shape)
                .field("catchall", catchall)
                .finish(),
            Self::Record(k, v) => f.debug_tuple("Record").field(k).field(v).finish(),
            Self::Union(o) => f.debug_tuple("Union").field(o).finish(),
            Self::DiscriminatedUnion {
                discriminator,
                options,
            } => f
                .debug_struct("DiscriminatedUnion")
                .field("discriminator", discriminator)
                .field("options", options)
                .finish(),
            Self::Intersection(l, r) => f.debug_tuple("Intersection").field(l).field(r).finish(),
            Self::Optional(s) => f.debug_tuple("Optional").field(s).finish(),
            Self::Nullable(s) => f.debug_tuple("Nullable").field(s).finish(),
            Self::Default(s, v) => f.debug_tuple("Default").field(s).field(v).finish(),
            Self::Catch(s, v) => f.debug_tuple("Catch").field(s).field(v).finish(),
            Self::Branded(s, b) => f.debug_tuple("Branded").field(s).field(b).finish(),
            Self::Readonly(s) => f.debug_tuple("Readonly").field(s).finish(),
            Self::Effects(s, _) => f.debug_tuple("Effects").field(s).finish(),
            Self::Pipeline(a, b) => f.debug_tuple("Pipeline").field(a).field(b).finish(),
            Self::Lazy(_) => write!(f, "Lazy"),
            Self::Custom(_) => write!(f, "Custom"),
        }
    }
}

/// A cheaply clonable, immutable schema.
#[derive(Clone)]
pub struct Schema(Arc<SchemaKind>);

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Schema {
    pub fn new(kind: SchemaKind) -> Self {
        Self(Arc::new(kind))
    }

    pub fn kind(&self) -> &SchemaKind {
        &self.0
    }

    /// Validate a value, returning the parsed output.
    pub fn safe_parse(&self, value: &Value) -> Result<Value, ValidationError> {
        validate::parse(self, value)
    }

    pub fn string() -> Self {
        Self::new(SchemaKind::String)
    }

    pub fn number() -> Self {
        Self::new(SchemaKind::Number)
    }

    pub fn nan() -> Self {
        Self::new(SchemaKind::NaN)
    }

    pub fn boolean() -> Self {
        Self::new(SchemaKind::Boolean)
    }

    pub fn null() -> Self {
        Self::new(SchemaKind::Null)
    }

    pub fn undefined() -> Self {
        Self::new(SchemaKind::Undefined)
    }

    pub fn void() -> Self {
        Self::new(SchemaKind::Void)
    }

    pub fn date() -> Self {
        Self::new(SchemaKind::Date)
    }

    pub fn bigint() -> Self {
        Self::new(SchemaKind::BigInt)
    }

    pub fn any() -> Self {
        Self::new(SchemaKind::Any)
    }

    pub fn unknown() -> Self {
        Self::new(SchemaKind::Unknown)
    }

    pub fn never() -> Self {
        Self::new(SchemaKind::Never)
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Self::new(SchemaKind::Literal(value.into()))
    }

    /// A string which must be one of `values`.
    pub fn enumeration<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Self::new(SchemaKind::Enum(values.into_iter().map(Into::into).collect()))
    }

    /// A value which must equal one of `values` (strings or numbers).
    pub fn native_enum<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Self::new(SchemaKind::NativeEnum(
            values.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn array(item: Schema) -> Self {
        Self::new(SchemaKind::Array(item))
    }

    pub fn tuple(items: impl IntoIterator<Item = Schema>) -> Self {
        Self::new(SchemaKind::Tuple(items.into_iter().collect()))
    }

    pub fn set(item: Schema) -> Self {
        Self::new(SchemaKind::Set(item))
    }

    pub fn map(key: Schema, value: Schema) -> Self {
        Self::new(SchemaKind::Map(key, value))
    }

    pub fn object<K: Into<String>>(shape: impl IntoIterator<Item = (K, Schema)>) -> Self {
        Self::new(SchemaKind::Object {
            shape: shape.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            catchall: None,
        })
    }

    pub fn record(key: Schema, value: Schema) -> Self {
        Self::new(SchemaKind::Record(key, value))
    }

    pub fn union(options: impl IntoIterator<Item = Schema>) -> Self {
        Self::new(SchemaKind::Union(options.into_iter().collect()))
    }

    /// A union of object schemas which is resolved by the literal value at `discriminator`.
    pub fn discriminated_union(
        discriminator: impl Into<String>,
        options: impl IntoIterator<Item = Schema>,
    ) -> Self {
        Self::new(SchemaKind::DiscriminatedUnion {
            discriminator: discriminator.into(),
            options: options.into_iter().collect(),
        })
    }

    pub fn lazy(getter: impl Fn() -> Schema + Send + Sync + 'static) -> Self {
        Self::new(SchemaKind::Lazy(Arc::new(getter)))
    }

    pub fn custom(validator: impl Validator) -> Self {
        Self::new(SchemaKind::Custom(Arc::new(validator)))
    }

    /// Validate unknown object keys against `schema` instead of stripping them.
    ///
    /// Has no effect on non-object schemas.
    pub fn catchall(self, schema: Schema) -> Self {
        match self.kind() {
            SchemaKind::Object { shape, .. } => Self::new(SchemaKind::Object {
                shape: shape.clone(),
                catchall: Some(schema),
            }),
            _ => self,
        }
    }

    pub fn optional(self) -> Self {
        Self::new(SchemaKind::Optional(self))
    }

    pub fn nullable(self) -> Self {
        Self::new(SchemaKind::Nullable(self))
    }

    /// Use `value` when the input is undefined.
    pub fn with_default(self, value: impl Into<Value>) -> Self {
        Self::new(SchemaKind::Default(self, value.into()))
    }

    pub fn catch(self, value: impl Into<Value>) -> Self {
        Self::new(SchemaKind::Catch(self, value.into()))
    }

    pub fn brand(self, brand: impl Into<Cow<'static, str>>) -> Self {
        Self::new(SchemaKind::Branded(self, brand.into()))
    }

    pub fn readonly(self) -> Self {
        Self::new(SchemaKind::Readonly(self))
    }

    /// Run `transform` on the parsed value. Returning `Err` adds a validation issue.
    pub fn transform(
        self,
        transform: impl Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    ) -> Self {
        Self::new(SchemaKind::Effects(self, Arc::new(transform)))
    }

    /// Feed the output of this schema into `next`.
    pub fn pipe(self, next: Schema) -> Self {
        Self::new(SchemaKind::Pipeline(self, next))
    }

    pub fn and(self, other: Schema) -> Self {
        Self::new(SchemaKind::Intersection(self, other))
    }
}

impl Validator for Schema {
    fn safe_parse(&self, value: &Value) -> Result<Value, ValidationError> {
        Schema::safe_parse(self, value)
    }
}
