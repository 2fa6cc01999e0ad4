//! Best-effort coercion of loosely typed wire data into the shape a [`Schema`] expects.
//!
//! Query strings and form bodies only carry strings, so a request like `?id=5&tags[0]=a` arrives
//! as `{"id": "5", "tags": {"0": "a"}}`. Coercion walks the schema alongside the value and rewrites
//! whatever it can (`"5"` into `5`, `{"0": "a"}` into `["a"]`) before strict validation runs.
//!
//! Coercion never rejects a value. Anything it can't make sense of is returned untouched so the
//! validator can report it.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::{
    schema::{Schema, SchemaKind},
    value::Object,
    Value,
};

/// Index keyed objects with an index above this are not turned into arrays.
const ARRAY_LIMIT: usize = 1000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoerceOptions {
    /// Enable the fixes for data decoded from bracket notation (`a[b][0]=c`), where every leaf is
    /// a string and arrays, sets and maps arrive as numerically keyed objects.
    pub bracket_notation: bool,
}

impl CoerceOptions {
    pub fn bracket_notation() -> Self {
        Self {
            bracket_notation: true,
        }
    }
}

/// Coerce `value` towards `schema`.
pub fn coerce(schema: &Schema, value: Value, options: CoerceOptions) -> Value {
    Coercer {
        bracket_notation: options.bracket_notation,
    }
    .coerce(schema, value, true)
}

struct Coercer {
    bracket_notation: bool,
}

impl Coercer {
    fn coerce(&self, schema: &Schema, value: Value, is_root: bool) -> Value {
        if is_root && self.bracket_notation {
            if let Value::Object(entries) = &value {
                if entries.is_empty() {
                    return self.coerce(schema, Value::Undefined, false);
                }

                if entries.len() == 1 {
                    if let Some(inner) = entries.get("") {
                        let flattened = self.coerce(schema, inner.clone(), false);
                        if schema.safe_parse(&flattened).is_ok() {
                            return flattened;
                        }
                        return self.coerce(schema, value, false);
                    }
                }
            }
        }

        match schema.kind() {
            SchemaKind::Number => match &value {
                Value::String(s) if self.bracket_notation => parse_number(s).unwrap_or(value),
                _ => value,
            },
            SchemaKind::NaN => match &value {
                Value::String(s) if s.eq_ignore_ascii_case("nan") => Value::Number(f64::NAN),
                _ => value,
            },
            SchemaKind::Boolean => match &value {
                Value::String(s) if self.bracket_notation => parse_bool(s).unwrap_or(value),
                _ => value,
            },
            SchemaKind::Null => match &value {
                Value::String(s) if self.bracket_notation && s.eq_ignore_ascii_case("null") => {
                    Value::Null
                }
                _ => value,
            },
            SchemaKind::Undefined | SchemaKind::Void => match &value {
                Value::String(s) if s.eq_ignore_ascii_case("undefined") => Value::Undefined,
                _ => value,
            },
            SchemaKind::Date => match &value {
                Value::String(s) if s.contains('-') || s.contains(':') => {
                    parse_date(s).map(Value::Date).unwrap_or(value)
                }
                _ => value,
            },
            SchemaKind::BigInt => match &value {
                Value::String(s) => parse_bigint(s).unwrap_or(value),
                _ => value,
            },
            SchemaKind::Array(item) => self.coerce_sequence(value, |_| Some(item), Value::Array),
            SchemaKind::Tuple(items) => {
                self.coerce_sequence(value, |i| items.get(i), Value::Array)
            }
            SchemaKind::Set(item) => {
                self.coerce_sequence(value, |_| Some(item), |items| Value::set(items))
            }
            SchemaKind::Map(key, val) => self.coerce_map(key, val, value),
            SchemaKind::Object { shape, catchall } => match value {
                Value::Object(entries) => {
                    let mut out = Object::with_capacity(entries.len());
                    let missing = shape
                        .keys()
                        .filter(|k| !entries.contains_key(*k))
                        .cloned()
                        .collect::<Vec<_>>();

                    for (k, v) in entries {
                        let v = match shape.get(&k).or(catchall.as_ref()) {
                            Some(schema) => self.coerce(schema, v, false),
                            None => v,
                        };
                        out.insert(k, v);
                    }

                    for k in missing {
                        let Some(schema) = shape.get(&k) else {
                            continue;
                        };
                        let v = self.coerce(schema, Value::Undefined, false);
                        if !v.is_undefined() {
                            out.insert(k, v);
                        }
                    }

                    Value::Object(out)
                }
                Value::Undefined if self.bracket_notation => Value::Object(Object::new()),
                Value::Array(mut items) if self.bracket_notation && !items.is_empty() => {
                    let last = items.pop().unwrap_or_default();
                    let last = match shape.get("").or(catchall.as_ref()) {
                        Some(schema) => self.coerce(schema, last, false),
                        None => last,
                    };
                    Value::object([("", last)])
                }
                value => value,
            },
            SchemaKind::Record(key, val) => match value {
                Value::Object(entries) => Value::Object(
                    entries
                        .into_iter()
                        .map(|(k, v)| {
                            let k = match self.coerce(key, Value::String(k.clone()), false) {
                                Value::String(s) => s,
                                _ => k,
                            };
                            (k, self.coerce(val, v, false))
                        })
                        .collect(),
                ),
                value => value,
            },
            SchemaKind::Union(options)
            | SchemaKind::DiscriminatedUnion { options, .. } => {
                self.coerce_union(schema, options, value, is_root)
            }
            SchemaKind::Intersection(left, right) => {
                let value = self.coerce(left, value, is_root);
                self.coerce(right, value, is_root)
            }
            SchemaKind::Readonly(inner)
            | SchemaKind::Effects(inner, _)
            | SchemaKind::Branded(inner, _)
            | SchemaKind::Catch(inner, _)
            | SchemaKind::Default(inner, _)
            | SchemaKind::Pipeline(inner, _) => self.coerce(inner, value, is_root),
            SchemaKind::Lazy(getter) => self.coerce(&getter(), value, is_root),
            SchemaKind::Nullable(inner) => match &value {
                Value::Null => Value::Null,
                Value::String(s) if self.bracket_notation => {
                    if schema.safe_parse(&value).is_ok() {
                        value
                    } else if s.eq_ignore_ascii_case("null") {
                        Value::Null
                    } else {
                        self.coerce(inner, value, is_root)
                    }
                }
                _ => self.coerce(inner, value, is_root),
            },
            SchemaKind::Optional(inner) => match &value {
                Value::Undefined => Value::Undefined,
                Value::String(s) => {
                    if schema.safe_parse(&value).is_ok() {
                        value
                    } else if s.eq_ignore_ascii_case("undefined") {
                        Value::Undefined
                    } else {
                        self.coerce(inner, value, is_root)
                    }
                }
                _ => self.coerce(inner, value, is_root),
            },
            SchemaKind::NativeEnum(options) => {
                if options.contains(&value) {
                    return value;
                }
                match &value {
                    Value::String(s) if self.bracket_notation => options
                        .iter()
                        .find(|option| option.to_string() == *s)
                        .cloned()
                        .unwrap_or(value),
                    _ => value,
                }
            }
            SchemaKind::Literal(expected) => match (&value, expected) {
                (Value::String(_), Value::String(_)) => value,
                (Value::String(s), Value::BigInt(_)) => parse_bigint(s).unwrap_or(value),
                (Value::String(s), Value::Undefined) if s.eq_ignore_ascii_case("undefined") => {
                    Value::Undefined
                }
                (Value::String(s), Value::Number(_)) if self.bracket_notation => {
                    parse_number(s).unwrap_or(value)
                }
                (Value::String(s), Value::Bool(_)) if self.bracket_notation => {
                    parse_bool(s).unwrap_or(value)
                }
                (Value::String(s), Value::Null)
                    if self.bracket_notation && s.eq_ignore_ascii_case("null") =>
                {
                    Value::Null
                }
                _ => value,
            },
            SchemaKind::String
            | SchemaKind::Enum(_)
            | SchemaKind::Any
            | SchemaKind::Unknown
            | SchemaKind::Never
            | SchemaKind::Custom(_) => value,
        }
    }

    fn coerce_sequence<'a>(
        &self,
        value: Value,
        schema_for: impl Fn(usize) -> Option<&'a Schema>,
        build: impl FnOnce(Vec<Value>) -> Value,
    ) -> Value {
        let coerce_at = |i: usize, v: Value| match schema_for(i) {
            Some(schema) => self.coerce(schema, v, false),
            None => v,
        };

        match value {
            Value::Array(items) => build(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| coerce_at(i, v))
                    .collect(),
            ),
            Value::Undefined if self.bracket_notation => build(Vec::new()),
            Value::Object(entries) if self.bracket_notation && is_index_object(&entries) => {
                let len = entries
                    .keys()
                    .try_fold(0, |len, k| Some(len.max(k.parse::<usize>().ok()?.checked_add(1)?)));

                match len {
                    Some(len) if len <= ARRAY_LIMIT => {
                        let mut items = vec![Value::Undefined; len];
                        for (k, v) in entries {
                            if let Ok(i) = k.parse::<usize>() {
                                items[i] = coerce_at(i, v);
                            }
                        }
                        build(items)
                    }
                    _ => Value::Object(entries),
                }
            }
            value => value,
        }
    }

    fn coerce_map(&self, key: &Schema, val: &Schema, value: Value) -> Value {
        let pair = |k: Value, v: Value| (self.coerce(key, k, false), self.coerce(val, v, false));

        match value {
            Value::Array(items)
                if items
                    .iter()
                    .all(|item| matches!(item, Value::Array(p) if p.len() == 2)) =>
            {
                Value::Map(
                    items
                        .into_iter()
                        .filter_map(|item| match item {
                            Value::Array(mut p) => {
                                let v = p.pop().unwrap_or_default();
                                let k = p.pop().unwrap_or_default();
                                Some(pair(k, v))
                            }
                            _ => None,
                        })
                        .collect(),
                )
            }
            Value::Undefined if self.bracket_notation => Value::Map(Vec::new()),
            Value::Object(entries) if self.bracket_notation => {
                let pairs = (0..entries.len())
                    .map(|i| match entries.get(&i.to_string()) {
                        Some(Value::Object(p))
                            if p.len() == 2 && p.contains_key("0") && p.contains_key("1") =>
                        {
                            Some((
                                p.get("0").cloned().unwrap_or_default(),
                                p.get("1").cloned().unwrap_or_default(),
                            ))
                        }
                        _ => None,
                    })
                    .collect::<Option<Vec<_>>>();

                match pairs {
                    Some(pairs) => {
                        Value::Map(pairs.into_iter().map(|(k, v)| pair(k, v)).collect())
                    }
                    None => Value::Object(entries),
                }
            }
            value => value,
        }
    }

    fn coerce_union(
        &self,
        schema: &Schema,
        options: &[Schema],
        value: Value,
        is_root: bool,
    ) -> Value {
        if schema.safe_parse(&value).is_ok() {
            return value;
        }

        let mut best: Option<(Value, usize)> = None;
        for option in options {
            let candidate = self.coerce(option, value.clone(), is_root);
            if candidate == value {
                continue;
            }

            if schema.safe_parse(&candidate).is_ok() {
                return candidate;
            }

            let residual = option
                .safe_parse(&candidate)
                .err()
                .map(|err| err.issues.len())
                .unwrap_or(0);
            // Ties keep the earliest branch.
            if best.as_ref().map_or(true, |(_, n)| residual < *n) {
                best = Some((candidate, residual));
            }
        }

        best.map(|(v, _)| v).unwrap_or(value)
    }
}

fn is_index_object(entries: &Object) -> bool {
    entries.keys().all(|k| {
        k == "0"
            || (!k.is_empty()
                && !k.starts_with('0')
                && k.bytes().all(|b| b.is_ascii_digit()))
    })
}

fn parse_number(s: &str) -> Option<Value> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    trimmed
        .parse::<f64>()
        .ok()
        .filter(|n| !n.is_nan())
        .map(Value::Number)
}

fn parse_bool(s: &str) -> Option<Value> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "on" | "t" => Some(Value::Bool(true)),
        "false" | "off" | "f" => Some(Value::Bool(false)),
        _ => None,
    }
}

fn parse_bigint(s: &str) -> Option<Value> {
    s.trim().parse::<i128>().ok().map(Value::BigInt)
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(s) {
        return Some(date.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(date) = NaiveDateTime::parse_from_str(s, format) {
            return Some(date.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|date| date.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_keys() {
        let keys = |keys: &[&str]| {
            is_index_object(&keys.iter().map(|k| (k.to_string(), Value::Null)).collect())
        };

        assert!(keys(&["0", "1", "10"]));
        assert!(keys(&[]));
        assert!(!keys(&["01"]));
        assert!(!keys(&["a"]));
        assert!(!keys(&["-1"]));
    }

    #[test]
    fn dates() {
        assert!(parse_date("2024-01-02").is_some());
        assert!(parse_date("2024-01-02T03:04:05Z").is_some());
        assert!(parse_date("2024-01-02T03:04:05.123").is_some());
        assert!(parse_date("not-a-date").is_none());
    }

    #[test]
    fn booleans() {
        assert_eq!(parse_bool("ON"), Some(Value::Bool(true)));
        assert_eq!(parse_bool("f"), Some(Value::Bool(false)));
        assert_eq!(parse_bool("yes"), None);
    }
}
