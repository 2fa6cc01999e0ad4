//! Decode `application/x-www-form-urlencoded` data using bracket notation.
//!
//! `user[name]=a&user[tags][]=x&user[tags][]=y` decodes to
//! `{"user": {"name": "a", "tags": ["x", "y"]}}`. Every leaf is a string, the [coercion
//! adapter](crate::coerce) turns them into the types the input schema expects.

use crate::{value::Object, Value};

#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    Key(&'a str),
    /// `[]`
    Append,
}

/// Split `a[b][]` into `a`, `b` and an append. Keys with unbalanced brackets are kept whole.
fn parse_key(key: &str) -> Vec<Segment<'_>> {
    let Some(start) = key.find('[') else {
        return vec![Segment::Key(key)];
    };

    let (root, mut rest) = key.split_at(start);
    let mut segments = vec![Segment::Key(root)];
    while !rest.is_empty() {
        let parsed = rest
            .strip_prefix('[')
            .and_then(|r| r.find(']').map(|end| (&r[..end], &r[end + 1..])));

        match parsed {
            Some((inner, next)) if !inner.contains('[') => {
                segments.push(match inner {
                    "" => Segment::Append,
                    key => Segment::Key(key),
                });
                rest = next;
            }
            _ => return vec![Segment::Key(key)],
        }
    }

    segments
}

/// Decode a query string or form body.
pub fn parse(input: &[u8]) -> Value {
    form_urlencoded::parse(input).fold(Value::Object(Object::new()), |root, (key, value)| {
        assign(root, &parse_key(&key), value.into_owned())
    })
}

/// Store `value` at `path` below `current`, returning the updated value.
fn assign(current: Value, path: &[Segment<'_>], value: String) -> Value {
    match path.split_first() {
        None => match current {
            Value::Undefined => Value::String(value),
            Value::Array(mut items) => {
                items.push(Value::String(value));
                Value::Array(items)
            }
            other => Value::Array(vec![other, Value::String(value)]),
        },
        Some((Segment::Append, rest)) => {
            let mut items = into_array(current);
            items.push(assign(Value::Undefined, rest, value));
            Value::Array(items)
        }
        Some((Segment::Key(key), rest)) => {
            let mut object = into_object(current);
            let slot = object.entry(key.to_string()).or_default();
            *slot = assign(std::mem::take(slot), rest, value);
            Value::Object(object)
        }
    }
}

fn into_array(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Undefined => Vec::new(),
        other => vec![other],
    }
}

/// Arrays become index keyed objects and any other value is kept under the empty key.
fn into_object(value: Value) -> Object {
    match value {
        Value::Object(object) => object,
        Value::Undefined => Object::new(),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        other => Object::from([(String::new(), other)]),
    }
}
