use crate::{value::Object, Value};

use super::{Issue, PathSegment, Schema, SchemaKind, ValidationError};

type ParseResult = Result<Value, Vec<Issue>>;

pub(super) fn parse(schema: &Schema, value: &Value) -> Result<Value, ValidationError> {
    parse_kind(schema.kind(), value).map_err(ValidationError::from_issues)
}

fn expected(expected: &str, value: &Value) -> Vec<Issue> {
    vec![Issue::new(format!(
        "Expected {expected}, received {}",
        value.kind()
    ))]
}

fn parse_kind(kind: &SchemaKind, value: &Value) -> ParseResult {
    match kind {
        SchemaKind::String => match value {
            Value::String(_) => Ok(value.clone()),
            _ => Err(expected("string", value)),
        },
        SchemaKind::Number => match value {
            Value::Number(n) if !n.is_nan() => Ok(value.clone()),
            _ => Err(expected("number", value)),
        },
        SchemaKind::NaN => match value {
            Value::Number(n) if n.is_nan() => Ok(value.clone()),
            _ => Err(expected("nan", value)),
        },
        SchemaKind::Boolean => match value {
            Value::Bool(_) => Ok(value.clone()),
            _ => Err(expected("boolean", value)),
        },
        SchemaKind::Null => match value {
            Value::Null => Ok(Value::Null),
            _ => Err(expected("null", value)),
        },
        SchemaKind::Undefined | SchemaKind::Void => match value {
            Value::Undefined => Ok(Value::Undefined),
            _ => Err(expected("undefined", value)),
        },
        SchemaKind::Date => match value {
            Value::Date(_) => Ok(value.clone()),
            _ => Err(expected("date", value)),
        },
        SchemaKind::BigInt => match value {
            Value::BigInt(_) => Ok(value.clone()),
            _ => Err(expected("bigint", value)),
        },
        SchemaKind::Any | SchemaKind::Unknown => Ok(value.clone()),
        SchemaKind::Never => Err(vec![Issue::new(format!(
            "Expected never, received {}",
            value.kind()
        ))]),
        SchemaKind::Literal(expected) => {
            if value == expected {
                Ok(value.clone())
            } else {
                Err(vec![Issue::new(format!(
                    "Invalid literal value, expected {expected}"
                ))])
            }
        }
        SchemaKind::Enum(options) => match value {
            Value::String(s) if options.contains(s) => Ok(value.clone()),
            _ => Err(vec![Issue::new(format!(
                "Invalid enum value. Expected {}, received {value}",
                options.join(" | ")
            ))]),
        },
        SchemaKind::NativeEnum(options) => {
            if options.contains(value) {
                Ok(value.clone())
            } else {
                Err(vec![Issue::new(format!(
                    "Invalid enum value, received {value}"
                ))])
            }
        }
        SchemaKind::Array(item) => match value {
            Value::Array(items) => parse_items(items, |_| Some(item)).map(Value::Array),
            _ => Err(expected("array", value)),
        },
        SchemaKind::Tuple(schemas) => match value {
            Value::Array(items) if items.len() == schemas.len() => {
                parse_items(items, |i| schemas.get(i)).map(Value::Array)
            }
            Value::Array(items) => Err(vec![Issue::new(format!(
                "Expected a tuple of {} items, received {}",
                schemas.len(),
                items.len()
            ))]),
            _ => Err(expected("array", value)),
        },
        SchemaKind::Set(item) => match value {
            Value::Set(items) => parse_items(items, |_| Some(item)).map(|items| Value::set(items)),
            _ => Err(expected("set", value)),
        },
        SchemaKind::Map(key, val) => match value {
            Value::Map(entries) => {
                let mut issues = Vec::new();
                let mut out = Vec::with_capacity(entries.len());
                for (i, (k, v)) in entries.iter().enumerate() {
                    let k = key.safe_parse(k).map_err(|err| {
                        issues.extend(err.prefixed(PathSegment::Index(i)));
                    });
                    let v = val.safe_parse(v).map_err(|err| {
                        issues.extend(err.prefixed(PathSegment::Index(i)));
                    });
                    if let (Ok(k), Ok(v)) = (k, v) {
                        out.push((k, v));
                    }
                }
                finish(issues, Value::Map(out))
            }
            _ => Err(expected("map", value)),
        },
        SchemaKind::Object { shape, catchall } => match value {
            Value::Object(entries) => parse_object(shape, catchall.as_ref(), entries),
            _ => Err(expected("object", value)),
        },
        SchemaKind::Record(key, val) => match value {
            Value::Object(entries) => {
                let mut issues = Vec::new();
                let mut out = Object::with_capacity(entries.len());
                for (k, v) in entries {
                    let segment = PathSegment::Key(k.clone());
                    let parsed_key = match key.safe_parse(&Value::String(k.clone())) {
                        Ok(Value::String(s)) => Some(s),
                        Ok(other) => Some(other.to_string()),
                        Err(err) => {
                            issues.extend(err.prefixed(segment.clone()));
                            None
                        }
                    };
                    match val.safe_parse(v) {
                        Ok(v) => {
                            if let Some(k) = parsed_key {
                                out.insert(k, v);
                            }
                        }
                        Err(err) => issues.extend(err.prefixed(segment)),
                    }
                }
                finish(issues, Value::Object(out))
            }
            _ => Err(expected("object", value)),
        },
        SchemaKind::Union(options) => options
            .iter()
            .find_map(|option| option.safe_parse(value).ok())
            .ok_or_else(|| {
                vec![Issue::new(format!(
                    "Invalid input, no union member accepts {}",
                    value.kind()
                ))]
            }),
        SchemaKind::DiscriminatedUnion {
            discriminator,
            options,
        } => {
            let Value::Object(entries) = value else {
                return Err(expected("object", value));
            };
            let tag = entries.get(discriminator).cloned().unwrap_or_default();
            let option = options.iter().find(|option| {
                let SchemaKind::Object { shape, .. } = option.kind() else {
                    return false;
                };
                shape
                    .get(discriminator)
                    .map(|s| s.safe_parse(&tag).is_ok())
                    .unwrap_or(false)
            });

            match option {
                Some(option) => option.safe_parse(value).map_err(|err| err.issues),
                None => Err(vec![Issue::new(format!(
                    "Invalid discriminator value, received {tag}"
                ))
                .prefixed(PathSegment::Key(discriminator.clone()))]),
            }
        }
        SchemaKind::Intersection(left, right) => {
            let (l, r) = (left.safe_parse(value), right.safe_parse(value));
            match (l, r) {
                (Ok(l), Ok(r)) => merge_intersection(l, r).ok_or_else(|| {
                    vec![Issue::new("Intersection results could not be merged")]
                }),
                (l, r) => {
                    let mut issues = Vec::new();
                    if let Err(err) = l {
                        issues.extend(err.issues);
                    }
                    if let Err(err) = r {
                        issues.extend(err.issues);
                    }
                    Err(issues)
                }
            }
        }
        SchemaKind::Optional(inner) => match value {
            Value::Undefined => Ok(Value::Undefined),
            _ => parse_kind(inner.kind(), value),
        },
        SchemaKind::Nullable(inner) => match value {
            Value::Null => Ok(Value::Null),
            _ => parse_kind(inner.kind(), value),
        },
        SchemaKind::Default(inner, default) => match value {
            Value::Undefined => parse_kind(inner.kind(), default),
            _ => parse_kind(inner.kind(), value),
        },
        SchemaKind::Catch(inner, fallback) => {
            Ok(parse_kind(inner.kind(), value).unwrap_or_else(|_| fallback.clone()))
        }
        SchemaKind::Branded(inner, _) | SchemaKind::Readonly(inner) => {
            parse_kind(inner.kind(), value)
        }
        SchemaKind::Effects(inner, transform) => {
            let parsed = parse_kind(inner.kind(), value)?;
            transform(parsed).map_err(|message| vec![Issue::new(message)])
        }
        SchemaKind::Pipeline(input, output) => {
            let parsed = parse_kind(input.kind(), value)?;
            parse_kind(output.kind(), &parsed)
        }
        SchemaKind::Lazy(getter) => parse_kind(getter().kind(), value),
        SchemaKind::Custom(validator) => validator.safe_parse(value).map_err(|err| err.issues),
    }
}

fn finish(issues: Vec<Issue>, value: Value) -> ParseResult {
    if issues.is_empty() {
        Ok(value)
    } else {
        Err(issues)
    }
}

fn parse_items<'a>(
    items: &[Value],
    schema_for: impl Fn(usize) -> Option<&'a Schema>,
) -> Result<Vec<Value>, Vec<Issue>> {
    let mut issues = Vec::new();
    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let Some(schema) = schema_for(i) else {
            out.push(item.clone());
            continue;
        };

        match schema.safe_parse(item) {
            Ok(v) => out.push(v),
            Err(err) => issues.extend(err.prefixed(PathSegment::Index(i))),
        }
    }

    if issues.is_empty() {
        Ok(out)
    } else {
        Err(issues)
    }
}

fn parse_object(
    shape: &indexmap::IndexMap<String, Schema>,
    catchall: Option<&Schema>,
    entries: &Object,
) -> ParseResult {
    let mut issues = Vec::new();
    let mut out = Object::with_capacity(shape.len());

    for (key, schema) in shape {
        let present = entries.get(key);
        let input = present.cloned().unwrap_or_default();
        match schema.safe_parse(&input) {
            // Keys missing from the input stay missing unless the schema produced a value for them.
            Ok(Value::Undefined) if present.is_none() => {}
            Ok(v) => {
                out.insert(key.clone(), v);
            }
            Err(err) => issues.extend(err.prefixed(PathSegment::Key(key.clone()))),
        }
    }

    // Unknown keys are stripped unless there is a catchall.
    if let Some(catchall) = catchall {
        for (key, v) in entries.iter().filter(|(k, _)| !shape.contains_key(*k)) {
            match catchall.safe_parse(v) {
                Ok(v) => {
                    out.insert(key.clone(), v);
                }
                Err(err) => issues.extend(err.prefixed(PathSegment::Key(key.clone()))),
            }
        }
    }

    finish(issues, Value::Object(out))
}

fn merge_intersection(left: Value, right: Value) -> Option<Value> {
    match (left, right) {
        (Value::Object(mut l), Value::Object(r)) => {
            for (k, v) in r {
                let merged = match l.shift_remove(&k) {
                    Some(existing) => merge_intersection(existing, v)?,
                    None => v,
                };
                l.insert(k, merged);
            }
            Some(Value::Object(l))
        }
        (l, r) if l == r => Some(l),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_strips_unknown_keys() {
        let schema = Schema::object([("id", Schema::string())]);
        let value = Value::object([("id", "1"), ("extra", "x")]);

        assert_eq!(schema.safe_parse(&value), Ok(Value::object([("id", "1")])));
    }

    #[test]
    fn object_reports_every_failing_key() {
        let schema = Schema::object([("a", Schema::string()), ("b", Schema::number())]);
        let err = schema
            .safe_parse(&Value::object([("a", 1), ("b", 2)]))
            .expect_err("should fail");

        assert_eq!(err.issues.len(), 1);
        assert_eq!(err.to_string(), "a: Expected string, received number");

        let err = schema
            .safe_parse(&Value::object::<&str, Value>([]))
            .expect_err("should fail");
        assert_eq!(err.issues.len(), 2);
    }

    #[test]
    fn optional_keys_stay_missing() {
        let schema = Schema::object([("a", Schema::string().optional())]);

        assert_eq!(
            schema.safe_parse(&Value::object::<&str, Value>([])),
            Ok(Value::object::<&str, Value>([]))
        );
    }

    #[test]
    fn default_fills_missing_key() {
        let schema = Schema::object([("page", Schema::number().with_default(1))]);

        assert_eq!(
            schema.safe_parse(&Value::object::<&str, Value>([])),
            Ok(Value::object([("page", 1)]))
        );
    }

    #[test]
    fn intersection_merges_objects() {
        let schema = Schema::object([("a", Schema::string())])
            .and(Schema::object([("b", Schema::number())]));

        assert_eq!(
            schema.safe_parse(&Value::object([("a", Value::from("x")), ("b", Value::from(1))])),
            Ok(Value::object([("a", Value::from("x")), ("b", Value::from(1))]))
        );
    }

    #[test]
    fn discriminated_union_picks_by_tag() {
        let schema = Schema::discriminated_union(
            "type",
            [
                Schema::object([("type", Schema::literal("a")), ("a", Schema::string())]),
                Schema::object([("type", Schema::literal("b")), ("b", Schema::number())]),
            ],
        );

        assert!(schema
            .safe_parse(&Value::object([("type", Value::from("b")), ("b", Value::from(2))]))
            .is_ok());
        let err = schema
            .safe_parse(&Value::object([("type", "c")]))
            .expect_err("unknown tag");
        assert_eq!(err.issues[0].path, vec![PathSegment::Key("type".into())]);
    }

    #[test]
    fn transform_runs_after_parse() {
        let schema = Schema::string().transform(|v| match v {
            Value::String(s) => Ok(Value::from(s.len())),
            _ => Err("unreachable".into()),
        });

        assert_eq!(schema.safe_parse(&"abc".into()), Ok(Value::from(3)));
        assert!(schema.safe_parse(&Value::from(1)).is_err());
    }
}
