//! Input descriptors
//!
//! A [`Shape`] describes what a block input may hold. Validation is structural
//! and recursive, and always answers with a plain boolean.

use super::Input;
use crate::value::{Value, ValueKind};
use std::collections::BTreeMap;
use thiserror::Error;

/// A descriptor that failed its well-formedness check
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{0}")]
pub struct MalformedShape(pub String);

/// Typed-value descriptor for a block input
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// A primitive kind: null, boolean, number or string
    Kind(ValueKind),
    /// A nested block, evaluated lazily
    Block,
    /// Any of the listed shapes
    Union(Vec<Shape>),
    /// A stack of blocks or a literal list, every element matching the shape
    ArrayOf(Box<Shape>),
    /// A literal object with (at least) these fields
    ObjectOf(BTreeMap<String, Shape>),
    /// Exactly this literal value
    Literal(Value),
}

impl Shape {
    pub fn string() -> Self {
        Shape::Kind(ValueKind::String)
    }

    pub fn number() -> Self {
        Shape::Kind(ValueKind::Number)
    }

    pub fn boolean() -> Self {
        Shape::Kind(ValueKind::Boolean)
    }

    pub fn null() -> Self {
        Shape::Kind(ValueKind::Null)
    }

    pub fn union(shapes: impl IntoIterator<Item = Shape>) -> Self {
        Shape::Union(shapes.into_iter().collect())
    }

    pub fn array_of(shape: Shape) -> Self {
        Shape::ArrayOf(Box::new(shape))
    }

    pub fn object_of<K: Into<String>>(fields: impl IntoIterator<Item = (K, Shape)>) -> Self {
        Shape::ObjectOf(fields.into_iter().map(|(k, s)| (k.into(), s)).collect())
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Shape::Literal(value.into())
    }

    /// An input slot: a literal of `kind`, free text, or a reporter block.
    pub fn slot(kind: ValueKind) -> Self {
        let mut shapes = vec![Shape::Kind(kind)];
        if kind != ValueKind::String {
            shapes.push(Shape::string());
        }
        shapes.push(Shape::Block);
        Shape::Union(shapes)
    }

    /// An input slot accepting any primitive or a reporter block
    pub fn any() -> Self {
        Shape::union([
            Shape::null(),
            Shape::boolean(),
            Shape::number(),
            Shape::string(),
            Shape::Block,
        ])
    }

    /// A C-block mouth: a stack of blocks, or nothing at all
    pub fn substack() -> Self {
        Shape::union([Shape::array_of(Shape::Block), Shape::null()])
    }

    /// A menu/field input: a fixed string
    pub fn field() -> Self {
        Shape::string()
    }

    /// Check that this descriptor is well formed
    pub fn check(&self) -> Result<(), MalformedShape> {
        match self {
            Shape::Kind(kind) if !kind.is_primitive() => Err(MalformedShape(format!(
                "`{}` is not a primitive kind",
                kind.name()
            ))),
            Shape::Kind(_) | Shape::Block | Shape::Literal(_) => Ok(()),
            Shape::Union(shapes) => {
                if shapes.is_empty() {
                    return Err(MalformedShape("union has no members".to_string()));
                }
                shapes.iter().try_for_each(Shape::check)
            }
            Shape::ArrayOf(inner) => inner.check(),
            Shape::ObjectOf(fields) => {
                if fields.keys().any(|k| k.is_empty()) {
                    return Err(MalformedShape("object field with an empty name".to_string()));
                }
                fields.values().try_for_each(Shape::check)
            }
        }
    }

    /// Validate a block input against this shape
    pub fn accepts(&self, input: &Input) -> bool {
        match (self, input) {
            (Shape::Block, Input::Block(_)) => true,
            (Shape::Union(shapes), _) => shapes.iter().any(|s| s.accepts(input)),
            (Shape::ArrayOf(inner), Input::Stack(blocks)) => blocks
                .iter()
                .all(|b| inner.accepts(&Input::Block(b.clone()))),
            (_, Input::Literal(value)) => self.accepts_value(value),
            _ => false,
        }
    }

    /// Validate a runtime value against this shape
    pub fn accepts_value(&self, value: &Value) -> bool {
        match self {
            Shape::Kind(kind) => value.kind() == *kind,
            Shape::Block => false,
            Shape::Union(shapes) => shapes.iter().any(|s| s.accepts_value(value)),
            Shape::ArrayOf(inner) => match value {
                Value::List(items) => items.iter().all(|v| inner.accepts_value(v)),
                _ => false,
            },
            Shape::ObjectOf(fields) => match value {
                Value::Obj(map) => fields
                    .iter()
                    .all(|(k, s)| map.get(k).is_some_and(|v| s.accepts_value(v))),
                _ => false,
            },
            Shape::Literal(expected) => value == expected,
        }
    }

    /// Parse a declarative descriptor
    ///
    /// Accepted forms:
    /// - `"null"`, `"boolean"`, `"number"`, `"string"`, `"block"`
    /// - `{"union": [d, ...]}`
    /// - `{"array": d}`
    /// - `{"object": {"field": d, ...}}`
    /// - `{"literal": value}`
    pub fn from_json(json: &serde_json::Value) -> Result<Shape, MalformedShape> {
        use serde_json::Value as Json;

        let shape = match json {
            Json::String(name) if name == "block" => Shape::Block,
            Json::String(name) => match ValueKind::from_name(name) {
                Some(kind) => Shape::Kind(kind),
                None => return Err(MalformedShape(format!("unknown kind `{}`", name))),
            },
            Json::Object(map) if map.len() == 1 => {
                let (tag, body) = map
                    .iter()
                    .next()
                    .ok_or_else(|| MalformedShape("empty descriptor object".to_string()))?;
                match (tag.as_str(), body) {
                    ("union", Json::Array(items)) => Shape::Union(
                        items
                            .iter()
                            .map(Shape::from_json)
                            .collect::<Result<_, _>>()?,
                    ),
                    ("array", inner) => Shape::array_of(Shape::from_json(inner)?),
                    ("object", Json::Object(fields)) => Shape::ObjectOf(
                        fields
                            .iter()
                            .map(|(k, v)| Ok((k.clone(), Shape::from_json(v)?)))
                            .collect::<Result<_, MalformedShape>>()?,
                    ),
                    ("literal", value) => Shape::Literal(json_to_value(value)),
                    _ => {
                        return Err(MalformedShape(format!(
                            "unrecognized descriptor `{}`",
                            json
                        )))
                    }
                }
            }
            _ => {
                return Err(MalformedShape(format!(
                    "unrecognized descriptor `{}`",
                    json
                )))
            }
        };

        shape.check()?;
        Ok(shape)
    }
}

/// Convert plain JSON into a runtime value
pub fn json_to_value(json: &serde_json::Value) -> Value {
    use serde_json::Value as Json;

    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => Value::Num(n.as_f64().unwrap_or(0.0)),
        Json::String(s) => Value::Str(s.clone()),
        Json::Array(items) => Value::List(items.iter().map(json_to_value).collect()),
        Json::Object(map) => Value::Obj(
            map.iter()
                .map(|(k, v)| (k.clone(), json_to_value(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::btreemap;
    use serde_json::json;

    fn lit(value: impl Into<Value>) -> Input {
        Input::Literal(value.into())
    }

    #[test]
    fn test_primitive_kinds() {
        assert!(Shape::number().accepts(&lit(3.0)));
        assert!(!Shape::number().accepts(&lit("3")));
        assert!(Shape::string().accepts(&lit("hi")));
        assert!(Shape::null().accepts(&Input::Literal(Value::Null)));
        assert!(!Shape::boolean().accepts(&lit(1.0)));
    }

    #[test]
    fn test_literal_shape() {
        let shape = Shape::literal("all");
        assert!(shape.accepts(&lit("all")));
        assert!(!shape.accepts(&lit("this script")));
    }

    #[test]
    fn test_union_and_array() {
        let shape = Shape::array_of(Shape::union([Shape::number(), Shape::string()]));
        let ok = Value::List(vec![Value::Num(1.0), "x".into()]);
        let bad = Value::List(vec![Value::Num(1.0), Value::Bool(true)]);
        assert!(shape.accepts_value(&ok));
        assert!(!shape.accepts_value(&bad));
        assert!(!shape.accepts_value(&Value::Num(1.0)));
    }

    #[test]
    fn test_object_requires_every_field() {
        let shape = Shape::object_of([("x", Shape::number()), ("y", Shape::number())]);
        let full = Value::Obj(btreemap! {
            "x".to_string() => Value::Num(1.0),
            "y".to_string() => Value::Num(2.0),
            "extra".to_string() => Value::Null,
        });
        let missing = Value::Obj(btreemap! { "x".to_string() => Value::Num(1.0) });
        assert!(shape.accepts_value(&full));
        assert!(!shape.accepts_value(&missing));
    }

    #[test]
    fn test_validation_is_repeatable() {
        let shape = Shape::slot(ValueKind::Number);
        let input = lit(4.0);
        let first = shape.accepts(&input);
        let second = shape.accepts(&input);
        assert_eq!(first, second);
        assert_eq!(input, lit(4.0));
    }

    #[test]
    fn test_malformed_shapes() {
        assert!(Shape::Union(vec![]).check().is_err());
        assert!(Shape::Kind(ValueKind::List).check().is_err());
        assert!(Shape::array_of(Shape::Union(vec![])).check().is_err());
        assert!(Shape::substack().check().is_ok());
    }

    #[test]
    fn test_from_json() {
        let shape = Shape::from_json(&json!({
            "object": {
                "name": "string",
                "size": {"union": ["number", {"literal": "auto"}]}
            }
        }))
        .unwrap();

        let value = Value::Obj(btreemap! {
            "name".to_string() => "cat".into(),
            "size".to_string() => "auto".into(),
        });
        assert!(shape.accepts_value(&value));

        assert!(Shape::from_json(&json!("float")).is_err());
        assert!(Shape::from_json(&json!({"tuple": []})).is_err());
        assert!(Shape::from_json(&json!({"union": []})).is_err());
        assert!(Shape::from_json(&json!(42)).is_err());
    }
}
