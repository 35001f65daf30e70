//! Instance data for a schema: the defaults and live trees.
//!
//! A [`Block`] holds one [`Value`] per field of its block definition, in
//! declaration order. Nested blocks and node-sequence entries are themselves
//! `Block`s, so a whole configuration is a single tree rooted at the schema's
//! root block.

use std::fmt;

use serde_json::{Map as JsonMap, Number, Value as Json};

use crate::document::Node;
use crate::schema::{BlockId, Schema};

/// A configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// An enum member, stored with the spelling of its declaration.
    Enum(String),
    List(Vec<Value>),
    /// String-keyed map; insertion order is preserved.
    Map(Vec<(String, Value)>),
    Block(Block),
}

/// An instance of a block definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub(crate) id: BlockId,
    pub(crate) values: Vec<Value>,
}

impl Block {
    pub(crate) fn new(id: BlockId, values: Vec<Value>) -> Self {
        Self { id, values }
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    /// Field values in declaration order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Resolve a dotted path below this block.
    ///
    /// Segments select block fields by node name, map entries by key and list
    /// entries by index: `node-test.node-seq-map.b.some-string`.
    pub fn lookup<'a>(&'a self, schema: &Schema, path: &str) -> Option<&'a Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let idx = schema.block(self.id).field_index(first)?;
        let mut current = &self.values[idx];
        for segment in segments {
            current = match current {
                Value::Block(block) => {
                    let idx = schema.block(block.id).field_index(segment)?;
                    &block.values[idx]
                }
                Value::Map(entries) => map_get(entries, segment)?,
                Value::List(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    pub(crate) fn lookup_mut<'a>(&'a mut self, schema: &Schema, path: &str) -> Option<&'a mut Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let idx = schema.block(self.id).field_index(first)?;
        let mut current = &mut self.values[idx];
        for segment in segments {
            current = match current {
                Value::Block(block) => {
                    let idx = schema.block(block.id).field_index(segment)?;
                    &mut block.values[idx]
                }
                Value::Map(entries) => entries
                    .iter_mut()
                    .find(|(k, _)| k == segment)
                    .map(|(_, v)| v)?,
                Value::List(items) => items.get_mut(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// JSON view of this block, keyed by lowercase field identifiers.
    /// Ignored fields are left out.
    pub fn to_json(&self, schema: &Schema) -> Json {
        let def = schema.block(self.id);
        let mut object = JsonMap::new();
        for (field, value) in def.fields().iter().zip(&self.values) {
            if field.is_ignored() || schema.block_ignored(field) {
                continue;
            }
            object.insert(field.ident().to_lowercase(), value.to_json(schema));
        }
        Json::Object(object)
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Enum(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(String, Value)]> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_block(&self) -> Option<&Block> {
        match self {
            Value::Block(block) => Some(block),
            _ => None,
        }
    }

    /// Look up a map entry by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        map_get(self.as_map()?, key)
    }

    /// Document-tree form of this value, as handed to custom serializers.
    /// Blocks have no schema-free document form and map to `None`.
    pub fn to_node(&self) -> Option<Node> {
        Some(match self {
            Value::Null => Node::Null,
            Value::Bool(b) => Node::Bool(*b),
            Value::Int(i) => Node::Int(*i),
            Value::Float(f) => Node::Float(*f),
            Value::String(s) | Value::Enum(s) => Node::String(s.clone()),
            Value::List(items) => {
                Node::Sequence(items.iter().map(Value::to_node).collect::<Option<_>>()?)
            }
            Value::Map(entries) => Node::Mapping(
                entries
                    .iter()
                    .map(|(k, v)| Some((k.clone(), v.to_node()?)))
                    .collect::<Option<_>>()?,
            ),
            Value::Block(_) => return None,
        })
    }

    /// Convert a document node into an untyped value.
    pub fn from_node(node: &Node) -> Value {
        match node {
            Node::Null => Value::Null,
            Node::Bool(b) => Value::Bool(*b),
            Node::Int(i) => Value::Int(*i),
            Node::Float(f) => Value::Float(*f),
            Node::String(s) => Value::String(s.clone()),
            Node::Sequence(items) => Value::List(items.iter().map(Value::from_node).collect()),
            Node::Mapping(entries) => Value::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from_node(v)))
                    .collect(),
            ),
        }
    }

    pub fn to_json(&self, schema: &Schema) -> Json {
        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(i) => Json::Number((*i).into()),
            Value::Float(f) => Number::from_f64(*f).map_or(Json::Null, Json::Number),
            Value::String(s) | Value::Enum(s) => Json::String(s.clone()),
            Value::List(items) => Json::Array(items.iter().map(|v| v.to_json(schema)).collect()),
            Value::Map(entries) => Json::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json(schema)))
                    .collect(),
            ),
            Value::Block(block) => block.to_json(schema),
        }
    }
}

pub(crate) fn map_get<'a>(entries: &'a [(String, Value)], key: &str) -> Option<&'a Value> {
    entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) | Value::Enum(s) => write!(f, "{s}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
            Value::Block(_) => write!(f, "{{...}}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i.into())
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Block> for Value {
    fn from(block: Block) -> Self {
        Value::Block(block)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_scalars() {
        assert_eq!(Value::from("text").to_string(), "text");
        assert_eq!(Value::Int(8080).to_string(), "8080");
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::Enum("FAST".into()).to_string(), "FAST");
    }

    #[test]
    fn display_collections() {
        let list = Value::from(vec!["a", "b"]);
        assert_eq!(list.to_string(), "[a, b]");
        let map = Value::Map(vec![("k".into(), Value::Int(1)), ("j".into(), Value::Bool(true))]);
        assert_eq!(map.to_string(), "{k: 1, j: true}");
    }

    #[test]
    fn node_round_trip_for_plain_values() {
        let value = Value::Map(vec![
            ("list".into(), Value::from(vec![1, 2])),
            ("name".into(), Value::from("x")),
        ]);
        let node = value.to_node().unwrap();
        assert_eq!(Value::from_node(&node), value);
    }

    #[test]
    fn enum_converts_to_string_node() {
        let node = Value::Enum("SLOW".into()).to_node().unwrap();
        assert_eq!(node, Node::String("SLOW".into()));
    }

    #[test]
    fn map_get_finds_entry() {
        let map = Value::Map(vec![("a".into(), Value::Int(1))]);
        assert_eq!(map.get("a"), Some(&Value::Int(1)));
        assert_eq!(map.get("b"), None);
    }

    #[test]
    fn option_into_value() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(3)), Value::Int(3));
    }

    #[test]
    fn float_accessor_widens_ints() {
        assert_eq!(Value::Int(2).as_float(), Some(2.0));
        assert_eq!(Value::Float(2.5).as_float(), Some(2.5));
        assert_eq!(Value::from("2").as_float(), None);
    }
}
