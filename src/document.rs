//! The generic document tree: what a YAML document looks like before it is
//! matched against a schema.
//!
//! Parsing is delegated to `serde_yaml`; this module only narrows its value
//! model down to the shapes the loader understands. Mapping keys are always
//! strings here (numeric and boolean keys are stringified), and mapping order
//! is the order in which keys appear in the text.

use serde_yaml::Value as Yaml;

use crate::error::YamlfigError;

/// A parsed document node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Sequence(Vec<Node>),
    Mapping(Vec<(String, Node)>),
}

impl Node {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&[(String, Node)]> {
        match self {
            Node::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    /// Look up a key in a mapping node.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_mapping()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Textual form of a scalar, as used when a string field receives a
    /// non-string value.
    pub fn scalar_text(&self) -> Option<String> {
        match self {
            Node::Null => Some("null".into()),
            Node::Bool(b) => Some(b.to_string()),
            Node::Int(i) => Some(i.to_string()),
            Node::Float(f) => Some(f.to_string()),
            Node::String(s) => Some(s.clone()),
            Node::Sequence(_) | Node::Mapping(_) => None,
        }
    }

    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            Node::Null => "null",
            Node::Bool(_) => "boolean",
            Node::Int(_) => "integer",
            Node::Float(_) => "float",
            Node::String(_) => "string",
            Node::Sequence(_) => "sequence",
            Node::Mapping(_) => "mapping",
        }
    }
}

/// Parse document text into a tree.
///
/// Returns `Ok(None)` when the document is empty or consists of a single
/// `null`, which callers treat as "no document" rather than a failure. A
/// top-level value that is not a mapping is rejected.
pub fn parse(text: &str) -> Result<Option<Node>, YamlfigError> {
    let blank = text.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#')
    });
    if blank {
        return Ok(None);
    }

    let raw: Yaml = serde_yaml::from_str(text)?;
    match convert(raw)? {
        Node::Null => Ok(None),
        Node::Mapping(entries) if entries.is_empty() => Ok(None),
        node @ Node::Mapping(_) => Ok(Some(node)),
        other => Err(YamlfigError::InvalidDocument(format!(
            "top level must be a mapping, found {}",
            other.kind_name()
        ))),
    }
}

fn convert(value: Yaml) -> Result<Node, YamlfigError> {
    Ok(match value {
        Yaml::Null => Node::Null,
        Yaml::Bool(b) => Node::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Node::Int(i)
            } else if let Some(f) = n.as_f64() {
                Node::Float(f)
            } else {
                return Err(YamlfigError::InvalidDocument(format!(
                    "unrepresentable number {n}"
                )));
            }
        }
        Yaml::String(s) => Node::String(s),
        Yaml::Sequence(items) => {
            Node::Sequence(items.into_iter().map(convert).collect::<Result<_, _>>()?)
        }
        Yaml::Mapping(map) => {
            let mut entries = Vec::with_capacity(map.len());
            for (key, value) in map {
                entries.push((convert_key(key)?, convert(value)?));
            }
            Node::Mapping(entries)
        }
        Yaml::Tagged(tagged) => convert(tagged.value)?,
    })
}

fn convert_key(key: Yaml) -> Result<String, YamlfigError> {
    match key {
        Yaml::String(s) => Ok(s),
        Yaml::Number(n) => Ok(n.to_string()),
        Yaml::Bool(b) => Ok(b.to_string()),
        Yaml::Null => Ok("null".into()),
        Yaml::Tagged(tagged) => convert_key(tagged.value),
        Yaml::Sequence(_) | Yaml::Mapping(_) => Err(YamlfigError::InvalidDocument(
            "mapping keys must be scalars".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_no_document() {
        assert_eq!(parse("").unwrap(), None);
        assert_eq!(parse("   \n\n").unwrap(), None);
    }

    #[test]
    fn null_document_is_no_document() {
        assert_eq!(parse("~\n").unwrap(), None);
        assert_eq!(parse("{}\n").unwrap(), None);
    }

    #[test]
    fn comments_only_is_no_document() {
        assert_eq!(parse("# nothing here\n").unwrap(), None);
    }

    #[test]
    fn mapping_preserves_key_order() {
        let node = parse("zeta: 1\nalpha: 2\nmid: 3\n").unwrap().unwrap();
        let keys: Vec<&str> = node
            .as_mapping()
            .unwrap()
            .iter()
            .map(|(k, _)| k.as_str())
            .collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn scalars_convert() {
        let node = parse("s: \"text\"\ni: 42\nf: 1.5\nb: true\nn: null\n")
            .unwrap()
            .unwrap();
        assert_eq!(node.get("s"), Some(&Node::String("text".into())));
        assert_eq!(node.get("i"), Some(&Node::Int(42)));
        assert_eq!(node.get("f"), Some(&Node::Float(1.5)));
        assert_eq!(node.get("b"), Some(&Node::Bool(true)));
        assert_eq!(node.get("n"), Some(&Node::Null));
    }

    #[test]
    fn numeric_keys_become_strings() {
        let node = parse("map:\n  1: one\n  \"2\": two\n").unwrap().unwrap();
        let map = node.get("map").unwrap();
        assert_eq!(map.get("1"), Some(&Node::String("one".into())));
        assert_eq!(map.get("2"), Some(&Node::String("two".into())));
    }

    #[test]
    fn nested_sequences_and_mappings() {
        let node = parse("list:\n  - a: 1\n  - a: 2\n").unwrap().unwrap();
        match node.get("list").unwrap() {
            Node::Sequence(items) => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[1].get("a"), Some(&Node::Int(2)));
            }
            other => panic!("Expected Sequence, got {other:?}"),
        }
    }

    #[test]
    fn top_level_scalar_is_rejected() {
        let err = parse("just a string\n").unwrap_err();
        assert!(matches!(err, YamlfigError::InvalidDocument(_)));
    }

    #[test]
    fn malformed_yaml_is_parse_error() {
        let err = parse("key: [unclosed\n").unwrap_err();
        assert!(matches!(err, YamlfigError::Parse(_)));
    }

    #[test]
    fn scalar_text_of_numbers() {
        assert_eq!(Node::Int(7).scalar_text().unwrap(), "7");
        assert_eq!(Node::Bool(false).scalar_text().unwrap(), "false");
        assert!(Node::Sequence(vec![]).scalar_text().is_none());
    }
}
