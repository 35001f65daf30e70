//! Populate the defaults and live trees from a parsed document.
//!
//! The document is walked twice against the schema:
//!
//! 1. **Defaults pass**: values are applied as written. `{PRFX}` tokens stay
//!    in place, so this tree shows what the document means with the prefix
//!    left symbolic. The writer diffs against it.
//! 2. **Live pass**: `{PRFX}` is replaced with the active prefix, the prefix
//!    designator key updates the active prefix for the rest of the pass, and
//!    `Placeholders` fields are registered. Defaults the document leaves out
//!    get the prefix the document ends with. This is the tree the
//!    application reads.
//!
//! `{NL}` is turned back into a line break in both passes.
//!
//! A key that does not resolve, or a value that does not fit its field, is
//! skipped with a diagnostic; the first such failure of a load also copies
//! the document to a `_backup_` file. Nothing here aborts a load.

use std::borrow::Cow;
use std::path::Path;

use crate::backup::{self, BackupKind, BackupProvider};
use crate::diagnostics::{Diagnostic, DiagnosticSink, Recorder};
use crate::document::Node;
use crate::placeholders::{PlaceholderKey, PlaceholderRegistry};
use crate::schema::{BlockId, ElementType, Field, FieldKind, ScalarType, Schema};
use crate::serializer::SerializerRegistry;
use crate::value::{Block, Value};

pub(crate) const PREFIX_TOKEN: &str = "{PRFX}";
pub(crate) const NEWLINE_TOKEN: &str = "{NL}";

/// Result of walking a document.
#[derive(Debug)]
pub(crate) struct Loaded {
    pub defaults: Block,
    pub live: Block,
    /// Active prefix at the end of the live pass.
    pub prefix: Option<String>,
    /// Registry keys for every `Placeholders` field that was loaded, by path.
    pub placeholders: Vec<(String, PlaceholderKey)>,
    pub diagnostics: Vec<Diagnostic>,
}

/// The file a document came from, used for the one-time backup.
pub(crate) struct DocumentHandle<'a> {
    pub path: &'a Path,
    pub backups: &'a mut dyn BackupProvider,
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Defaults,
    Live,
}

pub(crate) struct Loader<'a> {
    schema: &'a Schema,
    serializers: &'a SerializerRegistry,
    registry: &'a PlaceholderRegistry,
    prefix_key: Option<&'a str>,
    document: Option<DocumentHandle<'a>>,
    recorder: Recorder<'a>,
    prefix: Option<String>,
    /// Prefix in force once the live pass is done.
    final_prefix: Option<String>,
    pass: Pass,
    backed_up: bool,
    placeholders: Vec<(String, PlaceholderKey)>,
}

impl<'a> Loader<'a> {
    pub(crate) fn new(
        schema: &'a Schema,
        serializers: &'a SerializerRegistry,
        registry: &'a PlaceholderRegistry,
        sink: &'a mut dyn DiagnosticSink,
    ) -> Self {
        Self {
            schema,
            serializers,
            registry,
            prefix_key: None,
            document: None,
            recorder: Recorder::new(sink),
            prefix: None,
            final_prefix: None,
            pass: Pass::Defaults,
            backed_up: false,
            placeholders: Vec::new(),
        }
    }

    /// Dotted path of the field whose value becomes the active prefix.
    pub(crate) fn prefix_key(mut self, key: Option<&'a str>) -> Self {
        self.prefix_key = key;
        self
    }

    /// Prefix active at the start of the live pass.
    pub(crate) fn prefix(mut self, prefix: Option<String>) -> Self {
        self.prefix = prefix;
        self
    }

    pub(crate) fn document(mut self, handle: DocumentHandle<'a>) -> Self {
        self.document = Some(handle);
        self
    }

    /// Run both passes over a top-level mapping.
    pub(crate) fn load(mut self, entries: &[(String, Node)]) -> Loaded {
        let root = self.schema.root();

        self.pass = Pass::Defaults;
        let mut defaults = self.schema.instantiate(root);
        self.process_map(entries, &mut defaults, "", true);

        self.pass = Pass::Live;
        self.final_prefix = self
            .prefix_key
            .and_then(|key| designated(entries, "", key))
            .map(|s| s.replace(NEWLINE_TOKEN, "\n"))
            .or_else(|| self.prefix.clone());
        let mut live = self.fresh(root);
        self.process_map(entries, &mut live, "", true);

        Loaded {
            defaults,
            live,
            prefix: self.prefix,
            placeholders: self.placeholders,
            diagnostics: self.recorder.into_records(),
        }
    }

    fn process_map(&mut self, entries: &[(String, Node)], instance: &mut Block, base: &str, at_root: bool) {
        for (key, raw) in entries {
            let path = join(base, key);
            let node = self.prepare(raw);
            if at_root
                && self.pass == Pass::Live
                && self.prefix_key == Some(path.as_str())
                && let Node::String(s) = raw
            {
                // the designator is taken before the old prefix is applied
                self.prefix = Some(s.replace(NEWLINE_TOKEN, "\n"));
            }
            self.set_by_key(instance, key, &path, &node, at_root);
        }
    }

    /// A default instance. In the live pass its `{PRFX}` strings already
    /// carry the final prefix, so values the document omits follow it.
    fn fresh(&self, id: BlockId) -> Block {
        let mut block = self.schema.instantiate(id);
        if self.pass == Pass::Live
            && let Some(prefix) = &self.final_prefix
        {
            substitute_block(self.schema, &mut block, prefix);
        }
        block
    }

    /// Unescape `{NL}` and, in the live pass, substitute `{PRFX}`.
    fn prepare<'n>(&self, node: &'n Node) -> Cow<'n, Node> {
        let Node::String(s) = node else {
            return Cow::Borrowed(node);
        };
        if !s.contains(NEWLINE_TOKEN) && !(self.pass == Pass::Live && s.contains(PREFIX_TOKEN)) {
            return Cow::Borrowed(node);
        }
        let mut text = s.replace(NEWLINE_TOKEN, "\n");
        if self.pass == Pass::Live
            && let Some(prefix) = &self.prefix
        {
            text = text.replace(PREFIX_TOKEN, prefix);
        }
        Cow::Owned(Node::String(text))
    }

    /// Apply one document entry. `key` may itself be dotted; all but its
    /// last segment must name block fields.
    fn set_by_key(&mut self, instance: &mut Block, key: &str, path: &str, node: &Node, at_root: bool) {
        let schema = self.schema;
        let segments: Vec<&str> = key.split('.').collect();
        let Some((leaf, parents)) = segments.split_last() else {
            return;
        };

        let mut current = instance;
        for segment in parents {
            let def = schema.block(current.id);
            let Some(idx) = def.field_index(segment) else {
                return self.unresolved(path, format!("unknown key '{segment}'"));
            };
            let field = &def.fields()[idx];
            let FieldKind::Block(nested) = *field.kind() else {
                return self.unresolved(path, format!("'{segment}' is not a block"));
            };
            if schema.is_skipped(field) || field.is_final() {
                return self.skipped(path);
            }
            if !matches!(current.values[idx], Value::Block(_)) {
                current.values[idx] = Value::Block(self.fresh(nested));
            }
            current = match &mut current.values[idx] {
                Value::Block(block) => block,
                _ => return,
            };
        }

        let def = schema.block(current.id);
        let Some(idx) = def.field_index(leaf) else {
            return self.unresolved(path, format!("unknown key '{leaf}'"));
        };
        let field = &def.fields()[idx];
        if schema.is_skipped(field) || field.is_final() {
            return self.skipped(path);
        }

        if let (FieldKind::Block(nested), Node::Mapping(entries)) = (field.kind(), node)
            && self.serializers.for_field(field).is_none()
        {
            if !matches!(current.values[idx], Value::Block(_)) {
                current.values[idx] = Value::Block(self.fresh(*nested));
            }
            if let Value::Block(block) = &mut current.values[idx] {
                self.process_map(entries, block, path, at_root);
            }
            return;
        }

        match self.coerce(field, node, path) {
            Ok(value) => {
                self.register_placeholders(field, &value, path);
                current.values[idx] = value;
            }
            Err(reason) => self.unresolved(path, reason),
        }
    }

    fn register_placeholders(&mut self, field: &Field, value: &Value, path: &str) {
        if self.pass != Pass::Live || !matches!(value, Value::String(_)) {
            return;
        }
        let Some(tokens) = field.placeholder_tokens() else {
            return;
        };
        match self.registry.add(tokens) {
            Ok(key) => self.placeholders.push((path.to_string(), key)),
            Err(e) => self
                .recorder
                .record_with_cause(Diagnostic::warn(Some(path), "failed to register placeholders"), Some(&e)),
        }
    }

    fn coerce(&mut self, field: &Field, node: &Node, path: &str) -> Result<Value, String> {
        if let Some(hook) = self.serializers.for_field(field) {
            return hook
                .deserialize(&Value::from_node(node))
                .map_err(|e| format!("serializer failed: {e}"));
        }

        match field.kind() {
            FieldKind::Scalar(scalar) => coerce_scalar(scalar, node),
            FieldKind::Block(nested) => match node {
                Node::Null if field.is_create() => Ok(Value::Block(self.fresh(*nested))),
                Node::Null => Ok(Value::Null),
                other => Err(format!("expected a mapping, found {}", other.kind_name())),
            },
            FieldKind::List(element) => match node {
                Node::Null => Ok(Value::Null),
                Node::Sequence(items) => items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| self.coerce_element(element, item, &join(path, &i.to_string())))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::List),
                other => Err(format!("expected a sequence, found {}", other.kind_name())),
            },
            FieldKind::Map(element) => match node {
                Node::Null => Ok(Value::Null),
                Node::Mapping(entries) => entries
                    .iter()
                    .map(|(key, item)| {
                        let value = self.coerce_element(element, item, &join(path, key))?;
                        Ok((key.clone(), value))
                    })
                    .collect::<Result<Vec<_>, String>>()
                    .map(Value::Map),
                other => Err(format!("expected a mapping, found {}", other.kind_name())),
            },
        }
    }

    fn coerce_element(&mut self, element: &ElementType, node: &Node, path: &str) -> Result<Value, String> {
        match element {
            ElementType::Scalar(scalar) => coerce_scalar(scalar, &self.prepare(node)),
            ElementType::Node(id) => match node {
                Node::Mapping(entries) => {
                    let mut instance = self.fresh(*id);
                    self.process_map(entries, &mut instance, path, false);
                    Ok(Value::Block(instance))
                }
                other => Err(format!(
                    "expected a mapping for {}, found {}",
                    self.schema.block(*id).name(),
                    other.kind_name()
                )),
            },
        }
    }

    fn skipped(&mut self, path: &str) {
        if self.pass == Pass::Live {
            self.recorder
                .record(Diagnostic::debug(Some(path), "skipped ignored or final option"));
        }
    }

    /// Record a resolution failure and make the one backup for this load.
    /// Only the live pass reports, since both passes see the same document.
    fn unresolved(&mut self, path: &str, reason: String) {
        if self.pass != Pass::Live {
            return;
        }
        self.recorder.record(Diagnostic::warn(
            Some(path),
            format!("failed to set option: {reason}"),
        ));
        self.backup_once();
    }

    fn backup_once(&mut self) {
        if self.backed_up {
            return;
        }
        self.backed_up = true;
        let Some(doc) = self.document.as_mut() else {
            return;
        };
        let target = backup::backup_path(doc.path, BackupKind::Backup, &doc.timestamp);
        if doc.backups.exists(&target) {
            return;
        }
        match doc.backups.copy(doc.path, &target) {
            Ok(true) => self.recorder.record(Diagnostic::warn(
                None,
                format!(
                    "unable to load some of the config options, file was copied to {}",
                    target.display()
                ),
            )),
            Ok(false) => {}
            Err(e) => self.recorder.record_with_cause(
                Diagnostic::warn(None, "unable to load some of the config options and to make a copy"),
                Some(&e),
            ),
        }
    }
}

/// Text of the last string the document assigns to the prefix designator,
/// either through a dotted key or nested mappings.
fn designated<'n>(entries: &'n [(String, Node)], base: &str, key: &str) -> Option<&'n str> {
    let mut found = None;
    for (k, node) in entries {
        let path = join(base, k);
        if path == key {
            if let Node::String(s) = node {
                found = Some(s.as_str());
            }
        } else if let Node::Mapping(nested) = node
            && key.strip_prefix(path.as_str()).is_some_and(|rest| rest.starts_with('.'))
            && let Some(s) = designated(nested, &path, key)
        {
            found = Some(s);
        }
    }
    found
}

/// Substitute `{PRFX}` in a default instance. `Final` and ignored fields
/// keep their text.
fn substitute_block(schema: &Schema, block: &mut Block, prefix: &str) {
    let def = schema.block(block.id);
    for (field, value) in def.fields().iter().zip(block.values.iter_mut()) {
        if schema.is_skipped(field) || field.is_final() {
            continue;
        }
        substitute_value(schema, value, prefix);
    }
}

fn substitute_value(schema: &Schema, value: &mut Value, prefix: &str) {
    match value {
        Value::String(s) if s.contains(PREFIX_TOKEN) => *s = s.replace(PREFIX_TOKEN, prefix),
        Value::List(items) => {
            for item in items {
                substitute_value(schema, item, prefix);
            }
        }
        Value::Map(entries) => {
            for (_, item) in entries {
                substitute_value(schema, item, prefix);
            }
        }
        Value::Block(block) => substitute_block(schema, block, prefix),
        _ => {}
    }
}

fn join(base: &str, key: &str) -> String {
    if base.is_empty() {
        key.to_string()
    } else {
        format!("{base}.{key}")
    }
}

/// Built-in coercion of a document scalar to a scalar field type.
pub(crate) fn coerce_scalar(scalar: &ScalarType, node: &Node) -> Result<Value, String> {
    if node.is_null() {
        return Ok(Value::Null);
    }
    let mismatch = || format!("expected {}, found {}", scalar.type_name(), node.kind_name());
    match scalar {
        ScalarType::String => node.scalar_text().map(Value::String).ok_or_else(mismatch),
        ScalarType::Int => match node {
            Node::Int(i) => Ok(Value::Int(*i)),
            Node::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(Value::Int(*f as i64)),
            Node::String(s) => s.trim().parse().map(Value::Int).map_err(|_| mismatch()),
            _ => Err(mismatch()),
        },
        ScalarType::Float => match node {
            Node::Float(f) => Ok(Value::Float(*f)),
            Node::Int(i) => Ok(Value::Float(*i as f64)),
            Node::String(s) => s.trim().parse().map(Value::Float).map_err(|_| mismatch()),
            _ => Err(mismatch()),
        },
        ScalarType::Bool => match node {
            Node::Bool(b) => Ok(Value::Bool(*b)),
            Node::String(s) if s.eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
            Node::String(s) if s.eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
            _ => Err(mismatch()),
        },
        ScalarType::Enum(members) => {
            let text = node.scalar_text().ok_or_else(mismatch)?;
            if text.is_empty() || text == "null" {
                return Ok(Value::Null);
            }
            members
                .iter()
                .find(|m| m.eq_ignore_ascii_case(&text))
                .map(|m| Value::Enum(m.clone()))
                .ok_or_else(|| format!("'{text}' is not one of {}", members.join(", ")))
        }
        ScalarType::Custom(_) => Ok(Value::from_node(node)),
    }
}
