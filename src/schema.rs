//! The schema: a static description of the configuration tree.
//!
//! A [`Schema`] is an arena of [`BlockDef`]s referenced by [`BlockId`]. Each
//! block lists its [`Field`]s in declaration order, which is also the order
//! the writer emits them in. Per-field behavior is expressed with
//! [`Directive`]s:
//!
//! | Directive | Effect |
//! |-----------|--------|
//! | `Ignore` | never loaded, never written |
//! | `Final` | always keeps its schema default; document values are skipped |
//! | `Create` | block field is instantiated with defaults when absent |
//! | `NewLine(n)` | `n` blank lines before the field when writing |
//! | `Comment` | comment lines before, beside, or after the field |
//! | `Placeholders` | string value gets named tokens in the placeholder registry |
//! | `CustomSerializer(id)` | value passes through a named serializer hook |
//!
//! Blocks are declared bottom-up so that a field can reference an
//! already-finished block:
//!
//! ```ignore
//! let mut b = Schema::builder();
//! let database = b
//!     .block("database")
//!     .field(Field::string("url", "postgres://localhost"))
//!     .field(Field::int("pool_size", 5))
//!     .finish();
//! let root = b
//!     .block("root")
//!     .field(Field::string("prefix", ">>"))
//!     .field(Field::block("database", database).create())
//!     .finish();
//! let schema = b.build(root)?;
//! ```
//!
//! [`SchemaBuilder::build`] runs a validation pass; directive misuse (for
//! example `Placeholders` on an integer field) is a schema definition error
//! and fails the build instead of surfacing at load time.

use std::collections::HashSet;

use crate::error::YamlfigError;
use crate::naming;
use crate::placeholders;
use crate::value::{Block, Value};

/// Index of a block definition within a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(usize);

/// Where a comment is written relative to its field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentAt {
    Prepend,
    /// Same line as the value. Only the first line of the first same-line
    /// comment is written.
    SameLine,
    Append,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub lines: Vec<String>,
    pub at: CommentAt,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    Ignore,
    Final,
    Create,
    NewLine(usize),
    Comment(Comment),
    Placeholders(Vec<String>),
    CustomSerializer(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScalarType {
    String,
    Int,
    Float,
    Bool,
    /// Enum with the given member names; matched case-insensitively.
    Enum(Vec<String>),
    /// A named type whose conversion is expected to come from a serializer
    /// registered under the same name.
    Custom(String),
}

impl ScalarType {
    /// Name used to look up type-level serializers.
    pub fn type_name(&self) -> &str {
        match self {
            ScalarType::String => "string",
            ScalarType::Int => "int",
            ScalarType::Float => "float",
            ScalarType::Bool => "bool",
            ScalarType::Enum(_) => "enum",
            ScalarType::Custom(name) => name,
        }
    }
}

/// Element type of a list or map field.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementType {
    Scalar(ScalarType),
    /// A node sequence: every element is an instance of this block.
    Node(BlockId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Scalar(ScalarType),
    Block(BlockId),
    List(ElementType),
    Map(ElementType),
}

/// One member of a block.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    ident: String,
    kind: FieldKind,
    default: Value,
    directives: Vec<Directive>,
}

impl Field {
    pub fn new(ident: impl Into<String>, kind: FieldKind, default: impl Into<Value>) -> Self {
        Self {
            ident: ident.into(),
            kind,
            default: default.into(),
            directives: Vec::new(),
        }
    }

    pub fn string(ident: impl Into<String>, default: &str) -> Self {
        Self::new(ident, FieldKind::Scalar(ScalarType::String), default)
    }

    pub fn int(ident: impl Into<String>, default: i64) -> Self {
        Self::new(ident, FieldKind::Scalar(ScalarType::Int), default)
    }

    pub fn float(ident: impl Into<String>, default: f64) -> Self {
        Self::new(ident, FieldKind::Scalar(ScalarType::Float), default)
    }

    pub fn bool(ident: impl Into<String>, default: bool) -> Self {
        Self::new(ident, FieldKind::Scalar(ScalarType::Bool), default)
    }

    /// Enum field. `default` is matched case-insensitively against `members`;
    /// `None` leaves the field absent.
    pub fn enumeration(ident: impl Into<String>, members: &[&str], default: Option<&str>) -> Self {
        let members: Vec<String> = members.iter().map(|m| m.to_string()).collect();
        let default = match default {
            Some(name) => Value::Enum(
                members
                    .iter()
                    .find(|m| m.eq_ignore_ascii_case(name))
                    .cloned()
                    .unwrap_or_else(|| name.to_string()),
            ),
            None => Value::Null,
        };
        Self::new(ident, FieldKind::Scalar(ScalarType::Enum(members)), default)
    }

    /// Nested block field. Absent unless the document provides it or the
    /// field is marked with [`create`](Self::create).
    pub fn block(ident: impl Into<String>, block: BlockId) -> Self {
        Self::new(ident, FieldKind::Block(block), Value::Null)
    }

    pub fn list(ident: impl Into<String>, element: ElementType, default: Vec<Value>) -> Self {
        Self::new(ident, FieldKind::List(element), Value::List(default))
    }

    pub fn map<K: Into<String>>(
        ident: impl Into<String>,
        element: ElementType,
        default: Vec<(K, Value)>,
    ) -> Self {
        let entries = default.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self::new(ident, FieldKind::Map(element), Value::Map(entries))
    }

    pub fn custom(ident: impl Into<String>, type_name: &str, default: impl Into<Value>) -> Self {
        Self::new(
            ident,
            FieldKind::Scalar(ScalarType::Custom(type_name.to_string())),
            default,
        )
    }

    pub fn directive(mut self, directive: Directive) -> Self {
        self.directives.push(directive);
        self
    }

    pub fn ignore(self) -> Self {
        self.directive(Directive::Ignore)
    }

    pub fn final_field(self) -> Self {
        self.directive(Directive::Final)
    }

    pub fn create(self) -> Self {
        self.directive(Directive::Create)
    }

    pub fn new_line(self, amount: usize) -> Self {
        self.directive(Directive::NewLine(amount))
    }

    pub fn comment<I, S>(self, at: CommentAt, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.directive(Directive::Comment(Comment {
            lines: lines.into_iter().map(Into::into).collect(),
            at,
        }))
    }

    pub fn placeholders<I, S>(self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.directive(Directive::Placeholders(
            tokens.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn serializer(self, id: &str) -> Self {
        self.directive(Directive::CustomSerializer(id.to_string()))
    }

    pub fn ident(&self) -> &str {
        &self.ident
    }

    pub fn node_name(&self) -> String {
        naming::node_name(&self.ident)
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn default_value(&self) -> &Value {
        &self.default
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    pub fn is_ignored(&self) -> bool {
        self.directives.contains(&Directive::Ignore)
    }

    pub fn is_final(&self) -> bool {
        self.directives.contains(&Directive::Final)
    }

    pub fn is_create(&self) -> bool {
        self.directives.contains(&Directive::Create)
    }

    pub fn new_lines(&self) -> usize {
        new_lines(&self.directives)
    }

    pub fn comments(&self) -> impl Iterator<Item = &Comment> + Clone {
        comments(&self.directives)
    }

    pub fn placeholder_tokens(&self) -> Option<&[String]> {
        self.directives.iter().find_map(|d| match d {
            Directive::Placeholders(tokens) => Some(tokens.as_slice()),
            _ => None,
        })
    }

    pub fn serializer_id(&self) -> Option<&str> {
        self.directives.iter().find_map(|d| match d {
            Directive::CustomSerializer(id) => Some(id.as_str()),
            _ => None,
        })
    }

    /// Type name for type-level serializer lookup. Only scalar fields have one.
    pub fn type_name(&self) -> Option<&str> {
        match &self.kind {
            FieldKind::Scalar(scalar) => Some(scalar.type_name()),
            _ => None,
        }
    }
}

/// A block definition: an ordered list of fields plus the directives that
/// apply wherever the block appears.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockDef {
    name: String,
    fields: Vec<Field>,
    directives: Vec<Directive>,
}

impl BlockDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Index of the field a document key refers to.
    pub fn field_index(&self, key: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| naming::key_matches(key, &f.ident))
    }

    pub fn new_lines(&self) -> usize {
        new_lines(&self.directives)
    }

    pub fn comments(&self) -> impl Iterator<Item = &Comment> + Clone {
        comments(&self.directives)
    }

    pub fn is_ignored(&self) -> bool {
        self.directives.contains(&Directive::Ignore)
    }
}

fn new_lines(directives: &[Directive]) -> usize {
    directives
        .iter()
        .map(|d| match d {
            Directive::NewLine(n) => *n,
            _ => 0,
        })
        .sum()
}

fn comments(directives: &[Directive]) -> impl Iterator<Item = &Comment> + Clone {
    directives.iter().filter_map(|d| match d {
        Directive::Comment(c) => Some(c),
        _ => None,
    })
}

/// A validated schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    blocks: Vec<BlockDef>,
    root: BlockId,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    pub fn root(&self) -> BlockId {
        self.root
    }

    pub fn block(&self, id: BlockId) -> &BlockDef {
        &self.blocks[id.0]
    }

    /// Every block definition, in declaration order.
    pub fn blocks(&self) -> impl Iterator<Item = &BlockDef> {
        self.blocks.iter()
    }

    /// A fresh instance of a block holding schema defaults, with every
    /// `Create` block instantiated.
    pub fn instantiate(&self, id: BlockId) -> Block {
        instantiate(&self.blocks, id)
    }

    /// Whether the block type a field holds is itself marked `Ignore`.
    pub fn block_ignored(&self, field: &Field) -> bool {
        match field.kind {
            FieldKind::Block(id) => self.block(id).is_ignored(),
            _ => false,
        }
    }

    /// Whether a field takes part in loading and saving at all.
    pub fn is_skipped(&self, field: &Field) -> bool {
        field.is_ignored() || self.block_ignored(field)
    }

    /// Find the field definition a dotted path refers to, walking block
    /// fields and node-sequence entries.
    pub fn field_at(&self, path: &str) -> Option<&Field> {
        let mut block = self.block(self.root);
        let mut segments = path.split('.').peekable();
        while let Some(segment) = segments.next() {
            let field = &block.fields[block.field_index(segment)?];
            if segments.peek().is_none() {
                return Some(field);
            }
            block = match &field.kind {
                FieldKind::Block(id) => self.block(*id),
                FieldKind::List(ElementType::Node(id)) | FieldKind::Map(ElementType::Node(id)) => {
                    // skip the entry key or index
                    segments.next()?;
                    if segments.peek().is_none() {
                        return None;
                    }
                    self.block(*id)
                }
                _ => return None,
            };
        }
        None
    }
}

fn instantiate(blocks: &[BlockDef], id: BlockId) -> Block {
    let def = &blocks[id.0];
    let values = def
        .fields
        .iter()
        .map(|field| match field.kind {
            FieldKind::Block(nested) if field.is_create() && field.default.is_null() => {
                Value::Block(instantiate(blocks, nested))
            }
            _ => field.default.clone(),
        })
        .collect();
    Block::new(id, values)
}

/// Builds a [`Schema`] block by block.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    blocks: Vec<BlockDef>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a block definition. Call [`BlockBuilder::finish`] to add it.
    pub fn block(&mut self, name: &str) -> BlockBuilder<'_> {
        BlockBuilder {
            builder: self,
            def: BlockDef {
                name: name.to_string(),
                fields: Vec::new(),
                directives: Vec::new(),
            },
        }
    }

    /// Seed a node-sequence entry for use in a list or map default.
    ///
    /// Starts from the block's defaults and assigns `values` positionally to
    /// the fields that are neither `Final` nor `Ignore`. A `Create` field only
    /// consumes a value that is an instance of its block; otherwise it keeps
    /// its default instance and the value moves on to the next field. `Null`
    /// values keep the default.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not returned by this builder.
    pub fn node<I>(&self, id: BlockId, values: I) -> Value
    where
        I: IntoIterator<Item = Value>,
    {
        let mut block = instantiate(&self.blocks, id);
        let def = &self.blocks[id.0];
        let mut values = values.into_iter().peekable();
        for (idx, field) in def.fields.iter().enumerate() {
            if field.is_final() || field.is_ignored() {
                continue;
            }
            if let FieldKind::Block(nested) = field.kind
                && field.is_create()
            {
                let matches = matches!(values.peek(), Some(Value::Block(b)) if b.id == nested);
                if !matches {
                    continue;
                }
            }
            match values.next() {
                Some(Value::Null) => {}
                Some(value) => block.values[idx] = value,
                None => break,
            }
        }
        Value::Block(block)
    }

    /// Validate every block and produce the schema rooted at `root`.
    pub fn build(self, root: BlockId) -> Result<Schema, YamlfigError> {
        if root.0 >= self.blocks.len() {
            return Err(YamlfigError::Schema(format!("unknown root block {}", root.0)));
        }
        for def in &self.blocks {
            validate_block(&self.blocks, def)?;
        }
        Ok(Schema {
            blocks: self.blocks,
            root,
        })
    }
}

/// Builder for one block definition.
pub struct BlockBuilder<'a> {
    builder: &'a mut SchemaBuilder,
    def: BlockDef,
}

impl BlockBuilder<'_> {
    pub fn field(mut self, field: Field) -> Self {
        self.def.fields.push(field);
        self
    }

    pub fn new_line(mut self, amount: usize) -> Self {
        self.def.directives.push(Directive::NewLine(amount));
        self
    }

    pub fn comment<I, S>(mut self, at: CommentAt, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.def.directives.push(Directive::Comment(Comment {
            lines: lines.into_iter().map(Into::into).collect(),
            at,
        }));
        self
    }

    /// Exclude every field holding this block type from load and save.
    pub fn ignore(mut self) -> Self {
        self.def.directives.push(Directive::Ignore);
        self
    }

    pub fn finish(self) -> BlockId {
        let id = BlockId(self.builder.blocks.len());
        self.builder.blocks.push(self.def);
        id
    }
}

fn validate_block(blocks: &[BlockDef], def: &BlockDef) -> Result<(), YamlfigError> {
    let fail = |field: &Field, reason: String| {
        YamlfigError::Schema(format!("{}.{}: {reason}", def.name, field.ident))
    };

    let mut seen = HashSet::new();
    for field in &def.fields {
        if field.ident.is_empty() {
            return Err(YamlfigError::Schema(format!("{}: empty field name", def.name)));
        }
        if !seen.insert(field.ident.to_lowercase().replace('-', "_")) {
            return Err(fail(field, "duplicate node name".into()));
        }
        check_kind_refs(blocks, &field.kind).map_err(|reason| fail(field, reason))?;

        if field.is_create() && !matches!(field.kind, FieldKind::Block(_)) {
            return Err(fail(field, "Create is only valid on block fields".into()));
        }
        if let Some(tokens) = field.placeholder_tokens() {
            if field.kind != FieldKind::Scalar(ScalarType::String) {
                return Err(fail(field, "is incompatible with placeholders".into()));
            }
            for token in tokens {
                placeholders::to_placeholder_name(token)
                    .map_err(|e| fail(field, e.to_string()))?;
            }
        }
        check_value(blocks, &field.kind, &field.default).map_err(|reason| fail(field, reason))?;
    }
    Ok(())
}

fn check_kind_refs(blocks: &[BlockDef], kind: &FieldKind) -> Result<(), String> {
    let id = match kind {
        FieldKind::Block(id)
        | FieldKind::List(ElementType::Node(id))
        | FieldKind::Map(ElementType::Node(id)) => *id,
        _ => return Ok(()),
    };
    if id.0 < blocks.len() {
        Ok(())
    } else {
        Err(format!("references unknown block {}", id.0))
    }
}

fn check_value(blocks: &[BlockDef], kind: &FieldKind, value: &Value) -> Result<(), String> {
    if value.is_null() {
        return Ok(());
    }
    match (kind, value) {
        (FieldKind::Scalar(scalar), value) => check_scalar(scalar, value),
        (FieldKind::Block(id), Value::Block(block)) => check_block(blocks, *id, block),
        (FieldKind::List(element), Value::List(items)) => items
            .iter()
            .try_for_each(|item| check_element(blocks, element, item)),
        (FieldKind::Map(element), Value::Map(entries)) => entries
            .iter()
            .try_for_each(|(_, item)| check_element(blocks, element, item)),
        (kind, value) => Err(format!("default {value} does not fit {kind:?}")),
    }
}

fn check_element(blocks: &[BlockDef], element: &ElementType, value: &Value) -> Result<(), String> {
    match element {
        ElementType::Scalar(scalar) => check_scalar(scalar, value),
        ElementType::Node(id) => match value {
            Value::Block(block) => check_block(blocks, *id, block),
            other => Err(format!("node sequence entry {other} is not a block")),
        },
    }
}

fn check_scalar(scalar: &ScalarType, value: &Value) -> Result<(), String> {
    let ok = match (scalar, value) {
        (_, Value::Null) => true,
        (ScalarType::String, Value::String(_)) => true,
        (ScalarType::Int, Value::Int(_)) => true,
        (ScalarType::Float, Value::Float(_) | Value::Int(_)) => true,
        (ScalarType::Bool, Value::Bool(_)) => true,
        (ScalarType::Enum(members), Value::Enum(name)) => members.contains(name),
        (ScalarType::Custom(_), _) => true,
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(format!("default {value} is not a valid {}", scalar.type_name()))
    }
}

fn check_block(blocks: &[BlockDef], id: BlockId, block: &Block) -> Result<(), String> {
    if block.id != id {
        return Err(format!(
            "expected an instance of {}, found {}",
            blocks[id.0].name, blocks[block.id.0].name
        ));
    }
    let def = &blocks[id.0];
    for (field, value) in def.fields.iter().zip(&block.values) {
        check_value(blocks, &field.kind, value)?;
    }
    Ok(())
}
