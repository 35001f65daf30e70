//! Render the live tree back to YAML text.
//!
//! Output is produced by hand rather than through `serde_yaml` so that
//! comments, blank lines and field order come out exactly as the schema
//! declares them. Fields are written in declaration order; nested blocks are
//! indented by two spaces per level; node-sequence entries are written as
//! nested blocks inside their list or map.
//!
//! When a prefix is active, a value whose live text equals its defaults text
//! after `{PRFX}` substitution is written with the defaults text, so the
//! symbolic `{PRFX}` survives a load/save cycle. A value that really changed
//! is written as its live text.

use crate::error::YamlfigError;
use crate::loader::{NEWLINE_TOKEN, PREFIX_TOKEN};
use crate::naming;
use crate::schema::{Comment, CommentAt, Field, FieldKind, Schema};
use crate::serializer::SerializerRegistry;
use crate::value::{Block, Value};

/// Render `live` as a document, diffing against `defaults`.
///
/// Absent `Create` blocks are instantiated in both trees first, so the
/// caller's trees match what was written.
pub(crate) fn write_document(
    schema: &Schema,
    serializers: &SerializerRegistry,
    live: &mut Block,
    defaults: &mut Block,
    prefix: Option<&str>,
) -> Result<String, YamlfigError> {
    ensure_blocks(schema, live);
    ensure_blocks(schema, defaults);

    let writer = Writer {
        schema,
        serializers,
        prefix,
    };
    let mut out = String::new();
    writer.write_block(&mut out, live, defaults, 0, "")?;
    Ok(out)
}

/// Instantiate every absent `Create` block below `block`.
pub(crate) fn ensure_blocks(schema: &Schema, block: &mut Block) {
    let def = schema.block(block.id);
    for (field, value) in def.fields().iter().zip(block.values.iter_mut()) {
        let FieldKind::Block(nested) = *field.kind() else {
            continue;
        };
        if value.is_null() && field.is_create() {
            *value = Value::Block(schema.instantiate(nested));
        }
        if let Value::Block(inner) = value {
            ensure_blocks(schema, inner);
        }
    }
}

/// Placement of a value being rendered.
#[derive(Debug, Clone, Copy, Default)]
struct Position {
    /// Inside a list or map rather than directly under a field.
    in_collection: bool,
    /// The enclosing collection is a map.
    in_map: bool,
    /// List nesting depth.
    nested: usize,
}

struct Writer<'a> {
    schema: &'a Schema,
    serializers: &'a SerializerRegistry,
    prefix: Option<&'a str>,
}

impl Writer<'_> {
    fn write_block(
        &self,
        out: &mut String,
        live: &Block,
        defaults: &Block,
        indent: usize,
        path: &str,
    ) -> Result<(), YamlfigError> {
        let spacing = " ".repeat(indent);
        let def = self.schema.block(live.id);

        for (idx, field) in def.fields().iter().enumerate() {
            if self.schema.is_skipped(field) {
                continue;
            }
            let value = &live.values[idx];
            let default = defaults
                .values
                .get(idx)
                .filter(|_| defaults.id == live.id)
                .unwrap_or(value);
            let field_path = join(path, &field.node_name());

            if let (FieldKind::Block(nested), Value::Block(block)) = (field.kind(), value)
                && self.serializers.for_field(field).is_none()
            {
                let block_def = self.schema.block(*nested);
                let default_block = match default {
                    Value::Block(b) => b,
                    _ => block,
                };
                push_new_lines(out, field.new_lines());
                push_comments(out, field.comments(), CommentAt::Prepend, &spacing);
                push_new_lines(out, block_def.new_lines());
                if indent == 0 {
                    out.push('\n');
                }
                push_comments(out, block_def.comments(), CommentAt::Prepend, &spacing);
                out.push_str(&spacing);
                out.push_str(&field.node_name());
                out.push(':');
                let inner_spacing = " ".repeat(indent + 2);
                push_trailing(out, field.comments().chain(block_def.comments()), &inner_spacing);
                self.write_block(out, block, default_block, indent + 2, &field_path)?;
                continue;
            }

            if value.is_null() && matches!(field.kind(), FieldKind::Block(_)) {
                continue;
            }

            push_new_lines(out, field.new_lines());
            push_comments(out, field.comments(), CommentAt::Prepend, &spacing);

            let live_text = self.render_field(field, value, &spacing, &field_path)?;
            let default_text = self.render_field(field, default, &spacing, &field_path)?;
            let text = self.reconcile(live_text, &default_text);

            out.push_str(&spacing);
            out.push_str(&field.node_name());
            out.push_str(if text.contains('\n') { ":" } else { ": " });
            out.push_str(&text);
            push_trailing(out, field.comments(), &spacing);
        }
        Ok(())
    }

    fn render_field(
        &self,
        field: &Field,
        value: &Value,
        spacing: &str,
        path: &str,
    ) -> Result<String, YamlfigError> {
        match self.serializers.for_field(field) {
            Some(hook) => {
                let raw = hook.serialize(value).map_err(|e| YamlfigError::Serializer {
                    key: path.to_string(),
                    reason: e.to_string(),
                })?;
                self.render(&raw, spacing, Position::default())
            }
            None => self.render(value, spacing, Position::default()),
        }
    }

    fn render(&self, value: &Value, spacing: &str, pos: Position) -> Result<String, YamlfigError> {
        Ok(match value {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Enum(name) => name.clone(),
            Value::String(s) if s.is_empty() => "\"\"".to_string(),
            Value::String(s) => naming::quote_with(s, NEWLINE_TOKEN),
            Value::Map(entries) if entries.is_empty() => "{}".to_string(),
            Value::Map(entries) => {
                let mut text = String::new();
                for (key, item) in entries {
                    let data = self.render(
                        item,
                        spacing,
                        Position {
                            in_collection: true,
                            in_map: true,
                            nested: 0,
                        },
                    )?;
                    text.push('\n');
                    text.push_str(spacing);
                    text.push_str("  ");
                    text.push_str(&naming::map_key(key));
                    text.push_str(if data.starts_with('\n') { ":" } else { ": " });
                    text.push_str(&data);
                }
                text
            }
            Value::List(items) if items.is_empty() => "[]".to_string(),
            Value::List(items) => {
                let item_spacing = " ".repeat(2 + pos.nested * 2);
                let mut text = String::new();
                for (i, item) in items.iter().enumerate() {
                    if i > 0 || pos.nested == 0 {
                        text.push('\n');
                        text.push_str(spacing);
                        text.push_str(&item_spacing);
                    }
                    text.push_str("- ");
                    text.push_str(&self.render(
                        item,
                        spacing,
                        Position {
                            in_collection: true,
                            in_map: false,
                            nested: pos.nested + 1,
                        },
                    )?);
                }
                text
            }
            Value::Block(block) => self.render_node(block, spacing, pos)?,
        })
    }

    /// A node-sequence entry: a nested block written as part of a list or map.
    fn render_node(&self, block: &Block, spacing: &str, pos: Position) -> Result<String, YamlfigError> {
        let mut text = String::new();
        self.write_block(&mut text, block, block, spacing.len() + 4, "")?;
        if text.ends_with('\n') {
            text.pop();
        }
        if pos.in_map || !pos.in_collection {
            Ok(format!("\n{text}"))
        } else {
            Ok(text.trim_start_matches(' ').to_string())
        }
    }

    /// Pick the defaults text wherever it means the same as the live text
    /// under the active prefix.
    fn reconcile(&self, live: String, defaults: &str) -> String {
        let Some(prefix) = self.prefix else {
            return live;
        };
        // Rendered text is escaped, so the prefix must be too.
        let prefix = naming::escape(prefix, NEWLINE_TOKEN);
        let same = |a: &str, b: &str| a.replace(PREFIX_TOKEN, &prefix) == b.replace(PREFIX_TOKEN, &prefix);

        if is_quoted(&live) {
            return if same(&live, defaults) {
                defaults.to_string()
            } else {
                live
            };
        }
        if live.contains('\n') {
            let live_lines: Vec<&str> = live.split('\n').collect();
            let default_lines: Vec<&str> = defaults.split('\n').collect();
            if live_lines.len() != default_lines.len() {
                return live;
            }
            return live_lines
                .iter()
                .zip(&default_lines)
                .map(|(l, d)| if same(l, d) { *d } else { *l })
                .collect::<Vec<_>>()
                .join("\n");
        }
        live
    }
}

fn is_quoted(text: &str) -> bool {
    text.len() >= 2 && text.starts_with('"') && text.ends_with('"')
}

fn join(base: &str, key: &str) -> String {
    if base.is_empty() {
        key.to_string()
    } else {
        format!("{base}.{key}")
    }
}

/// Floats always carry a fractional part so they read back as floats.
fn format_float(f: f64) -> String {
    if f.is_nan() {
        ".nan".to_string()
    } else if f.is_infinite() {
        let text = if f > 0.0 { ".inf" } else { "-.inf" };
        text.to_string()
    } else if f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{f:.1}")
    } else {
        f.to_string()
    }
}

fn push_new_lines(out: &mut String, count: usize) {
    for _ in 0..count {
        out.push('\n');
    }
}

fn push_comment_line(out: &mut String, spacing: &str, line: &str) {
    for part in line.split('\n') {
        out.push_str(spacing);
        out.push('#');
        if !part.is_empty() {
            out.push(' ');
            out.push_str(part);
        }
        out.push('\n');
    }
}

fn push_comments<'c>(
    out: &mut String,
    comments: impl Iterator<Item = &'c Comment>,
    at: CommentAt,
    spacing: &str,
) {
    for comment in comments.filter(|c| c.at == at) {
        for line in &comment.lines {
            push_comment_line(out, spacing, line);
        }
    }
}

/// Same-line comment, end of line, then append comments.
fn push_trailing<'c>(out: &mut String, comments: impl Iterator<Item = &'c Comment> + Clone, spacing: &str) {
    let same_line = comments
        .clone()
        .find(|c| c.at == CommentAt::SameLine)
        .and_then(|c| c.lines.first());
    if let Some(line) = same_line {
        out.push_str(" # ");
        out.push_str(line.lines().next().unwrap_or_default());
    }
    out.push('\n');
    push_comments(out, comments, CommentAt::Append, spacing);
}
