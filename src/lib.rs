//! Declarative, comment-preserving YAML configuration for Rust applications.
//! Describe your settings once, point at a file, and go.
//!
//! Yamlfig binds a [`Schema`] (blocks of typed fields with defaults,
//! comments and directives) to a YAML document. Loading fills a live tree
//! the application reads; saving writes a normalized, commented document
//! that keeps the user's edits and refreshes everything they left alone.
//!
//! ```ignore
//! let mut config = Yamlfig::builder(schema)
//!     .app_name("myapp")
//!     .build()?;
//! let path = config.path().unwrap().to_owned();
//! config.reload(&path)?;
//! let port = config.get("server.port");
//! ```
//!
//! That reload reads `myapp.yml` from the platform config directory (or
//! creates it), applies it over the schema defaults, and writes it back with
//! every field, comment and blank line in place.
//!
//! # Schema as source of truth
//!
//! A [`Schema`] is an arena of blocks built with [`SchemaBuilder`]. Each
//! block is a list of [`Field`]s, and each field carries:
//!
//! - a **type**: scalar (`String`, `Int`, `Float`, `Bool`, an enum, or a
//!   custom type name), a nested block, a list, or a string-keyed map. List
//!   and map elements may themselves be blocks ("node sequences").
//! - a **default**, always present in the live tree until a document
//!   overrides it.
//! - **directives**: `Ignore`, `Final`, `Create`, `NewLine`, `Comment`,
//!   `Placeholders` and `CustomSerializer`.
//!
//! Field identifiers map to document keys by lowercasing and turning `_`
//! into `-`, so `string_field` is written as `string-field`. Lookups accept
//! either spelling.
//!
//! # The two trees
//!
//! Every load builds two trees from the same document:
//!
//! - the **defaults tree** holds the document's values as written, with
//!   `{PRFX}` left in place;
//! - the **live tree** has `{PRFX}` replaced by the active prefix. This is
//!   what [`Config::get`] and [`Config::extract`] read.
//!
//! When saving, a value whose live text equals its defaults text after
//! prefix substitution is written in its symbolic form. A changed prefix
//! therefore flows through to every untouched value on the next load, while
//! values the user edited by hand are kept verbatim.
//!
//! # Prefix
//!
//! The prefix is a piece of text (say `"[MyPlugin]"`) that fields embed as
//! `{PRFX}`. By default the root field `prefix` carries it: a document that
//! sets `prefix: "P2"` switches substitution to `P2` for every key after it.
//! Choose another field with
//! [`prefix_key()`](YamlfigBuilder::prefix_key), or disable the designator
//! with [`no_prefix()`](YamlfigBuilder::no_prefix) and pass the prefix to
//! [`Config::load_with_prefix`] instead.
//!
//! `{NL}` in any loaded string becomes a line break.
//!
//! # Placeholders
//!
//! A field with the `Placeholders` directive registers its tokens in a
//! [`PlaceholderRegistry`] on every load. [`Config::replace`] substitutes
//! positional arguments for them:
//!
//! ```ignore
//! // string-with-placeholders: "This is {TEST} with {TEST2}"
//! config.replace("string-with-placeholders", &[&"one", &"two"])?;
//! // => "This is one with two"
//! ```
//!
//! A reload releases the previous load's keys, and [`Config::dispose`] (or
//! dropping the config) releases the rest.
//!
//! # Lenient loading
//!
//! Loading never aborts on a single bad key. Unknown keys and values that
//! do not fit their field are skipped, reported to the
//! [`DiagnosticSink`] (a [`tracing`](https://docs.rs/tracing) sink by
//! default) and kept in [`Config::diagnostics`]. The first such problem of a
//! load also copies the document to `{file}_backup_{timestamp}`. A document
//! that does not parse at all is copied to `{file}_invalid_{timestamp}` and
//! the config keeps its previous values; see [`LoadResult`].
//!
//! # Serializer hooks
//!
//! A [`ConfigSerializer`] converts between a field's value and its document
//! form. Register one for a type name with
//! [`serializer()`](YamlfigBuilder::serializer), or under an id that fields
//! select with the `CustomSerializer` directive via
//! [`named_serializer()`](YamlfigBuilder::named_serializer).
//!
//! # Core library and clap adapter
//!
//! The core has no dependency on any CLI framework. [`ConfigAction`] and
//! [`Config::handle`] implement `config list|gen|get|reload`. With the
//! `clap` feature (on by default) [`ConfigArgs`] gives you those
//! subcommands as a clap derive:
//!
//! ```toml
//! yamlfig = { version = "...", default-features = false }
//! ```
//!
//! # Error handling
//!
//! Fallible operations return [`YamlfigError`]. See the [`error`] module for
//! the full set.

pub mod backup;
pub mod diagnostics;
pub mod error;
pub mod types;

mod builder;
#[cfg(feature = "clap")]
mod cli;
mod config;
mod document;
mod file;
pub(crate) mod loader;
mod naming;
mod ops;
mod placeholders;
mod schema;
mod serializer;
mod value;
pub(crate) mod writer;

#[cfg(test)]
mod fixtures;

pub use backup::{BackupKind, BackupProvider, FsBackups};
pub use builder::{Yamlfig, YamlfigBuilder};
#[cfg(feature = "clap")]
pub use cli::{ConfigArgs, ConfigSubcommand};
pub use config::Config;
pub use diagnostics::{Diagnostic, DiagnosticSink, Severity, SilentSink, TracingSink};
pub use document::Node;
pub use error::YamlfigError;
pub use naming::node_name;
pub use ops::ConfigResult;
pub use placeholders::{PlaceholderKey, PlaceholderRegistry, to_placeholder_name};
pub use schema::{
    BlockBuilder, BlockDef, BlockId, Comment, CommentAt, Directive, ElementType, Field, FieldKind,
    ScalarType, Schema, SchemaBuilder,
};
pub use serializer::{ConfigSerializer, FnSerializer, SerializerError, SerializerRegistry, from_fns};
pub use types::{ConfigAction, LoadResult, SearchPath};
pub use value::{Block, Value};
