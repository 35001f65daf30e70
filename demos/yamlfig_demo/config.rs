//! Schema and typed view for the yamlfig demo application.
//!
//! The root block carries the prefix designator, a greeting that embeds
//! `{PRFX}`, a message with placeholders, and two nested blocks:
//! [`ServerConfig`] and [`DisplayConfig`]. A `profiles` map of node entries
//! shows node sequences.

use serde::Deserialize;
use std::collections::BTreeMap;

use yamlfig::{CommentAt, ElementType, Field, ScalarType, Schema, Value};

pub fn schema() -> Schema {
    let mut b = Schema::builder();

    let server = b
        .block("server")
        .comment(CommentAt::Prepend, ["Server settings"])
        .field(Field::string("host", "127.0.0.1"))
        .field(Field::int("port", 3000).comment(CommentAt::SameLine, ["TCP port"]))
        .field(Field::int("max_connections", 100))
        .finish();

    let display = b
        .block("display")
        .new_line(1)
        .field(
            Field::enumeration(
                "color",
                &["RED", "GREEN", "YELLOW", "BLUE", "MAGENTA", "CYAN", "WHITE"],
                Some("YELLOW"),
            )
            .comment(CommentAt::Prepend, ["Terminal color for the echo command"]),
        )
        .field(Field::enumeration("format", &["TABLE", "PLAIN"], Some("TABLE")))
        .finish();

    let profile = b
        .block("profile")
        .field(Field::string("banner", "{PRFX} profile"))
        .field(Field::bool("verbose", false))
        .finish();
    let profiles = vec![
        ("dev", b.node(profile, [Value::from("{PRFX} development"), Value::Bool(true)])),
        ("prod", b.node(profile, [Value::from("{PRFX} production")])),
    ];

    let root = b
        .block("demo")
        .field(
            Field::string("prefix", "[demo]")
                .comment(CommentAt::Prepend, ["Replaces {PRFX} in every value below"]),
        )
        .field(Field::string("greeting", "{PRFX} hello"))
        .field(
            Field::string("welcome", "{PRFX} welcome {USER}, you have {COUNT} messages")
                .placeholders(["user", "count"]),
        )
        .field(Field::string("version", "1").final_field())
        .field(Field::list(
            "tags",
            ElementType::Scalar(ScalarType::String),
            vec![Value::from("demo")],
        ))
        .field(Field::block("server", server).create().new_line(1))
        .field(Field::block("display", display).create())
        .field(Field::map("profiles", ElementType::Node(profile), profiles).new_line(1))
        .finish();

    // The schema above is static and always valid.
    b.build(root).unwrap_or_else(|e| panic!("demo schema: {e}"))
}

#[derive(Deserialize, Debug)]
pub struct DemoConfig {
    pub prefix: String,
    pub greeting: String,
    pub tags: Vec<String>,
    pub server: ServerConfig,
    pub display: DisplayConfig,
    pub profiles: BTreeMap<String, Profile>,
}

#[derive(Deserialize, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_connections: u32,
}

#[derive(Deserialize, Debug)]
pub struct DisplayConfig {
    pub color: String,
    pub format: String,
}

#[derive(Deserialize, Debug)]
pub struct Profile {
    pub banner: String,
    pub verbose: bool,
}
