#[cfg(test)]
pub mod test {
    use std::collections::BTreeMap;

    use serde::Deserialize;

    use crate::schema::{CommentAt, ElementType, Field, ScalarType, Schema};
    use crate::value::Value;

    /// Small schema covering every scalar type, a list, a map and a block.
    pub fn simple_schema() -> Schema {
        let mut b = Schema::builder();
        let server = b
            .block("server")
            .field(Field::string("host", "localhost"))
            .field(Field::int("port", 5432))
            .finish();
        let root = b
            .block("simple")
            .field(Field::string("prefix", ""))
            .field(Field::string("regular", "{PRFX} regular"))
            .field(Field::int("port", 8080))
            .field(Field::float("ratio", 0.5))
            .field(Field::bool("enabled", true))
            .field(Field::enumeration("mode", &["FAST", "SLOW"], Some("FAST")))
            .field(Field::list(
                "tags",
                ElementType::Scalar(ScalarType::String),
                vec![Value::from("a"), Value::from("b")],
            ))
            .field(Field::map::<String>(
                "limits",
                ElementType::Scalar(ScalarType::Int),
                vec![],
            ))
            .field(Field::int("timeout", 1000).serializer("millis"))
            .field(Field::block("server", server).create())
            .finish();
        b.build(root).unwrap()
    }

    #[derive(Debug, Deserialize, PartialEq)]
    pub struct SimpleSettings {
        pub prefix: String,
        pub regular: String,
        pub port: u16,
        pub ratio: f64,
        pub enabled: bool,
        pub mode: Option<String>,
        pub tags: Vec<String>,
        pub limits: BTreeMap<String, i64>,
        pub timeout: i64,
        pub server: ServerSettings,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    pub struct ServerSettings {
        pub host: String,
        pub port: u16,
    }

    /// Settings with a prefix, placeholders, comments and node sequences.
    pub fn settings_schema() -> Schema {
        let mut b = Schema::builder();

        let append = b
            .block("append")
            .field(
                Field::string("field1", "{PRFX} string value")
                    .comment(CommentAt::Append, ["FIELD1 APPEND comment", "Visible line"]),
            )
            .field(
                Field::string("field2", "{PRFX} string value")
                    .new_line(1)
                    .comment(CommentAt::Prepend, ["FIELD2 PREPEND comment", "Line 2"]),
            )
            .finish();
        let same_line = b
            .block("same_line")
            .new_line(2)
            .comment(
                CommentAt::SameLine,
                ["SAME_LINE comment Line 1", "SAME_LINE comment Invisible line"],
            )
            .comment(
                CommentAt::Append,
                [
                    "SAME_LINE APPEND second comment Line 1",
                    "SAME_LINE APPEND second comment Line 2",
                ],
            )
            .field(Field::block("append", append).create())
            .finish();
        let prepend = b
            .block("prepend")
            .comment(CommentAt::Prepend, ["PREPEND comment Line 1", "PREPEND comment Line 2"])
            .field(Field::string("string_field", "{PRFX} string value"))
            .field(
                Field::string("field_with_comment_at_same_line", "{PRFX} string value")
                    .new_line(1)
                    .comment(
                        CommentAt::SameLine,
                        ["FIELD_WITH_COMMENT_AT_SAME_LINE comment", "Invisible line"],
                    ),
            )
            .field(Field::block("same_line", same_line).create())
            .finish();

        let other = b
            .block("other_node_seq")
            .field(Field::string("a", "{PRFX} value"))
            .field(Field::int("b", 10))
            .finish();
        let entry = b
            .block("test_node_sequence")
            .field(Field::string("final_field", "{PRFX} final").final_field())
            .field(Field::int("ignored", 0).ignore())
            .field(Field::string("some_string", "{PRFX} some value"))
            .field(Field::int("some_integer", 1234))
            .field(Field::block("other_node_seq", other).create())
            .finish();
        let seq_map = vec![
            ("1", b.node(entry, [])),
            ("b", b.node(entry, [Value::from("2nd string")])),
            ("c", b.node(entry, [Value::from("3rd string"), Value::Int(4321)])),
        ];
        let seq_list = vec![
            b.node(entry, [Value::from("{PRFX} first"), Value::Int(100)]),
            b.node(entry, [Value::from("second"), Value::Int(200)]),
        ];
        let node_test = b
            .block("node_test")
            .field(Field::map("node_seq_map", ElementType::Node(entry), seq_map))
            .field(Field::list("node_seq_list", ElementType::Node(entry), seq_list).new_line(1))
            .finish();

        let root = b
            .block("settings")
            .field(Field::string("final_field", "{PRFX} final value").final_field())
            .field(Field::string("prefix", "prefix value >>"))
            .field(Field::string("regular_field", "{PRFX} regular value"))
            .field(
                Field::string("string_with_placeholders", "This is {TEST} with {TEST2}")
                    .placeholders(["{TEST}", "test2"]),
            )
            .field(
                Field::string("string_with_placeholders2", "This is {TEST} with {TEST2}")
                    .placeholders(["test2", "test"]),
            )
            .field(
                Field::string(
                    "another_string_with_placeholders",
                    "{PLACEHOLDER} {ANOTHER_PLACEHOLDER}",
                )
                .placeholders(["PLACEHOLDER", "another-placeholder"]),
            )
            .field(Field::block("prepend", prepend).create())
            .field(Field::block("node_test", node_test).create())
            .finish();
        b.build(root).unwrap()
    }

    /// What [`settings_schema`] renders to with nothing loaded.
    pub const SETTINGS_DOCUMENT: &str = r#"final-field: "{PRFX} final value"
prefix: "prefix value >>"
regular-field: "{PRFX} regular value"
string-with-placeholders: "This is {TEST} with {TEST2}"
string-with-placeholders2: "This is {TEST} with {TEST2}"
another-string-with-placeholders: "{PLACEHOLDER} {ANOTHER_PLACEHOLDER}"

# PREPEND comment Line 1
# PREPEND comment Line 2
prepend:
  string-field: "{PRFX} string value"

  field-with-comment-at-same-line: "{PRFX} string value" # FIELD_WITH_COMMENT_AT_SAME_LINE comment


  same-line: # SAME_LINE comment Line 1
    # SAME_LINE APPEND second comment Line 1
    # SAME_LINE APPEND second comment Line 2
    append:
      field1: "{PRFX} string value"
      # FIELD1 APPEND comment
      # Visible line

      # FIELD2 PREPEND comment
      # Line 2
      field2: "{PRFX} string value"

node-test:
  node-seq-map:
    "1":
      final-field: "{PRFX} final"
      some-string: "{PRFX} some value"
      some-integer: 1234
      other-node-seq:
        a: "{PRFX} value"
        b: 10
    b:
      final-field: "{PRFX} final"
      some-string: "2nd string"
      some-integer: 1234
      other-node-seq:
        a: "{PRFX} value"
        b: 10
    c:
      final-field: "{PRFX} final"
      some-string: "3rd string"
      some-integer: 4321
      other-node-seq:
        a: "{PRFX} value"
        b: 10

  node-seq-list:
    - final-field: "{PRFX} final"
      some-string: "{PRFX} first"
      some-integer: 100
      other-node-seq:
        a: "{PRFX} value"
        b: 10
    - final-field: "{PRFX} final"
      some-string: "second"
      some-integer: 200
      other-node-seq:
        a: "{PRFX} value"
        b: 10
"#;

    #[test]
    fn settings_schema_builds() {
        let schema = settings_schema();
        let root = schema.instantiate(schema.root());
        assert_eq!(
            root.lookup(&schema, "node-test.node-seq-map.c.some-integer"),
            Some(&Value::Int(4321))
        );
    }
}
