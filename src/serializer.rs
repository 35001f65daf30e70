//! Custom serializer hooks: symmetric transforms between the raw document
//! value of a field and the value the application sees.
//!
//! Hooks are registered either for a field type (every field whose
//! [`type_name`](crate::schema::Field::type_name) matches) or under an id that
//! individual fields name with the `CustomSerializer` directive. A named hook
//! takes precedence over a type-level one. The loader runs `deserialize`
//! before any built-in coercion; the writer runs `serialize` before rendering.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::schema::Field;
use crate::value::Value;

/// A bidirectional value transform.
pub trait ConfigSerializer: Send + Sync {
    /// Typed value to raw document value.
    fn serialize(&self, value: &Value) -> Result<Value, SerializerError>;

    /// Raw document value to typed value.
    fn deserialize(&self, raw: &Value) -> Result<Value, SerializerError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct SerializerError(String);

impl SerializerError {
    pub fn new(msg: impl fmt::Display) -> Self {
        SerializerError(msg.to_string())
    }
}

impl fmt::Display for SerializerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for SerializerError {}

/// A serializer built from a pair of closures.
pub struct FnSerializer<S, D> {
    serialize: S,
    deserialize: D,
}

/// Build a [`ConfigSerializer`] from two closures.
pub fn from_fns<S, D>(serialize: S, deserialize: D) -> FnSerializer<S, D>
where
    S: Fn(&Value) -> Result<Value, SerializerError> + Send + Sync,
    D: Fn(&Value) -> Result<Value, SerializerError> + Send + Sync,
{
    FnSerializer {
        serialize,
        deserialize,
    }
}

impl<S, D> ConfigSerializer for FnSerializer<S, D>
where
    S: Fn(&Value) -> Result<Value, SerializerError> + Send + Sync,
    D: Fn(&Value) -> Result<Value, SerializerError> + Send + Sync,
{
    fn serialize(&self, value: &Value) -> Result<Value, SerializerError> {
        (self.serialize)(value)
    }

    fn deserialize(&self, raw: &Value) -> Result<Value, SerializerError> {
        (self.deserialize)(raw)
    }
}

/// Registered hooks, by field type and by id.
#[derive(Clone, Default)]
pub struct SerializerRegistry {
    by_type: HashMap<String, Arc<dyn ConfigSerializer>>,
    named: HashMap<String, Arc<dyn ConfigSerializer>>,
}

impl SerializerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_type<T: ConfigSerializer + 'static>(&mut self, type_name: &str, hook: T) {
        self.by_type.insert(type_name.to_string(), Arc::new(hook));
    }

    pub fn register_named<T: ConfigSerializer + 'static>(&mut self, id: &str, hook: T) {
        self.named.insert(id.to_string(), Arc::new(hook));
    }

    pub fn contains_named(&self, id: &str) -> bool {
        self.named.contains_key(id)
    }

    /// The hook that applies to a field, if any.
    pub fn for_field(&self, field: &Field) -> Option<&dyn ConfigSerializer> {
        if let Some(id) = field.serializer_id() {
            return self.named.get(id).map(|s| s.as_ref());
        }
        field
            .type_name()
            .and_then(|name| self.by_type.get(name))
            .map(|s| s.as_ref())
    }
}

impl fmt::Debug for SerializerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut by_type: Vec<&String> = self.by_type.keys().collect();
        let mut named: Vec<&String> = self.named.keys().collect();
        by_type.sort();
        named.sort();
        f.debug_struct("SerializerRegistry")
            .field("by_type", &by_type)
            .field("named", &named)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upper() -> impl ConfigSerializer {
        from_fns(
            |v| Ok(Value::from(v.as_str().unwrap_or_default().to_lowercase())),
            |raw| Ok(Value::from(raw.as_str().unwrap_or_default().to_uppercase())),
        )
    }

    #[test]
    fn fn_serializer_round_trips() {
        let hook = upper();
        let typed = hook.deserialize(&Value::from("abc")).unwrap();
        assert_eq!(typed, Value::from("ABC"));
        assert_eq!(hook.serialize(&typed).unwrap(), Value::from("abc"));
    }

    #[test]
    fn type_level_lookup() {
        let mut registry = SerializerRegistry::new();
        registry.register_type("color", upper());
        let field = Field::custom("accent", "color", "red");
        assert!(registry.for_field(&field).is_some());
        assert!(registry.for_field(&Field::string("name", "")).is_none());
    }

    #[test]
    fn named_hook_takes_precedence() {
        let mut registry = SerializerRegistry::new();
        registry.register_type(
            "string",
            from_fns(|_| Ok(Value::from("type")), |_| Ok(Value::from("type"))),
        );
        registry.register_named(
            "shout",
            from_fns(|_| Ok(Value::from("named")), |_| Ok(Value::from("named"))),
        );
        let field = Field::string("s", "").serializer("shout");
        let hook = registry.for_field(&field).unwrap();
        assert_eq!(hook.deserialize(&Value::Null).unwrap(), Value::from("named"));
        assert!(registry.contains_named("shout"));
    }

    #[test]
    fn missing_named_hook_is_none() {
        let registry = SerializerRegistry::new();
        let field = Field::string("s", "").serializer("nope");
        assert!(registry.for_field(&field).is_none());
    }

    #[test]
    fn error_displays_message() {
        let err = SerializerError::new("bad duration");
        assert_eq!(err.to_string(), "bad duration");
    }
}
