use metaform_shape::{Kind, Structured};
use serde_json::Value;
use std::collections::BTreeMap;

/// Named values passed through a decode or encode call.
///
/// Built once and read-only afterwards. A `Context` belongs to the call that
/// built it; clone it (or derive a new one) to hand a copy to another worker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    attributes: BTreeMap<String, Value>,
}

impl Context {
    /// Creates a context from name/value pairs. A repeated name keeps its last value.
    pub fn new<I, K, V>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            attributes: attributes
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn builder() -> ContextBuilder {
        ContextBuilder::default()
    }

    /// Starts a new context pre-filled with this one's attributes.
    pub fn derive(&self) -> ContextBuilder {
        ContextBuilder {
            attributes: self.attributes.clone(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl Structured for Context {
    fn kind(&self) -> Kind {
        Kind::Object
    }

    fn attribute(&self, name: &str) -> Option<&dyn Structured> {
        self.get(name).map(|v| v as &dyn Structured)
    }
}

/// Accumulates attributes for a [`Context`].
#[derive(Debug, Default)]
pub struct ContextBuilder {
    attributes: BTreeMap<String, Value>,
}

impl ContextBuilder {
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn build(self) -> Context {
        Context {
            attributes: self.attributes,
        }
    }
}
