//! Terraform JSON block builder.
//!
//! Keys keep their insertion order, so a resource's emitted JSON follows the
//! order its `to_block` writes them in. Absent options and empty collections
//! are skipped.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// An ordered JSON object under construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    body: Map<String, Value>,
}

impl Block {
    pub fn new() -> Self {
        Self { body: Map::new() }
    }

    /// Write a value unconditionally.
    pub fn attr(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.body.insert(key.to_string(), value.into());
        self
    }

    /// Write a value only when present.
    pub fn opt<T: Into<Value>>(self, key: &str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.attr(key, value),
            None => self,
        }
    }

    /// Write a string slice only when present.
    pub fn opt_str(self, key: &str, value: Option<&String>) -> Self {
        self.opt(key, value.cloned())
    }

    /// Write a list of scalars, skipping empty lists.
    pub fn list<T, I>(mut self, key: &str, values: I) -> Self
    where
        T: Into<Value>,
        I: IntoIterator<Item = T>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if !values.is_empty() {
            self.body.insert(key.to_string(), Value::Array(values));
        }
        self
    }

    /// Write a string map, skipping empty maps.
    pub fn map(mut self, key: &str, values: &BTreeMap<String, String>) -> Self {
        if !values.is_empty() {
            let object: Map<String, Value> = values
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            self.body.insert(key.to_string(), Value::Object(object));
        }
        self
    }

    /// Write a nested block.
    pub fn block(mut self, key: &str, block: Block) -> Self {
        self.body.insert(key.to_string(), block.into_value());
        self
    }

    /// Write a nested block only when present.
    pub fn opt_block(self, key: &str, block: Option<Block>) -> Self {
        match block {
            Some(block) => self.block(key, block),
            None => self,
        }
    }

    /// Write an empty nested block such as `allow {}`.
    pub fn empty_block(self, key: &str) -> Self {
        self.block(key, Block::new())
    }

    /// Write repeated nested blocks as an array, skipping when there are none.
    pub fn blocks<I>(mut self, key: &str, blocks: I) -> Self
    where
        I: IntoIterator<Item = Block>,
    {
        let values: Vec<Value> = blocks.into_iter().map(Block::into_value).collect();
        if !values.is_empty() {
            self.body.insert(key.to_string(), Value::Array(values));
        }
        self
    }

    /// Write a JSON document encoded as a string.
    pub fn json(mut self, key: &str, document: &Value) -> Self {
        self.body.insert(key.to_string(), Value::String(document.to_string()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.body.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.body.keys()
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.body)
    }
}

impl From<Block> for Value {
    fn from(block: Block) -> Self {
        block.into_value()
    }
}
