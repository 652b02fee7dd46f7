//! Tag index
//!
//! Flat key/value view of a resource's tag list.

use crate::aws::model::Tag;
use std::collections::HashMap;

/// Tag key that carries a resource's human name
pub const NAME_TAG: &str = "Name";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagIndex {
    tags: HashMap<String, String>,
}

impl TagIndex {
    /// Build the index from a tag list
    ///
    /// Tags without a key are dropped, a missing value is indexed as the
    /// empty string, and a later duplicate key overwrites an earlier one.
    pub fn build(tags: &[Tag]) -> Self {
        let mut index = HashMap::with_capacity(tags.len());

        for tag in tags {
            let Some(key) = &tag.key else {
                continue;
            };
            index.insert(key.clone(), tag.value.clone().unwrap_or_default());
        }

        Self { tags: index }
    }

    /// Value for `key`, or the empty string when the tag is missing
    pub fn lookup(&self, key: &str) -> String {
        self.get(key).unwrap_or_default().to_string()
    }

    /// Value for `key`, distinguishing a missing tag
    pub fn get(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(|v| v.as_str())
    }

    /// The `Name` tag, if set
    pub fn name(&self) -> Option<&str> {
        self.get(NAME_TAG)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
