use indexmap::IndexMap;

use crate::domain::{Choice, FieldDescriptor};

use super::template::placeholders;

/// Resolved option lists keyed by field key. Inline `options` never enter
/// the store; it only caches what the resolver fetched.
#[derive(Debug, Clone, Default)]
pub struct OptionStore {
    resolved: IndexMap<String, Vec<Choice>>,
}

impl OptionStore {
    pub fn get(&self, key: &str) -> Option<&[Choice]> {
        self.resolved.get(key).map(Vec::as_slice)
    }

    pub fn insert(&mut self, key: impl Into<String>, choices: Vec<Choice>) {
        self.resolved.insert(key.into(), choices);
    }

    pub fn remove(&mut self, key: &str) {
        self.resolved.shift_remove(key);
    }
}

/// Parameter names a field's options source depends on, in template order.
pub fn dependencies_of(field: &FieldDescriptor) -> Vec<String> {
    field
        .options_source
        .as_deref()
        .map(placeholders)
        .unwrap_or_default()
}

/// Keys of fields that directly reference `{key}` in their options source,
/// in declaration order.
pub fn direct_dependents(fields: &[FieldDescriptor], key: &str) -> Vec<String> {
    fields
        .iter()
        .filter(|field| dependencies_of(field).iter().any(|dep| dep == key))
        .map(|field| field.key.clone())
        .collect()
}

/// Transitive closure of `direct_dependents`: everything downstream of
/// `key`, so a changed `state` resets both `city` and `area`.
pub fn downstream_of(fields: &[FieldDescriptor], key: &str) -> Vec<String> {
    let mut frontier = vec![key.to_string()];
    let mut downstream = Vec::new();
    while let Some(current) = frontier.pop() {
        for dependent in direct_dependents(fields, &current) {
            if dependent != key && !downstream.contains(&dependent) {
                downstream.push(dependent.clone());
                frontier.push(dependent);
            }
        }
    }
    downstream
}
