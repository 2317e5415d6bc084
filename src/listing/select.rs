//! Remote-backed select and multiselect helpers.
//!
//! # Responsibilities
//! - Map arbitrary backend records to `{id, label}` options
//! - Debounce search input before hitting the backend
//! - Track multiselect state against fresh result sets

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ClientResult;
use crate::http::ApiClient;
use crate::listing::{DataSource, Debouncer, ListQuery, Page};

/// A selectable entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectOption {
    pub id: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Maps one backend record to an option. `None` skips the record.
pub trait Normalizer: Send + Sync {
    fn normalize(&self, record: &Value) -> Option<SelectOption>;
}

impl<F> Normalizer for F
where
    F: Fn(&Value) -> Option<SelectOption> + Send + Sync,
{
    fn normalize(&self, record: &Value) -> Option<SelectOption> {
        self(record)
    }
}

/// Reads the id and label from named fields. Dotted names reach into
/// nested objects (`"owner.name"`).
#[derive(Debug, Clone)]
pub struct FieldNormalizer {
    pub id_field: String,
    pub label_field: String,
}

impl FieldNormalizer {
    pub fn new(id_field: impl Into<String>, label_field: impl Into<String>) -> Self {
        Self {
            id_field: id_field.into(),
            label_field: label_field.into(),
        }
    }
}

impl Default for FieldNormalizer {
    fn default() -> Self {
        Self::new("id", "name")
    }
}

impl Normalizer for FieldNormalizer {
    fn normalize(&self, record: &Value) -> Option<SelectOption> {
        let id = scalar_text(lookup(record, &self.id_field)?)?;
        let label = scalar_text(lookup(record, &self.label_field)?)?;
        Some(SelectOption { id, label })
    }
}

fn lookup<'a>(record: &'a Value, field: &str) -> Option<&'a Value> {
    field
        .split('.')
        .try_fold(record, |value, key| value.get(key))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Normalize a batch, dropping records the normalizer rejects.
pub fn normalize_all(normalizer: &dyn Normalizer, records: &[Value]) -> Vec<SelectOption> {
    records
        .iter()
        .filter_map(|record| normalizer.normalize(record))
        .collect()
}

/// A combobox backed by a remote list endpoint.
#[derive(Clone)]
pub struct RemoteSelect {
    client: ApiClient,
    source: DataSource,
    normalizer: Arc<dyn Normalizer>,
    debouncer: Arc<Debouncer>,
}

impl RemoteSelect {
    /// Debounce interval defaults to the client's `listing.debounce_ms`.
    pub fn new(
        client: ApiClient,
        source: impl Into<DataSource>,
        normalizer: impl Normalizer + 'static,
    ) -> Self {
        let interval = Duration::from_millis(client.config().listing.debounce_ms);
        Self {
            client,
            source: source.into(),
            normalizer: Arc::new(normalizer),
            debouncer: Arc::new(Debouncer::new(interval)),
        }
    }

    pub fn with_debounce(mut self, interval: Duration) -> Self {
        self.debouncer = Arc::new(Debouncer::new(interval));
        self
    }

    /// Debounced search. `Ok(None)` when a later search superseded this one.
    pub async fn search(&self, term: &str) -> ClientResult<Option<Vec<SelectOption>>> {
        if !self.debouncer.settle().await {
            tracing::trace!(term, "Search superseded");
            return Ok(None);
        }
        self.fetch(term).await.map(Some)
    }

    /// Immediate fetch of the first page of options matching `term`.
    pub async fn fetch(&self, term: &str) -> ClientResult<Vec<SelectOption>> {
        let query = ListQuery::new().search(term);
        let page: Page<Value> = self.client.list(self.source.clone(), &query).await?;
        Ok(normalize_all(self.normalizer.as_ref(), &page.items))
    }
}

/// Selected options of a multiselect, in selection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    selected: Vec<SelectOption>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `option`; returns `false` if its id was already selected.
    pub fn insert(&mut self, option: SelectOption) -> bool {
        if self.contains(&option.id) {
            return false;
        }
        self.selected.push(option);
        true
    }

    pub fn remove(&mut self, id: &str) -> Option<SelectOption> {
        let index = self.selected.iter().position(|o| o.id == id)?;
        Some(self.selected.remove(index))
    }

    /// Select if absent, deselect if present. Returns whether it is now selected.
    pub fn toggle(&mut self, option: SelectOption) -> bool {
        if self.remove(&option.id).is_some() {
            false
        } else {
            self.selected.push(option);
            true
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.selected.iter().any(|o| o.id == id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.selected.iter().map(|o| o.id.as_str()).collect()
    }

    pub fn options(&self) -> &[SelectOption] {
        &self.selected
    }

    /// Options from a result set that are not yet selected.
    pub fn available<'a>(&self, options: &'a [SelectOption]) -> Vec<&'a SelectOption> {
        options.iter().filter(|o| !self.contains(&o.id)).collect()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_normalizer() {
        let normalizer = FieldNormalizer::new("id", "owner.name");
        let records = vec![
            json!({ "id": 12, "owner": { "name": "Acme Ltd" } }),
            json!({ "id": "c-7", "owner": { "name": "Globex" } }),
            json!({ "id": 13 }),
            json!({ "id": null, "owner": { "name": "Nobody" } }),
        ];
        assert_eq!(
            normalize_all(&normalizer, &records),
            vec![
                SelectOption::new("12", "Acme Ltd"),
                SelectOption::new("c-7", "Globex")
            ]
        );
    }

    #[test]
    fn test_closure_normalizer() {
        let normalizer = |record: &Value| {
            let id = record.get("uuid")?.as_str()?;
            let first = record.get("first_name")?.as_str()?;
            let last = record.get("last_name")?.as_str()?;
            Some(SelectOption::new(id, format!("{} {}", first, last)))
        };
        let option = normalizer
            .normalize(&json!({ "uuid": "u1", "first_name": "Ada", "last_name": "Lovelace" }))
            .unwrap();
        assert_eq!(option.label, "Ada Lovelace");
    }

    #[test]
    fn test_selection() {
        let mut selection = Selection::new();
        assert!(selection.insert(SelectOption::new("1", "One")));
        assert!(!selection.insert(SelectOption::new("1", "One again")));
        assert!(selection.toggle(SelectOption::new("2", "Two")));
        assert_eq!(selection.ids(), vec!["1", "2"]);

        let results = vec![
            SelectOption::new("1", "One"),
            SelectOption::new("3", "Three"),
        ];
        let available: Vec<&str> = selection
            .available(&results)
            .into_iter()
            .map(|o| o.id.as_str())
            .collect();
        assert_eq!(available, vec!["3"]);

        assert!(!selection.toggle(SelectOption::new("2", "Two")));
        assert_eq!(selection.len(), 1);
        assert_eq!(selection.remove("1").unwrap().label, "One");
        assert!(selection.is_empty());
    }
}
