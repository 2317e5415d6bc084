//! Paginated list responses.
//!
//! Backends in this family disagree on envelope shape. Accepted forms:
//! - `{ "data" | "items" | "results": [...], "total" | "count", "page" |
//!   "current_page", "last_page" | "total_pages", "per_page" | "page_size",
//!   "next" }`
//! - a bare JSON array (treated as the only page)

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One page of a remote list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    /// `next` link as sent, `Some(Null)` when the backend said "no next".
    #[serde(skip)]
    next: Option<Value>,
}

impl<T> Page<T> {
    /// A single, complete page.
    pub fn single(items: Vec<T>) -> Self {
        Self {
            items,
            total: None,
            page: None,
            last_page: None,
            per_page: None,
            next: None,
        }
    }

    /// Whether another page follows, judged from whatever the backend sent.
    pub fn has_next(&self) -> bool {
        if let (Some(page), Some(last)) = (self.page, self.last_page) {
            return page < last;
        }
        if let Some(next) = &self.next {
            return !next.is_null();
        }
        if let (Some(page), Some(per_page), Some(total)) = (self.page, self.per_page, self.total) {
            return u64::from(page) * u64::from(per_page) < total;
        }
        false
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            last_page: self.last_page,
            per_page: self.per_page,
            next: self.next,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Wire<T> {
    Bare(Vec<T>),
    Envelope(Envelope<T>),
}

#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(alias = "items", alias = "results")]
    data: Vec<T>,
    #[serde(default, alias = "count")]
    total: Option<u64>,
    #[serde(default, alias = "current_page")]
    page: Option<u32>,
    #[serde(default, alias = "total_pages")]
    last_page: Option<u32>,
    #[serde(default, alias = "page_size")]
    per_page: Option<u32>,
    #[serde(default, deserialize_with = "present")]
    next: Option<Value>,
}

/// Distinguish `"next": null` (no next page) from an absent field.
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Page<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Wire::<T>::deserialize(deserializer)? {
            Wire::Bare(items) => Page::single(items),
            Wire::Envelope(e) => Page {
                items: e.data,
                total: e.total,
                page: e.page,
                last_page: e.last_page,
                per_page: e.per_page,
                next: e.next,
            },
        })
    }
}
