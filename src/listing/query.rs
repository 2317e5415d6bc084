//! List query parameters and data-source descriptors.

use std::collections::BTreeMap;

use crate::config::ListingConfig;
use crate::http::ApiRequest;

/// Page, search term and filters for one list request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub search: Option<String>,
    pub filters: BTreeMap<String, String>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    /// The same query, one page after `current`. `None` past `u32::MAX`.
    pub fn next_page(&self, current: u32) -> Option<Self> {
        Some(Self {
            page: Some(current.checked_add(1)?),
            ..self.clone()
        })
    }

    /// Query-string pairs. Blank search terms and blank filter values are
    /// left out so an empty input box does not filter the list.
    pub fn to_pairs(&self, config: &ListingConfig) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push((config.page_param.clone(), page.to_string()));
        }
        if let Some(term) = self.search.as_deref().map(str::trim) {
            if !term.is_empty() {
                pairs.push((config.search_param.clone(), term.to_string()));
            }
        }
        pairs.extend(
            self.filters
                .iter()
                .filter(|(_, v)| !v.trim().is_empty())
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        pairs
    }
}

/// Where a list or select widget gets its records: an endpoint plus fixed
/// parameters applied to every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSource {
    pub path: String,
    pub params: Vec<(String, String)>,
}

impl DataSource {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            params: Vec::new(),
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// GET request for `query` against this source.
    pub fn request(&self, query: &ListQuery, config: &ListingConfig) -> ApiRequest {
        ApiRequest::get(self.path.clone())
            .queries(self.params.iter().cloned())
            .queries(query.to_pairs(config))
    }
}

impl From<&str> for DataSource {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for DataSource {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}
