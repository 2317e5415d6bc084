//! Remote listing subsystem: the data side of tables, comboboxes and
//! multiselects.
//!
//! # Data Flow
//! ```text
//! user input (search term, page, filters)
//!     → debounce.rs (drop superseded keystrokes)
//!     → query.rs (ListQuery + DataSource → query string)
//!     → ApiClient::list (authenticated GET)
//!     → page.rs (tolerant envelope decoding)
//!     → select.rs (records → {id, label} options)
//! ```

pub mod debounce;
pub mod page;
pub mod query;
pub mod select;

pub use debounce::Debouncer;
pub use page::Page;
pub use query::{DataSource, ListQuery};
pub use select::{FieldNormalizer, Normalizer, RemoteSelect, SelectOption, Selection};
