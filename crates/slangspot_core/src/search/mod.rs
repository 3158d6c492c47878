//! Search and filter query composition for list pages.
//!
//! # Responsibility
//! - Parse list parameters (`q`, filters, sort, pagination) into typed
//!   filters.
//! - Compose parameterized SQL over active rows for repositories to run.

pub mod filter;
pub mod query;

pub use filter::{BlogFilter, LessonFilter, PostFilter, SearchParams, SortKey};
pub use query::{like_pattern, SqlQuery};
