//! Tourism CMS content service - Library
//!
//! Status-aware CRUD over the destination's content tables (accommodations
//! and the shared places table), bulk actions with partial-failure reporting,
//! and the admin HTTP API on top. Re-exports modules for integration testing.

pub mod audit;
pub mod backend;
pub mod bulk;
pub mod config;
pub mod error;
pub mod fallback;
pub mod handlers;
pub mod manager;
pub mod page_content;
pub mod repository;
pub mod slug;
pub mod status;
pub mod storage;
pub mod types;

pub use error::{CmsError, CmsResult};
