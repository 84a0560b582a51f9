//! Omnibus UI crate - the embedded single-page chat.
//!
//! The page is one self-contained HTML file with inline CSS and JavaScript,
//! embedded at compile time via `include_str!`. It talks to the JSON API
//! under `/api/messages`.
//!
//! ```rust,ignore
//! use omnibus_ui::CHAT_HTML;
//!
//! async fn index() -> axum::response::Html<&'static str> {
//!     axum::response::Html(CHAT_HTML)
//! }
//! ```

pub mod page;

pub use page::{CHAT_HTML, PAGE_TITLE};
