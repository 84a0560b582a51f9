//! Chat page HTML.
//!
//! The page shows the title and subtitle, the transcript rendered by role,
//! a question box and a "Clear Chat" button. Sources for the latest answer
//! are listed under it.

/// Plain-text page title.
pub const PAGE_TITLE: &str = "Omnibus Rules Chatbot";

/// The complete self-contained chat page.
///
/// Endpoints used:
///
/// - `GET /api/messages` on load, to render the current transcript
/// - `POST /api/messages` with `{"question": ...}` to ask
/// - `DELETE /api/messages` for "Clear Chat"
pub const CHAT_HTML: &str = include_str!("../assets/chat.html");
