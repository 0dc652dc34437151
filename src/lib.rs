//! News feed core of the Nuvion launcher.
//!
//! [`news::NewsFeedSync`] fetches the backend news list through [`api::ApiClient`],
//! tracks unread entries against a persisted [`storage::ReadCursor`], and
//! filters the loaded list client-side.

pub mod api;
pub mod config;
pub mod news;
pub mod storage;
pub mod theme;
