//! Data structures for requests to and responses from the translation backends.
//!
//! This module holds the chat-completion wire types, the transport-level HTTP
//! request/response abstraction, and small shared enums.

pub mod chat;
mod http;
mod shared;

pub use chat::ChatTarget;
pub use http::*;
pub use shared::*;
