//! HTTP request handlers.

pub mod conversation;
pub mod generate;
