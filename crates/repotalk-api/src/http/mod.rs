//! HTTP/WebSocket surface for the chat server.

pub mod router;
pub mod ws;
