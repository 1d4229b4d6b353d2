//! Transport seam between the registry and the WebSocket layer.

use repotalk_types::error::TransportError;

/// The sending half of one client connection, exclusively owned by its
/// session.
///
/// The production implementation wraps an axum WebSocket sink; tests use a
/// recording mock. Uses native async fn in traits (RPITIT, Rust 2024
/// edition).
pub trait SessionTransport: Send {
    /// Send one UTF-8 text message to the client.
    fn send(
        &mut self,
        text: &str,
    ) -> impl std::future::Future<Output = Result<(), TransportError>> + Send;

    /// Close the connection. Failures are swallowed: the peer may already
    /// be gone, and there is nothing useful to do about it.
    fn close(&mut self) -> impl std::future::Future<Output = ()> + Send;
}
