//! Chat sessions: prompt assembly, transport seam, session registry.

pub mod prompt;
pub mod registry;
pub mod session;
pub mod transport;

pub use prompt::build_prompt;
pub use registry::SessionRegistry;
pub use session::Session;
pub use transport::SessionTransport;
