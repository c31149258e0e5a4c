//! HTTP gateway for nomen.
//!
//! Exposes the registrar's check/register/transfer operations plus a thin
//! proxy to the always-on messaging agent. The gateway owns input parsing
//! (labels and addresses arrive as untrusted strings) and the mapping from
//! registrar errors to HTTP statuses; everything else is delegated.

pub mod messaging;
pub mod server;

pub use messaging::MessagingClient;
pub use server::{router, serve, AppState};
