//! Session module - authenticated identity and the services that manage it.

mod auth_service;
mod session_context;
mod session_model;

pub use auth_service::AuthService;
pub use session_context::SessionContext;
pub use session_model::{AuthGrant, Registration, Session};
