//! Route paths served by the relay.
//!
//! Anything not matched here falls through to the static asset server.

/// Chat endpoint.
pub const API_CHAT: &str = "/api/chat";

/// Bare API prefix; never a valid endpoint.
pub const API_ROOT: &str = "/api/";

/// Any other API path. Catch-alls do not match an empty segment, hence
/// [`API_ROOT`].
pub const API_ANY: &str = "/api/{*rest}";
