//! # lumen_core
//!
//! Client-side chat logic for Lumen.
//!
//! The model and markup modules are always available (the wasm crate uses
//! them directly). The `client` feature adds the session controller, the
//! HTTP backend, the typing reveal and the clipboard helper.

pub mod markup;
pub mod models;

#[cfg(feature = "client")]
pub mod backend;
#[cfg(feature = "client")]
pub mod clipboard;
#[cfg(feature = "client")]
pub mod session;
#[cfg(feature = "client")]
pub mod typing;
#[cfg(feature = "client")]
pub mod view;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
