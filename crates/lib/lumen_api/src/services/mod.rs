//! Service layer.

pub mod inference;
