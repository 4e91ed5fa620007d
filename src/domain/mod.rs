//! Domain layer types.

pub mod entities;
pub mod profile;
pub mod types;
