//! Ghost headless CMS adapter.

mod client;
pub(crate) mod wire;

pub use client::GhostClient;
