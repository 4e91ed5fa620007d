//! Portfolio and blog front-end over the Ghost Content API.
//!
//! Content is read through [`infra::ghost::GhostClient`], composed by
//! [`application::content::ContentService`] and memoized in [`cache::FetchCache`].

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
