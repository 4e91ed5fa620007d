//! Application services: content composition, caching facade and page assembly.

pub mod blog;
pub mod cached_content;
pub mod content;
pub mod error;
pub mod export;
pub mod profile;
pub mod seo;
pub mod sitemap;
pub mod syndication;

#[cfg(test)]
pub(crate) mod test_support;
