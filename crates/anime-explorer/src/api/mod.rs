//! Jikan API v4 client implementation.
//!
//! This module provides the [`AnimeApi`] seam the store depends on, plus a
//! rate-limited HTTP client that implements it against the Jikan API
//! (MyAnimeList unofficial API).

pub mod client;
pub mod error;
pub mod rate_limiter;
pub mod types;

pub use client::JikanClient;
pub use error::ApiFailure;
pub use rate_limiter::RateLimiter;

use crate::models::AnimeRecord;
use std::future::Future;

/// One page of listing results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimePage {
    pub records: Vec<AnimeRecord>,
    /// Whether the upstream reports another page after this one.
    /// `None` when the response carried no pagination block.
    pub has_next_page: Option<bool>,
}

impl AnimePage {
    pub fn new(records: Vec<AnimeRecord>) -> Self {
        Self {
            records,
            has_next_page: None,
        }
    }
}

/// Source of paginated anime listings.
///
/// Implementations never retry; every transport problem is reported as an
/// [`ApiFailure`].
pub trait AnimeApi: Send + Sync {
    /// Fetch one page of anime, optionally restricted to the given genre ids
    fn fetch_anime_list(
        &self,
        page: u32,
        limit: u32,
        genres: Option<&[u32]>,
    ) -> impl Future<Output = Result<AnimePage, ApiFailure>> + Send;
}
