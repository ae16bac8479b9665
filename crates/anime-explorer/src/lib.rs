//! Anime Explorer library: browse Jikan anime listings and keep favourites.
//!
//! The centre of the crate is [`AnimeListStore`], which merges paginated
//! results from an [`AnimeApi`] implementation, tracks favourites persisted
//! through a [`shared::KeyValueStore`], and derives the filtered view that a
//! front end renders.

pub mod api;
pub mod details;
pub mod favourites;
pub mod filter;
pub mod models;
pub mod store;
pub mod subscription;

pub use api::{AnimeApi, AnimePage, ApiFailure, JikanClient, RateLimiter};
pub use details::AnimeDetails;
pub use favourites::{FavouriteSet, FAVOURITES_KEY};
pub use filter::{GenreFilter, ListFilter};
pub use models::{AnimeRecord, Genre, GenreRef};
pub use store::{AnimeListStore, FetchOutcome, StoreError};
pub use subscription::{StoreEvent, Subscription};
