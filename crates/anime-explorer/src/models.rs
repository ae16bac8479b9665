//! Domain models shared by the store, the client and the CLI.

use crate::api::types::{GenreItem, JikanAnime};
use serde::{Deserialize, Serialize};

/// Genre attached to an anime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreRef {
    pub id: u32,
    pub name: String,
}

/// Genre offered as a filter choice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: u32,
    pub name: String,
    /// Number of anime tagged with this genre upstream
    pub count: u32,
}

/// Anime as held by the store. Never mutated once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimeRecord {
    /// MyAnimeList id, the identity key
    pub id: u32,
    pub title: String,
    pub image_url: Option<String>,
    /// Raw start date as sent upstream; may be absent or unparseable
    pub aired_from: Option<String>,
    pub duration: String,
    pub synopsis: String,
    pub genres: Vec<GenreRef>,

    pub url: Option<String>,
    pub airing: bool,
    pub rating: Option<String>,
    pub score: Option<f64>,
    pub season: Option<String>,
    pub year: Option<u32>,
}

impl AnimeRecord {
    /// Minimal record, mostly useful for tests and fixtures
    pub fn new(id: u32, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            image_url: None,
            aired_from: None,
            duration: String::new(),
            synopsis: String::new(),
            genres: Vec::new(),
            url: None,
            airing: false,
            rating: None,
            score: None,
            season: None,
            year: None,
        }
    }

    /// Builder-style helper to attach genres
    pub fn with_genres(mut self, genres: &[(u32, &str)]) -> Self {
        self.genres = genres
            .iter()
            .map(|(id, name)| GenreRef {
                id: *id,
                name: (*name).to_string(),
            })
            .collect();
        self
    }

    /// Whether any of this record's genres is in `ids`
    pub fn has_any_genre(&self, ids: impl Fn(u32) -> bool) -> bool {
        self.genres.iter().any(|g| ids(g.id))
    }
}

impl From<JikanAnime> for AnimeRecord {
    fn from(raw: JikanAnime) -> Self {
        let images = raw.images.unwrap_or_default();
        let image_url = images
            .jpg
            .and_then(|set| set.image_url)
            .or_else(|| images.webp.and_then(|set| set.image_url))
            .filter(|url| !url.is_empty());

        Self {
            id: raw.mal_id,
            title: raw.title,
            image_url,
            aired_from: raw.aired.and_then(|aired| aired.from),
            duration: raw.duration.unwrap_or_default(),
            synopsis: raw.synopsis.unwrap_or_default(),
            genres: raw
                .genres
                .into_iter()
                .map(|g| GenreRef {
                    id: g.mal_id,
                    name: g.name,
                })
                .collect(),
            url: raw.url,
            airing: raw.airing,
            rating: raw.rating,
            score: raw.score,
            season: raw.season,
            year: raw.year,
        }
    }
}

impl From<GenreItem> for Genre {
    fn from(item: GenreItem) -> Self {
        Self {
            id: item.mal_id,
            name: item.name,
            count: item.count,
        }
    }
}
