//! Display-ready view of a single anime.

use crate::models::AnimeRecord;
use chrono::{DateTime, NaiveDate};
use std::fmt;

const UNKNOWN_DATE: &str = "Unknown";

/// Fields a details screen shows, already formatted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimeDetails {
    pub id: u32,
    /// Empty when upstream had no image
    pub image_url: String,
    pub title: String,
    pub is_favourite: bool,
    /// "Aired Apr 05, 2009" or "Aired Unknown"
    pub date_aired: String,
    pub duration: String,
    pub synopsis: String,
    /// Genre names joined with ", "
    pub genres: String,
}

impl AnimeDetails {
    pub fn new(record: &AnimeRecord, is_favourite: bool) -> Self {
        Self {
            id: record.id,
            image_url: record.image_url.clone().unwrap_or_default(),
            title: record.title.clone(),
            is_favourite,
            date_aired: aired_label(record.aired_from.as_deref()),
            duration: record.duration.clone(),
            synopsis: record.synopsis.clone(),
            genres: record
                .genres
                .iter()
                .map(|g| g.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

impl fmt::Display for AnimeDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.is_favourite { " ★" } else { "" };
        writeln!(f, "{} [{}]{}", self.title, self.id, marker)?;
        writeln!(f, "{}", self.date_aired)?;
        if !self.duration.is_empty() {
            writeln!(f, "{}", self.duration)?;
        }
        if !self.genres.is_empty() {
            writeln!(f, "{}", self.genres)?;
        }
        if !self.image_url.is_empty() {
            writeln!(f, "{}", self.image_url)?;
        }
        if !self.synopsis.is_empty() {
            writeln!(f)?;
            writeln!(f, "{}", self.synopsis)?;
        }
        Ok(())
    }
}

/// Format the aired date label, degrading to "Unknown" instead of failing
pub fn aired_label(raw: Option<&str>) -> String {
    let date = raw
        .and_then(parse_date)
        .map(|d| d.format("%b %d, %Y").to_string())
        .unwrap_or_else(|| UNKNOWN_DATE.to_string());
    format!("Aired {}", date)
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
}
