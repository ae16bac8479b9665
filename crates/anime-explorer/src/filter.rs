//! Pure projections over the fetched record list.

use crate::favourites::FavouriteSet;
use crate::models::AnimeRecord;
use std::collections::BTreeSet;

/// Selected genre ids. Empty means no filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenreFilter {
    ids: BTreeSet<u32>,
}

impl GenreFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: u32) -> bool {
        self.ids.contains(&id)
    }

    /// Add the genre if absent, remove it if present.
    /// Returns whether it is selected afterwards.
    pub fn toggle(&mut self, id: u32) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    /// Selected ids in ascending order, as sent to the API
    pub fn ids(&self) -> Vec<u32> {
        self.ids.iter().copied().collect()
    }

    /// Whether `record` carries at least one selected genre.
    /// Always true for an empty filter.
    pub fn matches(&self, record: &AnimeRecord) -> bool {
        self.is_empty() || record.has_any_genre(|id| self.contains(id))
    }
}

impl FromIterator<u32> for GenreFilter {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

/// Everything that narrows the displayed list
#[derive(Debug, Clone, Copy)]
pub struct ListFilter<'a> {
    pub favourites_only: bool,
    pub genres: &'a GenreFilter,
}

impl<'a> ListFilter<'a> {
    pub fn is_active(&self) -> bool {
        self.favourites_only || !self.genres.is_empty()
    }

    /// Project `records` through the filter without touching its inputs
    pub fn apply(&self, records: &[AnimeRecord], favourites: &FavouriteSet) -> Vec<AnimeRecord> {
        if !self.is_active() {
            return records.to_vec();
        }

        records
            .iter()
            .filter(|record| !self.favourites_only || favourites.contains(record.id))
            .filter(|record| self.genres.matches(record))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<AnimeRecord> {
        vec![
            AnimeRecord::new(1, "Action Only").with_genres(&[(1, "Action")]),
            AnimeRecord::new(2, "Comedy Only").with_genres(&[(8, "Comedy")]),
            AnimeRecord::new(3, "Both").with_genres(&[(1, "Action"), (8, "Comedy")]),
            AnimeRecord::new(4, "None"),
        ]
    }

    fn ids(list: &[AnimeRecord]) -> Vec<u32> {
        list.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_inactive_filter_is_identity() {
        let genres = GenreFilter::new();
        let filter = ListFilter { favourites_only: false, genres: &genres };
        let favourites: FavouriteSet = [2].into_iter().collect();

        assert_eq!(filter.apply(&records(), &favourites), records());
    }

    #[test]
    fn test_favourites_only() {
        let genres = GenreFilter::new();
        let filter = ListFilter { favourites_only: true, genres: &genres };
        let favourites: FavouriteSet = [2, 4, 99].into_iter().collect();

        assert_eq!(ids(&filter.apply(&records(), &favourites)), vec![2, 4]);
    }

    #[test]
    fn test_genre_intersection() {
        let genres: GenreFilter = [8].into_iter().collect();
        let filter = ListFilter { favourites_only: false, genres: &genres };

        assert_eq!(ids(&filter.apply(&records(), &FavouriteSet::new())), vec![2, 3]);

        let genres: GenreFilter = [1, 46].into_iter().collect();
        let filter = ListFilter { favourites_only: false, genres: &genres };
        assert_eq!(ids(&filter.apply(&records(), &FavouriteSet::new())), vec![1, 3]);
    }

    #[test]
    fn test_combined() {
        let genres: GenreFilter = [1].into_iter().collect();
        let filter = ListFilter { favourites_only: true, genres: &genres };
        let favourites: FavouriteSet = [2, 3].into_iter().collect();

        assert_eq!(ids(&filter.apply(&records(), &favourites)), vec![3]);
    }

    #[test]
    fn test_genre_toggle() {
        let mut genres = GenreFilter::new();
        assert!(genres.toggle(46));
        assert!(genres.toggle(1));
        assert_eq!(genres.ids(), vec![1, 46]);
        assert!(!genres.toggle(46));
        assert_eq!(genres.ids(), vec![1]);
    }
}
