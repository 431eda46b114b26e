//! Client-side content filter applied to every catalog read.
//!
//! Two gates run in sequence. The quality gate drops unapproved entries,
//! entries without a title and entries without a positive identifier. The
//! adult gate drops titles flagged adult or carrying a blocked genre name,
//! unless adult content is allowed. The adult gate is a display preference
//! and trivially bypassable; it is not an access-control mechanism.

use regex::Regex;

use crate::models::anime::AnimeRecord;

#[derive(Debug, Clone)]
pub struct ContentFilter {
    allow_adult: bool,
    blocked_genres: Option<Regex>,
}

impl Default for ContentFilter {
    fn default() -> Self {
        Self {
            allow_adult: false,
            blocked_genres: build_matcher(&["Hentai".to_string(), "Erotica".to_string()]),
        }
    }
}

impl ContentFilter {
    #[must_use]
    pub fn new(allow_adult: bool, blocked_genres: &[String]) -> Self {
        Self {
            allow_adult,
            blocked_genres: build_matcher(blocked_genres),
        }
    }

    #[must_use]
    pub const fn allows_adult(&self) -> bool {
        self.allow_adult
    }

    #[must_use]
    pub fn admits(&self, record: &AnimeRecord) -> bool {
        if record.approved == Some(false) || record.title.trim().is_empty() || !record.id.is_valid()
        {
            return false;
        }

        if self.allow_adult {
            return true;
        }

        if record.is_adult {
            return false;
        }

        !record.genres.iter().any(|g| self.blocks_genre(g))
    }

    /// Whether a genre name alone is enough to hide a title.
    #[must_use]
    pub fn blocks_genre(&self, genre: &str) -> bool {
        !self.allow_adult
            && self
                .blocked_genres
                .as_ref()
                .is_some_and(|re| re.is_match(genre))
    }

    #[must_use]
    pub fn apply(&self, records: Vec<AnimeRecord>) -> Vec<AnimeRecord> {
        records.into_iter().filter(|r| self.admits(r)).collect()
    }
}

fn build_matcher(terms: &[String]) -> Option<Regex> {
    let alternatives: Vec<String> = terms
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(regex::escape)
        .collect();

    if alternatives.is_empty() {
        return None;
    }

    Regex::new(&format!("(?i)({})", alternatives.join("|"))).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AnimeId;
    use crate::models::anime::sample_record;

    #[test]
    fn quality_gate() {
        let filter = ContentFilter::new(true, &[]);

        assert!(filter.admits(&sample_record(1, "Cowboy Bebop")));

        let mut unapproved = sample_record(2, "Pending");
        unapproved.approved = Some(false);
        assert!(!filter.admits(&unapproved));

        let mut unknown_approval = sample_record(3, "Legacy");
        unknown_approval.approved = None;
        assert!(filter.admits(&unknown_approval));

        assert!(!filter.admits(&sample_record(4, "   ")));

        let mut no_id = sample_record(5, "Unmapped");
        no_id.id = AnimeId::new(0);
        assert!(!filter.admits(&no_id));
    }

    #[test]
    fn adult_gate_matches_genre_substrings_case_insensitively() {
        let filter = ContentFilter::default();

        let mut record = sample_record(10, "Something");
        record.genres = vec!["Romance".to_string(), "hentai".to_string()];
        assert!(!filter.admits(&record));

        record.genres = vec!["Erotica (Soft)".to_string()];
        assert!(!filter.admits(&record));

        record.genres = vec!["Ecchi".to_string()];
        assert!(filter.admits(&record));

        record.is_adult = true;
        assert!(!filter.admits(&record));
    }

    #[test]
    fn allowing_adult_disables_only_the_adult_gate() {
        let filter = ContentFilter::new(true, &["Hentai".to_string()]);
        let mut record = sample_record(11, "Flagged");
        record.is_adult = true;
        record.genres = vec!["Hentai".to_string()];
        assert!(filter.admits(&record));

        record.approved = Some(false);
        assert!(!filter.admits(&record));
    }

    #[test]
    fn blocked_terms_are_escaped() {
        let filter = ContentFilter::new(false, &["R+".to_string(), " ".to_string()]);
        let mut record = sample_record(12, "Escaped");
        record.genres = vec!["RRR".to_string()];
        assert!(filter.admits(&record));
        record.genres = vec!["Rated R+".to_string()];
        assert!(!filter.admits(&record));
    }

    #[test]
    fn apply_keeps_order() {
        let filter = ContentFilter::default();
        let records = vec![
            sample_record(3, "C"),
            sample_record(0, "Dropped"),
            sample_record(1, "A"),
        ];
        let kept: Vec<i64> = filter.apply(records).iter().map(|r| r.id.value()).collect();
        assert_eq!(kept, vec![3, 1]);
    }
}
