//! Domain types for personal anime tracking with strong typing.
//!
//! Catalog identifiers, status lists and star ratings are wrapped in
//! dedicated types so that a list key can never be confused with a rating
//! key and a star count can never leave the 1..=5 range.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Catalog (MyAnimeList) identifier of an anime.
///
/// # Examples
///
/// ```rust
/// use allnime::domain::AnimeId;
///
/// let id = AnimeId::new(42);
/// assert_eq!(id.value(), 42);
/// assert_eq!(id.to_string(), "42");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AnimeId(i64);

impl AnimeId {
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn value(&self) -> i64 {
        self.0
    }

    /// Catalog identifiers are strictly positive. Anything else is a
    /// placeholder or a corrupted value and is filtered out of results.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for AnimeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<AnimeId> for i64 {
    fn from(id: AnimeId) -> Self {
        id.0
    }
}

impl From<i64> for AnimeId {
    fn from(id: i64) -> Self {
        Self::new(id)
    }
}

impl FromStr for AnimeId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self::new)
    }
}

impl Serialize for AnimeId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i64(self.0)
    }
}

impl<'de> Deserialize<'de> for AnimeId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let id = i64::deserialize(deserializer)?;
        Ok(Self::new(id))
    }
}

/// One of the four mutually exclusive status lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ListKind {
    PlanToWatch,
    Watching,
    Completed,
    Dropped,
}

impl ListKind {
    pub const ALL: [Self; 4] = [
        Self::PlanToWatch,
        Self::Watching,
        Self::Completed,
        Self::Dropped,
    ];

    /// Storage key the list is persisted under.
    #[must_use]
    pub const fn storage_key(self) -> &'static str {
        match self {
            Self::PlanToWatch => "planToWatchList",
            Self::Watching => "watchingList",
            Self::Completed => "completedList",
            Self::Dropped => "droppedList",
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PlanToWatch => "plan-to-watch",
            Self::Watching => "watching",
            Self::Completed => "completed",
            Self::Dropped => "dropped",
        }
    }

    #[must_use]
    pub fn from_storage_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.storage_key() == key)
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Membership of an identifier across the status lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListStatus {
    #[default]
    None,
    In(ListKind),
}

impl ListStatus {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::In(kind) => kind.name(),
        }
    }
}

impl fmt::Display for ListStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Star rating in the inclusive range 1..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Stars(u8);

impl Stars {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Returns `None` when `value` is outside 1..=5.
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if value >= Self::MIN && value <= Self::MAX {
            Some(Self(value))
        } else {
            None
        }
    }

    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }
}

impl<'de> Deserialize<'de> for Stars {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = u8::deserialize(deserializer)?;
        Self::new(raw).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "rating must be between {} and {}, got {raw}",
                Self::MIN,
                Self::MAX
            ))
        })
    }
}

/// Rejected star values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RatingError {
    #[error("Rating must be between {min} and {max} stars, got {got}", min = Stars::MIN, max = Stars::MAX)]
    OutOfRange { got: i64 },

    #[error("Rating is not a number: '{0}'")]
    NotANumber(String),
}

impl TryFrom<i64> for Stars {
    type Error = RatingError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .and_then(Self::new)
            .ok_or(RatingError::OutOfRange { got: value })
    }
}

impl FromStr for Stars {
    type Err = RatingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<i64>()
            .map_err(|_| RatingError::NotANumber(s.to_string()))?;
        Self::try_from(value)
    }
}

impl fmt::Display for Stars {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0, Self::MAX)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        })
    }
}
