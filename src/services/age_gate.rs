//! Decides whether adult titles may be shown for a given profile.
//!
//! Only the birthday is trusted. An account creation date says nothing
//! about the holder's age, so it is carried for display but never used.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const ADULT_AGE: u32 = 18;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub birthday: Option<NaiveDate>,
    pub account_created: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeVerdict {
    Adult,
    Minor,
    Unknown,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AgeGate {
    assume_adult_when_unknown: bool,
}

impl AgeGate {
    #[must_use]
    pub const fn new(assume_adult_when_unknown: bool) -> Self {
        Self {
            assume_adult_when_unknown,
        }
    }

    #[must_use]
    pub fn evaluate(&self, profile: &Profile, today: NaiveDate) -> AgeVerdict {
        let Some(birthday) = profile.birthday else {
            return AgeVerdict::Unknown;
        };

        match age_on(birthday, today) {
            Some(age) if age >= ADULT_AGE => AgeVerdict::Adult,
            Some(_) => AgeVerdict::Minor,
            // Birthday in the future.
            None => AgeVerdict::Unknown,
        }
    }

    /// Whether the verdict unlocks adult titles.
    #[must_use]
    pub const fn permits_adult(&self, verdict: AgeVerdict) -> bool {
        match verdict {
            AgeVerdict::Adult => true,
            AgeVerdict::Minor => false,
            AgeVerdict::Unknown => self.assume_adult_when_unknown,
        }
    }

    #[must_use]
    pub fn allows_adult(&self, profile: &Profile, today: NaiveDate) -> bool {
        let verdict = self.evaluate(profile, today);
        let allowed = self.permits_adult(verdict);
        debug!(?verdict, allowed, "Age gate evaluated");
        allowed
    }
}

/// Completed years between `birthday` and `today`, `None` if born after today.
#[must_use]
pub fn age_on(birthday: NaiveDate, today: NaiveDate) -> Option<u32> {
    if birthday > today {
        return None;
    }

    let mut years = today.year() - birthday.year();
    if (today.month(), today.day()) < (birthday.month(), birthday.day()) {
        years -= 1;
    }
    u32::try_from(years).ok()
}
