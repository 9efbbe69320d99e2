//! Display password derived from the identity info.
//!
//! The output is a demo artifact: two initials, the two-digit birth year and
//! month, one special character and a three digit number. It carries no
//! entropy guarantee and must not be used as a credential.

use super::domain::IdentityInfo;
use rand::seq::SliceRandom;
use rand::Rng;
use std::ops::RangeInclusive;

pub const SPECIAL_CHARACTERS: [char; 10] = ['!', '@', '#', '$', '%', '^', '&', '*', '(', ')'];
pub const SUFFIX_RANGE: RangeInclusive<u32> = 100..=999;

/// Source of the non-deterministic password parts.
pub trait RandomSource: Send + Sync {
    /// Uniform integer in `range`.
    fn next_int(&self, range: RangeInclusive<u32>) -> u32;

    /// Uniform pick from `set`; `None` only when `set` is empty.
    fn next_char(&self, set: &[char]) -> Option<char>;
}

/// [`RandomSource`] backed by the thread-local generator from `rand`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_int(&self, range: RangeInclusive<u32>) -> u32 {
        rand::thread_rng().gen_range(range)
    }

    fn next_char(&self, set: &[char]) -> Option<char> {
        set.choose(&mut rand::thread_rng()).copied()
    }
}

pub fn generate_password(info: &IdentityInfo, rng: &dyn RandomSource) -> String {
    let initials: String = info
        .first_name
        .chars()
        .take(2)
        .flat_map(char::to_uppercase)
        .collect();

    let mut segments = info.date_of_birth.split('-');
    let year = segments.next().unwrap_or_default();
    let month = segments.next().unwrap_or_default();
    let year_chars: Vec<char> = year.chars().collect();
    let short_year: String = year_chars[year_chars.len().saturating_sub(2)..]
        .iter()
        .collect();

    let special: String = rng.next_char(&SPECIAL_CHARACTERS).into_iter().collect();
    let suffix = rng.next_int(SUFFIX_RANGE);

    format!("{initials}{short_year}{month}{special}{suffix}")
}
