//! Criteria validation.
//!
//! A ticket column holds one decade (1-9, 10-19, ..., 80-90), so a row can
//! carry at most one number of a decade, a half at most two, and the whole
//! ticket at most four. Criteria that ask for more can never match and are
//! rejected before a session is created.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use super::types::{SearchCriteria, SearchMode, MAX_NUMBER, MIN_NUMBER};

/// Reasons criteria are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CriteriaError {
    #[error("at least one search number is required")]
    NoSearchNumbers,

    #[error("number {0} is outside 1-90")]
    OutOfRange(u8),

    #[error("search number {0} is listed more than once")]
    DuplicateNumber(u8),

    #[error("numbers {0:?} are both searched for and excluded")]
    Overlap(Vec<u8>),

    #[error(
        "a ticket cannot hold more than {max} numbers from decade {decade} in mode {mode}, got {found:?}"
    )]
    DecadeDensity {
        mode: SearchMode,
        decade: String,
        max: usize,
        found: Vec<u8>,
    },

    #[error("unknown search mode: {0}")]
    UnknownMode(String),
}

/// Decade index of a ticket number: 0 for 1-9, 8 for 80-90, `n / 10` otherwise.
pub fn decade_of(n: u8) -> u8 {
    match n {
        0..=9 => 0,
        80..=u8::MAX => 8,
        _ => n / 10,
    }
}

/// Human-readable decade range, e.g. `"10-19"` or `"80-90"`.
pub fn decade_label(decade: u8) -> String {
    match decade {
        0 => "1-9".to_string(),
        8 => "80-90".to_string(),
        d => format!("{}-{}", d * 10, d * 10 + 9),
    }
}

pub(super) fn validate_criteria(criteria: &SearchCriteria) -> Result<(), CriteriaError> {
    if criteria.search_numbers.is_empty() {
        return Err(CriteriaError::NoSearchNumbers);
    }

    let mut seen = BTreeSet::new();
    for &n in &criteria.search_numbers {
        check_range(n)?;
        if !seen.insert(n) {
            return Err(CriteriaError::DuplicateNumber(n));
        }
    }
    for &n in &criteria.exclude_numbers {
        check_range(n)?;
    }

    let overlap: Vec<u8> = criteria
        .exclude_numbers
        .iter()
        .copied()
        .filter(|n| seen.contains(n))
        .collect();
    if !overlap.is_empty() {
        return Err(CriteriaError::Overlap(overlap));
    }

    check_decade_density(&criteria.search_numbers, criteria.mode)
}

fn check_range(n: u8) -> Result<(), CriteriaError> {
    if (MIN_NUMBER..=MAX_NUMBER).contains(&n) {
        Ok(())
    } else {
        Err(CriteriaError::OutOfRange(n))
    }
}

fn check_decade_density(numbers: &[u8], mode: SearchMode) -> Result<(), CriteriaError> {
    let mut by_decade: BTreeMap<u8, Vec<u8>> = BTreeMap::new();
    for &n in numbers {
        by_decade.entry(decade_of(n)).or_default().push(n);
    }

    let max = mode.max_per_decade();
    match by_decade.into_iter().find(|(_, found)| found.len() > max) {
        Some((decade, found)) => Err(CriteriaError::DecadeDensity {
            mode,
            decade: decade_label(decade),
            max,
            found,
        }),
        None => Ok(()),
    }
}
