//! Criteria data types.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::validate::{self, CriteriaError};

/// Smallest number printed on a ticket.
pub const MIN_NUMBER: u8 = 1;

/// Largest number printed on a ticket.
pub const MAX_NUMBER: u8 = 90;

/// Where on the ticket the search numbers have to appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Anywhere among the 30 numbers.
    Anywhere,
    /// All inside one row of five.
    SameRow,
    /// All inside the upper three rows, or all inside the lower three.
    SameHalf,
}

impl SearchMode {
    /// Maximum count of search numbers taken from a single decade that a
    /// ticket can ever satisfy in this mode.
    pub fn max_per_decade(self) -> usize {
        match self {
            SearchMode::SameRow => 1,
            SearchMode::SameHalf => 2,
            SearchMode::Anywhere => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SearchMode::Anywhere => "anywhere",
            SearchMode::SameRow => "same_row",
            SearchMode::SameHalf => "same_half",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchMode {
    type Err = CriteriaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "anywhere" => Ok(SearchMode::Anywhere),
            "same_row" => Ok(SearchMode::SameRow),
            "same_half" => Ok(SearchMode::SameHalf),
            other => Err(CriteriaError::UnknownMode(other.to_string())),
        }
    }
}

/// What the user is looking for.
///
/// Deserialized criteria are not trusted: call [`SearchCriteria::validate`]
/// before handing them to an engine. [`SearchCriteria::new`] validates on
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCriteria {
    /// Numbers that must appear, in the order the user entered them.
    /// Only the first few are typed into the page filter.
    #[serde(alias = "searchNumbers")]
    pub search_numbers: Vec<u8>,
    /// Numbers that must not appear anywhere on the ticket.
    #[serde(default, alias = "excludeNumbers")]
    pub exclude_numbers: BTreeSet<u8>,
    pub mode: SearchMode,
    /// How many tickets to buy. Zero means search only.
    #[serde(default, alias = "ticketsToBuy")]
    pub tickets_to_buy: u32,
}

impl SearchCriteria {
    /// Build criteria, rejecting anything a ticket could never satisfy.
    pub fn new(
        search_numbers: Vec<u8>,
        exclude_numbers: impl IntoIterator<Item = u8>,
        mode: SearchMode,
        tickets_to_buy: u32,
    ) -> Result<Self, CriteriaError> {
        let criteria = Self {
            search_numbers,
            exclude_numbers: exclude_numbers.into_iter().collect(),
            mode,
            tickets_to_buy,
        };
        criteria.validate()?;
        Ok(criteria)
    }

    /// Check every invariant: ranges, duplicates, disjointness and decade density.
    pub fn validate(&self) -> Result<(), CriteriaError> {
        validate::validate_criteria(self)
    }

    pub fn is_search_only(&self) -> bool {
        self.tickets_to_buy == 0
    }

    pub fn is_purchase_mode(&self) -> bool {
        self.tickets_to_buy > 0
    }

    /// The leading numbers the vendor's filter widget can accept.
    pub fn filter_numbers(&self, limit: usize) -> &[u8] {
        let end = self.search_numbers.len().min(limit);
        &self.search_numbers[..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_str() {
        assert_eq!("same_row".parse::<SearchMode>().unwrap(), SearchMode::SameRow);
        assert_eq!("anywhere".parse::<SearchMode>().unwrap(), SearchMode::Anywhere);

        let err = "diagonal".parse::<SearchMode>().unwrap_err();
        assert!(matches!(err, CriteriaError::UnknownMode(ref m) if m == "diagonal"));
    }

    #[test]
    fn test_unknown_mode_rejected_on_deserialize() {
        let json = r#"{"search_numbers":[5],"mode":"diagonal"}"#;
        assert!(serde_json::from_str::<SearchCriteria>(json).is_err());
    }

    #[test]
    fn test_deserialize_defaults() {
        let json = r#"{"search_numbers":[5,14],"mode":"same_half"}"#;
        let criteria: SearchCriteria = serde_json::from_str(json).unwrap();
        assert!(criteria.exclude_numbers.is_empty());
        assert_eq!(criteria.tickets_to_buy, 0);
        assert!(criteria.is_search_only());
    }

    #[test]
    fn test_filter_numbers_truncates() {
        let criteria = SearchCriteria::new(
            vec![1, 11, 21, 31, 41, 51, 61, 71, 81],
            [],
            SearchMode::Anywhere,
            0,
        )
        .unwrap();
        assert_eq!(criteria.filter_numbers(7), &[1, 11, 21, 31, 41, 51, 61]);

        let short = SearchCriteria::new(vec![3, 40], [], SearchMode::Anywhere, 2).unwrap();
        assert_eq!(short.filter_numbers(7), &[3, 40]);
        assert!(short.is_purchase_mode());
    }
}
