//! Core ticket data types.

use serde::{Deserialize, Serialize};

/// Numbers printed on one ticket.
pub const NUMBERS_PER_TICKET: usize = 30;

/// Rows on one ticket.
pub const ROWS_PER_TICKET: usize = 6;

/// Numbers in one row.
pub const NUMBERS_PER_ROW: usize = 5;

/// Numbers in one half (three rows).
pub const NUMBERS_PER_HALF: usize = NUMBERS_PER_TICKET / 2;

/// A ticket offered by the vendor page.
///
/// The 30 numbers are laid out as 6 rows of 5 in reading order: row `i`
/// occupies indices `5i..5i + 5`. The page executor is responsible for
/// producing exactly 30 numbers; nothing here re-checks that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Vendor identifier, used to click the ticket.
    pub ticket_id: String,
    pub numbers: Vec<u8>,
}

impl Ticket {
    pub fn new(ticket_id: impl Into<String>, numbers: Vec<u8>) -> Self {
        Self {
            ticket_id: ticket_id.into(),
            numbers,
        }
    }

    pub fn contains(&self, number: u8) -> bool {
        self.numbers.contains(&number)
    }

    /// Rows of five, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.numbers.chunks(NUMBERS_PER_ROW).take(ROWS_PER_TICKET)
    }

    /// Rows 0-2.
    pub fn upper_half(&self) -> &[u8] {
        let end = self.numbers.len().min(NUMBERS_PER_HALF);
        &self.numbers[..end]
    }

    /// Rows 3-5.
    pub fn lower_half(&self) -> &[u8] {
        let start = self.numbers.len().min(NUMBERS_PER_HALF);
        let end = self.numbers.len().min(NUMBERS_PER_TICKET);
        &self.numbers[start..end]
    }

    pub fn has_all_anywhere(&self, wanted: &[u8]) -> bool {
        wanted.iter().all(|n| self.contains(*n))
    }

    pub fn has_all_in_same_row(&self, wanted: &[u8]) -> bool {
        self.rows().any(|row| wanted.iter().all(|n| row.contains(n)))
    }

    pub fn has_all_in_same_half(&self, wanted: &[u8]) -> bool {
        let upper = self.upper_half();
        let lower = self.lower_half();
        wanted.iter().all(|n| upper.contains(n)) || wanted.iter().all(|n| lower.contains(n))
    }
}

/// Account data scraped from the vendor page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    pub is_authorized: bool,
    /// Wallet balance in the vendor's currency units.
    #[serde(default)]
    pub balance: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequential_ticket() -> Ticket {
        Ticket::new("t-1", (1..=30).collect())
    }

    #[test]
    fn test_rows_and_halves() {
        let ticket = sequential_ticket();
        let rows: Vec<&[u8]> = ticket.rows().collect();
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0], &[1, 2, 3, 4, 5]);
        assert_eq!(rows[5], &[26, 27, 28, 29, 30]);
        assert_eq!(ticket.upper_half().len(), 15);
        assert_eq!(ticket.upper_half()[14], 15);
        assert_eq!(ticket.lower_half()[0], 16);
    }

    #[test]
    fn test_layout_checks() {
        let ticket = sequential_ticket();
        assert!(ticket.has_all_anywhere(&[1, 30]));
        assert!(ticket.has_all_in_same_row(&[6, 10]));
        assert!(!ticket.has_all_in_same_row(&[5, 6]));
        assert!(ticket.has_all_in_same_half(&[1, 15]));
        assert!(!ticket.has_all_in_same_half(&[15, 16]));
        assert!(!ticket.has_all_anywhere(&[31]));
    }

    #[test]
    fn test_ticket_deserialize() {
        let json = r#"{"ticket_id":"abc","numbers":[1,2,3]}"#;
        let ticket: Ticket = serde_json::from_str(json).unwrap();
        assert_eq!(ticket.ticket_id, "abc");
        assert_eq!(ticket.numbers, vec![1, 2, 3]);
    }
}
