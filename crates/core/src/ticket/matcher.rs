//! Ticket matching.

use crate::criteria::{SearchCriteria, SearchMode};

use super::types::Ticket;

/// Whether `ticket` satisfies `criteria`.
///
/// Excluded numbers are checked first and veto any positive match.
pub fn matches(ticket: &Ticket, criteria: &SearchCriteria) -> bool {
    if criteria.exclude_numbers.iter().any(|n| ticket.contains(*n)) {
        return false;
    }

    let wanted = &criteria.search_numbers;
    match criteria.mode {
        SearchMode::Anywhere => ticket.has_all_anywhere(wanted),
        SearchMode::SameRow => ticket.has_all_in_same_row(wanted),
        SearchMode::SameHalf => ticket.has_all_in_same_half(wanted),
    }
}

/// The tickets of one page that satisfy `criteria`, in page order.
pub fn matching<'a>(tickets: &'a [Ticket], criteria: &SearchCriteria) -> Vec<&'a Ticket> {
    tickets.iter().filter(|t| matches(t, criteria)).collect()
}
