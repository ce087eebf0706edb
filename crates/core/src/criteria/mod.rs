//! Search criteria: the numbers a user wants, the numbers they refuse, and
//! how the wanted numbers must be laid out on a ticket.

mod types;
mod validate;

pub use types::{SearchCriteria, SearchMode, MAX_NUMBER, MIN_NUMBER};
pub use validate::{decade_label, decade_of, CriteriaError};
