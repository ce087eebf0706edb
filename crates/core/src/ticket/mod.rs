//! Tickets offered by the vendor page and the logic deciding which ones match.

mod matcher;
mod types;

pub use matcher::{matches, matching};
pub use types::{
    Ticket, UserData, NUMBERS_PER_HALF, NUMBERS_PER_ROW, NUMBERS_PER_TICKET, ROWS_PER_TICKET,
};
