//! Record store ports for positions, additional purchases and close-outs.

use crate::domain::closeout::ClosedPosition;
use crate::domain::error::RectrackError;
use crate::domain::position::{AdditionalBuy, ListedCode, NewPosition, Position};

pub trait PositionStore {
    fn list_positions(&self) -> Result<Vec<Position>, RectrackError>;

    fn find_position(&self, id: i64) -> Result<Option<Position>, RectrackError>;

    /// Returns the id assigned to the new row.
    fn insert_position(&self, position: &NewPosition) -> Result<i64, RectrackError>;

    /// Returns whether a row was removed.
    fn delete_position(&self, id: i64) -> Result<bool, RectrackError>;
}

pub trait AdditionalBuyStore {
    /// All purchases in entry order: ascending date, same-date rows in the
    /// order they were recorded. The composite cap is applied in this order.
    fn list_additional_buys(&self) -> Result<Vec<AdditionalBuy>, RectrackError>;

    fn insert_additional_buy(&self, buy: &AdditionalBuy) -> Result<(), RectrackError>;
}

/// Sink for finalized close-out records.
pub trait ClosedPositionArchive {
    fn archive(&self, record: &ClosedPosition) -> Result<(), RectrackError>;

    /// Archived records, most recent sell date first.
    fn list_closed(&self) -> Result<Vec<ClosedPosition>, RectrackError>;
}

/// Store that can archive a close-out and drop the live position as one unit.
pub trait CloseOutStore: PositionStore + ClosedPositionArchive {
    /// Archive `record` and remove position `id`. Either both happen or
    /// neither does; an unknown `id` is `PositionNotFound`.
    fn close_out(&self, id: i64, record: &ClosedPosition) -> Result<(), RectrackError>;
}

/// Listed-company name to ticker code lookup.
pub trait CodeDirectory {
    /// Case-insensitive substring match on the name, at most `limit` rows.
    fn search_codes(&self, query: &str, limit: usize) -> Result<Vec<ListedCode>, RectrackError>;
}
