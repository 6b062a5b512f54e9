use sapling::{
    bookkeeper::{get_incoming_inputs, get_outgoing_inputs},
    InputNote, StateDiff, ViewingKey,
};
use serde::{Deserialize, Serialize};

use crate::details::DisplayDetails;

/// Where the next page of history starts
///
/// Pages count backwards from the most recent note, so new notes arriving between calls shift
/// entries towards later pages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionCursor {
    pub page: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionPage {
    pub transactions: Vec<DisplayDetails>,
    pub cursor: TransactionCursor,
}

/// Notes of `viewing_key` found by walking `diff` backwards in pages of `limit` notes
///
/// Reads whole pages, starting at `cursor`, until at least `limit` notes were found or the diff
/// is exhausted. Returns the incoming notes, the outgoing notes, and the first unread page
pub(crate) fn walk_pages(
    viewing_key: &ViewingKey,
    diff: &StateDiff,
    limit: usize,
    cursor: TransactionCursor,
) -> (Vec<InputNote>, Vec<InputNote>, TransactionCursor) {
    let mut indexed = diff.indexed();
    indexed.reverse();

    let mut incoming = Vec::new();
    let mut outgoing = Vec::new();
    let mut page = cursor.page;

    while incoming.len() + outgoing.len() < limit {
        let start = page.saturating_mul(limit);
        if start >= indexed.len() {
            break;
        }

        let notes = &indexed[start..indexed.len().min(start + limit)];
        incoming.extend(get_incoming_inputs(viewing_key, notes));
        outgoing.extend(get_outgoing_inputs(viewing_key, notes));

        page += 1;
    }

    (incoming, outgoing, TransactionCursor { page })
}
