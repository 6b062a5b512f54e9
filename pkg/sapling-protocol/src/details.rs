//! Transaction descriptions as shown to a user

use std::collections::HashSet;

use sapling::{Party, TransactionDetails};
use serde::{Deserialize, Serialize};

use crate::address::{encode_shielded_address, BaseChainAddress};

/// How the pool itself appears as a counterparty
pub const SHIELDED_POOL: &str = "Shielded Pool";

/// A [`TransactionDetails`] with every party rendered as text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayDetails {
    pub from: Vec<String>,
    pub to: Vec<String>,
    pub is_inbound: bool,
    pub amount: u64,
    pub fee: u64,
    /// Hex encoded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    /// The contract an unsigned transaction is meant for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,
}

fn render(party: &Party) -> String {
    match party {
        Party::ShieldedPool => SHIELDED_POOL.to_owned(),
        Party::Shielded(address) => encode_shielded_address(address),
        Party::External(packed) => match BaseChainAddress::unpack(packed) {
            Some(address) => address.to_string(),
            None => hex::encode(packed),
        },
    }
}

impl From<TransactionDetails> for DisplayDetails {
    fn from(details: TransactionDetails) -> Self {
        Self {
            from: details.from.iter().map(render).collect(),
            to: details.to.iter().map(render).collect(),
            is_inbound: details.is_inbound,
            amount: details.amount,
            fee: details.fee,
            memo: details.memo.map(hex::encode),
            destination: None,
            chain_id: None,
        }
    }
}

/// Drop entries that only move value back to where it came from
///
/// An entry is kept if its sender and recipient lists differ in length, or if some sender is not
/// among the recipients. If nothing would be kept, every entry is returned instead
pub fn filter_out_paybacks(details: Vec<DisplayDetails>) -> Vec<DisplayDetails> {
    let is_payment = |entry: &DisplayDetails| {
        if entry.from.len() != entry.to.len() {
            return true;
        }

        let to: HashSet<&String> = entry.to.iter().collect();
        entry.from.iter().any(|address| !to.contains(address))
    };

    match details.iter().any(is_payment) {
        true => details.into_iter().filter(is_payment).collect(),
        false => details,
    }
}
