use crate::types::Network;
use crate::workflow::capability::ConfirmationRecord;
use serde::Serialize;

/// Public, stable report entry for one confirmed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub transaction_hash: String,
    pub block_number: u64,
    pub gas_used: String,
    pub href: String,
}

impl Receipt {
    pub fn from_record(record: &ConfirmationRecord, network: Network) -> Self {
        Self {
            transaction_hash: format!("{:#x}", record.transaction_hash),
            block_number: record.block_number,
            gas_used: record.gas_used.to_string(),
            href: network.tx_url(record.transaction_hash),
        }
    }
}

/// Workflow report: one slot per attempted step, `null` where nothing confirmed.
pub type Report = Vec<Option<Receipt>>;

pub fn reduce(outcomes: &[Option<ConfirmationRecord>], network: Network) -> Report {
    outcomes
        .iter()
        .map(|outcome| {
            outcome
                .as_ref()
                .map(|record| Receipt::from_record(record, network))
        })
        .collect()
}

pub fn render(report: &Report) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}
