//! Intrinsic gas validation and refund capping — the bookkeeping
//! `exec-chainspec::gas` exposes per-revision, wired up against a concrete
//! [`Transaction`](crate::transaction::Transaction).

use crate::error::TransactionError;
use crate::transaction::Transaction;
use exec_chainspec::{intrinsic_gas, refund_quotient, AccessListCost, Revision};

fn access_list_cost(tx: &Transaction) -> Option<AccessListCost> {
    if tx.access_list.is_empty() {
        return None;
    }
    let storage_keys = tx.access_list.iter().map(|item| item.storage_keys.len() as u64).sum();
    Some(AccessListCost { addresses: tx.access_list.len() as u64, storage_keys })
}

/// Returns the transaction's intrinsic gas cost, or
/// [`TransactionError::IntrinsicGasGreaterThanLimit`] if it exceeds the
/// transaction's own gas limit.
pub fn validate_intrinsic_gas(tx: &Transaction, revision: Revision) -> Result<u64, TransactionError> {
    let intrinsic = intrinsic_gas(&tx.data, tx.is_contract_creation(), access_list_cost(tx), revision);
    if intrinsic > tx.gas_limit {
        return Err(TransactionError::IntrinsicGasGreaterThanLimit { intrinsic, limit: tx.gas_limit });
    }
    Ok(intrinsic)
}

/// EIP-3529/EIP-2200 refund cap: a transaction may only reclaim
/// `gas_used / refund_quotient(revision)` of whatever the interpreter
/// reported as refundable.
pub fn cap_refund(gas_used: u64, reported_refund: u64, revision: Revision) -> u64 {
    reported_refund.min(gas_used / refund_quotient(revision))
}
