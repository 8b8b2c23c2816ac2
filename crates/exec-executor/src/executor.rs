//! The six-phase block executor: sender recovery, static validation,
//! speculative parallel execution with ordered commit-and-retry, block
//! reward, receipt/bloom assembly, and root computation against the
//! header's claims.
//!
//! Sender recovery and speculative execution both fan out across
//! [`PriorityPool`]'s worker threads, submitted with `priority = index` so
//! the pool drains transactions in block order under contention rather than
//! whichever finishes recovering its signature first. Speculative execution
//! runs each transaction against its own [`BlockState::snapshot`] pinned to
//! the state as of the start of the block — cheap because the snapshot
//! shares the canonical trie's on-disk chunk log and only pays for a fresh
//! read cache — and buffers its writes in a [`exec_state::Overlay`] instead
//! of applying them. A second, strictly serial pass then walks the
//! transactions in order and gates each one on
//! [`exec_state::AccessSet::can_merge_after`]: if nothing it read was
//! written by an earlier transaction in this block, its speculative overlay
//! is applied as-is; otherwise it re-executes synchronously against the
//! now-current real state and that result is applied instead. A
//! transaction is re-executed at most once, exactly when an earlier
//! transaction it raced against committed a conflicting write.

use crate::block::Block;
use crate::context::TxContext;
use crate::error::{BlockError, BlockResult, TransactionError};
use crate::gas;
use crate::receipt::{Bloom, Receipt};
use crate::roots;
use crate::transaction::{Transaction, TxType};
use exec_chainspec::ChainSpec;
use exec_crypto::CryptoError;
use exec_evm_host::{apply_sender_prelude, BlockHashRing, Evm, ExecHost, Message, MessageKind};
use exec_fiber::{Priority, PriorityPool};
use exec_primitives::{Address, Hash256, U256};
use exec_rlp::encode::Encodable;
use exec_state::{detect_conflicts, AccessSet, BlockState, Overlay, TransactionState};
use std::path::Path;
use std::sync::Arc;

pub const MAX_INITCODE_SIZE: usize = 2 * 24_576;

pub struct ExecutionOutcome {
    pub receipts: Vec<Receipt>,
    pub bloom: Bloom,
    pub gas_used: u64,
    pub state_root: Hash256,
    pub transactions_root: Hash256,
    pub receipts_root: Hash256,
}

/// Recovers every transaction's sender in parallel across `pool`'s
/// workers, preserving block order in the returned vector.
fn recover_senders(
    transactions: &[Transaction],
    pool: &PriorityPool,
) -> Vec<Result<Address, CryptoError>> {
    let (result_tx, result_rx) = crossbeam_channel::bounded(transactions.len().max(1));
    for (index, tx) in transactions.iter().enumerate() {
        let tx = tx.clone();
        let result_tx = result_tx.clone();
        pool.submit(Priority(index as u64), move || {
            let recovered = tx.recover_sender();
            let _ = result_tx.send((index, recovered));
        });
    }
    drop(result_tx);

    let mut out: Vec<Option<Result<Address, CryptoError>>> = (0..transactions.len()).map(|_| None).collect();
    for _ in 0..transactions.len() {
        let (index, recovered) = result_rx.recv().expect("every submitted task replies exactly once");
        out[index] = Some(recovered);
    }
    out.into_iter().map(|entry| entry.expect("every index filled")).collect()
}

fn static_validate_transaction(
    tx: &Transaction,
    chain_id: u64,
    revision: exec_chainspec::Revision,
    base_fee: Option<U256>,
) -> Result<(), TransactionError> {
    if !matches!(tx.tx_type, TxType::Legacy) || tx.chain_id.is_some() {
        if let Some(found) = tx.chain_id {
            if found != chain_id {
                return Err(TransactionError::WrongChainId { expected: chain_id, found: Some(found) });
            }
        }
    }
    if let (Some(max_fee), Some(base)) = (tx.max_fee_per_gas, base_fee) {
        if max_fee < base {
            return Err(TransactionError::MaxFeeLessThanBase { max_fee, base_fee: base });
        }
    }
    if let (Some(priority), Some(max_fee)) = (tx.max_priority_fee_per_gas, tx.max_fee_per_gas) {
        if priority > max_fee {
            return Err(TransactionError::PriorityFeeGreaterThanMax { priority, max_fee });
        }
    }
    if tx.nonce == u64::MAX {
        return Err(TransactionError::NonceExceedsMax { address: Address::ZERO, nonce: tx.nonce });
    }
    if tx.is_contract_creation() && tx.data.len() > MAX_INITCODE_SIZE {
        return Err(TransactionError::InitCodeLimitExceeded { size: tx.data.len(), limit: MAX_INITCODE_SIZE });
    }
    gas::validate_intrinsic_gas(tx, revision)?;
    Ok(())
}

/// Runs one transaction against `state` — which may be the block's real
/// state (a serial retry) or a [`BlockState::snapshot`] (the speculative
/// phase) — returning its receipt, gas used, and its buffered writes as an
/// [`Overlay`] the caller applies (or discards) separately. Never merges
/// into `state` itself: that decision belongs to [`execute_block`]'s commit
/// phase, which is the only place that knows whether this result is safe to
/// keep.
fn execute_transaction(
    tx: &Transaction,
    sender: Address,
    revision: exec_chainspec::Revision,
    ctx: &TxContext,
    state: &mut BlockState,
    block_hashes: &BlockHashRing,
    evm: &dyn Evm,
) -> BlockResult<(Receipt, u64, Overlay, AccessSet)> {
    let intrinsic = gas::validate_intrinsic_gas(tx, revision)?;

    let mut tx_state = TransactionState::new(state);
    let account = tx_state.get_account(&sender).map_err(BlockError::State)?;
    if account.code_hash != exec_primitives::NULL_HASH {
        return Err(BlockError::Transaction(TransactionError::SenderNotEOA { address: sender }));
    }

    let gas_cost = ctx.gas_price * U256::from_u64(tx.gas_limit);
    apply_sender_prelude(&mut tx_state, &sender, tx.nonce, tx.upfront_cost(), gas_cost).map_err(|err| {
        BlockError::Transaction(match err {
            exec_state::StateError::NonceMismatch { address, expected, found } => {
                TransactionError::BadNonce { address, expected, found }
            }
            exec_state::StateError::InsufficientBalance { address, balance, required } => {
                TransactionError::InsufficientBalance { address, balance, required }
            }
            other => return BlockError::State(other),
        })
    })?;

    let gas_after_intrinsic = tx.gas_limit - intrinsic;
    let message = Message {
        kind: if tx.is_contract_creation() { MessageKind::Create } else { MessageKind::Call },
        depth: 0,
        gas: gas_after_intrinsic,
        sender,
        recipient: tx.to.unwrap_or(Address::ZERO),
        input: tx.data.clone(),
        value: tx.value,
        create2_salt: None,
    };

    let mut host = ExecHost::new(&mut tx_state, block_hashes);
    let result = evm.execute(revision, message, &mut host);
    let logs = std::mem::take(&mut host.logs);
    drop(host);

    let gas_used = gas_after_intrinsic.saturating_sub(result.gas_left).saturating_add(intrinsic);
    let refund = gas::cap_refund(gas_used, result.gas_refund, revision);
    let net_gas_used = gas_used.saturating_sub(refund);

    let gas_price = ctx.gas_price;
    let priority_fee = gas_price.saturating_sub(ctx.base_fee.unwrap_or(U256::ZERO));
    let refunded_wei = gas_price * U256::from_u64(tx.gas_limit - net_gas_used);
    let mut sender_account = tx_state.get_account(&sender).map_err(BlockError::State)?;
    sender_account.balance = sender_account.balance.saturating_add(refunded_wei);
    tx_state.set_account(sender, sender_account);

    let mut coinbase_account = tx_state.get_account(&ctx.coinbase).map_err(BlockError::State)?;
    coinbase_account.balance =
        coinbase_account.balance.saturating_add(priority_fee * U256::from_u64(net_gas_used));
    tx_state.set_account(ctx.coinbase, coinbase_account);

    let receipt = Receipt::from_logs(tx.tx_type, result.is_success(), net_gas_used, logs);
    let (overlay, access) = tx_state.into_overlay();
    Ok((receipt, net_gas_used, overlay, access))
}

/// Runs every transaction in `transactions` in parallel against its own
/// [`BlockState::snapshot`] pinned to `state`'s roots at call time, tagged
/// with `priority = index` so the pool drains them in block order under
/// contention. Returns results in the original transaction order.
#[allow(clippy::too_many_arguments)]
fn speculative_execute(
    transactions: &[Transaction],
    senders: &[Address],
    ctxs: &[TxContext],
    revision: exec_chainspec::Revision,
    state: &BlockState,
    block_hashes: &BlockHashRing,
    evm: &Arc<dyn Evm>,
    pool: &PriorityPool,
) -> Vec<BlockResult<(Receipt, u64, Overlay, AccessSet)>> {
    let (result_tx, result_rx) = crossbeam_channel::bounded(transactions.len().max(1));
    for (index, tx) in transactions.iter().enumerate() {
        let tx = tx.clone();
        let sender = senders[index];
        let ctx = ctxs[index].clone();
        let mut snapshot = state.snapshot();
        let block_hashes = block_hashes.clone();
        let evm = evm.clone();
        let result_tx = result_tx.clone();
        pool.submit(Priority(index as u64), move || {
            let result = execute_transaction(&tx, sender, revision, &ctx, &mut snapshot, &block_hashes, evm.as_ref());
            let _ = result_tx.send((index, result));
        });
    }
    drop(result_tx);

    let mut out: Vec<Option<BlockResult<(Receipt, u64, Overlay, AccessSet)>>> =
        (0..transactions.len()).map(|_| None).collect();
    for _ in 0..transactions.len() {
        let (index, result) = result_rx.recv().expect("every submitted task replies exactly once");
        out[index] = Some(result);
    }
    out.into_iter().map(|entry| entry.expect("every index filled")).collect()
}

pub fn execute_block(
    block: &Block,
    state: &mut BlockState,
    chain: &ChainSpec,
    block_hashes: &BlockHashRing,
    evm: Arc<dyn Evm>,
    pool: &PriorityPool,
    roots_dir: impl AsRef<Path>,
) -> BlockResult<ExecutionOutcome> {
    let revision = chain.revision_at(block.header.number);
    let senders_recovered = recover_senders(&block.transactions, pool);

    let mut senders = Vec::with_capacity(block.transactions.len());
    let mut ctxs = Vec::with_capacity(block.transactions.len());
    let mut cumulative_declared_gas: u64 = 0;
    for (tx, sender_result) in block.transactions.iter().zip(senders_recovered.into_iter()) {
        let sender = sender_result.map_err(|_| BlockError::Transaction(TransactionError::MissingSender))?;
        static_validate_transaction(tx, chain.chain_id, revision, block.header.base_fee_per_gas)?;

        cumulative_declared_gas = cumulative_declared_gas
            .checked_add(tx.gas_limit)
            .ok_or(BlockError::Transaction(TransactionError::GasLimitOverflow))?;
        if cumulative_declared_gas > block.header.gas_limit {
            return Err(BlockError::Transaction(TransactionError::GasLimitReached));
        }

        senders.push(sender);
        ctxs.push(TxContext::new(
            &block.header,
            chain.chain_id,
            sender,
            tx.effective_gas_price(block.header.base_fee_per_gas),
        ));
    }

    let speculative =
        speculative_execute(&block.transactions, &senders, &ctxs, revision, state, block_hashes, &evm, pool);

    let mut receipts = Vec::with_capacity(block.transactions.len());
    let mut block_bloom = Bloom::empty();
    let mut cumulative_gas_used: u64 = 0;
    let mut already_merged = AccessSet::new();
    let mut committed_access_sets = Vec::with_capacity(block.transactions.len());
    let mut retried = 0usize;

    for (index, (tx, result)) in block.transactions.iter().zip(speculative.into_iter()).enumerate() {
        let (receipt, gas_used, overlay, access) = match result {
            Ok((receipt, gas_used, overlay, access)) if access.can_merge_after(&already_merged) => {
                (receipt, gas_used, overlay, access)
            }
            _ => {
                retried += 1;
                execute_transaction(tx, senders[index], revision, &ctxs[index], state, block_hashes, evm.as_ref())?
            }
        };

        overlay.apply(state).map_err(BlockError::State)?;
        already_merged.absorb_writes(&access);
        cumulative_gas_used = cumulative_gas_used.saturating_add(gas_used);
        block_bloom.merge(&receipt.bloom);
        receipts.push(receipt);
        committed_access_sets.push(access);
    }
    if retried > 0 {
        tracing::debug!(retried, total = block.transactions.len(), "re-executed transactions serially after a speculative conflict");
    }
    let lingering_conflicts = detect_conflicts(&committed_access_sets);
    if !lingering_conflicts.is_empty() {
        tracing::warn!(count = lingering_conflicts.len(), "commit phase let conflicting access sets through — can_merge_after should have caught this");
    }

    if let Some(withdrawals) = &block.withdrawals {
        for withdrawal in withdrawals {
            let mut tx_state = TransactionState::new(state);
            let mut account = tx_state.get_account(&withdrawal.address).map_err(BlockError::State)?;
            account.balance = account.balance.saturating_add(U256::from_u64(withdrawal.amount) * U256::from_u64(1_000_000_000));
            tx_state.set_account(withdrawal.address, account);
            tx_state.merge().map_err(BlockError::State)?;
        }
    }

    let tx_items: Vec<Vec<u8>> = block.transactions.iter().map(|tx| tx.rlp_encode()).collect();
    let receipt_items: Vec<Vec<u8>> = receipts.iter().map(|r| r.rlp_encode()).collect();
    let transactions_root = roots::list_root(&tx_items, roots_dir.as_ref().join("tx-root")).map_err(BlockError::Trie)?;
    let receipts_root = roots::list_root(&receipt_items, roots_dir.as_ref().join("receipt-root")).map_err(BlockError::Trie)?;

    if cumulative_gas_used > block.header.gas_limit {
        return Err(BlockError::GasAboveLimit { used: cumulative_gas_used, limit: block.header.gas_limit });
    }
    if transactions_root != block.header.transactions_root || receipts_root != block.header.receipts_root {
        return Err(BlockError::WrongMerkleRoot);
    }
    let computed_ommers_hash = roots::ommers_hash(&block.ommers);
    if computed_ommers_hash != block.header.ommers_hash {
        return Err(BlockError::WrongOmmersHash);
    }

    Ok(ExecutionOutcome {
        receipts,
        bloom: block_bloom,
        gas_used: cumulative_gas_used,
        state_root: state.accounts_root(),
        transactions_root,
        receipts_root,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use exec_chainspec::{Header, Revision};
    use exec_crypto::keccak256;
    use exec_evm_host::{ExecutionResult, ExecutionStatus, Host};
    use exec_fiber::PoolConfig;
    use exec_state::Account;
    use k256::ecdsa::{signature::Signer, RecoveryId, Signature, SigningKey, VerifyingKey};

    /// Stand-in for the bytecode interpreter: a plain call just moves the
    /// message's value and reports every bit of gas unused. Good enough to
    /// exercise gas accounting, receipts, and root validation without a
    /// real EVM in this workspace.
    struct NullEvm;

    impl Evm for NullEvm {
        fn execute(&self, _revision: Revision, message: Message, host: &mut dyn Host) -> ExecutionResult {
            if !message.value.is_zero() && host.transfer(&message.sender, &message.recipient, message.value).is_err() {
                return ExecutionResult {
                    status: ExecutionStatus::Failure,
                    gas_left: 0,
                    gas_refund: 0,
                    output: Vec::new(),
                    create_address: None,
                };
            }
            ExecutionResult {
                status: ExecutionStatus::Success,
                gas_left: message.gas,
                gas_refund: 0,
                output: Vec::new(),
                create_address: None,
            }
        }
    }

    fn sign(key: &SigningKey, hash: &Hash256) -> (U256, U256, u64) {
        let (sig, recid): (Signature, RecoveryId) = key.sign_prehash_recoverable(hash.as_bytes()).unwrap();
        let bytes = sig.to_bytes();
        (U256::from_big_endian(&bytes[..32]), U256::from_big_endian(&bytes[32..]), 27 + recid.to_byte() as u64)
    }

    fn address_of(key: &SigningKey) -> Address {
        let verifying = VerifyingKey::from(key);
        let encoded = verifying.to_encoded_point(false);
        let hash = keccak256(&encoded.as_bytes()[1..]);
        Address::from_word_tail(hash.as_bytes().try_into().unwrap())
    }

    fn empty_header(gas_limit: u64) -> Header {
        Header {
            parent_hash: Hash256::ZERO,
            ommers_hash: Hash256::ZERO,
            coinbase: Address([0xaa; 20]),
            state_root: Hash256::ZERO,
            transactions_root: Hash256::ZERO,
            receipts_root: Hash256::ZERO,
            logs_bloom: [0u8; 256],
            difficulty: U256::ZERO,
            number: 1,
            gas_limit,
            gas_used: 0,
            timestamp: 1,
            extra_data: Vec::new(),
            mix_hash: Hash256::ZERO,
            nonce: [0u8; 8],
            base_fee_per_gas: None,
            withdrawals_root: None,
        }
    }

    fn signed_transfer(key: &SigningKey, to: Address, value: u64) -> Transaction {
        let mut tx = Transaction {
            tx_type: TxType::Legacy,
            chain_id: None,
            nonce: 0,
            gas_price: Some(U256::from_u64(1)),
            max_priority_fee_per_gas: None,
            max_fee_per_gas: None,
            gas_limit: 21_000,
            to: Some(to),
            value: U256::from_u64(value),
            data: Vec::new(),
            access_list: Vec::new(),
            max_fee_per_blob_gas: None,
            blob_versioned_hashes: Vec::new(),
            authorization_list: Vec::new(),
            v: 0,
            r: U256::ZERO,
            s: U256::ZERO,
        };
        let (r, s, v) = sign(key, &tx.signing_hash());
        tx.v = v;
        tx.r = r;
        tx.s = s;
        tx
    }

    #[test]
    fn execute_block_applies_a_plain_transfer_and_pays_the_coinbase() {
        let key = SigningKey::from_bytes(&[0x11; 32].into()).unwrap();
        let sender = address_of(&key);
        let recipient = Address([0x22; 20]);
        let coinbase = Address([0xaa; 20]);

        let tx = signed_transfer(&key, recipient, 1_000);
        assert_eq!(tx.recover_sender().unwrap(), sender);

        let state_dir = tempfile::tempdir().unwrap();
        let mut state = BlockState::open(state_dir.path()).unwrap();
        state
            .put_account(&sender, &Account { nonce: 0, balance: U256::from_u64(22_000), ..Account::empty() })
            .unwrap();

        let roots_dir = tempfile::tempdir().unwrap();
        let predicted_receipt = Receipt::from_logs(TxType::Legacy, true, 21_000, Vec::new());
        let transactions_root =
            roots::list_root(&[tx.rlp_encode()], roots_dir.path().join("predict-tx")).unwrap();
        let receipts_root =
            roots::list_root(&[predicted_receipt.rlp_encode()], roots_dir.path().join("predict-receipt")).unwrap();

        let mut header = empty_header(21_000);
        header.coinbase = coinbase;
        header.transactions_root = transactions_root;
        header.receipts_root = receipts_root;
        header.ommers_hash = roots::ommers_hash(&[]);

        let block = Block { header, transactions: vec![tx], ommers: Vec::new(), withdrawals: None };

        let chain = ChainSpec::mainnet_shaped(1);
        let block_hashes = BlockHashRing::new();
        let evm: Arc<dyn Evm> = Arc::new(NullEvm);
        let pool = PriorityPool::new(PoolConfig { worker_count: 2, submission_capacity: 16 });

        let outcome = execute_block(&block, &mut state, &chain, &block_hashes, evm, &pool, roots_dir.path().join("exec")).unwrap();
        pool.shutdown();

        assert_eq!(outcome.gas_used, 21_000);
        assert_eq!(outcome.transactions_root, transactions_root);
        assert_eq!(outcome.receipts_root, receipts_root);
        assert_eq!(outcome.receipts.len(), 1);
        assert!(outcome.receipts[0].status);

        let mut verify = TransactionState::new(&mut state);
        assert_eq!(verify.get_account(&recipient).unwrap().balance, U256::from_u64(1_000));
        assert_eq!(verify.get_account(&sender).unwrap().balance, U256::ZERO);
        assert_eq!(verify.get_account(&sender).unwrap().nonce, 1);
        assert_eq!(verify.get_account(&coinbase).unwrap().balance, U256::from_u64(21_000));
    }

    #[test]
    fn execute_block_rejects_a_bad_nonce() {
        let key = SigningKey::from_bytes(&[0x22; 32].into()).unwrap();
        let sender = address_of(&key);
        let recipient = Address([0x33; 20]);

        let mut tx = signed_transfer(&key, recipient, 0);
        tx.nonce = 5;
        let (r, s, v) = sign(&key, &tx.signing_hash());
        tx.v = v;
        tx.r = r;
        tx.s = s;

        let state_dir = tempfile::tempdir().unwrap();
        let mut state = BlockState::open(state_dir.path()).unwrap();
        state
            .put_account(&sender, &Account { nonce: 0, balance: U256::from_u64(100_000), ..Account::empty() })
            .unwrap();

        let roots_dir = tempfile::tempdir().unwrap();
        let mut header = empty_header(21_000);
        header.ommers_hash = roots::ommers_hash(&[]);
        let block = Block { header, transactions: vec![tx], ommers: Vec::new(), withdrawals: None };

        let chain = ChainSpec::mainnet_shaped(1);
        let block_hashes = BlockHashRing::new();
        let evm: Arc<dyn Evm> = Arc::new(NullEvm);
        let pool = PriorityPool::new(PoolConfig { worker_count: 2, submission_capacity: 16 });

        let err = execute_block(&block, &mut state, &chain, &block_hashes, evm, &pool, roots_dir.path().join("exec")).unwrap_err();
        pool.shutdown();

        assert!(matches!(err, BlockError::Transaction(TransactionError::BadNonce { .. })));
    }

    #[test]
    fn execute_block_folds_withdrawals_after_transactions() {
        let recipient = Address([0x44; 20]);
        let roots_dir = tempfile::tempdir().unwrap();
        let mut header = empty_header(0);
        header.ommers_hash = roots::ommers_hash(&[]);
        header.transactions_root = roots::list_root(&[], roots_dir.path().join("predict-tx")).unwrap();
        header.receipts_root = roots::list_root(&[], roots_dir.path().join("predict-receipt")).unwrap();

        let withdrawal = crate::withdrawal::Withdrawal { index: 0, validator_index: 0, address: recipient, amount: 5 };
        header.withdrawals_root =
            Some(roots::list_root(&[withdrawal.rlp_encode()], roots_dir.path().join("predict-withdrawals")).unwrap());
        let block =
            Block { header, transactions: Vec::new(), ommers: Vec::new(), withdrawals: Some(vec![withdrawal]) };

        let state_dir = tempfile::tempdir().unwrap();
        let mut state = BlockState::open(state_dir.path()).unwrap();
        let chain = ChainSpec::mainnet_shaped(1);
        let block_hashes = BlockHashRing::new();
        let evm: Arc<dyn Evm> = Arc::new(NullEvm);
        let pool = PriorityPool::new(PoolConfig { worker_count: 1, submission_capacity: 16 });

        execute_block(&block, &mut state, &chain, &block_hashes, evm, &pool, roots_dir.path().join("exec")).unwrap();
        pool.shutdown();

        let mut verify = TransactionState::new(&mut state);
        assert_eq!(verify.get_account(&recipient).unwrap().balance, U256::from_u64(5_000_000_000));
    }
}
