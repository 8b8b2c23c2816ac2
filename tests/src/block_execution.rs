//! S5 and S6/universal property 5: end-to-end block execution through
//! `exec_executor::execute_block`, exercising the fiber pool's sender
//! recovery and the block-level log bloom.

use exec_chainspec::{ChainSpec, Header, Revision};
use exec_evm_host::{BlockHashRing, Evm, ExecutionResult, ExecutionStatus, Host, Log, Message};
use exec_executor::receipt::Bloom;
use exec_executor::{roots, Block, Receipt, Transaction, TxType};
use exec_fiber::{PoolConfig, PriorityPool};
use exec_primitives::{Address, Hash256, U256};
use exec_rlp::encode::Encodable;
use exec_state::{Account, BlockState};
use k256::ecdsa::{signature::Signer, RecoveryId, Signature, SigningKey, VerifyingKey};
use std::sync::Arc;

/// Moves `message.value` from sender to recipient and reports the full gas
/// allowance unused, same as the plain-transfer stand-in used elsewhere in
/// this workspace.
struct TransferEvm;

impl Evm for TransferEvm {
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

/// Like `TransferEvm`, but also emits one log per call — for exercising the
/// block-level bloom filter.
struct LoggingEvm;

impl Evm for LoggingEvm {
    fn execute(&self, _revision: Revision, message: Message, host: &mut dyn Host) -> ExecutionResult {
        host.emit_log(Log { address: message.recipient, topics: vec![Hash256([0x42; 32])], data: Vec::new() });
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
    let hash = exec_crypto::keccak256(&encoded.as_bytes()[1..]);
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

/// A zero-gas-price legacy transfer: isolates the balance arithmetic from
/// gas cost accounting, so the expected balances match plain subtraction.
fn zero_fee_transfer(key: &SigningKey, nonce: u64, to: Address, value: u64) -> Transaction {
    let mut tx = Transaction {
        tx_type: TxType::Legacy,
        chain_id: None,
        nonce,
        gas_price: Some(U256::ZERO),
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

/// S5: three transfers (A->B, B->C, A->C) against starting balances
/// A=10, B=0, C=0 converge to A=8, B=0, C=2 regardless of the worker count
/// driving speculative execution. `tx2` (B->C) and `tx3` (A->C) both touch
/// `c`, and `tx3` also touches `a` which `tx1` writes, so at 4 workers the
/// speculative phase races `tx1`/`tx3` against a stale snapshot of `a` —
/// the commit phase's `can_merge_after` gate is what forces the same result
/// as the 1-worker run by re-executing whichever one lost the race.
fn run_three_way_transfer(worker_count: usize) -> (U256, U256, U256) {
    let key_a = SigningKey::from_bytes(&[0x11; 32].into()).unwrap();
    let key_b = SigningKey::from_bytes(&[0x22; 32].into()).unwrap();
    let a = address_of(&key_a);
    let b = address_of(&key_b);
    let c = Address([0x33; 20]);

    let tx1 = zero_fee_transfer(&key_a, 0, b, 1);
    let tx2 = zero_fee_transfer(&key_b, 0, c, 1);
    let tx3 = zero_fee_transfer(&key_a, 1, c, 1);

    let state_dir = tempfile::tempdir().unwrap();
    let mut state = BlockState::open(state_dir.path()).unwrap();
    state.put_account(&a, &Account { nonce: 0, balance: U256::from_u64(10), ..Account::empty() }).unwrap();
    state.put_account(&b, &Account { nonce: 0, balance: U256::ZERO, ..Account::empty() }).unwrap();

    let roots_dir = tempfile::tempdir().unwrap();
    let predicted_receipt = Receipt::from_logs(TxType::Legacy, true, 21_000, Vec::new());
    let tx_bytes: Vec<Vec<u8>> = vec![tx1.rlp_encode(), tx2.rlp_encode(), tx3.rlp_encode()];
    let receipt_bytes: Vec<Vec<u8>> =
        vec![predicted_receipt.rlp_encode(), predicted_receipt.rlp_encode(), predicted_receipt.rlp_encode()];
    let transactions_root = roots::list_root(&tx_bytes, roots_dir.path().join("predict-tx")).unwrap();
    let receipts_root = roots::list_root(&receipt_bytes, roots_dir.path().join("predict-receipt")).unwrap();

    let mut header = empty_header(3 * 21_000);
    header.transactions_root = transactions_root;
    header.receipts_root = receipts_root;
    header.ommers_hash = roots::ommers_hash(&[]);

    let block = Block { header, transactions: vec![tx1, tx2, tx3], ommers: Vec::new(), withdrawals: None };

    let chain = ChainSpec::mainnet_shaped(1);
    let block_hashes = BlockHashRing::new();
    let evm: Arc<dyn Evm> = Arc::new(TransferEvm);
    let pool = PriorityPool::new(PoolConfig { worker_count, submission_capacity: 16 });

    let outcome =
        exec_executor::execute_block(&block, &mut state, &chain, &block_hashes, evm, &pool, roots_dir.path().join("exec"))
            .unwrap();
    pool.shutdown();

    assert_eq!(outcome.receipts.len(), 3);
    assert!(outcome.receipts.iter().all(|r| r.status));

    let mut verify = exec_state::TransactionState::new(&mut state);
    let balance_a = verify.get_account(&a).unwrap().balance;
    let balance_b = verify.get_account(&b).unwrap().balance;
    let balance_c = verify.get_account(&c).unwrap().balance;
    (balance_a, balance_b, balance_c)
}

#[test]
fn s5_three_way_transfer_converges_regardless_of_worker_count() {
    for worker_count in [1, 4] {
        let (a, b, c) = run_three_way_transfer(worker_count);
        assert_eq!(a, U256::from_u64(8), "worker_count={worker_count}");
        assert_eq!(b, U256::ZERO, "worker_count={worker_count}");
        assert_eq!(c, U256::from_u64(2), "worker_count={worker_count}");
    }
}

/// S6 / universal property 5: every log's own bloom bits are a subset of the
/// receipt (and block) bloom that accrued it.
#[test]
fn s6_logs_bloom_contains_every_emitted_log() {
    let key = SigningKey::from_bytes(&[0x33; 32].into()).unwrap();
    let sender = address_of(&key);
    let recipient = Address([0x44; 20]);

    let tx = zero_fee_transfer(&key, 0, recipient, 0);

    let state_dir = tempfile::tempdir().unwrap();
    let mut state = BlockState::open(state_dir.path()).unwrap();
    state.put_account(&sender, &Account { nonce: 0, balance: U256::ZERO, ..Account::empty() }).unwrap();

    let emitted = Log { address: recipient, topics: vec![Hash256([0x42; 32])], data: Vec::new() };
    let mut expected_bloom = Bloom::empty();
    expected_bloom.accrue_log(&emitted);

    let roots_dir = tempfile::tempdir().unwrap();
    let predicted_receipt = Receipt::from_logs(TxType::Legacy, true, 21_000, vec![emitted]);
    let transactions_root = roots::list_root(&[tx.rlp_encode()], roots_dir.path().join("predict-tx")).unwrap();
    let receipts_root =
        roots::list_root(&[predicted_receipt.rlp_encode()], roots_dir.path().join("predict-receipt")).unwrap();

    let mut header = empty_header(21_000);
    header.transactions_root = transactions_root;
    header.receipts_root = receipts_root;
    header.ommers_hash = roots::ommers_hash(&[]);

    let block = Block { header, transactions: vec![tx], ommers: Vec::new(), withdrawals: None };

    let chain = ChainSpec::mainnet_shaped(1);
    let block_hashes = BlockHashRing::new();
    let evm: Arc<dyn Evm> = Arc::new(LoggingEvm);
    let pool = PriorityPool::new(PoolConfig { worker_count: 1, submission_capacity: 16 });

    let outcome =
        exec_executor::execute_block(&block, &mut state, &chain, &block_hashes, evm, &pool, roots_dir.path().join("exec"))
            .unwrap();
    pool.shutdown();

    assert!(outcome.bloom.contains(&expected_bloom));
    assert_eq!(outcome.receipts[0].logs, vec![Log { address: recipient, topics: vec![Hash256([0x42; 32])], data: Vec::new() }]);
}
