//! The call frame contract between the executor and the bytecode
//! interpreter (an external collaborator this crate never implements —
//! it only answers the `Host` queries the interpreter makes while running
//! a frame described by a [`Message`]).

use crate::host::Host;
use exec_chainspec::Revision;
use exec_primitives::{Address, Hash256, U256};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageKind {
    Call,
    Create,
    Create2,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub kind: MessageKind,
    pub depth: u32,
    pub gas: u64,
    pub sender: Address,
    pub recipient: Address,
    pub input: Vec<u8>,
    pub value: U256,
    pub create2_salt: Option<Hash256>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionStatus {
    Success,
    Revert,
    Failure,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    pub gas_left: u64,
    pub gas_refund: u64,
    pub output: Vec<u8>,
    pub create_address: Option<Address>,
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Success
    }
}

/// The bytecode interpreter this crate delegates opcode execution to.
/// Never implemented here — every real implementation lives outside this
/// workspace; tests supply a stub that just answers `Success` so the
/// executor's bookkeeping (gas, state transitions, receipts) can be
/// exercised without a real interpreter.
pub trait Evm: Send + Sync {
    fn execute(&self, revision: Revision, message: Message, host: &mut dyn Host) -> ExecutionResult;
}
