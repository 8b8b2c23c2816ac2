//! Validator withdrawals (EIP-4895): a plain RLP list, always bare — there
//! is no typed-envelope framing for withdrawals the way there is for
//! transactions and receipts.

use exec_primitives::Address;
use exec_rlp::decode::{Decodable, Rlp};
use exec_rlp::encode::{Encodable, ListEncoder};
use exec_rlp::RlpResult;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Withdrawal {
    pub index: u64,
    pub validator_index: u64,
    pub address: Address,
    /// Amount in Gwei, as the consensus layer reports it.
    pub amount: u64,
}

impl Encodable for Withdrawal {
    fn rlp_append(&self, out: &mut Vec<u8>) {
        ListEncoder::new()
            .field(&self.index)
            .field(&self.validator_index)
            .field(&self.address)
            .field(&self.amount)
            .finish(out);
    }
}

impl Decodable for Withdrawal {
    fn rlp_decode(rlp: &mut Rlp<'_>) -> RlpResult<Self> {
        let mut list = rlp.list()?;
        let index = list.u64()?;
        let validator_index = list.u64()?;
        let address = Address::rlp_decode(&mut list)?;
        let amount = list.u64()?;
        Ok(Withdrawal { index, validator_index, address, amount })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn withdrawal_round_trips_through_rlp() {
        let w = Withdrawal { index: 5, validator_index: 17, address: Address([0x11; 20]), amount: 32_000_000_000 };
        let encoded = w.rlp_encode();
        let decoded = Withdrawal::rlp_decode_complete(&encoded).unwrap();
        assert_eq!(decoded, w);
    }
}
