//! A block as the executor consumes and produces it: a header plus the
//! three RLP-encodable lists whose roots the header commits to.

use crate::transaction::Transaction;
use crate::withdrawal::Withdrawal;
use exec_chainspec::Header;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub header: Header,
    pub transactions: Vec<Transaction>,
    pub ommers: Vec<Header>,
    pub withdrawals: Option<Vec<Withdrawal>>,
}
