use crate::buffer::Buffer;
use crate::ticket::Ticket;

pub enum CompletionKind {
    Read { buffer: Buffer },
    Write,
}

pub struct Completion {
    pub ticket: Ticket,
    pub result: std::io::Result<usize>,
    pub kind: CompletionKind,
}
