//! Voting: the transactional tally writer and its receipts

mod engine;
mod receipt;

pub use engine::VotingEngine;
pub use receipt::{VoteAction, VoteReceipt, VoteTarget};
