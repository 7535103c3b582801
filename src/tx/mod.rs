//! Transaction lifecycle: nonce, fees, assembly and submission

pub mod builder;
pub mod gas;
mod nonce;
mod sender;

pub use builder::{TransactionBuilder, VOTE_SELECTOR};
pub use gas::{FeePolicy, FeeQuote};
pub use nonce::NonceSequencer;
pub use sender::Submitter;
