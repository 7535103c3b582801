//! Vote campaign orchestration and outcome bookkeeping

mod driver;
mod outcome;

pub use driver::CampaignDriver;
pub use outcome::{CampaignReport, TransactionOutcome};
