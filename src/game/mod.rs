pub mod progress_ledger;
pub mod puzzle;
pub mod scoring;
pub mod services;
pub mod settings;
pub mod spot_difference;
pub mod word_chain;

pub use progress_ledger::{ProgressLedger, RecordFactory};
pub use scoring::{calculate_score, GameRules, ScoreBasis};
pub use services::GameServices;
pub use settings::{Settings, UnknownLevelPolicy, UnknownUserPolicy};
