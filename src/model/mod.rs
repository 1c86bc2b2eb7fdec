mod difficulty;
mod level;
mod progress_event;
mod progress_record;

pub use difficulty::Difficulty;
pub use level::{Level, LevelCatalog, LevelContent, UnlockCondition};
pub use progress_event::ProgressEvent;
pub use progress_record::{ProgressRecord, ProgressUpdate, DEFAULT_STARTING_HINTS};
