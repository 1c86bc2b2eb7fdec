/// Emitted by a ledger after a mutation has been applied and persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    LevelCompleted {
        user_id: String,
        level_id: String,
        score: u32,
        time_taken: u32,
    },
    HintUsed {
        user_id: String,
        remaining: u32,
    },
    HintUnlocked {
        user_id: String,
        remaining: u32,
    },
    ProgressUpdated {
        user_id: String,
    },
    ProgressReset,
}

impl ProgressEvent {
    pub fn user_id(&self) -> Option<&str> {
        match self {
            ProgressEvent::LevelCompleted { user_id, .. }
            | ProgressEvent::HintUsed { user_id, .. }
            | ProgressEvent::HintUnlocked { user_id, .. }
            | ProgressEvent::ProgressUpdated { user_id } => Some(user_id),
            ProgressEvent::ProgressReset => None,
        }
    }
}
