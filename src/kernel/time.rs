use serde::{Deserialize, Serialize};

/// Logical clock of the conversation: one step per processed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Turn {
    pub index: u64,
}

impl Turn {
    pub fn new() -> Self {
        Turn { index: 0 }
    }

    pub fn next(&self) -> Self {
        Turn { index: self.index + 1 }
    }

    pub fn since(&self, earlier: Turn) -> u64 {
        self.index.saturating_sub(earlier.index)
    }
}
