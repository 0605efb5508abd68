/// What the engine hands back for one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    /// False only after a command was dispatched successfully.
    pub continue_conversation: bool,
}

impl Reply {
    /// The conversation goes on: a question, a clarification or an error.
    pub fn prompt(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            continue_conversation: true,
        }
    }

    pub fn done(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            continue_conversation: false,
        }
    }

    /// `(text, continue)`.
    pub fn into_parts(self) -> (String, bool) {
        (self.text, self.continue_conversation)
    }
}
