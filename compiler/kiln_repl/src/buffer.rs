//! Held input between calls.

/// Source text that did not yet form a complete unit.
///
/// Non-empty only while the most recent submission was incomplete.
#[derive(Clone, Debug, Default)]
pub struct PendingInput {
    text: String,
}

impl PendingInput {
    pub fn new() -> Self {
        PendingInput::default()
    }

    /// Take held text with `input` appended, leaving the buffer empty.
    pub fn merge(&mut self, input: &str) -> String {
        let mut candidate = std::mem::take(&mut self.text);
        candidate.push_str(input);
        candidate
    }

    /// Hold `candidate` until the next call.
    pub fn hold(&mut self, candidate: String) {
        self.text = candidate;
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn is_holding(&self) -> bool {
        !self.text.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}
