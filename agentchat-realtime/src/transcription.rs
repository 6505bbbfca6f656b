//! Running transcripts for the current turn.

/// Inbound (user) and outbound (model) transcripts, cleared at turn boundaries.
///
/// Fragments are concatenated literally, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptionAccumulator {
    input: String,
    output: String,
}

impl TranscriptionAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append recognized user speech and return the full inbound transcript.
    pub fn append_input(&mut self, fragment: &str) -> &str {
        self.input.push_str(fragment);
        &self.input
    }

    /// Append recognized model speech and return the full outbound transcript.
    pub fn append_output(&mut self, fragment: &str) -> &str {
        self.output.push_str(fragment);
        &self.output
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn reset(&mut self) {
        self.input.clear();
        self.output.clear();
    }
}
