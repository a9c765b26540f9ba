//! The expression delimiter configuration.

/// The pair of characters that bracket an embedded expression.
///
/// Defaults to `<` and `>`. The stop character is only meaningful inside an
/// expression; outside one it is ordinary text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delims {
    start: char,
    stop: char,
}

impl Delims {
    /// Construct a delimiter pair from a start and stop character.
    pub const fn new(start: char, stop: char) -> Self {
        Self { start, stop }
    }

    pub fn start(&self) -> char {
        self.start
    }

    pub fn stop(&self) -> char {
        self.stop
    }
}

impl Default for Delims {
    fn default() -> Self {
        Self::new('<', '>')
    }
}
