//! Captured output.

/// Lines read from the child's pipe, in arrival order.
///
/// Lines are stored without their terminator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineBuffer {
    lines: Vec<String>,
}

impl LineBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line.
    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Captured lines.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of captured lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Every line followed by a newline, as returned to callers.
    pub fn joined(&self) -> String {
        self.lines.iter().fold(String::new(), |mut out, line| {
            out.push_str(line);
            out.push('\n');
            out
        })
    }

    /// Joined output with surrounding whitespace removed.
    pub fn trimmed(&self) -> String {
        self.joined().trim().to_string()
    }

    /// Take the lines out of the buffer.
    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

/// Decode one raw line, dropping its `\n` or `\r\n` terminator.
pub(crate) fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}
