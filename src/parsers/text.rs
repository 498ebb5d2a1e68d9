/// Accumulates rendered text one line at a time.
///
/// Inline text is appended to the current line with whitespace collapsed;
/// block boundaries close the line. Empty lines are never emitted.
#[derive(Debug, Default)]
pub struct TextBuilder {
    lines: Vec<String>,
    current: String,
}

impl TextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a run of inline text to the current line
    pub fn push_inline(&mut self, text: &str) {
        for word in text.split_whitespace() {
            if !self.current.is_empty() {
                self.current.push(' ');
            }
            self.current.push_str(word);
        }
    }

    /// Close the current line, if it has any content
    pub fn break_line(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(std::mem::take(&mut self.current));
        }
    }

    pub fn finish(mut self) -> String {
        self.break_line();
        self.lines.join("\n")
    }
}

/// Normalizes whitespace within a single line or paragraph
pub fn normalize_whitespace_in_segment(segment: &str) -> String {
    segment.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Trim every line, collapse runs of inner whitespace and allow at most one
/// blank line between paragraphs
pub fn normalize_paragraphs(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut pending_blank = false;

    for line in text.lines() {
        let line = normalize_whitespace_in_segment(line);
        if line.is_empty() {
            pending_blank = !out.is_empty();
            continue;
        }
        if pending_blank {
            out.push(String::new());
            pending_blank = false;
        }
        out.push(line);
    }

    out.join("\n")
}

/// Longest prefix of `text` holding at most `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Truncate with a visible marker appended when anything was cut
pub fn truncate_with_marker(text: &str, max_chars: usize, marker: &str) -> String {
    let truncated = truncate_chars(text, max_chars);
    if truncated.len() == text.len() {
        text.to_string()
    } else {
        format!("{}\n... {}", truncated, marker)
    }
}
