//! Tab-aligned layout of a failure report.

use super::message::LabeledContent;

/// Renders rows as `\t<label>:<padding>\t<content>\n`.
///
/// Labels are padded to the longest one; continuation lines of multi-line
/// content are indented to the content column.
pub fn labeled_output(content: &[LabeledContent]) -> String {
    let longest_label = content
        .iter()
        .map(|entry| entry.label.len())
        .max()
        .unwrap_or(0);

    let mut output = String::new();
    for entry in content {
        output.push('\t');
        output.push_str(&entry.label);
        output.push(':');
        output.push_str(&" ".repeat(longest_label - entry.label.len()));
        output.push('\t');
        output.push_str(&indent_message_lines(&entry.content, longest_label));
        output.push('\n');
    }
    output
}

/// Re-indents every line after the first under the content column.
pub fn indent_message_lines(message: &str, longest_label_len: usize) -> String {
    let continuation = format!("\n\t{}\t", " ".repeat(longest_label_len + 1));
    let mut out = String::with_capacity(message.len());
    for (i, line) in message.lines().enumerate() {
        if i != 0 {
            out.push_str(&continuation);
        }
        out.push_str(line);
    }
    out
}
