//! Discord message length helpers
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Line-aware fitting for medicine and exercise listings
//! - 1.0.0: Initial message truncation helper

/// Discord message content limit
pub const MESSAGE_LIMIT: usize = 2000;

/// Truncate text to fit message limit, adding ellipsis if needed
pub fn truncate_for_message(text: &str) -> String {
    if text.len() <= MESSAGE_LIMIT {
        text.to_string()
    } else {
        // Find a safe UTF-8 boundary
        let mut end = MESSAGE_LIMIT - 3; // Room for "..."
        while !text.is_char_boundary(end) && end > 0 {
            end -= 1;
        }
        format!("{}...", &text[..end])
    }
}

/// Join `header` and as many whole `lines` as fit in one message.
///
/// Lines that would overflow are dropped and replaced with a
/// "...and N more" marker so a listing never ends mid-line.
pub fn fit_lines_to_message(header: &str, lines: &[String]) -> String {
    let mut out = String::from(header);
    for (idx, line) in lines.iter().enumerate() {
        let remaining = lines.len() - idx;
        let marker = format!("\n...and {remaining} more");
        if out.len() + 1 + line.len() + marker.len() > MESSAGE_LIMIT {
            out.push_str(&marker);
            return out;
        }
        out.push('\n');
        out.push_str(line);
    }
    truncate_for_message(&out)
}
