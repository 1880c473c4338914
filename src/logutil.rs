//! Keep operator text on one log line.

/// Escape a string for single-line logging:
/// - `\n` => `\\n`
/// - `\r` => `\\r`
/// - `\t` => `\\t`
/// - backslash => `\\\\`
///
/// Other control characters become `\xNN`. Input longer than 200 characters
/// is cut with an ellipsis.
pub fn escape_log(s: &str) -> String {
    const MAX_PREVIEW: usize = 200;
    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW) + 8);
    for (count, ch) in s.chars().enumerate() {
        if count >= MAX_PREVIEW {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                use std::fmt::Write;
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::escape_log;

    #[test]
    fn pasted_multiline_exchange_stays_on_one_line() {
        let s = "F4BOT DE F4ABC\r\nUR 5NN\tK";
        assert_eq!(escape_log(s), "F4BOT DE F4ABC\\r\\nUR 5NN\\tK");
    }

    #[test]
    fn control_bytes_and_length() {
        assert_eq!(escape_log("CQ\u{7}"), "CQ\\x07");
        let long = "E".repeat(500);
        let out = escape_log(&long);
        assert_eq!(out.chars().count(), 201);
        assert!(out.ends_with('…'));
    }
}
