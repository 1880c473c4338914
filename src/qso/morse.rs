//! Text to dot/dash encoding for outbound procedural text.
//!
//! Letters are separated by single spaces and words by a `/` token, so
//! `"HI OM"` becomes `".... .. / -- --"`. Characters outside the table are
//! dropped. [`decode_morse`] reads the same format back with the same table.

use super::lexicon::Lexicon;

/// Encode text to Morse. Input is uppercased; unknown characters are skipped.
pub fn encode_morse(text: &str) -> String {
    text.to_uppercase()
        .chars()
        .filter_map(|c| if c == ' ' { Some("/") } else { Lexicon::morse_for(c) })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decode a string produced by [`encode_morse`]. Unknown groups are skipped.
pub fn decode_morse(code: &str) -> String {
    let mut out = String::new();
    for group in code.split_whitespace() {
        if group == "/" {
            out.push(' ');
        } else if let Some(c) = Lexicon::char_for_morse(group) {
            out.push(c);
        }
    }
    out
}
