//! # Note Name Formatting
//!
//! Note names in temperament files are plain ASCII with placeholder tokens
//! between braces, e.g. `C{sharp}` or `B{flat}`. This module turns them into
//! the musical symbols shown to the user.
//!
//! Tokens do not nest and braces cannot be escaped. An unknown token, or a
//! token left open at the end of the name, is emitted as its bare content.

/// Placeholder tokens and the symbols they stand for.
const SYMBOLS: [(&str, &str); 5] = [
    ("sharp", "\u{266F}"),
    ("flat", "\u{266D}"),
    ("natural", "\u{266E}"),
    ("doublesharp", "\u{1D12A}"),
    ("doubleflat", "\u{1D12B}"),
];

fn symbol_for(token: &str) -> Option<&'static str> {
    SYMBOLS
        .iter()
        .find(|(name, _)| *name == token)
        .map(|(_, symbol)| *symbol)
}

/// Replaces `{token}` placeholders in a note name with musical symbols.
pub fn prettify_note_name(name: &str) -> String {
    let mut pretty = String::with_capacity(name.len());
    let mut token: Option<String> = None;

    for c in name.chars() {
        match token.take() {
            None if c == '{' => token = Some(String::new()),
            None => pretty.push(c),
            Some(content) if c == '}' => {
                pretty.push_str(symbol_for(&content).unwrap_or(&content));
            }
            Some(mut content) => {
                content.push(c);
                token = Some(content);
            }
        }
    }

    // Unterminated token at the end of the name
    if let Some(content) = token {
        pretty.push_str(&content);
    }
    pretty
}
