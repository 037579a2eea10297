//! Word tokenizer used by the map phase.

/// Characters removed from every token, wherever they appear in it
const STRIPPED: &[char] = &[
    '.', ',', '?', '!', ':', ';', '*', '£', '$', '&', '(', ')', '{', '}', '@', '/', '`', '_', '+',
    '=', '-', '"', '\'',
];

/// Lower-case `word` and drop every stripped character.
/// A token made only of stripped characters normalizes to the empty string.
pub fn normalize(word: &str) -> String {
    word.to_lowercase()
        .chars()
        .filter(|c| !STRIPPED.contains(c))
        .collect()
}

/// Token separators: space, tab, line feed, vertical tab, form feed, carriage return.
/// Other Unicode spaces such as U+00A0 are part of a token.
fn is_separator(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0B' | '\x0C' | '\r')
}

/// Split `contents` on runs of separators and normalize each token, in order.
pub fn tokenize(contents: &str) -> Vec<String> {
    contents
        .split(is_separator)
        .filter(|token| !token.is_empty())
        .map(normalize)
        .collect()
}
