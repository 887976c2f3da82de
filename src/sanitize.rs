//! Text cleaning ahead of encoding.
//!
//! Text pasted from editors and web pages often carries byte-order marks, stray control
//! characters and invisible formatting codepoints. Scanners render those as garbage, so they are
//! removed before the text becomes a byte payload.

/// Byte-order mark, also the deprecated zero-width no-break space when it appears mid-string.
const BYTE_ORDER_MARK: char = '\u{FEFF}';

/// A byte-order mark read with the wrong endianness.
const REVERSED_BYTE_ORDER_MARK: char = '\u{FFFE}';

/// Zero-width format codepoints that are always dropped.
///
/// U+200D ZERO WIDTH JOINER is deliberately absent: it is needed for emoji sequences and for
/// ligatures in several scripts.
const ZERO_WIDTH: [char; 3] = ['\u{200B}', '\u{200C}', BYTE_ORDER_MARK];

/// Cleans `raw` so that it encodes to a byte-safe payload.
///
/// Removes, in order:
///
/// 1. a leading byte-order mark (U+FEFF),
/// 2. leading reversed byte-order marks (U+FFFE),
/// 3. C0 control characters and DEL, except line feed, carriage return and tab,
/// 4. zero-width space, zero-width non-joiner and any remaining U+FEFF.
///
/// The zero-width joiner is kept. Leading U+FFFE is stripped again after the removals, so a mark
/// hidden behind a removed character does not survive; this keeps the function idempotent.
/// Surrounding whitespace is not trimmed here.
///
/// # Example
///
/// ```
/// use qrstamp::sanitize::sanitize;
///
/// assert_eq!(sanitize("\u{FEFF}Hello\u{0007}, World\u{200B}!"), "Hello, World!");
/// ```
pub fn sanitize(raw: &str) -> String {
    let text = raw.strip_prefix(BYTE_ORDER_MARK).unwrap_or(raw);
    let text = text.trim_start_matches(REVERSED_BYTE_ORDER_MARK);

    let cleaned: String = text
        .chars()
        .filter(|&c| !is_stripped_control(c) && !ZERO_WIDTH.contains(&c))
        .collect();

    if cleaned.starts_with(REVERSED_BYTE_ORDER_MARK) {
        return cleaned.trim_start_matches(REVERSED_BYTE_ORDER_MARK).to_owned();
    }
    cleaned
}

fn is_stripped_control(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{8}' | '\u{B}' | '\u{C}' | '\u{E}'..='\u{1F}' | '\u{7F}')
}
