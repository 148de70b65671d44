//! Input normalisation applied before signature matching.
//!
//! Attack payloads are commonly URL-encoded, HTML-entity-encoded, or both
//! (possibly several times). Decoding repeats until the text stops changing
//! or `max_rounds` is reached.

use std::borrow::Cow;

use percent_encoding::percent_decode_str;

/// Default number of decoding rounds.
pub const DEFAULT_DECODE_ROUNDS: usize = 3;

/// Decode `input` to a fixpoint (bounded by `max_rounds`).
pub fn normalize(input: &str, max_rounds: usize) -> String {
    let mut current = input.replace('\0', "");
    for _ in 0..max_rounds {
        let decoded = decode_html_entities(&url_decode(&current)).replace('\0', "");
        if decoded == current {
            break;
        }
        current = decoded;
    }
    current
}

/// Percent-decode, treating `+` as a space.
pub fn url_decode(input: &str) -> String {
    let spaced: Cow<'_, str> = if input.contains('+') {
        Cow::Owned(input.replace('+', " "))
    } else {
        Cow::Borrowed(input)
    };
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// Decode named, decimal and hexadecimal HTML character references.
///
/// Unknown references are left untouched. Numeric references without a
/// trailing `;` are decoded as browsers do.
pub fn decode_html_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match decode_reference(tail) {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Decode the reference at the start of `s` (which begins with `&`).
/// Returns the character and the number of bytes consumed.
fn decode_reference(s: &str) -> Option<(char, usize)> {
    let body = &s[1..];
    if let Some(numeric) = body.strip_prefix('#') {
        let (digits, radix, prefix_len) = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => (hex, 16, 3),
            None => (numeric, 10, 2),
        };
        let len = digits.chars().take_while(|c| c.is_digit(radix)).count();
        if len == 0 || len > 8 {
            return None;
        }
        let value = u32::from_str_radix(&digits[..len], radix).ok()?;
        let ch = char::from_u32(value)?;
        let semicolon = usize::from(digits[len..].starts_with(';'));
        return Some((ch, prefix_len + len + semicolon));
    }

    let end = body.find(';')?;
    if end == 0 || end > 8 {
        return None;
    }
    let ch = match body[..end].to_ascii_lowercase().as_str() {
        "lt" => '<',
        "gt" => '>',
        "amp" => '&',
        "quot" => '"',
        "apos" => '\'',
        "sol" => '/',
        "bsol" => '\\',
        "colon" => ':',
        "semi" => ';',
        "lpar" => '(',
        "rpar" => ')',
        "equals" => '=',
        "nbsp" => ' ',
        "tab" => '\t',
        "newline" => '\n',
        _ => return None,
    };
    Some((ch, end + 2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
    use proptest::prelude::*;

    #[test]
    fn test_url_decoding() {
        assert_eq!(normalize("%3Cscript%3E", DEFAULT_DECODE_ROUNDS), "<script>");
        assert_eq!(normalize("a+b%2Bc", DEFAULT_DECODE_ROUNDS), "a b c");
    }

    #[test]
    fn test_double_encoding() {
        assert_eq!(normalize("%253Cscript%253E", DEFAULT_DECODE_ROUNDS), "<script>");
    }

    #[test]
    fn test_html_entities() {
        assert_eq!(decode_html_entities("&lt;img src=x&gt;"), "<img src=x>");
        assert_eq!(decode_html_entities("&#60;&#x3C;&#X3c&#x3c;"), "<<<<");
        assert_eq!(decode_html_entities("fish &chips; & more"), "fish &chips; & more");
        assert_eq!(decode_html_entities("java&Tab;script&colon;"), "java\tscript:");
    }

    #[test]
    fn test_mixed_encoding() {
        // URL-encoded HTML entity
        assert_eq!(normalize("%26lt%3Bscript%26gt%3B", DEFAULT_DECODE_ROUNDS), "<script>");
    }

    #[test]
    fn test_rounds_are_bounded() {
        assert_eq!(normalize("%253C", 1), "%3C");
        assert_eq!(normalize("%253C", 0), "%253C");
    }

    #[test]
    fn test_strips_null_bytes() {
        assert_eq!(normalize("<scr\0ipt>", 1), "<script>");
        assert_eq!(normalize("<scr%00ipt>", 1), "<script>");
    }

    proptest! {
        #[test]
        fn percent_encoding_is_transparent(s in "[a-z<>/()=' ]{0,40}") {
            let encoded = utf8_percent_encode(&s, NON_ALPHANUMERIC).to_string();
            prop_assert_eq!(normalize(&encoded, DEFAULT_DECODE_ROUNDS), s);
        }

        #[test]
        fn plain_text_is_unchanged(s in "[a-zA-Z0-9 .,]{0,60}") {
            prop_assert_eq!(normalize(&s, DEFAULT_DECODE_ROUNDS), s);
        }
    }
}
