//! Entity decoding and escaping
//!
//! Handles the five predefined XML entities and numeric character
//! references in both directions.

use std::borrow::Cow;

use memchr::memchr;

/// Decode entity references in text or attribute content.
///
/// Unknown or malformed references are kept verbatim.
pub fn decode(input: &str) -> Cow<'_, str> {
    // Fast path: no ampersand means nothing to decode
    if memchr(b'&', input.as_bytes()).is_none() {
        return Cow::Borrowed(input);
    }

    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(amp) = rest.find('&') {
        result.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        match tail.find(';').and_then(|semi| Some((semi, decode_entity(&tail[..semi])?))) {
            Some((semi, c)) => {
                result.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                result.push('&');
                rest = tail;
            }
        }
    }
    result.push_str(rest);

    Cow::Owned(result)
}

/// Decode a single entity (without & and ;)
fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let numeric = entity.strip_prefix('#')?;
            let codepoint = match numeric.strip_prefix(|c: char| c == 'x' || c == 'X') {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => numeric.parse::<u32>().ok()?,
            };
            char::from_u32(codepoint)
        }
    }
}

/// Escape text content for XML output
pub fn escape_text(input: &str) -> Cow<'_, str> {
    escape(input, |c| match c {
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '&' => Some("&amp;"),
        _ => None,
    })
}

/// Escape a value for use inside a double-quoted attribute
pub fn escape_attribute(input: &str) -> Cow<'_, str> {
    escape(input, |c| match c {
        '<' => Some("&lt;"),
        '&' => Some("&amp;"),
        '"' => Some("&quot;"),
        _ => None,
    })
}

fn escape(input: &str, replacement: impl Fn(char) -> Option<&'static str>) -> Cow<'_, str> {
    // Fast path: check if any escaping needed
    if !input.chars().any(|c| replacement(c).is_some()) {
        return Cow::Borrowed(input);
    }

    let mut result = String::with_capacity(input.len() + 16);
    for c in input.chars() {
        match replacement(c) {
            Some(escaped) => result.push_str(escaped),
            None => result.push(c),
        }
    }
    Cow::Owned(result)
}
