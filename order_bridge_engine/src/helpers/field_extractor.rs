//! A scanner for the flat, fixed-shape JSON objects emitted by the partner order feed.
//!
//! This is not a JSON parser. Only two value shapes are recognised:
//! * quoted strings, returned without the quotes. Escaped quotes are not understood, so `"a\"b"` yields `a\`.
//! * unquoted numbers: an optional leading `-`, digits, and at most one `.`.
//!
//! Anything else (`null`, booleans, nested objects and arrays) yields `None`. The scanner never panics, whatever the
//! input.

/// Returns the scalar value of `field` in `raw`, or `None` if the key is missing or its value is out of grammar.
///
/// The first occurrence of `"field"` in the text is used.
pub fn extract_field<'a>(raw: &'a str, field: &str) -> Option<&'a str> {
    let key = format!("\"{field}\"");
    let key_end = raw.find(&key)? + key.len();
    let colon = key_end + raw[key_end..].find(':')?;
    let value = raw[colon + 1..].trim_start_matches(|c: char| c.is_ascii_whitespace());
    match value.as_bytes().first()? {
        b'"' => {
            let body = &value[1..];
            let end = body.find('"')?;
            Some(&body[..end])
        },
        b'-' | b'0'..=b'9' => scan_number(value),
        _ => None,
    }
}

fn scan_number(s: &str) -> Option<&str> {
    let bytes = s.as_bytes();
    let mut end = usize::from(bytes.first() == Some(&b'-'));
    let mut seen_dot = false;
    let mut digits = 0usize;
    while let Some(&b) = bytes.get(end) {
        match b {
            b'0'..=b'9' => digits += 1,
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end += 1;
    }
    (digits > 0).then(|| &s[..end])
}
