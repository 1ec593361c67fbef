//! URI encoding functions: `encodeURI`, `encodeURIComponent`, their
//! decoders, and the legacy `escape`/`unescape` pair

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::{Result, TemplateError};

/// Characters `encodeURIComponent` leaves alone, besides alphanumerics
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// `encodeURI` additionally keeps the URI delimiters intact
const FULL_URI: &AsciiSet = &COMPONENT
    .remove(b';')
    .remove(b',')
    .remove(b'/')
    .remove(b'?')
    .remove(b':')
    .remove(b'@')
    .remove(b'&')
    .remove(b'=')
    .remove(b'+')
    .remove(b'$')
    .remove(b'#');

/// Escapes of these survive `decodeURI`
const URI_RESERVED: &[u8] = b";/?:@&=+$,#";

pub fn encode_uri_component(s: &str) -> String {
    utf8_percent_encode(s, COMPONENT).to_string()
}

pub fn encode_uri(s: &str) -> String {
    utf8_percent_encode(s, FULL_URI).to_string()
}

pub fn decode_uri_component(s: &str) -> Result<String> {
    decode(s, &[])
}

pub fn decode_uri(s: &str) -> Result<String> {
    decode(s, URI_RESERVED)
}

fn malformed() -> TemplateError {
    TemplateError::evaluation("URIError: URI malformed")
}

fn decode(s: &str, preserve: &[u8]) -> Result<String> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'%' {
            out.push(bytes[i]);
            i += 1;
            continue;
        }
        let byte = bytes
            .get(i + 1..i + 3)
            .filter(|hex| hex.iter().all(u8::is_ascii_hexdigit))
            .and_then(|hex| std::str::from_utf8(hex).ok())
            .and_then(|hex| u8::from_str_radix(hex, 16).ok())
            .ok_or_else(malformed)?;
        if preserve.contains(&byte) {
            out.extend_from_slice(&bytes[i..i + 3]);
        } else {
            out.push(byte);
        }
        i += 3;
    }
    String::from_utf8(out).map_err(|_| malformed())
}

/// Legacy `escape`: `%XX` for Latin-1, `%uXXXX` for other UTF-16 units
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for unit in s.encode_utf16() {
        match unit {
            0x30..=0x39 | 0x41..=0x5A | 0x61..=0x7A => out.push(unit as u8 as char),
            _ if b"@*_+-./".contains(&(unit as u8)) && unit < 0x80 => {
                out.push(unit as u8 as char)
            }
            0..=0xFF => out.push_str(&format!("%{:02X}", unit)),
            _ => out.push_str(&format!("%u{:04X}", unit)),
        }
    }
    out
}

/// Legacy `unescape`. Malformed escapes are kept verbatim.
pub fn unescape(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut units: Vec<u16> = Vec::with_capacity(chars.len());
    let mut i = 0;

    let hex = |from: usize, len: usize| -> Option<u16> {
        let digits = chars.get(from..from + len)?;
        if !digits.iter().all(char::is_ascii_hexdigit) {
            return None;
        }
        let digits: String = digits.iter().collect();
        u16::from_str_radix(&digits, 16).ok()
    };

    while i < chars.len() {
        if chars[i] == '%' {
            if chars.get(i + 1) == Some(&'u') {
                if let Some(unit) = hex(i + 2, 4) {
                    units.push(unit);
                    i += 6;
                    continue;
                }
            } else if let Some(unit) = hex(i + 1, 2) {
                units.push(unit);
                i += 3;
                continue;
            }
        }
        let mut buf = [0u16; 2];
        units.extend_from_slice(chars[i].encode_utf16(&mut buf));
        i += 1;
    }

    char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode() {
        assert_eq!(encode_uri_component("a b&c/d"), "a%20b%26c%2Fd");
        assert_eq!(encode_uri("https://x.dev/a b?q=1&r=é"), "https://x.dev/a%20b?q=1&r=%C3%A9");
        assert_eq!(encode_uri_component("it's (ok)!"), "it's%20(ok)!");
    }

    #[test]
    fn test_decode() {
        assert_eq!(decode_uri_component("a%20b%26c").unwrap(), "a b&c");
        assert_eq!(decode_uri("a%20b%26c").unwrap(), "a b%26c");
        assert_eq!(decode_uri_component("%C3%A9").unwrap(), "é");
        assert!(decode_uri_component("%E0%A4%A").is_err());
        assert!(decode_uri_component("%zz").is_err());
        assert!(decode_uri_component("%C3").is_err());
        assert!(decode_uri_component("%+1").is_err());
        assert!(decode_uri("a%-fb").is_err());
    }

    #[test]
    fn test_escape_round_trip() {
        assert_eq!(escape("a b+é€"), "a%20b+%E9%u20AC");
        assert_eq!(unescape("a%20b+%E9%u20AC"), "a b+é€");
        assert_eq!(unescape("100%"), "100%");
        assert_eq!(unescape("%+1x"), "%+1x");
    }
}
