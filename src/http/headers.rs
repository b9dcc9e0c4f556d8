//! Header collection and field-line parsing.
//!
//! Names are stored lower-cased so every lookup is case-insensitive. A name
//! seen twice folds into one entry as `"first, second"`; that rule lives in
//! [`Headers::append`] and nowhere else.

use std::collections::BTreeMap;

use crate::http::error::ParseError;

pub(crate) const CRLF: &[u8] = b"\r\n";

/// Outcome of feeding bytes to [`Headers::parse_line`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStatus {
    /// No complete line buffered yet.
    Partial,
    /// One field line was stored; `consumed` includes its CRLF.
    Field { consumed: usize },
    /// The empty line ending the header section.
    End { consumed: usize },
}

impl LineStatus {
    pub fn consumed(&self) -> usize {
        match self {
            LineStatus::Partial => 0,
            LineStatus::Field { consumed } | LineStatus::End { consumed } => *consumed,
        }
    }
}

/// Field name to value mapping with comma folding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    fields: BTreeMap<String, String>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Store `value`, folding it onto any existing value for `name`.
    pub fn append(&mut self, name: &str, value: &str) {
        let key = name.to_ascii_lowercase();
        match self.fields.get_mut(&key) {
            Some(existing) => {
                existing.push_str(", ");
                existing.push_str(value);
            }
            None => {
                self.fields.insert(key, value.to_string());
            }
        }
    }

    /// Store `value`, replacing any existing value for `name`.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.fields.insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.fields.remove(&name.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Entries ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parse at most one field line from the front of `data`.
    ///
    /// Returns [`LineStatus::Partial`] without touching the collection when
    /// `data` holds no CRLF yet.
    pub fn parse_line(&mut self, data: &[u8]) -> Result<LineStatus, ParseError> {
        let Some(idx) = find_crlf(data) else {
            return Ok(LineStatus::Partial);
        };
        if idx == 0 {
            return Ok(LineStatus::End { consumed: CRLF.len() });
        }

        let line = std::str::from_utf8(&data[..idx])
            .map_err(|_| ParseError::InvalidHeaderSyntax("field line is not valid utf-8"))?;
        let (raw_name, raw_value) = line
            .split_once(':')
            .ok_or(ParseError::InvalidHeaderSyntax("missing colon"))?;

        if raw_name.chars().last().map_or(true, char::is_whitespace) {
            return Err(ParseError::InvalidHeaderSyntax(
                "whitespace between field name and colon",
            ));
        }

        let name = single_token(raw_name)
            .ok_or(ParseError::InvalidHeaderSyntax("field name must be one token"))?;
        let value = single_token(raw_value)
            .ok_or(ParseError::InvalidHeaderSyntax("field value must be one token"))?;

        if !is_valid_name(name) {
            return Err(ParseError::InvalidHeaderName(name.to_string()));
        }

        self.append(name, value);
        Ok(LineStatus::Field {
            consumed: idx + CRLF.len(),
        })
    }
}

/// Position of the first CRLF in `data`.
pub(crate) fn find_crlf(data: &[u8]) -> Option<usize> {
    data.windows(CRLF.len()).position(|w| w == CRLF)
}

fn single_token(s: &str) -> Option<&str> {
    let mut tokens = s.split_whitespace();
    match (tokens.next(), tokens.next()) {
        (Some(token), None) => Some(token),
        _ => None,
    }
}

fn is_tchar(c: u8) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_'
                | b'`' | b'|' | b'~'
        )
}

fn is_valid_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.first().is_some_and(u8::is_ascii_alphabetic) && bytes.iter().all(|&c| is_tchar(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_field() {
        let mut headers = Headers::new();
        let data = b"Host: localhost:42069\r\n\r\n";
        let status = headers.parse_line(data).unwrap();
        assert_eq!(status, LineStatus::Field { consumed: 23 });
        assert_eq!(headers.get("host"), Some("localhost:42069"));
        assert_eq!(headers.get("HOST"), Some("localhost:42069"));
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let mut headers = Headers::new();
        let data = b"       Host:    localhost:42069     \r\n\r\n";
        let status = headers.parse_line(data).unwrap();
        assert_eq!(status.consumed(), data.len() - 2);
        assert_eq!(headers.get("host"), Some("localhost:42069"));
    }

    #[test]
    fn empty_line_ends_section() {
        let mut headers = Headers::new();
        let status = headers.parse_line(b"\r\nbody").unwrap();
        assert_eq!(status, LineStatus::End { consumed: 2 });
        assert!(headers.is_empty());
    }

    #[test]
    fn incomplete_line_waits() {
        let mut headers = Headers::new();
        assert_eq!(headers.parse_line(b"Host: local").unwrap(), LineStatus::Partial);
        assert_eq!(headers.parse_line(b"Host: localhost\r").unwrap(), LineStatus::Partial);
        assert!(headers.is_empty());
    }

    #[test]
    fn repeated_names_fold() {
        let mut headers = Headers::new();
        let mut data: &[u8] = b"X: a\r\nX: b\r\n\r\n";
        loop {
            match headers.parse_line(data).unwrap() {
                LineStatus::Field { consumed } => data = &data[consumed..],
                LineStatus::End { .. } => break,
                LineStatus::Partial => panic!("complete input reported as partial"),
            }
        }
        assert_eq!(headers.get("x"), Some("a, b"));
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn space_before_colon_is_rejected() {
        let mut headers = Headers::new();
        let err = headers.parse_line(b"Host : localhost\r\n\r\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidHeaderSyntax(_)));
    }

    #[test]
    fn multi_word_name_is_syntax_error() {
        let mut headers = Headers::new();
        let err = headers.parse_line(b"na me: v\r\n\r\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidHeaderSyntax(_)));
    }

    #[test]
    fn multi_word_value_is_syntax_error() {
        let mut headers = Headers::new();
        let err = headers.parse_line(b"User-Agent: curl 8.0\r\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidHeaderSyntax(_)));
    }

    #[test]
    fn missing_colon_is_syntax_error() {
        let mut headers = Headers::new();
        let err = headers.parse_line(b"Host localhost\r\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidHeaderSyntax(_)));
    }

    #[test]
    fn bad_names_are_rejected() {
        for line in [&b"1a: v\r\n\r\n"[..], b"H\xc2\xa9st: v\r\n", b"-x: v\r\n", b"ho@st: v\r\n"] {
            let mut headers = Headers::new();
            let err = headers.parse_line(line).unwrap_err();
            assert!(
                matches!(err, ParseError::InvalidHeaderName(_)),
                "{:?} gave {:?}",
                String::from_utf8_lossy(line),
                err
            );
        }
    }

    #[test]
    fn token_symbols_are_allowed() {
        let mut headers = Headers::new();
        headers.parse_line(b"X-Custom_Name.v2~: ok\r\n").unwrap();
        assert_eq!(headers.get("x-custom_name.v2~"), Some("ok"));
    }

    #[test]
    fn set_replaces_and_append_folds() {
        let mut headers = Headers::new();
        headers.append("Accept", "text/html");
        headers.append("accept", "application/json");
        assert_eq!(headers.get("ACCEPT"), Some("text/html, application/json"));

        headers.set("Accept", "*/*");
        assert_eq!(headers.get("accept"), Some("*/*"));
        assert_eq!(headers.remove("ACCEPT").as_deref(), Some("*/*"));
        assert!(headers.is_empty());
    }
}
