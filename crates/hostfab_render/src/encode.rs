//! Escaping policy: raw value + destination syntax -> safe literal text.
//!
//! Every value interpolated into an artifact passes through [`encode`] with
//! the syntax of its destination. Encodings are injective so the consuming
//! side can recover the original value; values that cannot be represented
//! safely are rejected rather than emitted.

use serde::{Deserialize, Serialize};

/// Destination syntaxes a value can be encoded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Syntax {
    /// Web-server directive value: quoted when it contains whitespace or
    /// quote characters.
    Directive,
    /// Single-quoted source-code string literal.
    SourceString,
    /// Percent-encoded token for URLs and environment channels.
    UrlToken,
    /// [`Syntax::UrlToken`] applied per `@`-separated segment, for
    /// usernames whose surrounding field separator is also `@`.
    UrlSegments,
    /// Filesystem path in a directive argument position.
    PathArg,
}

impl Syntax {
    pub fn as_str(&self) -> &'static str {
        match self {
            Syntax::Directive => "directive",
            Syntax::SourceString => "source_string",
            Syntax::UrlToken => "url_token",
            Syntax::UrlSegments => "url_segments",
            Syntax::PathArg => "path_arg",
        }
    }
}

impl std::fmt::Display for Syntax {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a value could not be represented in a destination syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeError {
    pub syntax: Syntax,
    pub reason: String,
}

impl std::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "not representable as {}: {}", self.syntax, self.reason)
    }
}

/// Encode a raw value for the given destination syntax.
pub fn encode(value: &str, syntax: Syntax) -> Result<String, EncodeError> {
    match syntax {
        Syntax::Directive => encode_directive(value),
        Syntax::SourceString => encode_source_string(value),
        Syntax::UrlToken => Ok(url_encode(value)),
        Syntax::UrlSegments => Ok(encode_at_segments(value)),
        Syntax::PathArg => encode_path_arg(value),
    }
}

fn reject_control(value: &str, syntax: Syntax) -> Result<(), EncodeError> {
    if let Some(c) = value.chars().find(|c| c.is_control()) {
        return Err(EncodeError {
            syntax,
            reason: format!("contains control character U+{:04X}", c as u32),
        });
    }
    Ok(())
}

fn encode_directive(value: &str) -> Result<String, EncodeError> {
    reject_control(value, Syntax::Directive)?;

    let needs_quoting = value.is_empty() || value.chars().any(|c| c.is_whitespace() || c == '"');
    if !needs_quoting {
        return Ok(value.to_string());
    }

    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    Ok(out)
}

fn encode_source_string(value: &str) -> Result<String, EncodeError> {
    reject_control(value, Syntax::SourceString)?;

    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '\'' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    Ok(out)
}

fn encode_path_arg(value: &str) -> Result<String, EncodeError> {
    reject_control(value, Syntax::PathArg)?;

    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c == ' ' || c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    Ok(out)
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
pub fn url_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Decode a percent-encoded token. Returns `None` on malformed or
/// non-UTF-8 input.
pub fn url_decode(value: &str) -> Option<String> {
    let mut bytes = Vec::with_capacity(value.len());
    let mut iter = value.bytes();
    while let Some(byte) = iter.next() {
        if byte == b'%' {
            let hi = iter.next()?;
            let lo = iter.next()?;
            let hex = [hi, lo];
            let hex = std::str::from_utf8(&hex).ok()?;
            bytes.push(u8::from_str_radix(hex, 16).ok()?);
        } else {
            bytes.push(byte);
        }
    }
    String::from_utf8(bytes).ok()
}

/// Encode each `@`-separated segment independently and rejoin with `@`.
///
/// Usernames are carried inside fields whose separator is itself `@`, so
/// the segments are encoded on their own; the consumer splits on the
/// outermost `@` of the surrounding field and decodes per segment.
pub fn encode_at_segments(value: &str) -> String {
    value
        .split('@')
        .map(url_encode)
        .collect::<Vec<_>>()
        .join("@")
}

/// Inverse of [`encode_at_segments`].
pub fn decode_at_segments(value: &str) -> Option<String> {
    let segments: Option<Vec<String>> = value.split('@').map(url_decode).collect();
    Some(segments?.join("@"))
}
