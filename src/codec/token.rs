//! Token encoding and decoding.

use std::fmt;
use std::sync::OnceLock;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use regex::Regex;

use crate::error::CodecError;

/// File extension of every rendered thumbnail.
pub const THUMBNAIL_EXTENSION: &str = "jpg";

/// Content type of every rendered thumbnail.
pub const THUMBNAIL_CONTENT_TYPE: &str = "image/jpeg";

/// Base64 characters replaced to make the token path-safe, as `(base64, token)` pairs.
///
/// `+` is left untouched; the token grammar accepts it.
const SUBSTITUTIONS: [(char, char); 2] = [('=', '-'), ('/', '_')];

/// Standard alphabet; decoding accepts tokens with or without trailing padding.
const TOKEN_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Za-z0-9_\-\\+]+)_([0-9]+)_([0-9]+)$").expect("token grammar is valid")
    })
}

fn path_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^/([A-Za-z0-9_\-\\+]+_[0-9]+_[0-9]+)\.jpg$").expect("path grammar is valid")
    })
}

// =============================================================================
// Thumbnail Request
// =============================================================================

/// The `(source URL, width, height)` triple a token stands for.
///
/// Built fresh for every inbound request and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThumbnailRequest {
    source_url: String,
    width: u32,
    height: u32,
}

impl ThumbnailRequest {
    pub fn new(source_url: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            source_url: source_url.into(),
            width,
            height,
        }
    }

    /// Decode a token into a request. Equivalent to [`decode`].
    pub fn from_token(token: &str) -> Result<Self, CodecError> {
        decode(token)
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Re-encode this request into its token.
    pub fn token(&self) -> CacheToken {
        encode(&self.source_url, self.width, self.height)
    }
}

// =============================================================================
// Cache Token
// =============================================================================

/// Path-safe encoding of a [`ThumbnailRequest`].
///
/// Never contains `/` or `=`, so it is usable both as a URL path segment
/// and as a filename stem.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheToken(String);

impl CacheToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filename of the cached thumbnail, e.g. `<token>.jpg`.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.0, THUMBNAIL_EXTENSION)
    }

    /// Request path that serves this thumbnail, e.g. `/<token>.jpg`.
    pub fn request_path(&self) -> String {
        format!("/{}", self.file_name())
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CacheToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// Encode / Decode
// =============================================================================

/// Encode a source URL and size into a token.
pub fn encode(url: &str, width: u32, height: u32) -> CacheToken {
    let encoded: String = TOKEN_BASE64
        .encode(url.as_bytes())
        .chars()
        .map(|c| {
            SUBSTITUTIONS
                .iter()
                .find(|(from, _)| *from == c)
                .map_or(c, |(_, to)| *to)
        })
        .collect();

    CacheToken(format!("{}_{}_{}", encoded, width, height))
}

/// Decode a token back into its request.
///
/// The encoded group is greedy: when the payload itself ends in
/// `_<digits>_<digits>`, only the last two integer groups are taken as the size.
///
/// This does not check that the URL is usable; a valid payload may decode to
/// any UTF-8 string.
pub fn decode(token: &str) -> Result<ThumbnailRequest, CodecError> {
    let malformed = |reason: String| CodecError::MalformedToken {
        token: token.to_string(),
        reason,
    };

    let captures = token_regex()
        .captures(token)
        .ok_or_else(|| malformed("URL is not a thumbnail URL".to_string()))?;

    let payload: String = captures[1]
        .chars()
        .map(|c| {
            SUBSTITUTIONS
                .iter()
                .find(|(_, to)| *to == c)
                .map_or(c, |(from, _)| *from)
        })
        .collect();

    let bytes = TOKEN_BASE64
        .decode(payload.as_bytes())
        .map_err(|e| malformed(format!("invalid base64: {}", e)))?;

    let source_url =
        String::from_utf8(bytes).map_err(|e| malformed(format!("invalid UTF-8: {}", e)))?;

    let width = captures[2]
        .parse::<u32>()
        .map_err(|e| malformed(format!("invalid width: {}", e)))?;
    let height = captures[3]
        .parse::<u32>()
        .map_err(|e| malformed(format!("invalid height: {}", e)))?;

    Ok(ThumbnailRequest {
        source_url,
        width,
        height,
    })
}

/// Extract the token from a thumbnail request path (`/<token>.jpg`).
///
/// Returns `None` for any path that is not a thumbnail request, including
/// nested paths and other extensions.
pub fn match_thumbnail_path(path: &str) -> Option<&str> {
    path_regex()
        .captures(path)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

// =============================================================================
// Tests
// =============================================================================
