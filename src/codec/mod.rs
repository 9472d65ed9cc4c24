//! Thumbnail token codec.
//!
//! A thumbnail is addressed by a single path-safe token that carries the
//! source image URL and the requested size:
//!
//! ```text
//! http://example.com/cat.jpg, 150, 150
//!            │
//!            ▼  base64, then '=' → '-' and '/' → '_'
//! aHR0cDovL2V4YW1wbGUuY29tL2NhdC5qcGc-_150_150
//!            │
//!            ▼  + ".jpg"
//! GET /aHR0cDovL2V4YW1wbGUuY29tL2NhdC5qcGc-_150_150.jpg
//! ```
//!
//! The same token names the cached file on disk, so the filename is the
//! cache key.
//!
//! # Example
//!
//! ```
//! use thumb_proxy::codec::{decode, encode};
//!
//! let token = encode("http://example.com/cat.jpg", 150, 150);
//! assert_eq!(token.as_str(), "aHR0cDovL2V4YW1wbGUuY29tL2NhdC5qcGc-_150_150");
//!
//! let request = decode(token.as_str()).unwrap();
//! assert_eq!(request.source_url(), "http://example.com/cat.jpg");
//! assert_eq!((request.width(), request.height()), (150, 150));
//! ```

mod token;

pub use token::{
    decode, encode, match_thumbnail_path, CacheToken, ThumbnailRequest, THUMBNAIL_CONTENT_TYPE,
    THUMBNAIL_EXTENSION,
};
