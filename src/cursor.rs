//! Opaque connection cursors
//!
//! A cursor is the base64 encoding of `"typeName:key"`, pairing a record's
//! unique document key with a type discriminator so that a cursor minted for
//! one connection cannot be replayed against another entity type.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::{LoaderError, Result};

/// Cursor encoding/decoding
pub struct CursorCodec;

impl CursorCodec {
    /// Encode a typed cursor for a record key.
    ///
    /// ```rust
    /// use tracker_graphql_helpers::CursorCodec;
    ///
    /// let cursor = CursorCodec::encode("SslScan", "scans/123");
    /// assert_eq!(
    ///     CursorCodec::decode(&cursor).unwrap(),
    ///     ("SslScan".to_string(), "scans/123".to_string()),
    /// );
    /// ```
    pub fn encode(type_name: &str, key: &str) -> String {
        BASE64.encode(format!("{type_name}:{key}"))
    }

    /// Decode a cursor back into its `(typeName, key)` pair.
    ///
    /// Keys may themselves contain `:` (e.g. qualified document ids), so only
    /// the first separator is significant.
    pub fn decode(cursor: &str) -> Result<(String, String)> {
        let bytes = BASE64
            .decode(cursor.as_bytes())
            .map_err(|e| LoaderError::InvalidCursor(e.to_string()))?;
        let raw = String::from_utf8(bytes)
            .map_err(|e| LoaderError::InvalidCursor(e.to_string()))?;

        let (type_name, key) = raw
            .split_once(':')
            .ok_or_else(|| LoaderError::InvalidCursor("missing type discriminator".to_string()))?;

        if type_name.is_empty() || key.is_empty() {
            return Err(LoaderError::InvalidCursor(
                "empty type discriminator or key".to_string(),
            ));
        }

        Ok((type_name.to_string(), key.to_string()))
    }
}
