//! Frame decoder: raw websocket payload → parsed JSON document.
//!
//! CoinEx compresses binary frames with gzip; other exchanges send plain
//! text. Pure functions, no side effects.

use std::io::Read;

use flate2::read::GzDecoder;
use serde_json::Value;

use crate::error::DecodeError;

/// Gzip member header signature.
const GZIP_MAGIC: [u8; 3] = [0x1f, 0x8b, 0x08];

/// One raw frame as received from the transport.
#[derive(Debug, Clone, Copy)]
pub enum RawFrame<'a> {
    Text(&'a str),
    Binary(&'a [u8]),
}

/// Decode a raw frame into a JSON document.
///
/// Binary frames starting with the gzip magic are decompressed fully before
/// parsing; other binary frames are decoded as UTF-8 text.
pub fn decode_frame(frame: RawFrame<'_>) -> Result<Value, DecodeError> {
    match frame {
        RawFrame::Text(text) => Ok(serde_json::from_str(text)?),
        RawFrame::Binary(bytes) if bytes.starts_with(&GZIP_MAGIC) => {
            let mut text = String::new();
            GzDecoder::new(bytes)
                .read_to_string(&mut text)
                .map_err(DecodeError::Compression)?;
            Ok(serde_json::from_str(&text)?)
        }
        RawFrame::Binary(bytes) => {
            let text = std::str::from_utf8(bytes)?;
            Ok(serde_json::from_str(text)?)
        }
    }
}
