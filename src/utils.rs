use bytes::Bytes;

use crate::error::{Error, Result};

/// Copy protocol string bytes into an owned `String`.
pub fn to_string(bytes: &Bytes) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|err| {
            tracing::error!("Error converting from UTF8 {:?}", err);
            Error::DecodingUtf8Error
        })
}
