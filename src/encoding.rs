//! Encoding normalizer.
//!
//! Documents on the site were saved over the years by different editors, so
//! the raw bytes may be UTF-8 or one of several single-byte code pages. The
//! text is decoded with the first encoding that accepts it, then a fixed table
//! of double-encoded accented characters is repaired.

use crate::errors::EngineError;
use encoding_rs::Encoding;
use tracing::debug;

/// Mis-decoded sequence and the character it stands for.
const MOJIBAKE: &[(&str, &str)] = &[
    ("Ã©", "é"),
    ("Ã¨", "è"),
    ("Ã¢", "â"),
    ("Ãª", "ê"),
    ("Ã®", "î"),
    ("Ã´", "ô"),
    ("Ã»", "û"),
    ("Ã¹", "ù"),
    ("Ã§", "ç"),
];

/// Text decoded from raw bytes, with the encoding that succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub text: String,
    pub encoding: &'static str,
}

/// Decode `bytes` with the first of `encodings` that reports no malformed input.
///
/// A leading byte-order mark of the chosen encoding is dropped.
pub fn decode(bytes: &[u8], encodings: &[&'static Encoding]) -> Result<Decoded, EngineError> {
    for encoding in encodings {
        let (text, had_errors) = encoding.decode_with_bom_removal(bytes);
        if had_errors {
            debug!(encoding = encoding.name(), "Decode attempt failed");
            continue;
        }
        return Ok(Decoded {
            text: text.into_owned(),
            encoding: encoding.name(),
        });
    }
    Err(EngineError::UnreadableEncoding {
        tried: encodings.iter().map(|e| e.name().to_string()).collect(),
    })
}

/// Replace known double-encoded sequences with the intended characters.
pub fn repair_mojibake(text: &str) -> String {
    let mut out = text.to_string();
    for (wrong, right) in MOJIBAKE {
        if out.contains(wrong) {
            out = out.replace(wrong, right);
        }
    }
    out
}

/// Decode and repair in one step.
pub fn normalize(bytes: &[u8], encodings: &[&'static Encoding]) -> Result<String, EngineError> {
    let decoded = decode(bytes, encodings)?;
    Ok(repair_mojibake(&decoded.text))
}
