//! Lowercase hex encoding with optional `0x` prefix on input.

use crate::error::CryptoError;

/// Encode bytes as lowercase hex without prefix.
pub fn encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Encode bytes as `0x`-prefixed lowercase hex.
pub fn encode_prefixed(bytes: &[u8]) -> String {
    format!("0x{}", encode(bytes))
}

/// Decode hex, tolerating a leading `0x` and surrounding whitespace.
pub fn decode(hex: &str) -> Result<Vec<u8>, CryptoError> {
    let hex = hex.trim();
    let hex = hex.strip_prefix("0x").unwrap_or(hex);
    if hex.len() % 2 != 0 {
        return Err(CryptoError::HexDecode(
            "hex string must have even length".to_string(),
        ));
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| {
            hex.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| CryptoError::HexDecode(format!("invalid hex at position {i}")))
        })
        .collect()
}
