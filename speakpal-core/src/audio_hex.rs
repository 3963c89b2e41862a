use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HexDecodeError {
    #[error("hex audio has odd length {0}")]
    OddLength(usize),

    #[error("invalid hex digit {digit:?} at offset {offset}")]
    InvalidDigit { digit: char, offset: usize },
}

/// Decode server audio delivered as hexadecimal digit pairs into raw bytes.
pub fn decode_audio_hex(hex: &str) -> Result<Vec<u8>, HexDecodeError> {
    let hex = hex.trim();
    let bytes = hex.as_bytes();
    if bytes.len() % 2 != 0 {
        return Err(HexDecodeError::OddLength(bytes.len()));
    }

    let mut out = Vec::with_capacity(bytes.len() / 2);
    for (i, pair) in bytes.chunks_exact(2).enumerate() {
        let hi = nibble(pair[0], i * 2)?;
        let lo = nibble(pair[1], i * 2 + 1)?;
        out.push((hi << 4) | lo);
    }
    Ok(out)
}

fn nibble(b: u8, offset: usize) -> Result<u8, HexDecodeError> {
    match b {
        b'0'..=b'9' => Ok(b - b'0'),
        b'a'..=b'f' => Ok(b - b'a' + 10),
        b'A'..=b'F' => Ok(b - b'A' + 10),
        _ => Err(HexDecodeError::InvalidDigit {
            digit: b as char,
            offset,
        }),
    }
}
