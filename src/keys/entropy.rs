//! Raw root secret. One live copy, wiped on drop, never printed.

use crate::error::{SignerError, SignerResult};
use bip39::Mnemonic;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub const MIN_LEN: usize = 16;
pub const MAX_LEN: usize = 32;

#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Entropy(Vec<u8>);

impl Entropy {
    /// 16..=32 bytes, multiple of 4.
    pub fn new(mut bytes: Vec<u8>) -> SignerResult<Self> {
        let len = bytes.len();
        if !(MIN_LEN..=MAX_LEN).contains(&len) || len % 4 != 0 {
            bytes.zeroize();
            return Err(SignerError::InputCapture(format!("bad entropy length: {len}")));
        }
        Ok(Self(bytes))
    }

    pub fn from_hex(value: &str) -> SignerResult<Self> {
        let bytes = hex::decode(value.trim())
            .map_err(|e| SignerError::InputCapture(format!("entropy hex: {e}")))?;
        Self::new(bytes)
    }

    pub fn to_hex(&self) -> String { hex::encode(&self.0) }

    pub fn as_bytes(&self) -> &[u8] { &self.0 }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn word_count(&self) -> usize { self.0.len() * 3 / 4 }

    pub fn to_mnemonic(&self) -> SignerResult<Mnemonic> {
        Mnemonic::from_entropy(&self.0).map_err(|e| SignerError::InputCapture(e.to_string()))
    }

    /// Space-separated English words.
    pub fn phrase(&self) -> SignerResult<String> {
        Ok(self.to_mnemonic()?.to_string())
    }
}

impl std::fmt::Debug for Entropy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entropy(<{} bytes>)", self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_entropy_golden_phrase() {
        let entropy = Entropy::new(vec![0u8; 16]).unwrap();
        assert_eq!(
            entropy.phrase().unwrap(),
            "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about"
        );
        assert_eq!(entropy.word_count(), 12);
    }

    #[test]
    fn rejects_bad_lengths() {
        for len in [0, 12, 15, 17, 36] {
            assert!(Entropy::new(vec![0u8; len]).is_err(), "len {len}");
        }
        for len in [16, 20, 24, 28, 32] {
            assert!(Entropy::new(vec![0u8; len]).is_ok(), "len {len}");
        }
    }

    #[test]
    fn debug_hides_bytes() {
        let entropy = Entropy::from_hex("ff".repeat(16).as_str()).unwrap();
        let shown = format!("{:?}", entropy);
        assert!(!shown.contains("ff"));
        assert!(shown.contains("16 bytes"));
    }
}
