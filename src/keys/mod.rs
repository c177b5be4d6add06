//! Keys - lifecycle of the root secret. Entropy NEVER leaves volatile memory
//! unless the operator asks for reckless storage.
//!
//! ```text
//! generate / recover ──► Entropy ──► derive_seed(passphrase) ──► KeyStore
//!                           │
//!                           └── save / load / erase ──► RecklessStore
//! ```

mod entropy;
mod keystore;

pub use entropy::Entropy;
pub use keystore::KeyStore;

use crate::error::{SignerError, SignerResult};
use crate::storage::RecklessStore;
use bip39::{Language, Mnemonic};
use rand::{CryptoRng, RngCore};
use zeroize::Zeroizing;

pub const WORD_COUNTS: [usize; 5] = [12, 15, 18, 21, 24];
pub const DEFAULT_CANDIDATE_LIMIT: usize = 10;

#[derive(Debug, Clone)]
pub struct KeyLifecycleManager {
    store: RecklessStore,
    candidate_limit: usize,
}

impl KeyLifecycleManager {
    pub fn new(store: RecklessStore) -> Self {
        Self { store, candidate_limit: DEFAULT_CANDIDATE_LIMIT }
    }

    pub fn with_candidate_limit(mut self, limit: usize) -> Self {
        self.candidate_limit = limit.max(1);
        self
    }

    pub fn store(&self) -> &RecklessStore { &self.store }

    /// Fresh entropy from the OS RNG.
    pub fn generate_new(&self, word_count: usize) -> SignerResult<Entropy> {
        self.generate_with(&mut rand::rngs::OsRng, word_count)
    }

    pub fn generate_with<R: RngCore + CryptoRng>(&self, rng: &mut R, word_count: usize) -> SignerResult<Entropy> {
        if !WORD_COUNTS.contains(&word_count) {
            return Err(SignerError::InputCapture(format!("unsupported word count: {word_count}")));
        }
        let mut bytes = vec![0u8; word_count * 4 / 3];
        rng.fill_bytes(&mut bytes);
        let entropy = Entropy::new(bytes)?;
        tracing::info!(words = word_count, "generated new entropy");
        Ok(entropy)
    }

    /// Checksum and wordlist are checked before anything is accepted.
    pub fn recover(&self, phrase: &str) -> SignerResult<Entropy> {
        let normalized = Zeroizing::new(normalize_phrase(phrase));
        let mnemonic = Mnemonic::parse_in_normalized(Language::English, &normalized).map_err(|e| {
            tracing::warn!(error = %e, "recovery phrase rejected");
            SignerError::InputCapture(describe_mnemonic_error(&e))
        })?;
        let entropy = Entropy::new(mnemonic.to_entropy())?;
        tracing::info!(words = mnemonic.word_count(), "recovered entropy from phrase");
        Ok(entropy)
    }

    /// Completions for the last word of `partial`: exact match first, then
    /// shorter words, then alphabetical.
    pub fn word_candidates(&self, partial: &str) -> Vec<&'static str> {
        let last = match partial.split_whitespace().last() {
            Some(word) if !partial.ends_with(char::is_whitespace) => word.to_lowercase(),
            _ => return Vec::new(),
        };
        let mut words: Vec<&'static str> = Language::English.words_by_prefix(&last).to_vec();
        words.sort_by(|a, b| {
            (*a != last)
                .cmp(&(*b != last))
                .then(a.len().cmp(&b.len()))
                .then(a.cmp(b))
        });
        words.truncate(self.candidate_limit);
        words
    }

    pub fn has_persisted(&self) -> bool { self.store.exists() }

    /// Absent or unreadable record is a recoverable persistence error.
    pub fn load_persisted(&self) -> SignerResult<Entropy> {
        self.store
            .load()
            .ok_or_else(|| SignerError::Persistence("no usable key in storage".into()))
    }

    pub fn save_persisted(&self, entropy: &Entropy) -> SignerResult<()> {
        self.store.save(entropy)
    }

    pub fn erase_persisted(&self) -> SignerResult<()> {
        self.store.delete()
    }

    /// BIP-39 seed from entropy and passphrase (PBKDF2, 2048 rounds).
    pub fn derive_seed(entropy: &Entropy, passphrase: &str) -> SignerResult<Zeroizing<[u8; 64]>> {
        Ok(Zeroizing::new(entropy.to_mnemonic()?.to_seed(passphrase)))
    }
}

fn normalize_phrase(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn describe_mnemonic_error(e: &bip39::Error) -> String {
    match e {
        bip39::Error::BadWordCount(n) => format!("{n} words, expected 12, 15, 18, 21 or 24"),
        bip39::Error::UnknownWord(i) => format!("word {} is not in the wordlist", i + 1),
        bip39::Error::InvalidChecksum => "invalid checksum".into(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::paths;
    use crate::storage::MemoryMedium;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    const TEST_MNEMONIC: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn manager() -> KeyLifecycleManager {
        KeyLifecycleManager::new(RecklessStore::new(Arc::new(MemoryMedium::new()), paths::RECKLESS))
    }

    #[test]
    fn generate_lengths_follow_word_count() {
        let keys = manager();
        let mut rng = StdRng::seed_from_u64(7);
        for words in WORD_COUNTS {
            let entropy = keys.generate_with(&mut rng, words).unwrap();
            assert_eq!(entropy.len(), words * 4 / 3);
            assert_eq!(entropy.phrase().unwrap().split(' ').count(), words);
        }
        assert!(keys.generate_with(&mut rng, 13).is_err());
        assert!(keys.generate_new(11).is_err());
    }

    #[test]
    fn seeded_generation_is_deterministic() {
        let keys = manager();
        let a = keys.generate_with(&mut StdRng::seed_from_u64(1), 12).unwrap();
        let b = keys.generate_with(&mut StdRng::seed_from_u64(1), 12).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn recover_normalizes_whitespace_and_case() {
        let keys = manager();
        let messy = format!("  {}  ", TEST_MNEMONIC.to_uppercase().replace(' ', "   "));
        let entropy = keys.recover(&messy).unwrap();
        assert_eq!(entropy.as_bytes(), &[0u8; 16]);
    }

    #[test]
    fn recover_rejects_bad_phrases() {
        let keys = manager();
        let bad_checksum = TEST_MNEMONIC.replace("about", "abandon");
        assert!(matches!(keys.recover(&bad_checksum), Err(SignerError::InputCapture(_))));
        assert!(keys.recover("abandon abandon").is_err());
        let unknown = TEST_MNEMONIC.replace("about", "bitcoinz");
        match keys.recover(&unknown) {
            Err(SignerError::InputCapture(msg)) => assert!(msg.contains("word 12")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn candidates_rank_exact_then_length() {
        let keys = manager();
        let found = keys.word_candidates("abandon ab");
        assert_eq!(&found[..3], &["able", "about", "above"]);

        let exact = keys.word_candidates("act");
        assert_eq!(exact[0], "act");
        assert!(exact.iter().skip(1).all(|w| w.starts_with("act") && w.len() > 3));

        assert!(keys.word_candidates("abandon ").is_empty());
        assert!(keys.word_candidates("").is_empty());
    }

    #[test]
    fn candidates_are_capped() {
        let keys = manager().with_candidate_limit(3);
        assert_eq!(keys.word_candidates("s").len(), 3);
    }

    #[test]
    fn seed_depends_on_passphrase() {
        let entropy = Entropy::new(vec![0u8; 16]).unwrap();
        let a = KeyLifecycleManager::derive_seed(&entropy, "").unwrap();
        let b = KeyLifecycleManager::derive_seed(&entropy, "").unwrap();
        let c = KeyLifecycleManager::derive_seed(&entropy, "TREZOR").unwrap();
        assert_eq!(*a, *b);
        assert_ne!(*a, *c);
        // BIP-39 reference vector
        assert_eq!(
            hex::encode(&c[..]),
            "c55257c360c07c72029aebc1b53c05ed0362ada38ead3e3e9efa3708e53495531f09a6987599d18264c1e1c92f2cf141630c7a3c4ab7c81b2f001698e7463b04"
        );
    }

    #[test]
    fn persistence_goes_through_store() {
        let keys = manager();
        assert!(!keys.has_persisted());
        assert!(matches!(keys.load_persisted(), Err(SignerError::Persistence(_))));

        let entropy = keys.generate_with(&mut StdRng::seed_from_u64(3), 24).unwrap();
        keys.save_persisted(&entropy).unwrap();
        assert!(keys.has_persisted());
        assert_eq!(keys.load_persisted().unwrap(), entropy);

        keys.erase_persisted().unwrap();
        keys.erase_persisted().unwrap();
        assert!(!keys.has_persisted());
    }
}
