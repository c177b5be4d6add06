//! Error taxonomy shared by every workflow.
//!
//! Workflows never let one of these cross their boundary: the controller turns
//! it into an operator message and falls back to the top-level menu.

use crate::verify::VerifyError;

pub type SignerResult<T> = std::result::Result<T, SignerError>;

#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    /// Malformed or cancelled capture, malformed recovery phrase.
    #[error("Input capture failed: {0}")]
    InputCapture(String),

    /// Payload could not be decoded into a transaction.
    #[error("Failed at transaction parsing: {0}")]
    Parse(String),

    /// Transaction not attributable to a known wallet, or fee uncomputable.
    #[error("Problem with the transaction: {0}")]
    Validation(String),

    /// Operator said no. Abort path, not a fault.
    #[error("Confirmation declined")]
    ConfirmationDeclined,

    #[error("Signing failed: {0}")]
    Signing(String),

    /// Storage read, write, or read-back mismatch.
    #[error("Storage error: {0}")]
    Persistence(String),

    /// KeyStore used before a seed was loaded, bad settings, bad derivation.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Network id outside the known set. The only fatal error.
    #[error("Configuration error: Unknown network: {0}")]
    UnknownNetwork(String),

    #[error(transparent)]
    Verify(#[from] VerifyError),
}

impl SignerError {
    pub fn not_keyed() -> Self {
        SignerError::Configuration("no key loaded".into())
    }

    pub fn unknown_network(id: &str) -> Self {
        SignerError::UnknownNetwork(id.to_string())
    }

    /// Only an unknown network id is a caller-contract violation.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SignerError::UnknownNetwork(_))
    }

    /// Text shown on the device screen.
    pub fn operator_message(&self) -> String {
        match self {
            SignerError::Parse(_) => "Failed at transaction parsing".into(),
            SignerError::ConfirmationDeclined => "Transaction was not signed".into(),
            SignerError::Persistence(_) => "Something went wrong with the key storage".into(),
            other => other.to_string(),
        }
    }
}

impl From<std::io::Error> for SignerError {
    fn from(e: std::io::Error) -> Self {
        SignerError::Persistence(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unknown_network_is_fatal() {
        assert!(SignerError::unknown_network("moon").is_fatal());
        assert!(!SignerError::not_keyed().is_fatal());
        assert!(!SignerError::Parse("bad".into()).is_fatal());
        assert!(!SignerError::Configuration("Unknown network: moon".into()).is_fatal());
        assert_eq!(
            SignerError::unknown_network("moon").to_string(),
            "Configuration error: Unknown network: moon"
        );
    }

    #[test]
    fn verify_errors_keep_their_message() {
        let err: SignerError = VerifyError::MissingIndex.into();
        assert_eq!(
            err.operator_message(),
            "No derivation index in the address metadata - can't verify."
        );
    }
}
