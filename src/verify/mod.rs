//! Address verification
//!
//! ```text
//! [bitcoin:]<address>?index=<n>[&other=...]
//! ```
//!
//! The index is mandatory. There is no search over indices: the address at
//! exactly `index` is derived for every wallet and must match one of them.

use crate::session::SessionState;
use crate::wallet::{Network, Wallet};

const SCHEME: &str = "bitcoin:";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    #[error("No derivation index in the address metadata - can't verify.")]
    MissingIndex,
    #[error("Index is not an integer: {0}")]
    InvalidIndex(String),
    #[error("Address doesn't belong to any wallet. Wrong device or network?")]
    NoMatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRequest {
    pub address: String,
    pub index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedAddress {
    pub wallet_name: String,
    pub index: u32,
    pub address: String,
}

impl VerifiedAddress {
    /// Addresses are numbered from 1 on screen.
    pub fn title(&self) -> String { format!("Address #{}", self.index as u64 + 1) }
}

pub fn parse_request(input: &str) -> Result<AddressRequest, VerifyError> {
    let input = input.trim();
    let body = match input.get(..SCHEME.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(SCHEME) => &input[SCHEME.len()..],
        _ => input,
    };
    let (address, query) = body.split_once('?').ok_or(VerifyError::MissingIndex)?;

    let mut index = None;
    for (key, value) in query.split('&').filter_map(|pair| pair.split_once('=')) {
        if key != "index" {
            continue;
        }
        if index.is_some() {
            return Err(VerifyError::InvalidIndex(format!("{value} (repeated)")));
        }
        index = Some(value.parse::<u32>().map_err(|_| VerifyError::InvalidIndex(value.to_string()))?);
    }

    let index = index.ok_or(VerifyError::MissingIndex)?;
    Ok(AddressRequest { address: address.to_string(), index })
}

/// Succeeds iff exactly one wallet derives `address` at `index`.
pub fn verify_in(wallets: &[Wallet], network: Network, request: &AddressRequest) -> Result<VerifiedAddress, VerifyError> {
    let mut matches = wallets.iter().filter(|wallet| match wallet.address(request.index, network) {
        Ok(derived) => derived.to_string() == request.address,
        Err(e) => {
            tracing::debug!(wallet = wallet.name(), error = %e, "address derivation failed");
            false
        }
    });

    let found = matches.next().ok_or(VerifyError::NoMatch)?;
    if matches.next().is_some() {
        tracing::warn!(index = request.index, "address matches several wallets");
        return Err(VerifyError::NoMatch);
    }
    Ok(VerifiedAddress {
        wallet_name: found.name().to_string(),
        index: request.index,
        address: request.address.clone(),
    })
}

/// Parse and verify against the session's active network and wallets.
pub fn verify(session: &SessionState, input: &str) -> Result<VerifiedAddress, VerifyError> {
    let request = parse_request(input)?;
    let verified = verify_in(&session.wallets, session.network, &request)?;
    tracing::info!(wallet = %verified.wallet_name, index = verified.index, "address verified");
    Ok(verified)
}
