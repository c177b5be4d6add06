//! Post-sign redaction and export encoding.
//!
//! What goes back over the display channel is the unsigned transaction plus
//! our signatures. Anything else the coordinator already has.

use crate::error::{SignerError, SignerResult};
use base64::Engine;
use bitcoin::psbt::Psbt;

/// Strips everything not needed to combine and finalize the partial
/// signatures. Idempotent.
pub fn redact(psbt: &mut Psbt) {
    psbt.xpub.clear();
    psbt.proprietary.clear();
    psbt.unknown.clear();

    for input in psbt.inputs.iter_mut() {
        input.non_witness_utxo = None;
        input.witness_utxo = None;
        input.sighash_type = None;
        input.redeem_script = None;
        input.witness_script = None;
        input.bip32_derivation.clear();
        input.ripemd160_preimages.clear();
        input.sha256_preimages.clear();
        input.hash160_preimages.clear();
        input.hash256_preimages.clear();
        input.tap_scripts.clear();
        input.tap_key_origins.clear();
        input.tap_internal_key = None;
        input.tap_merkle_root = None;
        input.proprietary.clear();
        input.unknown.clear();
    }

    for output in psbt.outputs.iter_mut() {
        output.redeem_script = None;
        output.witness_script = None;
        output.bip32_derivation.clear();
        output.tap_internal_key = None;
        output.tap_tree = None;
        output.tap_key_origins.clear();
        output.proprietary.clear();
        output.unknown.clear();
    }
}

/// Base64 of the binary PSBT, no trailing newline.
pub fn encode(psbt: &Psbt) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(psbt.serialize());
    encoded.trim_end_matches(['\r', '\n']).to_string()
}

/// Inverse of [`encode`]. Surrounding whitespace is ignored.
pub fn decode(payload: &str) -> SignerResult<Psbt> {
    let raw = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| SignerError::Parse(format!("base64: {e}")))?;
    Psbt::deserialize(&raw).map_err(|e| SignerError::Parse(format!("psbt: {e}")))
}
