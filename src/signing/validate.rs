//! Transaction validation against the session's wallets.

use crate::error::{SignerError, SignerResult};
use crate::wallet::{Network, Wallet};
use bitcoin::psbt::Psbt;
use bitcoin::{Address, Amount, TxOut};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendOutput {
    /// Address text, or `script:<hex>` for non-standard outputs.
    pub address: String,
    pub value: Amount,
}

/// What the operator confirms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendSummary {
    pub wallet_name: String,
    /// Value of inputs attributed to the wallet.
    pub recognized_input: Amount,
    pub total_input: Amount,
    pub send_outputs: Vec<SendOutput>,
    pub change: Amount,
    pub fee: Amount,
}

impl SpendSummary {
    /// Leaves the wallet: sends plus fee.
    pub fn spending(&self) -> Amount {
        self.send_outputs.iter().fold(self.fee, |acc, o| acc + o.value)
    }

    /// Lines for the confirmation screen.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![format!("Spending {} sat from {}", self.spending().to_sat(), self.wallet_name)];
        lines.extend(self.send_outputs.iter().map(|o| format!("{} sat to {}", o.value.to_sat(), o.address)));
        if self.change > Amount::ZERO {
            lines.push(format!("Change {} sat", self.change.to_sat()));
        }
        lines.push(format!("Fee {} sat", self.fee.to_sat()));
        lines
    }
}

/// Validated, not yet signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransaction {
    pub psbt: Psbt,
    pub summary: SpendSummary,
}

fn invalid(msg: impl Into<String>) -> SignerError {
    SignerError::Validation(msg.into())
}

fn add(acc: Amount, value: Amount) -> SignerResult<Amount> {
    acc.checked_add(value).ok_or_else(|| invalid("amount overflow"))
}

/// Previous output spent by input `i`, from whatever the PSBT carries.
fn spent_output(psbt: &Psbt, i: usize) -> SignerResult<TxOut> {
    let input = &psbt.inputs[i];
    let outpoint = psbt.unsigned_tx.input[i].previous_output;

    let from_full = match &input.non_witness_utxo {
        Some(prev) => {
            if prev.compute_txid() != outpoint.txid {
                return Err(invalid(format!("input {i}: previous transaction does not match outpoint")));
            }
            let out = prev
                .output
                .get(outpoint.vout as usize)
                .ok_or_else(|| invalid(format!("input {i}: previous output {} missing", outpoint.vout)))?;
            Some(out.clone())
        }
        None => None,
    };

    match (from_full, &input.witness_utxo) {
        (Some(full), Some(witness)) if full != *witness => {
            Err(invalid(format!("input {i}: witness utxo disagrees with previous transaction")))
        }
        (Some(full), _) => Ok(full),
        (None, Some(witness)) => Ok(witness.clone()),
        (None, None) => Err(invalid(format!("input {i}: missing input value, fee can't be computed"))),
    }
}

/// Attributes every input and output to `wallets` and computes the fee.
pub fn check_psbt(psbt: Psbt, wallets: &[Wallet], network: Network) -> SignerResult<PendingTransaction> {
    let mut total_input = Amount::ZERO;
    let mut recognized_input = Amount::ZERO;
    let mut owner: Option<&Wallet> = None;

    for (i, input) in psbt.inputs.iter().enumerate() {
        let prev = spent_output(&psbt, i)?;
        total_input = add(total_input, prev.value)?;

        let found = wallets
            .iter()
            .find(|w| w.owns(&prev.script_pubkey, &input.bip32_derivation, network).is_some());
        if let Some(wallet) = found {
            match owner {
                Some(current) if current.name() != wallet.name() => {
                    return Err(invalid("inputs belong to more than one wallet"));
                }
                _ => owner = Some(wallet),
            }
            recognized_input = add(recognized_input, prev.value)?;
        }
    }

    let wallet = owner.ok_or_else(|| invalid("no input belongs to a known wallet"))?;

    let mut total_output = Amount::ZERO;
    let mut change = Amount::ZERO;
    let mut send_outputs = Vec::new();
    for (txout, output) in psbt.unsigned_tx.output.iter().zip(psbt.outputs.iter()) {
        total_output = add(total_output, txout.value)?;
        if wallet.owns(&txout.script_pubkey, &output.bip32_derivation, network).is_some() {
            change = add(change, txout.value)?;
            continue;
        }
        let address = match Address::from_script(&txout.script_pubkey, network.to_bitcoin()) {
            Ok(addr) => addr.to_string(),
            Err(_) => format!("script:{}", txout.script_pubkey.to_hex_string()),
        };
        send_outputs.push(SendOutput { address, value: txout.value });
    }

    let fee = total_input
        .checked_sub(total_output)
        .ok_or_else(|| invalid("outputs exceed inputs"))?;

    tracing::debug!(
        wallet = wallet.name(),
        inputs = psbt.inputs.len(),
        outputs = psbt.outputs.len(),
        fee = fee.to_sat(),
        "transaction validated"
    );

    let summary = SpendSummary {
        wallet_name: wallet.name().to_string(),
        recognized_input,
        total_input,
        send_outputs,
        change,
        fee,
    };
    Ok(PendingTransaction { psbt, summary })
}
