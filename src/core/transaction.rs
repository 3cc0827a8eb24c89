//! Transaction decoding
//!
//! Decodes transactions handed to the overlay by the ledger host:
//! - Raw serialized transactions
//! - BEEF bundles (BRC-62 V1 and BRC-96 V2), where the subject is the last transaction
//! - Atomic BEEF (BRC-95), where the subject is named by txid
//!
//! Merkle proofs carried in a bundle are parsed past but not verified.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::script::Script;
use super::varint::{Reader, VarIntError, Writer};
use crate::crypto::double_sha256;

// =============================================================================
// Constants
// =============================================================================

/// BEEF V1 version marker (`0100BEEF` on the wire)
pub const BEEF_V1: u32 = 0xEFBE_0001;

/// BEEF V2 version marker (`0200BEEF` on the wire)
pub const BEEF_V2: u32 = 0xEFBE_0002;

/// Atomic BEEF prefix (`01010101` on the wire)
pub const ATOMIC_BEEF: u32 = 0x0101_0101;

/// Length of a transaction ID in bytes
pub const TXID_LEN: usize = 32;

/// V2 per-transaction data formats
const FORMAT_RAW_TX: u8 = 0;
const FORMAT_RAW_TX_AND_BUMP: u8 = 1;
const FORMAT_TXID_ONLY: u8 = 2;

// =============================================================================
// Error Types
// =============================================================================

/// Transaction decoding errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("Malformed transaction data: {0}")]
    Decode(#[from] VarIntError),
    #[error("{0} unexpected trailing bytes after transaction")]
    TrailingBytes(usize),
    #[error("Invalid BEEF: {0}")]
    InvalidBeef(String),
    #[error("Invalid outpoint: {0}")]
    InvalidOutpoint(String),
}

// =============================================================================
// Outpoint
// =============================================================================

/// Reference to one transaction output: `(txid, output_index)`
///
/// Text form is `"<txid>.<output_index>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outpoint {
    pub txid: String,
    pub output_index: u32,
}

impl Outpoint {
    pub fn new(txid: impl Into<String>, output_index: u32) -> Self {
        Self {
            txid: txid.into(),
            output_index,
        }
    }
}

impl fmt::Display for Outpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.txid, self.output_index)
    }
}

impl FromStr for Outpoint {
    type Err = TransactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (txid, index) = s
            .rsplit_once('.')
            .ok_or_else(|| TransactionError::InvalidOutpoint(s.to_string()))?;
        if txid.is_empty() {
            return Err(TransactionError::InvalidOutpoint(s.to_string()));
        }
        let output_index = index
            .parse::<u32>()
            .map_err(|_| TransactionError::InvalidOutpoint(s.to_string()))?;
        Ok(Self::new(txid, output_index))
    }
}

// =============================================================================
// Inputs and Outputs
// =============================================================================

/// Transaction input (reference to a previous output)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    /// Transaction ID of the previous transaction (display hex)
    pub prev_txid: String,
    /// Index of the output in the previous transaction
    pub output_index: u32,
    pub unlocking_script: Script,
    pub sequence: u32,
}

/// Transaction output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    pub satoshis: u64,
    pub locking_script: Script,
}

// =============================================================================
// Transaction
// =============================================================================

/// A decoded transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: u32,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    pub lock_time: u32,
}

/// Convert between internal byte order and display hex
fn reversed_hex(bytes: &[u8]) -> String {
    let mut reversed = bytes.to_vec();
    reversed.reverse();
    hex::encode(reversed)
}

impl Transaction {
    /// Create a transaction with the given outputs and no inputs
    pub fn with_outputs(outputs: Vec<TransactionOutput>) -> Self {
        Self {
            version: 1,
            inputs: Vec::new(),
            outputs,
            lock_time: 0,
        }
    }

    /// Decode whatever the host handed us: raw transaction or BEEF
    pub fn from_bundle(bytes: &[u8]) -> Result<Self, TransactionError> {
        let marker = Reader::new(bytes).read_u32_le()?;
        match marker {
            BEEF_V1 | BEEF_V2 | ATOMIC_BEEF => Self::from_beef(bytes),
            _ => Self::from_bytes(bytes),
        }
    }

    /// Decode a raw serialized transaction
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TransactionError> {
        let mut reader = Reader::new(bytes);
        let tx = Self::read_from(&mut reader)?;
        if !reader.is_empty() {
            return Err(TransactionError::TrailingBytes(reader.remaining()));
        }
        Ok(tx)
    }

    /// Decode a raw transaction from hex
    pub fn from_hex(hex_str: &str) -> Result<Self, TransactionError> {
        let bytes = hex::decode(hex_str.trim())
            .map_err(|e| TransactionError::InvalidBeef(format!("invalid hex: {}", e)))?;
        Self::from_bundle(&bytes)
    }

    fn read_from(reader: &mut Reader<'_>) -> Result<Self, TransactionError> {
        let version = reader.read_u32_le()?;

        let input_count = reader.read_var_len()?;
        let mut inputs = Vec::with_capacity(input_count.min(reader.remaining()));
        for _ in 0..input_count {
            let prev_txid = reversed_hex(reader.read_bytes(TXID_LEN)?);
            let output_index = reader.read_u32_le()?;
            let unlocking_script = Script::from_bytes(reader.read_var_bytes()?.to_vec());
            let sequence = reader.read_u32_le()?;
            inputs.push(TransactionInput {
                prev_txid,
                output_index,
                unlocking_script,
                sequence,
            });
        }

        let output_count = reader.read_var_len()?;
        let mut outputs = Vec::with_capacity(output_count.min(reader.remaining()));
        for _ in 0..output_count {
            let satoshis = reader.read_u64_le()?;
            let locking_script = Script::from_bytes(reader.read_var_bytes()?.to_vec());
            outputs.push(TransactionOutput {
                satoshis,
                locking_script,
            });
        }

        let lock_time = reader.read_u32_le()?;
        Ok(Self {
            version,
            inputs,
            outputs,
            lock_time,
        })
    }

    /// Decode a BEEF bundle and return its subject transaction
    pub fn from_beef(bytes: &[u8]) -> Result<Self, TransactionError> {
        let mut reader = Reader::new(bytes);
        let mut version = reader.read_u32_le()?;

        let mut subject_txid = None;
        if version == ATOMIC_BEEF {
            subject_txid = Some(reversed_hex(reader.read_bytes(TXID_LEN)?));
            version = reader.read_u32_le()?;
        }
        if version != BEEF_V1 && version != BEEF_V2 {
            return Err(TransactionError::InvalidBeef(format!(
                "unknown version {:#010x}",
                version
            )));
        }

        let bump_count = reader.read_var_len()?;
        for _ in 0..bump_count {
            skip_bump(&mut reader)?;
        }

        let tx_count = reader.read_var_len()?;
        let mut transactions: Vec<Option<Transaction>> = Vec::new();
        for _ in 0..tx_count {
            let entry = if version == BEEF_V2 {
                match reader.read_u8()? {
                    FORMAT_TXID_ONLY => {
                        reader.read_bytes(TXID_LEN)?;
                        None
                    }
                    FORMAT_RAW_TX_AND_BUMP => {
                        reader.read_var_int()?;
                        Some(Self::read_from(&mut reader)?)
                    }
                    FORMAT_RAW_TX => Some(Self::read_from(&mut reader)?),
                    other => {
                        return Err(TransactionError::InvalidBeef(format!(
                            "unknown transaction format {}",
                            other
                        )))
                    }
                }
            } else {
                let tx = Self::read_from(&mut reader)?;
                if reader.read_u8()? != 0 {
                    reader.read_var_int()?;
                }
                Some(tx)
            };
            transactions.push(entry);
        }

        let subject = match subject_txid {
            Some(txid) => transactions
                .into_iter()
                .flatten()
                .find(|tx| tx.txid() == txid)
                .ok_or_else(|| {
                    TransactionError::InvalidBeef(format!("subject {} not in bundle", txid))
                })?,
            None => transactions.pop().flatten().ok_or_else(|| {
                TransactionError::InvalidBeef("bundle has no subject transaction".to_string())
            })?,
        };

        Ok(subject)
    }

    /// Serialize to raw transaction bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = Writer::new();
        writer.write_u32_le(self.version);

        writer.write_var_int(self.inputs.len() as u64);
        for input in &self.inputs {
            // Invalid hex serializes as an all-zero txid
            let mut prev = hex::decode(&input.prev_txid).unwrap_or_else(|_| vec![0; TXID_LEN]);
            prev.reverse();
            writer
                .write_bytes(&prev)
                .write_u32_le(input.output_index)
                .write_var_bytes(input.unlocking_script.as_bytes())
                .write_u32_le(input.sequence);
        }

        writer.write_var_int(self.outputs.len() as u64);
        for output in &self.outputs {
            writer
                .write_u64_le(output.satoshis)
                .write_var_bytes(output.locking_script.as_bytes());
        }

        writer.write_u32_le(self.lock_time);
        writer.into_bytes()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Transaction ID: double SHA-256 of the raw bytes, displayed byte-reversed
    pub fn txid(&self) -> String {
        reversed_hex(&double_sha256(&self.to_bytes()))
    }

    /// Wrap this transaction alone in a BEEF V1 bundle
    pub fn to_beef(&self) -> Vec<u8> {
        let mut writer = Writer::new();
        writer
            .write_u32_le(BEEF_V1)
            .write_var_int(0)
            .write_var_int(1)
            .write_bytes(&self.to_bytes())
            .write_u8(0);
        writer.into_bytes()
    }
}

/// Skip one BUMP (BRC-74 merkle path)
fn skip_bump(reader: &mut Reader<'_>) -> Result<(), TransactionError> {
    reader.read_var_int()?; // block height
    let tree_height = reader.read_u8()?;
    for _ in 0..tree_height {
        let leaves = reader.read_var_len()?;
        for _ in 0..leaves {
            reader.read_var_int()?; // offset
            let flags = reader.read_u8()?;
            // Duplicate leaves carry no hash
            if flags & 0x01 == 0 {
                reader.read_bytes(TXID_LEN)?;
            }
        }
    }
    Ok(())
}
