//! Locking scripts as sequences of chunks
//!
//! A chunk is either a bare opcode or a data push. Only the parts of the
//! script language needed to read and build token scripts are covered here;
//! scripts are never executed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::varint::{Reader, VarIntError};

// =============================================================================
// Opcodes
// =============================================================================

pub const OP_0: u8 = 0x00;
pub const OP_PUSHDATA1: u8 = 0x4c;
pub const OP_PUSHDATA2: u8 = 0x4d;
pub const OP_PUSHDATA4: u8 = 0x4e;
pub const OP_1NEGATE: u8 = 0x4f;
pub const OP_1: u8 = 0x51;
pub const OP_16: u8 = 0x60;
pub const OP_2DROP: u8 = 0x6d;
pub const OP_DROP: u8 = 0x75;
pub const OP_CHECKSIG: u8 = 0xac;

// =============================================================================
// Script Errors
// =============================================================================

/// Script-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("Truncated push at offset {offset}: {source}")]
    TruncatedPush {
        offset: usize,
        #[source]
        source: VarIntError,
    },
    #[error("Invalid hex: {0}")]
    InvalidHex(String),
}

// =============================================================================
// Chunks
// =============================================================================

/// A single script element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptChunk {
    /// The opcode; for pushes this is the push opcode or direct length
    pub op: u8,
    /// Pushed bytes, if this chunk is a data push
    pub data: Option<Vec<u8>>,
}

impl ScriptChunk {
    /// A bare opcode
    pub fn op(op: u8) -> Self {
        Self { op, data: None }
    }

    /// Push `data` using the smallest encoding
    ///
    /// Empty data and `[0]` become `OP_0`, `[1]..=[16]` become `OP_1..OP_16`
    /// and `[0x81]` becomes `OP_1NEGATE`.
    pub fn minimal_push(data: &[u8]) -> Self {
        match data {
            [] | [0] => Self::op(OP_0),
            [n @ 1..=16] => Self::op(OP_1 + n - 1),
            [0x81] => Self::op(OP_1NEGATE),
            _ => {
                let op = match data.len() {
                    len if len < OP_PUSHDATA1 as usize => len as u8,
                    len if len <= u8::MAX as usize => OP_PUSHDATA1,
                    len if len <= u16::MAX as usize => OP_PUSHDATA2,
                    _ => OP_PUSHDATA4,
                };
                Self {
                    op,
                    data: Some(data.to_vec()),
                }
            }
        }
    }

    /// The value this chunk places on the stack, if it pushes anything
    ///
    /// Small-integer opcodes are expanded to their single-byte value.
    pub fn pushed_value(&self) -> Option<Vec<u8>> {
        match (&self.data, self.op) {
            (Some(data), _) => Some(data.clone()),
            (None, OP_0) => Some(vec![0]),
            (None, OP_1NEGATE) => Some(vec![0x81]),
            (None, op @ OP_1..=OP_16) => Some(vec![op - OP_1 + 1]),
            _ => None,
        }
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        out.push(self.op);
        if let Some(data) = &self.data {
            match self.op {
                OP_PUSHDATA1 => out.push(data.len() as u8),
                OP_PUSHDATA2 => out.extend_from_slice(&(data.len() as u16).to_le_bytes()),
                OP_PUSHDATA4 => out.extend_from_slice(&(data.len() as u32).to_le_bytes()),
                _ => {}
            }
            out.extend_from_slice(data);
        }
    }
}

// =============================================================================
// Script
// =============================================================================

/// A serialized script
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Script(#[serde(with = "hex_bytes")] Vec<u8>);

impl Script {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, ScriptError> {
        hex::decode(hex_str)
            .map(Self)
            .map_err(|e| ScriptError::InvalidHex(e.to_string()))
    }

    /// Serialize chunks into a script
    pub fn from_chunks(chunks: &[ScriptChunk]) -> Self {
        let mut bytes = Vec::new();
        for chunk in chunks {
            chunk.write_to(&mut bytes);
        }
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Split the script into chunks
    pub fn chunks(&self) -> Result<Vec<ScriptChunk>, ScriptError> {
        let mut reader = Reader::new(&self.0);
        let mut chunks = Vec::new();

        while !reader.is_empty() {
            let offset = reader.position();
            let truncated = |source| ScriptError::TruncatedPush { offset, source };

            let op = reader.read_u8().map_err(truncated)?;
            let len = match op {
                1..=0x4b => Some(op as usize),
                OP_PUSHDATA1 => Some(reader.read_u8().map_err(truncated)? as usize),
                OP_PUSHDATA2 => Some(reader.read_u16_le().map_err(truncated)? as usize),
                OP_PUSHDATA4 => Some(reader.read_u32_le().map_err(truncated)? as usize),
                _ => None,
            };

            let data = match len {
                Some(len) => Some(reader.read_bytes(len).map_err(truncated)?.to_vec()),
                None => None,
            };
            chunks.push(ScriptChunk { op, data });
        }

        Ok(chunks)
    }
}

impl From<Vec<u8>> for Script {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}
