//! PushDrop token scripts
//!
//! A PushDrop token locks an output to a public key and carries data fields
//! that are pushed and then dropped before the signature check runs:
//!
//! ```text
//! <locking pubkey> OP_CHECKSIG <field 0> ... <field n-1> OP_2DROP ... [OP_DROP]
//! ```

use secp256k1::PublicKey;
use thiserror::Error;

use crate::core::script::{ScriptChunk, OP_2DROP, OP_CHECKSIG, OP_DROP};
use crate::core::{Script, ScriptError};
use crate::crypto::public_key_from_slice;

/// Token decoding errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PushDropError {
    #[error("Script error: {0}")]
    Script(#[from] ScriptError),
    #[error("Script does not start with a locking public key push")]
    MissingLockingKey,
    #[error("Locking public key is not a valid public key")]
    InvalidLockingKey,
    #[error("Locking key is not followed by OP_CHECKSIG")]
    MissingChecksig,
    #[error("Field {0} is not a data push (opcode {1:#04x})")]
    NonPushField(usize, u8),
}

/// A decoded PushDrop token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushDropToken {
    pub locking_public_key: PublicKey,
    pub fields: Vec<Vec<u8>>,
}

impl PushDropToken {
    pub fn new(locking_public_key: PublicKey, fields: Vec<Vec<u8>>) -> Self {
        Self {
            locking_public_key,
            fields,
        }
    }

    /// Decode a token from a locking script
    pub fn decode(script: &Script) -> Result<Self, PushDropError> {
        let chunks = script.chunks()?;
        let mut chunks = chunks.iter();

        let key_bytes = chunks
            .next()
            .and_then(|chunk| chunk.data.as_deref())
            .ok_or(PushDropError::MissingLockingKey)?;
        let locking_public_key =
            public_key_from_slice(key_bytes).map_err(|_| PushDropError::InvalidLockingKey)?;

        match chunks.next() {
            Some(chunk) if chunk.op == OP_CHECKSIG && chunk.data.is_none() => {}
            _ => return Err(PushDropError::MissingChecksig),
        }

        let mut fields = Vec::new();
        for chunk in chunks {
            if chunk.data.is_none() && (chunk.op == OP_DROP || chunk.op == OP_2DROP) {
                break;
            }
            let value = chunk
                .pushed_value()
                .ok_or(PushDropError::NonPushField(fields.len(), chunk.op))?;
            fields.push(value);
        }

        Ok(Self {
            locking_public_key,
            fields,
        })
    }

    /// Encode the token as a locking script
    pub fn encode(&self) -> Script {
        let mut chunks = Vec::with_capacity(self.fields.len() * 2 + 2);
        chunks.push(ScriptChunk::minimal_push(&self.locking_public_key.serialize()));
        chunks.push(ScriptChunk::op(OP_CHECKSIG));
        chunks.extend(self.fields.iter().map(|f| ScriptChunk::minimal_push(f)));

        let mut remaining = self.fields.len();
        while remaining > 1 {
            chunks.push(ScriptChunk::op(OP_2DROP));
            remaining -= 2;
        }
        if remaining == 1 {
            chunks.push(ScriptChunk::op(OP_DROP));
        }

        Script::from_chunks(&chunks)
    }
}
