//! Core ledger primitives
//!
//! This module contains the building blocks the overlay reads from the ledger:
//! - VarInt encoding and byte cursors
//! - Scripts (chunk parsing and minimal push encoding)
//! - Transactions (raw and BEEF bundles) and outpoints

pub mod script;
pub mod transaction;
pub mod varint;

pub use script::{Script, ScriptChunk, ScriptError};
pub use transaction::{
    Outpoint, Transaction, TransactionError, TransactionInput, TransactionOutput, ATOMIC_BEEF,
    BEEF_V1, BEEF_V2,
};
pub use varint::{decode_var_int, encode_var_int, Reader, VarIntError, Writer};
