//! Cryptographic utilities for the overlay
//!
//! This module provides:
//! - SHA-256, HMAC-SHA256 and Base58Check helpers
//! - ECDSA key management (secp256k1)
//! - Counterparty-based child key derivation
//! - The identity linkage proof for advertisement tokens

pub mod derivation;
pub mod hash;
pub mod keys;
pub mod linkage;

pub use derivation::{
    derive_child_private_key, derive_child_public_key, invoice_number, Counterparty,
    DerivationError, ProtoWallet, ProtocolId,
};
pub use hash::{
    double_sha256, from_base58_check, hmac_sha256, sha256, to_base58_check,
};
pub use keys::{
    public_key_from_hex, public_key_from_slice, public_key_to_hex, sign_message,
    verify_signature, KeyError, KeyPair,
};
pub use linkage::{
    check_linkage, uhrp_protocol_id, verify_linkage, LinkageError, UHRP_KEY_ID,
    UHRP_PROTOCOL_NAME, UHRP_SECURITY_LEVEL,
};
