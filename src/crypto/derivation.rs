//! Counterparty-based child key derivation
//!
//! Two parties holding root keys `a` and `B = b*G` derive linked child keys
//! without further interaction. The shared secret `S = a*B = b*A` keys an
//! HMAC over an invoice number, and the HMAC output tweaks the root key:
//!
//! - child private key: `a + HMAC(S, invoice)`
//! - child public key of the other party: `B + HMAC(S, invoice)*G`
//!
//! The invoice number binds a protocol, a security level and a key ID:
//! `"<securityLevel>-<protocolName>-<keyID>"`.

use secp256k1::{PublicKey, Scalar, Secp256k1, SecretKey};
use thiserror::Error;

use super::hash::hmac_sha256;
use super::keys::{sign_message, verify_signature, KeyError};

/// Highest security level accepted in a protocol ID
pub const MAX_SECURITY_LEVEL: u8 = 2;

/// Protocol name length bounds, in characters
pub const MIN_PROTOCOL_NAME_LEN: usize = 5;
pub const MAX_PROTOCOL_NAME_LEN: usize = 400;

/// Maximum key ID length, in bytes
pub const MAX_KEY_ID_LEN: usize = 800;

/// Root key of the "anyone" wallet: the scalar 1
const ANYONE_SECRET: [u8; 32] = {
    let mut bytes = [0u8; 32];
    bytes[31] = 1;
    bytes
};

/// Errors raised while deriving keys or checking signatures
#[derive(Error, Debug)]
pub enum DerivationError {
    #[error("Security level must be 0, 1 or 2, got {0}")]
    InvalidSecurityLevel(u8),
    #[error("Invalid protocol name: {0}")]
    InvalidProtocolName(String),
    #[error("Key ID must be 1..={} bytes, got {0}", MAX_KEY_ID_LEN)]
    InvalidKeyId(usize),
    #[error("Key tweak out of range")]
    TweakOutOfRange,
    #[error("Key error: {0}")]
    Key(#[from] KeyError),
    #[error("Secp256k1 error: {0}")]
    Secp256k1(#[from] secp256k1::Error),
}

/// A protocol identifier: security level plus protocol name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolId {
    pub security_level: u8,
    pub name: String,
}

impl ProtocolId {
    pub fn new(security_level: u8, name: impl Into<String>) -> Self {
        Self {
            security_level,
            name: name.into(),
        }
    }
}

/// The other party in a derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counterparty {
    /// The publicly known "anyone" key (`1*G`)
    Anyone,
    /// A specific identity key
    Key(PublicKey),
}

/// Build the normalized invoice number for a protocol and key ID
pub fn invoice_number(protocol: &ProtocolId, key_id: &str) -> Result<String, DerivationError> {
    if protocol.security_level > MAX_SECURITY_LEVEL {
        return Err(DerivationError::InvalidSecurityLevel(
            protocol.security_level,
        ));
    }
    if key_id.is_empty() || key_id.len() > MAX_KEY_ID_LEN {
        return Err(DerivationError::InvalidKeyId(key_id.len()));
    }

    let name = protocol.name.trim().to_lowercase();
    let name_len = name.chars().count();
    if name_len < MIN_PROTOCOL_NAME_LEN || name_len > MAX_PROTOCOL_NAME_LEN {
        return Err(DerivationError::InvalidProtocolName(format!(
            "length must be {}..={} characters",
            MIN_PROTOCOL_NAME_LEN, MAX_PROTOCOL_NAME_LEN
        )));
    }
    if name.contains("  ") {
        return Err(DerivationError::InvalidProtocolName(
            "must not contain consecutive spaces".to_string(),
        ));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == ' ')
    {
        return Err(DerivationError::InvalidProtocolName(
            "only letters, numbers and spaces are allowed".to_string(),
        ));
    }
    if name.ends_with(" protocol") {
        return Err(DerivationError::InvalidProtocolName(
            "must not end with \" protocol\"".to_string(),
        ));
    }

    Ok(format!("{}-{}-{}", protocol.security_level, name, key_id))
}

fn scalar_from(bytes: [u8; 32]) -> Result<Scalar, DerivationError> {
    Scalar::from_be_bytes(bytes).map_err(|_| DerivationError::TweakOutOfRange)
}

/// HMAC tweak shared by both sides of a derivation
fn derivation_tweak(
    public_key: &PublicKey,
    secret_key: &SecretKey,
    invoice: &str,
) -> Result<Scalar, DerivationError> {
    let secp = Secp256k1::new();
    let shared_secret = public_key.mul_tweak(&secp, &scalar_from(secret_key.secret_bytes())?)?;
    scalar_from(hmac_sha256(&shared_secret.serialize(), invoice.as_bytes()))
}

/// Derive the child public key of `public_key`'s owner, as seen by `secret_key`'s owner
pub fn derive_child_public_key(
    public_key: &PublicKey,
    secret_key: &SecretKey,
    invoice: &str,
) -> Result<PublicKey, DerivationError> {
    let secp = Secp256k1::new();
    let tweak = derivation_tweak(public_key, secret_key, invoice)?;
    Ok(public_key.add_exp_tweak(&secp, &tweak)?)
}

/// Derive our own child private key for a counterparty's public key
pub fn derive_child_private_key(
    secret_key: &SecretKey,
    counterparty: &PublicKey,
    invoice: &str,
) -> Result<SecretKey, DerivationError> {
    let tweak = derivation_tweak(counterparty, secret_key, invoice)?;
    Ok(secret_key.add_tweak(&tweak)?)
}

/// A minimal wallet that derives keys and checks signatures from a root key
///
/// The [`ProtoWallet::anyone`] wallet holds no real secret: its root key is the
/// scalar 1, so it can only verify proofs addressed to "anyone".
#[derive(Clone)]
pub struct ProtoWallet {
    root_key: SecretKey,
}

impl ProtoWallet {
    /// Create a wallet over a root private key
    pub fn new(root_key: SecretKey) -> Self {
        Self { root_key }
    }

    /// The unprivileged "anyone" wallet
    pub fn anyone() -> Result<Self, DerivationError> {
        let root_key = SecretKey::from_slice(&ANYONE_SECRET)?;
        Ok(Self { root_key })
    }

    /// Root identity public key of this wallet
    pub fn identity_key(&self) -> PublicKey {
        PublicKey::from_secret_key(&Secp256k1::new(), &self.root_key)
    }

    fn counterparty_key(&self, counterparty: Counterparty) -> Result<PublicKey, DerivationError> {
        match counterparty {
            Counterparty::Anyone => Ok(Self::anyone()?.identity_key()),
            Counterparty::Key(key) => Ok(key),
        }
    }

    /// Derive a public key for a protocol, key ID and counterparty
    ///
    /// With `for_self` the result is our own child key (the one our matching
    /// private key signs with); otherwise it is the counterparty's child key.
    pub fn get_public_key(
        &self,
        protocol: &ProtocolId,
        key_id: &str,
        counterparty: Counterparty,
        for_self: bool,
    ) -> Result<PublicKey, DerivationError> {
        let invoice = invoice_number(protocol, key_id)?;
        let other = self.counterparty_key(counterparty)?;

        if for_self {
            let child = derive_child_private_key(&self.root_key, &other, &invoice)?;
            Ok(PublicKey::from_secret_key(&Secp256k1::new(), &child))
        } else {
            derive_child_public_key(&other, &self.root_key, &invoice)
        }
    }

    /// Sign `data` with our child key for a protocol, key ID and counterparty
    pub fn create_signature(
        &self,
        data: &[u8],
        protocol: &ProtocolId,
        key_id: &str,
        counterparty: Counterparty,
    ) -> Result<Vec<u8>, DerivationError> {
        let invoice = invoice_number(protocol, key_id)?;
        let other = self.counterparty_key(counterparty)?;
        let child = derive_child_private_key(&self.root_key, &other, &invoice)?;
        Ok(sign_message(&child, data)?)
    }

    /// Verify a signature the counterparty made with their child key
    ///
    /// A well-formed but wrong signature yields `Ok(false)`; malformed inputs
    /// are errors.
    pub fn verify_signature(
        &self,
        data: &[u8],
        signature: &[u8],
        protocol: &ProtocolId,
        key_id: &str,
        counterparty: Counterparty,
    ) -> Result<bool, DerivationError> {
        let signer = self.get_public_key(protocol, key_id, counterparty, false)?;
        Ok(verify_signature(&signer, data, signature)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;

    fn protocol() -> ProtocolId {
        ProtocolId::new(2, "uhrp advertisement")
    }

    #[test]
    fn test_invoice_number_normalizes_name() {
        let protocol = ProtocolId::new(2, "  UHRP Advertisement ");
        assert_eq!(
            invoice_number(&protocol, "1").unwrap(),
            "2-uhrp advertisement-1"
        );
    }

    #[test]
    fn test_invoice_number_rejects_bad_input() {
        assert!(invoice_number(&ProtocolId::new(3, "uhrp advertisement"), "1").is_err());
        assert!(invoice_number(&ProtocolId::new(2, "uhrp"), "1").is_err());
        assert!(invoice_number(&ProtocolId::new(2, "uhrp  advertisement"), "1").is_err());
        assert!(invoice_number(&ProtocolId::new(2, "uhrp-advertisement"), "1").is_err());
        assert!(invoice_number(&ProtocolId::new(2, "uhrp ad protocol"), "1").is_err());
        assert!(invoice_number(&protocol(), "").is_err());
        assert!(invoice_number(&protocol(), &"k".repeat(801)).is_err());
    }

    #[test]
    fn test_both_sides_derive_the_same_child_key() {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();
        let invoice = invoice_number(&protocol(), "1").unwrap();

        let alice_child =
            derive_child_private_key(&alice.secret_key, &bob.public_key, &invoice).unwrap();
        let seen_by_bob =
            derive_child_public_key(&alice.public_key, &bob.secret_key, &invoice).unwrap();

        assert_eq!(KeyPair::from_secret_key(alice_child).public_key, seen_by_bob);
    }

    #[test]
    fn test_anyone_wallet_verifies_signature_for_anyone() {
        let publisher = KeyPair::generate();
        let wallet = ProtoWallet::new(publisher.secret_key);
        let data = b"advertised payload";

        let signature = wallet
            .create_signature(data, &protocol(), "1", Counterparty::Anyone)
            .unwrap();

        let anyone = ProtoWallet::anyone().unwrap();
        let counterparty = Counterparty::Key(publisher.public_key);
        assert!(anyone
            .verify_signature(data, &signature, &protocol(), "1", counterparty)
            .unwrap());
        assert!(!anyone
            .verify_signature(b"tampered", &signature, &protocol(), "1", counterparty)
            .unwrap());
        assert!(!anyone
            .verify_signature(data, &signature, &protocol(), "2", counterparty)
            .unwrap());
    }

    #[test]
    fn test_own_key_matches_what_anyone_derives() {
        let publisher = KeyPair::generate();
        let wallet = ProtoWallet::new(publisher.secret_key);
        let own = wallet
            .get_public_key(&protocol(), "1", Counterparty::Anyone, true)
            .unwrap();

        let anyone = ProtoWallet::anyone().unwrap();
        let derived = anyone
            .get_public_key(&protocol(), "1", Counterparty::Key(publisher.public_key), false)
            .unwrap();

        assert_eq!(own, derived);
        assert_ne!(own, publisher.public_key);
    }
}
