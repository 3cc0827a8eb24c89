//! Identity linkage proof for advertisement tokens
//!
//! A token's fields start with the publisher's identity key and end with a
//! signature over every preceding field. The token is linked to that identity
//! when the signature verifies under the identity's derived child key and the
//! output is locked to that same child key.

use secp256k1::PublicKey;
use thiserror::Error;

use super::derivation::{Counterparty, DerivationError, ProtoWallet, ProtocolId};
use super::keys::{public_key_from_slice, public_key_to_hex};

/// Security level of the advertisement protocol
pub const UHRP_SECURITY_LEVEL: u8 = 2;

/// Protocol name of the advertisement protocol
pub const UHRP_PROTOCOL_NAME: &str = "uhrp advertisement";

/// Key ID used for every advertisement
pub const UHRP_KEY_ID: &str = "1";

/// Protocol ID used to sign and lock advertisements
pub fn uhrp_protocol_id() -> ProtocolId {
    ProtocolId::new(UHRP_SECURITY_LEVEL, UHRP_PROTOCOL_NAME)
}

/// Reasons a token fails the linkage proof
#[derive(Error, Debug)]
pub enum LinkageError {
    #[error("Token has no fields")]
    NoFields,
    #[error("Token has a signature but no identity key field")]
    MissingIdentityKey,
    #[error("Claimed identity key is not a valid public key")]
    InvalidIdentityKey,
    #[error("Signature does not verify for the claimed identity")]
    BadSignature,
    #[error("Locking key {actual} does not match expected derived key {expected}")]
    LockingKeyMismatch { expected: String, actual: String },
    #[error("Verification failed: {0}")]
    Verification(#[from] DerivationError),
}

/// Check that `fields` are signed by the claimed identity and that the output
/// is locked to the key derived from that identity
pub fn check_linkage(locking_public_key: &PublicKey, fields: &[Vec<u8>]) -> Result<(), LinkageError> {
    let (signature, payload_fields) = fields.split_last().ok_or(LinkageError::NoFields)?;
    let identity_field = payload_fields
        .first()
        .ok_or(LinkageError::MissingIdentityKey)?;
    let identity_key =
        public_key_from_slice(identity_field).map_err(|_| LinkageError::InvalidIdentityKey)?;

    let data = payload_fields.concat();
    let protocol = uhrp_protocol_id();
    let counterparty = Counterparty::Key(identity_key);
    let anyone = ProtoWallet::anyone()?;

    // A malformed signature counts as a bad one
    let valid = anyone
        .verify_signature(&data, signature, &protocol, UHRP_KEY_ID, counterparty)
        .unwrap_or(false);
    if !valid {
        return Err(LinkageError::BadSignature);
    }

    let expected = anyone.get_public_key(&protocol, UHRP_KEY_ID, counterparty, false)?;
    let expected = public_key_to_hex(&expected);
    let actual = public_key_to_hex(locking_public_key);
    if expected != actual {
        return Err(LinkageError::LockingKeyMismatch { expected, actual });
    }

    Ok(())
}

/// Boolean form of [`check_linkage`]: any failure is a plain rejection
pub fn verify_linkage(locking_public_key: &PublicKey, fields: &[Vec<u8>]) -> bool {
    match check_linkage(locking_public_key, fields) {
        Ok(()) => true,
        Err(e) => {
            log::debug!("Token linkage rejected: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;

    /// Build signed fields and the matching locking key for a publisher
    fn signed_fields(publisher: &KeyPair, extra: &[&[u8]]) -> (PublicKey, Vec<Vec<u8>>) {
        let wallet = ProtoWallet::new(publisher.secret_key);
        let protocol = uhrp_protocol_id();

        let mut fields = vec![publisher.public_key.serialize().to_vec()];
        fields.extend(extra.iter().map(|f| f.to_vec()));

        let signature = wallet
            .create_signature(&fields.concat(), &protocol, UHRP_KEY_ID, Counterparty::Anyone)
            .unwrap();
        fields.push(signature);

        let locking_key = wallet
            .get_public_key(&protocol, UHRP_KEY_ID, Counterparty::Anyone, true)
            .unwrap();
        (locking_key, fields)
    }

    #[test]
    fn test_valid_token_is_linked() {
        let publisher = KeyPair::generate();
        let (locking_key, fields) = signed_fields(&publisher, &[&[1u8; 32], b"https://host/file"]);
        assert!(verify_linkage(&locking_key, &fields));
    }

    #[test]
    fn test_fields_are_not_mutated() {
        let publisher = KeyPair::generate();
        let (locking_key, fields) = signed_fields(&publisher, &[b"a"]);
        let before = fields.clone();
        check_linkage(&locking_key, &fields).unwrap();
        assert_eq!(fields, before);
    }

    #[test]
    fn test_flipped_payload_byte_is_rejected() {
        let publisher = KeyPair::generate();
        let (locking_key, fields) = signed_fields(&publisher, &[&[9u8; 32], b"https://host/file"]);

        for field_index in 0..fields.len() - 1 {
            for byte_index in 0..fields[field_index].len() {
                let mut tampered = fields.clone();
                tampered[field_index][byte_index] ^= 0x01;
                assert!(!verify_linkage(&locking_key, &tampered));
            }
        }
    }

    #[test]
    fn test_substituted_locking_key_is_rejected() {
        let publisher = KeyPair::generate();
        let (_, fields) = signed_fields(&publisher, &[b"payload"]);

        // The identity key itself is not the derived locking key
        assert!(matches!(
            check_linkage(&publisher.public_key, &fields),
            Err(LinkageError::LockingKeyMismatch { .. })
        ));

        let other = KeyPair::generate();
        assert!(!verify_linkage(&other.public_key, &fields));
    }

    #[test]
    fn test_other_identity_cannot_claim_signature() {
        let publisher = KeyPair::generate();
        let impostor = KeyPair::generate();
        let (locking_key, mut fields) = signed_fields(&publisher, &[b"payload"]);

        fields[0] = impostor.public_key.serialize().to_vec();
        assert!(matches!(
            check_linkage(&locking_key, &fields),
            Err(LinkageError::BadSignature)
        ));
    }

    #[test]
    fn test_malformed_inputs_are_rejections() {
        let publisher = KeyPair::generate();
        let (locking_key, fields) = signed_fields(&publisher, &[b"payload"]);

        assert!(matches!(check_linkage(&locking_key, &[]), Err(LinkageError::NoFields)));
        assert!(matches!(
            check_linkage(&locking_key, &fields[2..]),
            Err(LinkageError::MissingIdentityKey)
        ));

        let mut bad_identity = fields.clone();
        bad_identity[0] = b"not a key".to_vec();
        assert!(matches!(
            check_linkage(&locking_key, &bad_identity),
            Err(LinkageError::InvalidIdentityKey)
        ));

        let mut bad_signature = fields.clone();
        *bad_signature.last_mut().unwrap() = vec![0xde, 0xad];
        assert!(!verify_linkage(&locking_key, &bad_signature));
    }
}
