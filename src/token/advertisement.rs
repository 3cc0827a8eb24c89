//! UHRP advertisement tokens
//!
//! An advertisement is a PushDrop token with these fields, in order:
//!
//! | # | Field                | Encoding                    |
//! |---|----------------------|-----------------------------|
//! | 0 | host identity key    | compressed public key       |
//! | 1 | content hash         | 32-byte SHA-256             |
//! | 2 | hosted file location | UTF-8 URL                   |
//! | 3 | expiry time          | VarInt, unix seconds        |
//! | 4 | file size            | VarInt, bytes               |
//! | … | signature            | DER, always the last field  |

use secp256k1::PublicKey;
use thiserror::Error;

use super::pushdrop::PushDropToken;
use crate::core::{decode_var_int, encode_var_int, VarIntError};
use crate::crypto::{
    from_base58_check, sha256, to_base58_check, uhrp_protocol_id, Counterparty,
    DerivationError, ProtoWallet, UHRP_KEY_ID,
};

// =============================================================================
// Constants
// =============================================================================

/// Minimum number of token fields an advertisement must carry
pub const MIN_TOKEN_FIELDS: usize = 5;

/// Length of the advertised content hash
pub const CONTENT_HASH_LEN: usize = 32;

/// Base58Check version prefix of UHRP URLs
pub const UHRP_URL_PREFIX: [u8; 2] = [0xce, 0x00];

pub const FIELD_IDENTITY_KEY: usize = 0;
pub const FIELD_CONTENT_HASH: usize = 1;
pub const FIELD_LOCATION: usize = 2;
pub const FIELD_EXPIRY_TIME: usize = 3;
pub const FIELD_FILE_SIZE: usize = 4;

// =============================================================================
// Errors
// =============================================================================

/// Errors decoding or building advertisement fields
#[derive(Error, Debug)]
pub enum AdvertisementError {
    #[error("Missing {0} field")]
    MissingField(&'static str),
    #[error("Content hash must be {} bytes, got {0}", CONTENT_HASH_LEN)]
    InvalidHashLength(usize),
    #[error("Hosted file location is not valid UTF-8")]
    InvalidLocationEncoding,
    #[error("Invalid {field}: {source}")]
    InvalidVarInt {
        field: &'static str,
        #[source]
        source: VarIntError,
    },
    #[error("Invalid UHRP URL: {0}")]
    InvalidUhrpUrl(String),
    #[error("Signing failed: {0}")]
    Signing(#[from] DerivationError),
}

// =============================================================================
// UHRP URLs
// =============================================================================

/// Content locator for a 32-byte content hash
pub fn uhrp_url_for_hash(hash: &[u8]) -> Result<String, AdvertisementError> {
    if hash.len() != CONTENT_HASH_LEN {
        return Err(AdvertisementError::InvalidHashLength(hash.len()));
    }
    Ok(to_base58_check(hash, &UHRP_URL_PREFIX))
}

/// Content locator for file contents
pub fn uhrp_url_for_file(data: &[u8]) -> String {
    to_base58_check(&sha256(data), &UHRP_URL_PREFIX)
}

/// Strip an optional `uhrp:` / `uhrp://` scheme
pub fn normalize_uhrp_url(url: &str) -> &str {
    let url = url.trim();
    let url = match url.get(..5) {
        Some(scheme) if scheme.eq_ignore_ascii_case("uhrp:") => &url[5..],
        _ => url,
    };
    url.strip_prefix("//").unwrap_or(url)
}

/// Recover the content hash from a content locator
pub fn hash_from_uhrp_url(url: &str) -> Result<[u8; CONTENT_HASH_LEN], AdvertisementError> {
    let normalized = normalize_uhrp_url(url);
    let (prefix, payload) = from_base58_check(normalized, UHRP_URL_PREFIX.len())
        .ok_or_else(|| AdvertisementError::InvalidUhrpUrl("bad encoding or checksum".into()))?;
    if prefix != UHRP_URL_PREFIX {
        return Err(AdvertisementError::InvalidUhrpUrl(format!(
            "bad prefix {}",
            hex::encode(prefix)
        )));
    }
    <[u8; CONTENT_HASH_LEN]>::try_from(payload.as_slice())
        .map_err(|_| AdvertisementError::InvalidHashLength(payload.len()))
}

/// Whether a string is a well-formed content locator
pub fn is_valid_uhrp_url(url: &str) -> bool {
    hash_from_uhrp_url(url).is_ok()
}

// =============================================================================
// Advertisement Fields
// =============================================================================

/// The five data fields of an advertisement, decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertisementFields {
    /// Hex of the identity key field
    pub host_identity_key: String,
    pub content_hash: [u8; CONTENT_HASH_LEN],
    pub hosted_file_location: String,
    pub expiry_time: u64,
    pub file_size: u64,
}

fn field<'a>(fields: &'a [Vec<u8>], index: usize, name: &'static str) -> Result<&'a [u8], AdvertisementError> {
    fields
        .get(index)
        .map(Vec::as_slice)
        .ok_or(AdvertisementError::MissingField(name))
}

fn var_int_field(fields: &[Vec<u8>], index: usize, name: &'static str) -> Result<u64, AdvertisementError> {
    decode_var_int(field(fields, index, name)?)
        .map_err(|source| AdvertisementError::InvalidVarInt { field: name, source })
}

impl AdvertisementFields {
    /// Decode fields 0-4 of a token; any later fields are ignored
    pub fn decode(fields: &[Vec<u8>]) -> Result<Self, AdvertisementError> {
        let host_identity_key = hex::encode(field(fields, FIELD_IDENTITY_KEY, "identity key")?);

        let hash = field(fields, FIELD_CONTENT_HASH, "content hash")?;
        let content_hash = <[u8; CONTENT_HASH_LEN]>::try_from(hash)
            .map_err(|_| AdvertisementError::InvalidHashLength(hash.len()))?;

        let hosted_file_location =
            String::from_utf8(field(fields, FIELD_LOCATION, "location")?.to_vec())
                .map_err(|_| AdvertisementError::InvalidLocationEncoding)?;

        let expiry_time = var_int_field(fields, FIELD_EXPIRY_TIME, "expiry time")?;
        let file_size = var_int_field(fields, FIELD_FILE_SIZE, "file size")?;

        Ok(Self {
            host_identity_key,
            content_hash,
            hosted_file_location,
            expiry_time,
            file_size,
        })
    }

    /// Content locator of the advertised hash
    pub fn uhrp_url(&self) -> String {
        to_base58_check(&self.content_hash, &UHRP_URL_PREFIX)
    }
}

// =============================================================================
// Publishing
// =============================================================================

/// Build a signed advertisement token for the wallet's identity
///
/// The fields are signed with the wallet's child key for "anyone" and the
/// output is locked to that same child key, so any verifier can check the
/// linkage without knowing a secret.
pub fn create_advertisement(
    wallet: &ProtoWallet,
    content_hash: &[u8; CONTENT_HASH_LEN],
    hosted_file_location: &str,
    expiry_time: u64,
    file_size: u64,
) -> Result<PushDropToken, AdvertisementError> {
    let protocol = uhrp_protocol_id();
    let identity_key: PublicKey = wallet.identity_key();

    let mut fields = vec![
        identity_key.serialize().to_vec(),
        content_hash.to_vec(),
        hosted_file_location.as_bytes().to_vec(),
        encode_var_int(expiry_time),
        encode_var_int(file_size),
    ];

    let signature =
        wallet.create_signature(&fields.concat(), &protocol, UHRP_KEY_ID, Counterparty::Anyone)?;
    fields.push(signature);

    let locking_public_key =
        wallet.get_public_key(&protocol, UHRP_KEY_ID, Counterparty::Anyone, true)?;

    Ok(PushDropToken::new(locking_public_key, fields))
}
