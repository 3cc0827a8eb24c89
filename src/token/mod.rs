//! Advertisement tokens
//!
//! Provides the PushDrop token codec and the UHRP advertisement layout on top of it:
//! - Decoding locking scripts into a locking key plus ordered fields
//! - Decoding the five advertisement fields
//! - Content locators (UHRP URLs) for content hashes
//! - Building signed advertisements for a publisher
//!
//! # Example
//!
//! ```rust
//! use uhrp_overlay::crypto::{KeyPair, ProtoWallet};
//! use uhrp_overlay::token::{create_advertisement, AdvertisementFields, PushDropToken};
//!
//! let publisher = ProtoWallet::new(KeyPair::generate().secret_key);
//! let token = create_advertisement(&publisher, &[7u8; 32], "https://host/file", 1000, 2048)
//!     .unwrap();
//!
//! let script = token.encode();
//! let decoded = PushDropToken::decode(&script).unwrap();
//! let fields = AdvertisementFields::decode(&decoded.fields).unwrap();
//! assert_eq!(fields.file_size, 2048);
//! ```

pub mod advertisement;
pub mod pushdrop;

pub use advertisement::{
    create_advertisement, hash_from_uhrp_url, is_valid_uhrp_url, normalize_uhrp_url,
    uhrp_url_for_file, uhrp_url_for_hash, AdvertisementError, AdvertisementFields,
    CONTENT_HASH_LEN, MIN_TOKEN_FIELDS, UHRP_URL_PREFIX,
};
pub use pushdrop::{PushDropError, PushDropToken};
