//! UHRP Overlay: content availability advertisements for the Universal Hash
//! Resolution Protocol
//!
//! This crate provides:
//! - A topic manager that admits signed advertisement tokens
//! - An identity linkage proof binding each token to its host's identity key
//! - A lookup service indexing live advertisements by outpoint, content
//!   locator, host and expiry
//! - Raw and BEEF transaction decoding
//! - JSON persistence of the advertisement index
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use serde_json::json;
//! use uhrp_overlay::core::{Transaction, TransactionOutput};
//! use uhrp_overlay::crypto::{sha256, KeyPair, ProtoWallet};
//! use uhrp_overlay::storage::MemoryRecordStore;
//! use uhrp_overlay::token::{create_advertisement, uhrp_url_for_hash};
//! use uhrp_overlay::UhrpOverlay;
//!
//! // A host advertises a file it serves
//! let host = ProtoWallet::new(KeyPair::generate().secret_key);
//! let hash: [u8; 32] = sha256(b"hello world").try_into().unwrap();
//! let token = create_advertisement(&host, &hash, "https://cdn.example.com/hello", 1_900_000_000, 11)
//!     .unwrap();
//! let tx = Transaction::with_outputs(vec![TransactionOutput {
//!     satoshis: 1,
//!     locking_script: token.encode(),
//! }]);
//!
//! // The overlay admits it and indexes it
//! let overlay = UhrpOverlay::with_store(Arc::new(MemoryRecordStore::new()));
//! let outcome = overlay.submit(&tx.to_beef()).unwrap();
//! assert_eq!(outcome.instructions.outputs_to_admit, vec![0]);
//!
//! // Clients resolve the content locator
//! let url = uhrp_url_for_hash(&hash).unwrap();
//! let found = overlay.lookup(&json!({ "uhrpUrl": url })).unwrap();
//! assert_eq!(found.len(), 1);
//! ```

pub mod cli;
pub mod core;
pub mod crypto;
pub mod docs;
pub mod lookup;
pub mod overlay;
pub mod storage;
pub mod token;
pub mod topic;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use core::{Outpoint, Script, Transaction};
pub use crypto::{verify_linkage, KeyPair, ProtoWallet};
pub use lookup::{LookupQuery, UhrpLookupService, UhrpRecord};
pub use overlay::{OverlayError, SubmitOutcome, UhrpOverlay};
pub use storage::{JsonFileStore, MemoryRecordStore, RecordStore};
pub use token::{AdvertisementFields, PushDropToken};
pub use topic::{AdmittanceInstructions, UhrpTopicManager, UHRP_TOPIC};
