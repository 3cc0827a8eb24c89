//! Shared fixtures for unit tests

use parking_lot::Mutex;

use crate::core::TransactionOutput;
use crate::crypto::{KeyPair, ProtoWallet};
use crate::token::create_advertisement;
use crate::topic::{AdmissionError, AdmissionObserver};

/// A publisher wallet with a fresh identity
pub fn publisher() -> ProtoWallet {
    ProtoWallet::new(KeyPair::generate().secret_key)
}

/// A one-satoshi output carrying a signed advertisement
pub fn advertisement_output(
    wallet: &ProtoWallet,
    location: &str,
    expiry_time: u64,
    file_size: u64,
) -> TransactionOutput {
    let hash = crate::crypto::sha256(location.as_bytes());
    let mut content_hash = [0u8; 32];
    content_hash.copy_from_slice(&hash);

    let token = create_advertisement(wallet, &content_hash, location, expiry_time, file_size)
        .expect("advertisement fixture");
    TransactionOutput {
        satoshis: 1,
        locking_script: token.encode(),
    }
}

/// Observer that remembers what it saw
#[derive(Default)]
pub struct RecordingObserver {
    admitted: Mutex<Vec<u32>>,
    rejected: Mutex<Vec<u32>>,
    transactions: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn admitted(&self) -> Vec<u32> {
        self.admitted.lock().clone()
    }

    pub fn rejected_outputs(&self) -> Vec<u32> {
        self.rejected.lock().clone()
    }

    pub fn transaction_rejections(&self) -> Vec<String> {
        self.transactions.lock().clone()
    }
}

impl AdmissionObserver for RecordingObserver {
    fn output_admitted(&self, _txid: &str, output_index: u32) {
        self.admitted.lock().push(output_index);
    }

    fn output_rejected(&self, _txid: &str, output_index: u32, _reason: &AdmissionError) {
        self.rejected.lock().push(output_index);
    }

    fn transaction_rejected(&self, reason: &AdmissionError) {
        self.transactions.lock().push(reason.to_string());
    }
}
