//! UHRP topic manager
//!
//! Decides which outputs of a submitted transaction are legitimate UHRP
//! advertisements. Every output is checked on its own; a bad output never
//! prevents its siblings from being admitted.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use super::observer::{AdmissionObserver, LogObserver};
use crate::core::{Outpoint, Transaction, TransactionError, TransactionOutput};
use crate::crypto::{check_linkage, LinkageError};
use crate::docs::{ServiceMetadata, TOPIC_MANAGER_DOCS};
use crate::token::{AdvertisementError, AdvertisementFields, PushDropError, PushDropToken, MIN_TOKEN_FIELDS};

// =============================================================================
// Constants
// =============================================================================

/// Topic name the overlay routes UHRP transactions under
pub const UHRP_TOPIC: &str = "tm_uhrp";

/// Only secure locations may be advertised
pub const REQUIRED_LOCATION_SCHEME: &str = "https";

// =============================================================================
// Errors
// =============================================================================

/// Why an output or transaction was not admitted
#[derive(Error, Debug)]
pub enum AdmissionError {
    #[error("Transaction bundle could not be decoded: {0}")]
    Bundle(#[from] TransactionError),
    #[error("Output is not a PushDrop token: {0}")]
    Token(#[from] PushDropError),
    #[error("UHRP tokens have at least {} fields, got {0}", MIN_TOKEN_FIELDS)]
    TooFewFields(usize),
    #[error("Signature is not properly linked: {0}")]
    Linkage(#[from] LinkageError),
    #[error("Invalid advertisement field: {0}")]
    Field(#[from] AdvertisementError),
    #[error("Hosted file location is not a URL: {0}")]
    InvalidLocation(#[from] url::ParseError),
    #[error("Advertisement must be on HTTPS, got scheme {0:?}")]
    InsecureLocation(String),
    #[error("Invalid expiry time {0}: must be at least 1")]
    InvalidExpiryTime(u64),
    #[error("Invalid file size {0}: must be at least 1")]
    InvalidFileSize(u64),
    #[error("This transaction does not publish a valid UHRP advertisement")]
    NoAdmissibleOutputs,
}

// =============================================================================
// Admittance Instructions
// =============================================================================

/// Outcome of evaluating one transaction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmittanceInstructions {
    /// Indices of outputs to admit, ascending
    pub outputs_to_admit: Vec<u32>,
    /// Previously retained coins to keep
    pub coins_to_retain: Vec<u32>,
}

impl AdmittanceInstructions {
    /// Nothing admitted, nothing retained
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs_to_admit.is_empty() && self.coins_to_retain.is_empty()
    }
}

// =============================================================================
// Topic Manager
// =============================================================================

/// Admission validator for UHRP advertisements
#[derive(Clone)]
pub struct UhrpTopicManager {
    observer: Arc<dyn AdmissionObserver>,
}

impl Default for UhrpTopicManager {
    fn default() -> Self {
        Self::new()
    }
}

impl UhrpTopicManager {
    /// Create a topic manager that reports through the `log` facade
    pub fn new() -> Self {
        Self::with_observer(Arc::new(LogObserver))
    }

    /// Create a topic manager with a custom observer
    pub fn with_observer(observer: Arc<dyn AdmissionObserver>) -> Self {
        Self { observer }
    }

    /// Evaluate a serialized transaction (raw or BEEF)
    ///
    /// Never fails: an undecodable bundle or a transaction without a single
    /// valid advertisement yields [`AdmittanceInstructions::empty`].
    pub fn identify_admissible_outputs(
        &self,
        bundle: &[u8],
        previous_coins: &[u32],
    ) -> AdmittanceInstructions {
        match Transaction::from_bundle(bundle) {
            Ok(tx) => self.identify_admissible_outputs_in(&tx, previous_coins),
            Err(e) => {
                self.observer.transaction_rejected(&AdmissionError::Bundle(e));
                AdmittanceInstructions::empty()
            }
        }
    }

    /// Evaluate an already decoded transaction
    pub fn identify_admissible_outputs_in(
        &self,
        tx: &Transaction,
        previous_coins: &[u32],
    ) -> AdmittanceInstructions {
        match self.classify(tx, previous_coins) {
            Ok(instructions) => instructions,
            Err(e) => {
                self.observer.transaction_rejected(&e);
                AdmittanceInstructions::empty()
            }
        }
    }

    fn classify(
        &self,
        tx: &Transaction,
        previous_coins: &[u32],
    ) -> Result<AdmittanceInstructions, AdmissionError> {
        let txid = tx.txid();
        self.observer.transaction_received(&txid, previous_coins.len());

        let mut outputs_to_admit = Vec::new();
        for (index, output) in tx.outputs.iter().enumerate() {
            let index = index as u32;
            match Self::validate_output(output) {
                Ok(_) => {
                    self.observer.output_admitted(&txid, index);
                    outputs_to_admit.push(index);
                }
                Err(e) => self.observer.output_rejected(&txid, index, &e),
            }
        }

        if outputs_to_admit.is_empty() {
            return Err(AdmissionError::NoAdmissibleOutputs);
        }

        Ok(AdmittanceInstructions {
            outputs_to_admit,
            coins_to_retain: previous_coins.to_vec(),
        })
    }

    /// Run every advertisement check against one output
    pub fn validate_output(
        output: &TransactionOutput,
    ) -> Result<AdvertisementFields, AdmissionError> {
        let token = PushDropToken::decode(&output.locking_script)?;
        if token.fields.len() < MIN_TOKEN_FIELDS {
            return Err(AdmissionError::TooFewFields(token.fields.len()));
        }

        check_linkage(&token.locking_public_key, &token.fields)?;

        // The signature is the last field; everything before it is data
        let data_fields = &token.fields[..token.fields.len() - 1];
        let fields = AdvertisementFields::decode(data_fields)?;

        let location = url::Url::parse(&fields.hosted_file_location)?;
        if location.scheme() != REQUIRED_LOCATION_SCHEME {
            return Err(AdmissionError::InsecureLocation(location.scheme().to_string()));
        }

        if fields.expiry_time < 1 {
            return Err(AdmissionError::InvalidExpiryTime(fields.expiry_time));
        }
        if fields.file_size < 1 {
            return Err(AdmissionError::InvalidFileSize(fields.file_size));
        }

        Ok(fields)
    }

    /// Inputs the host must supply before admission; UHRP needs none
    pub fn identify_needed_inputs(&self, _bundle: &[u8]) -> Vec<Outpoint> {
        Vec::new()
    }

    pub fn documentation(&self) -> &'static str {
        TOPIC_MANAGER_DOCS
    }

    pub fn metadata(&self) -> ServiceMetadata {
        ServiceMetadata::new(
            "Universal Hash Resolution Protocol",
            "Manages UHRP content availability advertisements.",
        )
    }
}
