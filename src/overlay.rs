//! In-process overlay host
//!
//! Wires the topic manager to the lookup service the way a ledger host does:
//! submitted transactions are classified, admitted outputs are indexed and
//! inputs that consume tracked advertisements are reported as spends.

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::core::{Outpoint, Transaction, TransactionError};
use crate::lookup::{
    LookupError, OutputAdmittedByTopic, OutputSpent, UhrpLookupService, UhrpRecord, UtxoReference,
};
use crate::storage::RecordStore;
use crate::topic::{AdmittanceInstructions, UhrpTopicManager, UHRP_TOPIC};

/// Host-level errors
#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("Transaction bundle could not be decoded: {0}")]
    Bundle(#[from] TransactionError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
}

/// What a submission changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOutcome {
    pub txid: String,
    pub instructions: AdmittanceInstructions,
    /// Tracked advertisements consumed by this transaction's inputs
    pub spent: Vec<Outpoint>,
}

/// Topic manager plus lookup service over one record store
#[derive(Clone)]
pub struct UhrpOverlay {
    topic_manager: UhrpTopicManager,
    lookup: UhrpLookupService,
}

impl UhrpOverlay {
    pub fn new(topic_manager: UhrpTopicManager, lookup: UhrpLookupService) -> Self {
        Self {
            topic_manager,
            lookup,
        }
    }

    /// Default topic manager over the given store
    pub fn with_store(store: Arc<dyn RecordStore>) -> Self {
        Self::new(UhrpTopicManager::new(), UhrpLookupService::new(store))
    }

    pub fn topic_manager(&self) -> &UhrpTopicManager {
        &self.topic_manager
    }

    pub fn lookup_service(&self) -> &UhrpLookupService {
        &self.lookup
    }

    /// Submit a serialized transaction (raw or BEEF)
    pub fn submit(&self, bundle: &[u8]) -> Result<SubmitOutcome, OverlayError> {
        let tx = Transaction::from_bundle(bundle)?;
        self.submit_transaction(&tx)
    }

    /// Submit a decoded transaction
    ///
    /// Spends are reported even when nothing new is admitted: spending an
    /// advertisement without replacing it is how it gets revoked. Admissions
    /// are indexed before spends are applied, so a failed submission leaves
    /// the consumed advertisements tracked and can be retried as is.
    pub fn submit_transaction(&self, tx: &Transaction) -> Result<SubmitOutcome, OverlayError> {
        let txid = tx.txid();

        let mut previous_coins = Vec::new();
        let mut spent = Vec::new();
        for (index, input) in tx.inputs.iter().enumerate() {
            let outpoint = Outpoint::new(input.prev_txid.clone(), input.output_index);
            if self.lookup.find_record(&outpoint)?.is_some() {
                previous_coins.push(index as u32);
                spent.push(outpoint);
            }
        }

        let instructions = self
            .topic_manager
            .identify_admissible_outputs_in(tx, &previous_coins);

        for &output_index in &instructions.outputs_to_admit {
            let output = &tx.outputs[output_index as usize];
            self.lookup.output_admitted_by_topic(&OutputAdmittedByTopic {
                topic: UHRP_TOPIC.to_string(),
                txid: txid.clone(),
                output_index,
                locking_script: output.locking_script.clone(),
            })?;
        }

        for outpoint in &spent {
            self.lookup.output_spent(&OutputSpent {
                topic: UHRP_TOPIC.to_string(),
                txid: outpoint.txid.clone(),
                output_index: outpoint.output_index,
            })?;
        }

        log::info!(
            "Submitted {}: {} admitted, {} spent",
            txid,
            instructions.outputs_to_admit.len(),
            spent.len()
        );

        Ok(SubmitOutcome {
            txid,
            instructions,
            spent,
        })
    }

    /// Report a spend that happened outside a submitted transaction
    pub fn spend(&self, outpoint: &Outpoint) -> Result<(), OverlayError> {
        Ok(self.lookup.output_spent(&OutputSpent {
            topic: UHRP_TOPIC.to_string(),
            txid: outpoint.txid.clone(),
            output_index: outpoint.output_index,
        })?)
    }

    /// Report an eviction
    pub fn evict(&self, outpoint: &Outpoint) -> Result<(), OverlayError> {
        Ok(self
            .lookup
            .output_evicted(&outpoint.txid, outpoint.output_index)?)
    }

    pub fn lookup(&self, query: &Value) -> Result<Vec<UtxoReference>, OverlayError> {
        Ok(self.lookup.lookup(query)?)
    }

    pub fn record(&self, outpoint: &Outpoint) -> Result<Option<UhrpRecord>, OverlayError> {
        Ok(self.lookup.find_record(outpoint)?)
    }
}
