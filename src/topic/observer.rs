//! Observability hooks for admission decisions
//!
//! The topic manager reports every decision to an injected observer.

use super::manager::AdmissionError;

/// Receives admission events from the topic manager
///
/// All methods default to doing nothing.
pub trait AdmissionObserver: Send + Sync {
    /// A transaction is about to be evaluated
    fn transaction_received(&self, _txid: &str, _previous_coins: usize) {}

    /// An output passed every check
    fn output_admitted(&self, _txid: &str, _output_index: u32) {}

    /// An output was rejected; the rest of the transaction is still evaluated
    fn output_rejected(&self, _txid: &str, _output_index: u32, _reason: &AdmissionError) {}

    /// The whole transaction yields no admissions
    fn transaction_rejected(&self, _reason: &AdmissionError) {}
}

/// Observer that writes through the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl AdmissionObserver for LogObserver {
    fn transaction_received(&self, txid: &str, previous_coins: usize) {
        log::debug!("Evaluating {} with {} previous coins", txid, previous_coins);
    }

    fn output_admitted(&self, txid: &str, output_index: u32) {
        log::info!("Admitting UHRP advertisement {}.{}", txid, output_index);
    }

    fn output_rejected(&self, txid: &str, output_index: u32, reason: &AdmissionError) {
        log::warn!("Rejected output {}.{}: {}", txid, output_index, reason);
    }

    fn transaction_rejected(&self, reason: &AdmissionError) {
        log::warn!("Transaction not admitted: {}", reason);
    }
}

/// Observer that discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl AdmissionObserver for NoopObserver {}
