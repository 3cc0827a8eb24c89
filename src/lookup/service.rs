//! UHRP lookup service
//!
//! Materialized view of live advertisements. Records are created when the
//! host reports an admitted output and removed when it reports the output
//! spent or evicted; nothing else mutates the index.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use super::query::LookupQuery;
use super::record::{UhrpRecord, UtxoReference};
use crate::core::{Outpoint, Script};
use crate::docs::{ServiceMetadata, LOOKUP_SERVICE_DOCS};
use crate::storage::{RecordStore, StorageError};
use crate::token::{AdvertisementError, AdvertisementFields, PushDropError, PushDropToken};
use crate::topic::UHRP_TOPIC;

/// How admitted outputs are delivered to this service
pub const ADMISSION_MODE: &str = "locking-script";

/// How spends are delivered to this service
pub const SPEND_NOTIFICATION_MODE: &str = "none";

/// Lookup service errors
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    #[error("Admitted output is not a PushDrop token: {0}")]
    Token(#[from] PushDropError),
    #[error("Admitted output has invalid advertisement fields: {0}")]
    Field(#[from] AdvertisementError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

// =============================================================================
// Notifications
// =============================================================================

/// An output was admitted under a topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputAdmittedByTopic {
    pub topic: String,
    pub txid: String,
    pub output_index: u32,
    pub locking_script: Script,
}

/// A previously admitted output was spent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputSpent {
    pub topic: String,
    pub txid: String,
    pub output_index: u32,
}

/// Ledger events delivered by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum OverlayEvent {
    Admitted(OutputAdmittedByTopic),
    Spent(OutputSpent),
    Evicted(Outpoint),
}

// =============================================================================
// Lookup Service
// =============================================================================

/// Advertisement tracker and query endpoint
#[derive(Clone)]
pub struct UhrpLookupService {
    store: Arc<dyn RecordStore>,
}

impl UhrpLookupService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Index an admitted advertisement; other topics are ignored
    pub fn output_admitted_by_topic(
        &self,
        payload: &OutputAdmittedByTopic,
    ) -> Result<(), LookupError> {
        if payload.topic != UHRP_TOPIC {
            return Ok(());
        }

        let token = PushDropToken::decode(&payload.locking_script)?;
        let fields = AdvertisementFields::decode(&token.fields)?;
        let outpoint = Outpoint::new(payload.txid.clone(), payload.output_index);
        let record = UhrpRecord::from_fields(&outpoint, &fields);

        log::debug!("Indexing {} for {}", outpoint, record.uhrp_url);
        self.store.upsert(record)?;
        Ok(())
    }

    /// Drop a spent advertisement; other topics are ignored
    pub fn output_spent(&self, payload: &OutputSpent) -> Result<(), LookupError> {
        if payload.topic != UHRP_TOPIC {
            return Ok(());
        }
        self.remove(&Outpoint::new(payload.txid.clone(), payload.output_index))
    }

    /// Drop an evicted advertisement
    pub fn output_evicted(&self, txid: &str, output_index: u32) -> Result<(), LookupError> {
        self.remove(&Outpoint::new(txid, output_index))
    }

    fn remove(&self, outpoint: &Outpoint) -> Result<(), LookupError> {
        if self.store.delete(outpoint)? {
            log::debug!("Removed {}", outpoint);
        }
        Ok(())
    }

    /// Apply one ledger event
    pub fn handle(&self, event: &OverlayEvent) -> Result<(), LookupError> {
        match event {
            OverlayEvent::Admitted(payload) => self.output_admitted_by_topic(payload),
            OverlayEvent::Spent(payload) => self.output_spent(payload),
            OverlayEvent::Evicted(outpoint) => {
                self.output_evicted(&outpoint.txid, outpoint.output_index)
            }
        }
    }

    /// Answer a JSON query
    pub fn lookup(&self, query: &Value) -> Result<Vec<UtxoReference>, LookupError> {
        let query = LookupQuery::from_value(query)?;
        self.lookup_query(&query)
    }

    /// Answer an already validated query
    pub fn lookup_query(&self, query: &LookupQuery) -> Result<Vec<UtxoReference>, LookupError> {
        let records = match query {
            LookupQuery::Outpoint(outpoint) => {
                self.store.find_by_outpoint(outpoint)?.into_iter().collect()
            }
            LookupQuery::Attributes(filter) => self.store.find(filter)?,
        };
        Ok(records.iter().map(UhrpRecord::reference).collect())
    }

    /// Full record for an outpoint
    pub fn find_record(&self, outpoint: &Outpoint) -> Result<Option<UhrpRecord>, LookupError> {
        Ok(self.store.find_by_outpoint(outpoint)?)
    }

    pub fn documentation(&self) -> &'static str {
        LOOKUP_SERVICE_DOCS
    }

    pub fn metadata(&self) -> ServiceMetadata {
        ServiceMetadata::new(
            "UHRP Lookup Service",
            "Lookup Service for User file hosting commitment tokens",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryRecordStore;
    use crate::test_support::{advertisement_output, publisher};
    use crate::token::uhrp_url_for_hash;
    use serde_json::json;

    fn service() -> (UhrpLookupService, Arc<MemoryRecordStore>) {
        let store = Arc::new(MemoryRecordStore::new());
        (UhrpLookupService::new(store.clone()), store)
    }

    fn admitted(txid: &str, output_index: u32, locking_script: Script) -> OutputAdmittedByTopic {
        OutputAdmittedByTopic {
            topic: UHRP_TOPIC.to_string(),
            txid: txid.to_string(),
            output_index,
            locking_script,
        }
    }

    fn spent(txid: &str, output_index: u32) -> OutputSpent {
        OutputSpent {
            topic: UHRP_TOPIC.to_string(),
            txid: txid.to_string(),
            output_index,
        }
    }

    #[test]
    fn test_admit_lookup_spend() {
        let (service, _) = service();
        let wallet = publisher();
        let output = advertisement_output(&wallet, "https://host/file", 1000, 2048);

        service
            .output_admitted_by_topic(&admitted("abc123", 0, output.locking_script))
            .unwrap();
        assert_eq!(
            service.lookup(&json!({"outpoint": "abc123.0"})).unwrap(),
            vec![Outpoint::new("abc123", 0)]
        );

        service.output_spent(&spent("abc123", 0)).unwrap();
        assert!(service.lookup(&json!({"outpoint": "abc123.0"})).unwrap().is_empty());
    }

    #[test]
    fn test_record_contents() {
        let (service, _) = service();
        let wallet = publisher();
        let output = advertisement_output(&wallet, "https://host/file", 1000, 2048);
        service
            .output_admitted_by_topic(&admitted("abc123", 3, output.locking_script))
            .unwrap();

        let record = service
            .find_record(&Outpoint::new("abc123", 3))
            .unwrap()
            .unwrap();
        let hash = crate::crypto::sha256(b"https://host/file");
        assert_eq!(record.uhrp_url, uhrp_url_for_hash(&hash).unwrap());
        assert_eq!(record.host_identity_key, hex::encode(wallet.identity_key().serialize()));
        assert_eq!(record.hosted_file_location, "https://host/file");
        assert_eq!(record.expiry_time, 1000);
        assert_eq!(record.file_size, 2048);
    }

    #[test]
    fn test_repeated_admission_is_idempotent() {
        let (service, store) = service();
        let wallet = publisher();
        let script = advertisement_output(&wallet, "https://host/file", 1000, 2048).locking_script;

        service.output_admitted_by_topic(&admitted("abc123", 0, script.clone())).unwrap();
        service.output_admitted_by_topic(&admitted("abc123", 0, script)).unwrap();
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_spend_and_evict_of_absent_outpoint_are_noops() {
        let (service, store) = service();
        service.output_spent(&spent("missing", 0)).unwrap();
        service.output_evicted("missing", 0).unwrap();
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_eviction_removes_record() {
        let (service, store) = service();
        let wallet = publisher();
        let script = advertisement_output(&wallet, "https://host/file", 1000, 2048).locking_script;

        service
            .handle(&OverlayEvent::Admitted(admitted("abc123", 1, script)))
            .unwrap();
        service
            .handle(&OverlayEvent::Evicted(Outpoint::new("abc123", 1)))
            .unwrap();
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_other_topics_are_ignored() {
        let (service, store) = service();
        let wallet = publisher();
        let script = advertisement_output(&wallet, "https://host/file", 1000, 2048).locking_script;

        let mut payload = admitted("abc123", 0, script);
        service.output_admitted_by_topic(&payload).unwrap();

        payload.topic = "tm_other".to_string();
        payload.output_index = 1;
        service.output_admitted_by_topic(&payload).unwrap();
        assert_eq!(store.len().unwrap(), 1);

        let mut spend = spent("abc123", 0);
        spend.topic = "tm_other".to_string();
        service.output_spent(&spend).unwrap();
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_attribute_queries() {
        let (service, _) = service();
        let host = publisher();
        let other_host = publisher();
        let host_key = hex::encode(host.identity_key().serialize());

        for (txid, wallet, location) in [
            ("aa", &host, "https://one/file"),
            ("bb", &host, "https://two/file"),
            ("cc", &other_host, "https://one/file"),
        ] {
            let script = advertisement_output(wallet, location, 1000, 2048).locking_script;
            service.output_admitted_by_topic(&admitted(txid, 0, script)).unwrap();
        }

        assert_eq!(
            service.lookup(&json!({"hostIdentityKey": host_key})).unwrap(),
            vec![Outpoint::new("aa", 0), Outpoint::new("bb", 0)]
        );

        let url = uhrp_url_for_hash(&crate::crypto::sha256(b"https://one/file")).unwrap();
        assert_eq!(
            service.lookup(&json!({"uhrpUrl": url})).unwrap(),
            vec![Outpoint::new("aa", 0), Outpoint::new("cc", 0)]
        );
        assert_eq!(
            service
                .lookup(&json!({"uhrpUrl": url, "hostIdentityKey": host_key}))
                .unwrap(),
            vec![Outpoint::new("aa", 0)]
        );
        assert_eq!(service.lookup(&json!({"expiryTime": 1000})).unwrap().len(), 3);
        assert!(service.lookup(&json!({"expiryTime": 999})).unwrap().is_empty());
    }

    #[test]
    fn test_every_supplied_attribute_must_match() {
        let (service, _) = service();
        let wallet = publisher();
        let host_key = hex::encode(wallet.identity_key().serialize());
        let script = advertisement_output(&wallet, "https://host/file", 1000, 2048).locking_script;
        service.output_admitted_by_topic(&admitted("aa", 0, script)).unwrap();

        assert!(service
            .lookup(&json!({"hostIdentityKey": host_key, "fileSize": 1}))
            .unwrap()
            .is_empty());
        assert!(service
            .lookup(&json!({"hostIdentityKey": host_key, "expiryTime": 0}))
            .unwrap()
            .is_empty());
        assert_eq!(
            service
                .lookup(&json!({
                    "hostIdentityKey": host_key,
                    "fileSize": 2048,
                    "hostedFileLocation": "https://host/file",
                    "txid": "aa",
                    "outputIndex": 0
                }))
                .unwrap(),
            vec![Outpoint::new("aa", 0)]
        );
        assert!(matches!(
            service.lookup(&json!({"hostIdentityKey": host_key, "sizeInBytes": 2048})),
            Err(LookupError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_invalid_query_and_undecodable_admission() {
        let (service, store) = service();
        assert!(matches!(
            service.lookup(&json!({})),
            Err(LookupError::InvalidQuery(_))
        ));

        let result =
            service.output_admitted_by_topic(&admitted("abc123", 0, Script::from_bytes(vec![0x6a])));
        assert!(matches!(result, Err(LookupError::Token(_))));
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_metadata() {
        let (service, _) = service();
        assert_eq!(service.metadata().name, "UHRP Lookup Service");
        assert!(service.documentation().contains("uhrpUrl"));
        assert_eq!(ADMISSION_MODE, "locking-script");
        assert_eq!(SPEND_NOTIFICATION_MODE, "none");
    }

    #[test]
    fn test_event_json_shape() {
        let event: OverlayEvent = serde_json::from_value(json!({
            "event": "spent",
            "topic": "tm_uhrp",
            "txid": "abc123",
            "outputIndex": 2
        }))
        .unwrap();
        assert_eq!(event, OverlayEvent::Spent(spent("abc123", 2)));
    }
}
