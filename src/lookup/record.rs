//! Advertisement records kept by the lookup service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::Outpoint;
use crate::token::AdvertisementFields;

/// Query result: the outpoint of a matching advertisement
pub type UtxoReference = Outpoint;

/// One live advertisement, keyed by its outpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UhrpRecord {
    pub txid: String,
    pub output_index: u32,
    /// Content locator of the advertised hash
    pub uhrp_url: String,
    pub host_identity_key: String,
    pub hosted_file_location: String,
    /// Unix seconds; advisory only
    pub expiry_time: u64,
    pub file_size: u64,
}

impl UhrpRecord {
    pub fn from_fields(outpoint: &Outpoint, fields: &AdvertisementFields) -> Self {
        Self {
            txid: outpoint.txid.clone(),
            output_index: outpoint.output_index,
            uhrp_url: fields.uhrp_url(),
            host_identity_key: fields.host_identity_key.clone(),
            hosted_file_location: fields.hosted_file_location.clone(),
            expiry_time: fields.expiry_time,
            file_size: fields.file_size,
        }
    }

    pub fn outpoint(&self) -> Outpoint {
        Outpoint::new(self.txid.clone(), self.output_index)
    }

    pub fn reference(&self) -> UtxoReference {
        self.outpoint()
    }

    /// Expiry as a timestamp, if it fits the calendar
    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.expiry_time)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    /// Whether the host's availability promise has lapsed at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expiry() {
            Some(expiry) => expiry <= now,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(expiry_time: u64) -> UhrpRecord {
        UhrpRecord {
            txid: "ab".repeat(32),
            output_index: 1,
            uhrp_url: "url".to_string(),
            host_identity_key: "02".repeat(33),
            hosted_file_location: "https://host/file".to_string(),
            expiry_time,
            file_size: 2048,
        }
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(record(1000)).unwrap();
        assert_eq!(json["outputIndex"], 1);
        assert_eq!(json["hostIdentityKey"], "02".repeat(33));
        assert_eq!(json["expiryTime"], 1000);
        assert_eq!(
            serde_json::to_value(record(1000).reference()).unwrap(),
            serde_json::json!({"txid": "ab".repeat(32), "outputIndex": 1})
        );
    }

    #[test]
    fn test_expiry_is_advisory() {
        let now = DateTime::from_timestamp(2000, 0).unwrap();
        assert!(record(1000).is_expired_at(now));
        assert!(!record(3000).is_expired_at(now));
        assert!(!record(u64::MAX).is_expired_at(now));
    }
}
