//! Lookup queries
//!
//! Clients send JSON. A query either names one outpoint or filters by
//! advertisement attributes; anything else is rejected before the store is
//! consulted.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::record::UhrpRecord;
use super::service::LookupError;
use crate::core::Outpoint;

/// Exact-match filter over advertisement attributes
///
/// Every field that is set must match. `contentLocator` is accepted as an
/// alias of `uhrpUrl`; any other key is rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AttributeFilter {
    #[serde(default, alias = "contentLocator", skip_serializing_if = "Option::is_none")]
    pub uhrp_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_identity_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosted_file_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_index: Option<u32>,
}

impl AttributeFilter {
    pub fn by_uhrp_url(uhrp_url: impl Into<String>) -> Self {
        Self {
            uhrp_url: Some(uhrp_url.into()),
            ..Default::default()
        }
    }

    pub fn by_host(host_identity_key: impl Into<String>) -> Self {
        Self {
            host_identity_key: Some(host_identity_key.into()),
            ..Default::default()
        }
    }

    /// Whether a content locator, expiry time or host is given
    ///
    /// Empty strings and a zero expiry time do not count.
    pub fn has_discriminator(&self) -> bool {
        self.uhrp_url.as_deref().map_or(false, |u| !u.is_empty())
            || self.expiry_time.map_or(false, |e| e != 0)
            || self.host_identity_key.as_deref().map_or(false, |k| !k.is_empty())
    }

    pub fn matches(&self, record: &UhrpRecord) -> bool {
        fn eq<T: PartialEq + ?Sized>(wanted: Option<&T>, actual: &T) -> bool {
            wanted.map_or(true, |w| w == actual)
        }

        eq(self.uhrp_url.as_deref(), record.uhrp_url.as_str())
            && eq(self.expiry_time.as_ref(), &record.expiry_time)
            && eq(self.host_identity_key.as_deref(), record.host_identity_key.as_str())
            && eq(self.hosted_file_location.as_deref(), record.hosted_file_location.as_str())
            && eq(self.file_size.as_ref(), &record.file_size)
            && eq(self.txid.as_deref(), record.txid.as_str())
            && eq(self.output_index.as_ref(), &record.output_index)
    }
}

/// A validated lookup query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupQuery {
    /// Exactly one outpoint
    Outpoint(Outpoint),
    /// All advertisements matching the filter
    Attributes(AttributeFilter),
}

impl LookupQuery {
    /// Validate a JSON query
    ///
    /// A null or empty `outpoint` counts as absent.
    pub fn from_value(query: &Value) -> Result<Self, LookupError> {
        let mut object = query
            .as_object()
            .cloned()
            .ok_or_else(|| LookupError::InvalidQuery("Lookup must include a valid query!".into()))?;

        match object.remove("outpoint") {
            None | Some(Value::Null) => {}
            Some(Value::String(outpoint)) if outpoint.is_empty() => {}
            Some(Value::String(outpoint)) => {
                let outpoint = outpoint.parse::<Outpoint>().map_err(|_| {
                    LookupError::InvalidQuery(format!(
                        "outpoint must be \"<txid>.<outputIndex>\", got {:?}",
                        outpoint
                    ))
                })?;
                return Ok(LookupQuery::Outpoint(outpoint));
            }
            Some(other) => {
                return Err(LookupError::InvalidQuery(format!(
                    "outpoint must be a string, got {}",
                    other
                )))
            }
        }

        let filter: AttributeFilter = serde_json::from_value(Value::Object(object))
            .map_err(|e| LookupError::InvalidQuery(e.to_string()))?;
        if !filter.has_discriminator() {
            return Err(LookupError::InvalidQuery(
                "Lookup must specify either outpoint, or at least one of (uhrpUrl, expiryTime, hostIdentityKey)"
                    .into(),
            ));
        }

        Ok(LookupQuery::Attributes(filter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_outpoint_query() {
        let query = LookupQuery::from_value(&json!({"outpoint": "abc123.0"})).unwrap();
        assert_eq!(query, LookupQuery::Outpoint(Outpoint::new("abc123", 0)));
    }

    #[test]
    fn test_attribute_query() {
        let query = LookupQuery::from_value(&json!({
            "hostIdentityKey": "02ab",
            "expiryTime": 1000,
            "fileSize": 2048
        }))
        .unwrap();
        assert_eq!(
            query,
            LookupQuery::Attributes(AttributeFilter {
                expiry_time: Some(1000),
                host_identity_key: Some("02ab".into()),
                file_size: Some(2048),
                ..Default::default()
            })
        );

        let query = LookupQuery::from_value(&json!({"contentLocator": "XUT"})).unwrap();
        assert_eq!(query, LookupQuery::Attributes(AttributeFilter::by_uhrp_url("XUT")));
    }

    #[test]
    fn test_empty_outpoint_falls_back_to_attributes() {
        let query = LookupQuery::from_value(&json!({"outpoint": "", "hostIdentityKey": "02ab"}))
            .unwrap();
        assert_eq!(query, LookupQuery::Attributes(AttributeFilter::by_host("02ab")));

        let query = LookupQuery::from_value(&json!({"outpoint": null, "uhrpUrl": "XUT"})).unwrap();
        assert_eq!(query, LookupQuery::Attributes(AttributeFilter::by_uhrp_url("XUT")));
    }

    #[test]
    fn test_zero_expiry_filters_alongside_a_host() {
        let query =
            LookupQuery::from_value(&json!({"expiryTime": 0, "hostIdentityKey": "02ab"})).unwrap();
        assert_eq!(
            query,
            LookupQuery::Attributes(AttributeFilter {
                expiry_time: Some(0),
                host_identity_key: Some("02ab".into()),
                ..Default::default()
            })
        );
    }

    #[test]
    fn test_invalid_queries() {
        for query in [
            json!({}),
            json!({"outpoint": null}),
            json!({"outpoint": ""}),
            json!({"unrelated": 1}),
            json!({"hostIdentityKey": "02ab", "unrelated": true}),
            json!({"fileSize": 2048}),
            json!({"expiryTime": 0}),
            json!({"uhrpUrl": ""}),
            json!({"hostIdentityKey": "", "expiryTime": 0, "uhrpUrl": ""}),
            json!("abc123.0"),
            json!(null),
            json!([{"outpoint": "abc123.0"}]),
            json!({"outpoint": "abc123"}),
            json!({"outpoint": "abc123.first"}),
            json!({"outpoint": 5}),
            json!({"expiryTime": "soon"}),
            json!({"uhrpUrl": 12}),
            json!({"hostIdentityKey": "02ab", "fileSize": "big"}),
        ] {
            assert!(
                matches!(LookupQuery::from_value(&query), Err(LookupError::InvalidQuery(_))),
                "accepted {}",
                query
            );
        }
    }

    #[test]
    fn test_filter_matches_all_set_fields() {
        let record = UhrpRecord {
            txid: "t".into(),
            output_index: 0,
            uhrp_url: "u".into(),
            host_identity_key: "k".into(),
            hosted_file_location: "https://h/f".into(),
            expiry_time: 5,
            file_size: 1,
        };
        assert!(AttributeFilter::by_host("k").matches(&record));
        assert!(!AttributeFilter::by_host("other").matches(&record));

        let filter = AttributeFilter {
            uhrp_url: Some("u".into()),
            expiry_time: Some(6),
            ..Default::default()
        };
        assert!(!filter.matches(&record));

        let mut filter = AttributeFilter {
            host_identity_key: Some("k".into()),
            hosted_file_location: Some("https://h/f".into()),
            file_size: Some(1),
            txid: Some("t".into()),
            output_index: Some(0),
            ..Default::default()
        };
        assert!(filter.matches(&record));

        filter.file_size = Some(2);
        assert!(!filter.matches(&record));
    }
}
