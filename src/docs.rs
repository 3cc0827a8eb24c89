//! Human-readable documentation and metadata descriptors
//!
//! Both overlay services publish a markdown document and a short metadata
//! record that hosts show to operators and clients.

use serde::{Deserialize, Serialize};

/// Metadata descriptor of an overlay service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceMetadata {
    pub name: String,
    pub short_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub information_url: Option<String>,
}

impl ServiceMetadata {
    pub fn new(name: &str, short_description: &str) -> Self {
        Self {
            name: name.to_string(),
            short_description: short_description.to_string(),
            icon_url: None,
            version: None,
            information_url: None,
        }
    }
}

/// Topic manager documentation
pub const TOPIC_MANAGER_DOCS: &str = "\
# Universal Hash Resolution Protocol Topic Manager Docs

To have outputs accepted into the UHRP overlay network, use the PushDrop template to create \
valid advertisements.

Each advertisement token carries, in order: the host's identity key, the 32-byte SHA-256 hash \
of the file, the HTTPS URL the file is hosted at, the expiry time (VarInt, unix seconds), the \
file size (VarInt, bytes) and finally a signature over all preceding fields. The signature must \
be made under protocol `[2, \"uhrp advertisement\"]` with key ID `1` for counterparty `anyone`, \
and the output must be locked to the matching derived key.

Submit transactions that advertise new files, or revoke (spend) existing advertisements already \
submitted.

The latest state of all advertisements will be tracked, and will be available through the \
corresponding UHRP Lookup Service.
";

/// Lookup service documentation
pub const LOOKUP_SERVICE_DOCS: &str = "\
# UHRP Lookup Service Docs

Resolves UHRP content hashes to the outputs currently advertising them. Each result is an \
outpoint `{ txid, outputIndex }`; fetch the output to read the hosted file location.

Queries are JSON objects of one of two shapes:

- `{ \"outpoint\": \"<txid>.<outputIndex>\" }` returns that advertisement if it is still unspent.
- Any combination of `uhrpUrl`, `hostIdentityKey` and `expiryTime` returns every advertisement \
matching all of the given fields. `hostedFileLocation`, `fileSize`, `txid` and `outputIndex` \
narrow the match further.

A query with no non-empty `uhrpUrl`, `hostIdentityKey` or non-zero `expiryTime` is rejected, \
as is any other field. Advertisements disappear from results once \
their output is spent or evicted; the expiry time is informational and is not enforced.
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_serializes_camel_case() {
        let metadata = ServiceMetadata::new("Name", "Short");
        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json, serde_json::json!({"name": "Name", "shortDescription": "Short"}));
    }
}
