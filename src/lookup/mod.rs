//! UHRP lookup service
//!
//! Tracks live advertisements and answers queries:
//! - Admission, spend and eviction notifications from the host
//! - Exact outpoint queries
//! - Attribute queries by content locator, host identity key and expiry time

pub mod query;
pub mod record;
pub mod service;

pub use query::{AttributeFilter, LookupQuery};
pub use record::{UhrpRecord, UtxoReference};
pub use service::{
    LookupError, OutputAdmittedByTopic, OutputSpent, OverlayEvent, UhrpLookupService,
    ADMISSION_MODE, SPEND_NOTIFICATION_MODE,
};
