//! UHRP topic manager
//!
//! Admission of transaction outputs into the UHRP topic:
//! - Structural checks on the advertisement token
//! - Identity linkage proof
//! - Field validation (hash length, HTTPS location, expiry and size)
//! - Injectable observers for admission decisions

pub mod manager;
pub mod observer;

pub use manager::{
    AdmissionError, AdmittanceInstructions, UhrpTopicManager, REQUIRED_LOCATION_SCHEME,
    UHRP_TOPIC,
};
pub use observer::{AdmissionObserver, LogObserver, NoopObserver};
