//! CLI commands for the overlay
//!
//! Implements all command handlers for the CLI interface.

use crate::core::Outpoint;
use crate::lookup::{ADMISSION_MODE, SPEND_NOTIFICATION_MODE};
use crate::crypto::{KeyPair, ProtoWallet};
use crate::overlay::UhrpOverlay;
use crate::storage::{JsonFileStore, RecordStore, StoreConfig};
use crate::token::{create_advertisement, uhrp_url_for_hash, CONTENT_HASH_LEN};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Application state
pub struct AppState {
    pub overlay: UhrpOverlay,
    pub store: Arc<JsonFileStore>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Open the record store and wire the overlay over it
    pub fn new(data_dir: PathBuf) -> CliResult<Self> {
        let store_config = StoreConfig {
            data_dir: data_dir.clone(),
            ..Default::default()
        };

        let store = Arc::new(JsonFileStore::open(store_config)?);
        let overlay = UhrpOverlay::with_store(store.clone());

        Ok(Self {
            overlay,
            store,
            data_dir,
        })
    }
}

fn parse_outpoint(outpoint: &str) -> CliResult<Outpoint> {
    Ok(outpoint.parse::<Outpoint>()?)
}

/// Submit a transaction (hex, raw or BEEF)
pub fn cmd_submit(state: &AppState, bundle_hex: &str) -> CliResult<()> {
    let bundle = hex::decode(bundle_hex.trim())?;
    let outcome = state.overlay.submit(&bundle)?;

    println!("📨 Submitted transaction {}", outcome.txid);
    if outcome.instructions.outputs_to_admit.is_empty() {
        println!("   ⚠️  No valid UHRP advertisements in this transaction");
    }
    for index in &outcome.instructions.outputs_to_admit {
        println!("   ✅ Admitted {}.{}", outcome.txid, index);
    }
    for outpoint in &outcome.spent {
        println!("   🗑️  Revoked {}", outpoint);
    }
    println!("\n{}", serde_json::to_string_pretty(&outcome.instructions)?);

    Ok(())
}

/// Report a spent advertisement
pub fn cmd_spend(state: &AppState, outpoint: &str) -> CliResult<()> {
    let outpoint = parse_outpoint(outpoint)?;
    state.overlay.spend(&outpoint)?;
    println!("🗑️  Marked {} as spent", outpoint);
    Ok(())
}

/// Report an evicted advertisement
pub fn cmd_evict(state: &AppState, outpoint: &str) -> CliResult<()> {
    let outpoint = parse_outpoint(outpoint)?;
    state.overlay.evict(&outpoint)?;
    println!("🧹 Evicted {}", outpoint);
    Ok(())
}

/// Run a JSON lookup query
pub fn cmd_lookup(state: &AppState, query: &str) -> CliResult<()> {
    let query: serde_json::Value = serde_json::from_str(query)?;
    let references = state.overlay.lookup(&query)?;
    println!("{}", serde_json::to_string_pretty(&references)?);
    Ok(())
}

/// Show the full record at an outpoint
pub fn cmd_show(state: &AppState, outpoint: &str) -> CliResult<()> {
    let outpoint = parse_outpoint(outpoint)?;

    let Some(record) = state.overlay.record(&outpoint)? else {
        println!("📭 No live advertisement at {}", outpoint);
        return Ok(());
    };

    println!("📄 Advertisement {}", outpoint);
    println!("   ├─ UHRP URL: {}", record.uhrp_url);
    println!("   ├─ Host: {}", record.host_identity_key);
    println!("   ├─ Location: {}", record.hosted_file_location);
    println!("   ├─ Size: {} bytes", record.file_size);
    match record.expiry() {
        Some(expiry) if record.is_expired_at(Utc::now()) => {
            println!("   └─ Expiry: {} (⚠️  expired)", expiry.to_rfc3339())
        }
        Some(expiry) => println!("   └─ Expiry: {}", expiry.to_rfc3339()),
        None => println!("   └─ Expiry: {} (out of range)", record.expiry_time),
    }

    Ok(())
}

/// Build a signed advertisement locking script
pub fn cmd_advertise(
    private_key: &str,
    hash: &str,
    url: &str,
    expiry: u64,
    size: u64,
) -> CliResult<()> {
    let key = KeyPair::from_private_key_hex(private_key)?;
    let wallet = ProtoWallet::new(key.secret_key);

    let hash_bytes = hex::decode(hash)?;
    let content_hash: [u8; CONTENT_HASH_LEN] = hash_bytes
        .as_slice()
        .try_into()
        .map_err(|_| format!("content hash must be {} bytes", CONTENT_HASH_LEN))?;

    let token = create_advertisement(&wallet, &content_hash, url, expiry, size)?;

    println!("📢 Advertisement for {}", uhrp_url_for_hash(&content_hash)?);
    println!("   🔑 Host: {}", key.public_key_hex());
    println!("   🔒 Locking key: {}", hex::encode(token.locking_public_key.serialize()));
    println!("\n{}", token.encode().to_hex());

    Ok(())
}

/// Print documentation and metadata of both services
pub fn cmd_docs(state: &AppState) -> CliResult<()> {
    let topic_manager = state.overlay.topic_manager();
    let lookup = state.overlay.lookup_service();

    println!("{}", serde_json::to_string_pretty(&topic_manager.metadata())?);
    println!("{}", topic_manager.documentation());
    println!("{}", serde_json::to_string_pretty(&lookup.metadata())?);
    println!("   ├─ Admission mode: {}", ADMISSION_MODE);
    println!("   └─ Spend notifications: {}", SPEND_NOTIFICATION_MODE);
    println!("{}", lookup.documentation());

    Ok(())
}

/// Show record store statistics
pub fn cmd_stats(state: &AppState) -> CliResult<()> {
    let stats = state.store.stats()?;
    let expired = state
        .store
        .find(&Default::default())?
        .iter()
        .filter(|r| r.is_expired_at(Utc::now()))
        .count();

    println!("📊 UHRP index at {:?}", state.data_dir);
    println!("   ├─ Live advertisements: {}", stats.record_count);
    println!("   ├─ Past expiry: {}", expired);
    println!("   ├─ File size: {} bytes", stats.file_size);
    println!("   └─ Backups: {}", stats.backup_count);

    Ok(())
}
