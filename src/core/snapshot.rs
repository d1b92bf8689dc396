//! core::snapshot
//!
//! Registry snapshot schema (v1).
//!
//! # Schema Design
//!
//! A snapshot is the complete serializable state of the registry:
//! every product (in insertion order) and every edge (in registration
//! order). Like all persisted documents in meshline, it is:
//! - Self-describing with `kind` and `schema_version`
//! - Strictly parsed (unknown fields rejected)
//! - Integrity-checked with a SHA-256 digest over the body
//!
//! The digest turns silent on-disk corruption into a hard
//! [`SnapshotError::DigestMismatch`] at load time, so the engine never
//! starts from an ambiguous data set.
//!
//! # Example
//!
//! ```
//! use meshline::core::snapshot::{parse_snapshot, RegistrySnapshot, SNAPSHOT_KIND};
//!
//! let snapshot = RegistrySnapshot::new(vec![], vec![]).unwrap();
//! assert_eq!(snapshot.kind, SNAPSHOT_KIND);
//!
//! let json = snapshot.to_json().unwrap();
//! let parsed = parse_snapshot(&json).unwrap();
//! assert!(parsed.products.is_empty());
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::lineage::LineageEdge;
use super::product::DataProduct;
use super::types::UtcTimestamp;

/// The kind identifier for registry snapshots.
pub const SNAPSHOT_KIND: &str = "meshline.registry-snapshot";

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Errors from snapshot serialization and parsing.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to parse snapshot: {0}")]
    Parse(String),

    #[error("failed to serialize snapshot: {0}")]
    Serialize(String),

    #[error("invalid kind '{found}', expected '{}'", SNAPSHOT_KIND)]
    InvalidKind { found: String },

    #[error("unsupported schema version {0}, supported: {SCHEMA_VERSION}")]
    UnsupportedVersion(u32),

    #[error("snapshot digest mismatch: expected {expected}, computed {computed}")]
    DigestMismatch { expected: String, computed: String },
}

/// Envelope for version dispatch before full parsing.
#[derive(Debug, Deserialize)]
struct SnapshotEnvelope {
    kind: String,
    schema_version: u32,
}

/// Body view used for digest computation.
///
/// Serialized separately from the envelope so the digest covers exactly
/// the products and edges, independent of `saved_at`.
#[derive(Serialize)]
struct SnapshotBody<'a> {
    products: &'a [DataProduct],
    edges: &'a [LineageEdge],
}

fn body_digest(products: &[DataProduct], edges: &[LineageEdge]) -> Result<String, SnapshotError> {
    let body = serde_json::to_vec(&SnapshotBody { products, edges })
        .map_err(|e| SnapshotError::Serialize(e.to_string()))?;
    let mut hasher = Sha256::new();
    hasher.update(&body);
    Ok(hex::encode(hasher.finalize()))
}

/// A complete registry snapshot (v1).
///
/// Use [`parse_snapshot`] to parse from JSON with kind, version, and
/// digest validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RegistrySnapshot {
    /// Kind identifier (always "meshline.registry-snapshot").
    pub kind: String,

    /// Schema version (always 1 for this struct).
    pub schema_version: u32,

    /// When the snapshot was taken.
    pub saved_at: UtcTimestamp,

    /// SHA-256 over the canonical JSON of `{products, edges}`.
    pub digest: String,

    /// Products in insertion order.
    pub products: Vec<DataProduct>,

    /// Edges in registration order.
    pub edges: Vec<LineageEdge>,
}

impl RegistrySnapshot {
    /// Build a snapshot of the given state, taken now.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Serialize`] if the body cannot be
    /// serialized for digest computation.
    pub fn new(
        products: Vec<DataProduct>,
        edges: Vec<LineageEdge>,
    ) -> Result<Self, SnapshotError> {
        let digest = body_digest(&products, &edges)?;
        Ok(Self {
            kind: SNAPSHOT_KIND.to_string(),
            schema_version: SCHEMA_VERSION,
            saved_at: UtcTimestamp::now(),
            digest,
            products,
            edges,
        })
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string_pretty(self).map_err(|e| SnapshotError::Serialize(e.to_string()))
    }

    /// Verify the stored digest against the body.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::DigestMismatch`] if the body does not
    /// hash to the stored digest.
    pub fn verify_digest(&self) -> Result<(), SnapshotError> {
        let computed = body_digest(&self.products, &self.edges)?;
        if computed != self.digest {
            return Err(SnapshotError::DigestMismatch {
                expected: self.digest.clone(),
                computed,
            });
        }
        Ok(())
    }
}

/// Parse snapshot JSON with version dispatch and integrity checking.
///
/// # Errors
///
/// Returns an error if:
/// - The JSON is malformed
/// - The `kind` field doesn't match [`SNAPSHOT_KIND`]
/// - The `schema_version` is not supported
/// - The stored digest doesn't match the body
pub fn parse_snapshot(json: &str) -> Result<RegistrySnapshot, SnapshotError> {
    let envelope: SnapshotEnvelope =
        serde_json::from_str(json).map_err(|e| SnapshotError::Parse(e.to_string()))?;

    if envelope.kind != SNAPSHOT_KIND {
        return Err(SnapshotError::InvalidKind {
            found: envelope.kind,
        });
    }

    match envelope.schema_version {
        1 => {
            let snapshot: RegistrySnapshot =
                serde_json::from_str(json).map_err(|e| SnapshotError::Parse(e.to_string()))?;
            snapshot.verify_digest()?;
            Ok(snapshot)
        }
        v => Err(SnapshotError::UnsupportedVersion(v)),
    }
}
