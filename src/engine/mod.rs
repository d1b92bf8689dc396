//! engine
//!
//! The registry engine: the single entry point for collaborators.
//!
//! # Architecture
//!
//! The engine composes the product catalog, the lineage graph, and the
//! snapshot store behind one mutation-serialization point. Collaborators
//! (the CLI today, an HTTP layer tomorrow) never touch the components
//! directly.
//!
//! Lifecycle:
//!
//! 1. **Open**: acquire the store lock, load the persisted snapshot
//!    (absent snapshot = empty registry; corrupt snapshot = fatal)
//! 2. **Serve**: mutations take the write lock; reads take the read lock
//!    and never observe a partially applied mutation
//! 3. **Close**: flush the in-memory snapshot; failures surface
//!
//! # Invariants
//!
//! - All mutations are mutually exclusive with each other and with
//!   snapshot copies (one writer lock)
//! - A snapshot handed to the store is always copied under the same
//!   exclusion as mutations, so a torn state is never serialized
//! - Saves run one at a time, ordered by a per-mutation sequence number
//!   taken under the write lock; an older snapshot never overwrites a
//!   newer one on disk, and the state lock is not held during store I/O
//! - A failed post-mutation flush never rolls back the in-memory
//!   mutation; it is logged and retained as [`RegistryEngine::last_flush_error`]
//! - There is no ambient global engine; callers construct one at process
//!   start and pass it explicitly

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, RwLock};

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

use crate::core::catalog::{CatalogError, ProductCatalog, ProductFilter};
use crate::core::config::{Config, FlushPolicy, Limits};
use crate::core::lineage::{
    EdgeDraft, GraphError, LineageEdge, LineageFilter, LineageGraph, TraversalNode,
};
use crate::core::product::{DataProduct, ProductDraft, ProductPatch};
use crate::core::snapshot::RegistrySnapshot;
use crate::core::types::{Page, ProductName};
use crate::store::{SnapshotStore, StoreError, StoreLock};

/// Errors from engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Catalog operation rejected.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Graph operation rejected.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A writer panicked while holding the state lock.
    #[error("registry state lock poisoned")]
    Poisoned,
}

/// In-memory registry state guarded by the engine's lock.
#[derive(Debug)]
struct RegistryState {
    catalog: ProductCatalog,
    graph: LineageGraph,
    /// Bumped on every accepted mutation, under the write lock.
    /// Snapshots carry the sequence they were copied at so the flush
    /// path can apply them in mutation order.
    seq: u64,
}

/// Bookkeeping for the serialized flush path.
#[derive(Debug)]
struct FlushState {
    /// Sequence of the last snapshot that reached the disk; `None`
    /// until the first successful save of this engine's lifetime.
    /// A loaded snapshot counts as sequence 0.
    saved_seq: Option<u64>,
    /// Most recent flush failure, cleared by the next successful save.
    last_error: Option<String>,
}

/// Registered product and edge counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegistryCounts {
    pub products: usize,
    pub edges: usize,
}

/// Aggregate statistics over the lineage graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineageStats {
    /// Total number of edges.
    pub total_entries: usize,
    /// Number of distinct source names.
    pub unique_sources: usize,
    /// Number of distinct target names.
    pub unique_targets: usize,
    /// Edge counts grouped by lineage type.
    pub by_type: BTreeMap<String, usize>,
    /// Mean confidence across all edges; `None` when the graph is empty.
    pub mean_confidence: Option<f64>,
}

/// The registry engine.
///
/// # Example
///
/// ```no_run
/// use meshline::core::config::Config;
/// use meshline::core::product::ProductDraft;
/// use meshline::core::types::ProductName;
/// use meshline::engine::RegistryEngine;
///
/// let config = Config::load()?;
/// let engine = RegistryEngine::open(&config)?;
///
/// let draft = ProductDraft::new(
///     ProductName::new("orders")?,
///     "sales",
///     "sales-team@example.com",
///     "Raw sales orders",
/// );
/// let product = engine.register_product(draft)?;
/// println!("registered {}", product.name);
///
/// engine.close()?;
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug)]
pub struct RegistryEngine {
    state: RwLock<RegistryState>,
    store: SnapshotStore,
    limits: Limits,
    flush_policy: FlushPolicy,
    /// Serializes saves; mutations release the state lock before
    /// queueing on this one, so store I/O never blocks readers.
    flush: Mutex<FlushState>,
    /// Held for the engine's lifetime; released on drop.
    _lock: StoreLock,
}

impl RegistryEngine {
    /// Open the engine over the configured store.
    ///
    /// Acquires the exclusive store lock, then loads the persisted
    /// snapshot. A missing snapshot yields an empty registry.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Lock`] if another process owns the store
    /// - [`StoreError::Corrupt`] if a snapshot exists but is unreadable;
    ///   the engine refuses to start rather than losing data silently
    pub fn open(config: &Config) -> Result<Self, EngineError> {
        let data_dir = config.data_dir();
        let lock = StoreLock::acquire(&data_dir).map_err(StoreError::from)?;
        let store = SnapshotStore::new(&data_dir);
        let limits = config.limits();

        let mut catalog = ProductCatalog::with_capacity_limit(limits.max_products);
        let mut graph = LineageGraph::with_capacity_limit(limits.max_lineage_entries);

        let saved_seq = match store.load()? {
            Some(snapshot) => {
                info!(
                    products = snapshot.products.len(),
                    edges = snapshot.edges.len(),
                    "restoring registry from snapshot"
                );
                catalog.restore(snapshot.products);
                graph.restore(snapshot.edges);
                Some(0)
            }
            None => {
                info!(data_dir = %data_dir.display(), "starting with empty registry");
                None
            }
        };

        Ok(Self {
            state: RwLock::new(RegistryState {
                catalog,
                graph,
                seq: 0,
            }),
            store,
            limits,
            flush_policy: config.flush_policy(),
            flush: Mutex::new(FlushState {
                saved_seq,
                last_error: None,
            }),
            _lock: lock,
        })
    }

    // =========================================================================
    // Product operations
    // =========================================================================

    /// Register a new product.
    pub fn register_product(&self, draft: ProductDraft) -> Result<DataProduct, EngineError> {
        let (product, snapshot, seq) = {
            let mut state = self.state.write().map_err(|_| EngineError::Poisoned)?;
            let product = state.catalog.create(draft)?.clone();
            info!(name = %product.name, domain = %product.domain, "registered product");
            let (snapshot, seq) = self.snapshot_after_mutation(&mut state)?;
            (product, snapshot, seq)
        };
        self.flush_after_mutation(snapshot, seq);
        Ok(product)
    }

    /// Apply a partial update to a product.
    pub fn update_product(
        &self,
        name: &ProductName,
        patch: ProductPatch,
    ) -> Result<DataProduct, EngineError> {
        let (product, snapshot, seq) = {
            let mut state = self.state.write().map_err(|_| EngineError::Poisoned)?;
            let product = state.catalog.update(name, patch)?.clone();
            info!(name = %product.name, "updated product");
            let (snapshot, seq) = self.snapshot_after_mutation(&mut state)?;
            (product, snapshot, seq)
        };
        self.flush_after_mutation(snapshot, seq);
        Ok(product)
    }

    /// Delete a product.
    ///
    /// Lineage edges referencing the name are left in place as dangling
    /// references.
    pub fn delete_product(&self, name: &ProductName) -> Result<DataProduct, EngineError> {
        let (product, snapshot, seq) = {
            let mut state = self.state.write().map_err(|_| EngineError::Poisoned)?;
            let product = state.catalog.delete(name)?;
            info!(name = %product.name, "deleted product");
            let (snapshot, seq) = self.snapshot_after_mutation(&mut state)?;
            (product, snapshot, seq)
        };
        self.flush_after_mutation(snapshot, seq);
        Ok(product)
    }

    /// Look up a product by name.
    pub fn get_product(&self, name: &ProductName) -> Result<DataProduct, EngineError> {
        let state = self.state.read().map_err(|_| EngineError::Poisoned)?;
        Ok(state.catalog.get(name)?.clone())
    }

    /// List products matching `filter`, in insertion order.
    ///
    /// The page limit is clamped to the configured maximum page size.
    pub fn list_products(
        &self,
        filter: &ProductFilter,
        page: Page,
    ) -> Result<Vec<DataProduct>, EngineError> {
        let page = page.clamped(self.limits.max_page_size);
        let state = self.state.read().map_err(|_| EngineError::Poisoned)?;
        Ok(state
            .catalog
            .list(filter, page)
            .into_iter()
            .cloned()
            .collect())
    }

    // =========================================================================
    // Lineage operations
    // =========================================================================

    /// Register a new lineage edge.
    ///
    /// Neither endpoint has to exist in the catalog: lineage may be
    /// declared ahead of formal registration.
    pub fn register_lineage(&self, draft: EdgeDraft) -> Result<LineageEdge, EngineError> {
        let (edge, snapshot, seq) = {
            let mut state = self.state.write().map_err(|_| EngineError::Poisoned)?;
            let edge = state.graph.add_edge(draft)?.clone();
            info!(source = %edge.source, target = %edge.target, "registered lineage");
            let (snapshot, seq) = self.snapshot_after_mutation(&mut state)?;
            (edge, snapshot, seq)
        };
        self.flush_after_mutation(snapshot, seq);
        Ok(edge)
    }

    /// Query edges matching `filter`, in registration order.
    ///
    /// The page limit is clamped to the configured maximum page size.
    pub fn query_lineage(
        &self,
        filter: &LineageFilter,
        page: Page,
    ) -> Result<Vec<LineageEdge>, EngineError> {
        let page = page.clamped(self.limits.max_page_size);
        let state = self.state.read().map_err(|_| EngineError::Poisoned)?;
        Ok(state
            .graph
            .query(filter, page)
            .into_iter()
            .cloned()
            .collect())
    }

    /// All products transitively feeding into `name`.
    pub fn upstream(
        &self,
        name: &ProductName,
        max_depth: Option<usize>,
    ) -> Result<Vec<TraversalNode>, EngineError> {
        let state = self.state.read().map_err(|_| EngineError::Poisoned)?;
        Ok(state.graph.upstream(name, max_depth))
    }

    /// All products transitively derived from `name`.
    pub fn downstream(
        &self,
        name: &ProductName,
        max_depth: Option<usize>,
    ) -> Result<Vec<TraversalNode>, EngineError> {
        let state = self.state.read().map_err(|_| EngineError::Poisoned)?;
        Ok(state.graph.downstream(name, max_depth))
    }

    // =========================================================================
    // Analytics
    // =========================================================================

    /// Product counts grouped by domain.
    pub fn domain_distribution(&self) -> Result<BTreeMap<String, usize>, EngineError> {
        let state = self.state.read().map_err(|_| EngineError::Poisoned)?;
        let mut counts = BTreeMap::new();
        for product in state.catalog.iter() {
            *counts.entry(product.domain.clone()).or_insert(0) += 1;
        }
        Ok(counts)
    }

    /// Aggregate edge statistics.
    pub fn lineage_stats(&self) -> Result<LineageStats, EngineError> {
        let state = self.state.read().map_err(|_| EngineError::Poisoned)?;

        let mut sources: HashSet<&ProductName> = HashSet::new();
        let mut targets: HashSet<&ProductName> = HashSet::new();
        let mut by_type: BTreeMap<String, usize> = BTreeMap::new();
        let mut confidence_sum = 0.0;
        let mut total = 0usize;

        for edge in state.graph.iter() {
            sources.insert(&edge.source);
            targets.insert(&edge.target);
            *by_type.entry(edge.lineage_type.to_string()).or_insert(0) += 1;
            confidence_sum += edge.confidence.value();
            total += 1;
        }

        Ok(LineageStats {
            total_entries: total,
            unique_sources: sources.len(),
            unique_targets: targets.len(),
            by_type,
            mean_confidence: (total > 0).then(|| confidence_sum / total as f64),
        })
    }

    /// Registered product and edge counts.
    pub fn counts(&self) -> Result<RegistryCounts, EngineError> {
        let state = self.state.read().map_err(|_| EngineError::Poisoned)?;
        Ok(RegistryCounts {
            products: state.catalog.len(),
            edges: state.graph.len(),
        })
    }

    // =========================================================================
    // Persistence lifecycle
    // =========================================================================

    /// Take a consistent snapshot of the current state.
    ///
    /// The copy is made under the read lock, so it is always either
    /// entirely before or entirely after any concurrent mutation.
    pub fn snapshot(&self) -> Result<RegistrySnapshot, EngineError> {
        let state = self.state.read().map_err(|_| EngineError::Poisoned)?;
        self.build_snapshot(&state)
    }

    /// Flush the current state to the store.
    ///
    /// A no-op when the snapshot on disk is already current. Exposed so
    /// a supervisor can drive periodic persistence; the engine itself
    /// schedules nothing.
    pub fn flush(&self) -> Result<(), EngineError> {
        let (snapshot, seq) = {
            let state = self.state.read().map_err(|_| EngineError::Poisoned)?;
            (self.build_snapshot(&state)?, state.seq)
        };
        self.save_in_order(&snapshot, seq)
    }

    /// Flush and consume the engine.
    ///
    /// The store lock is released on return. Flush failure is an error,
    /// not a silent shutdown.
    pub fn close(self) -> Result<(), EngineError> {
        info!("flushing registry on shutdown");
        self.flush()
    }

    /// The most recent post-mutation flush failure, if any.
    ///
    /// Cleared by the next successful flush. Collaborators surface this
    /// so operators learn the in-memory state is ahead of the store.
    pub fn last_flush_error(&self) -> Option<String> {
        self.flush
            .lock()
            .ok()
            .and_then(|guard| guard.last_error.clone())
    }

    /// Build a snapshot from already-locked state.
    fn build_snapshot(&self, state: &RegistryState) -> Result<RegistrySnapshot, EngineError> {
        Ok(RegistrySnapshot::new(
            state.catalog.to_vec(),
            state.graph.to_vec(),
        )
        .map_err(StoreError::from)?)
    }

    /// Bump the mutation sequence and copy the state, under the write lock.
    fn snapshot_after_mutation(
        &self,
        state: &mut RegistryState,
    ) -> Result<(RegistrySnapshot, u64), EngineError> {
        state.seq += 1;
        Ok((self.build_snapshot(state)?, state.seq))
    }

    /// Persist after a mutation per the flush policy.
    ///
    /// The mutation already happened and stands regardless of the
    /// outcome here; a failure is recorded, never propagated.
    fn flush_after_mutation(&self, snapshot: RegistrySnapshot, seq: u64) {
        if self.flush_policy != FlushPolicy::Immediate {
            return;
        }
        if let Err(e) = self.save_in_order(&snapshot, seq) {
            error!(error = %e, "post-mutation flush failed; in-memory state is ahead of the store");
        }
    }

    /// Save a snapshot unless the disk already holds a newer one.
    ///
    /// Every save in the process funnels through the flush lock, so
    /// saves never race each other on the store's temp file; the
    /// sequence check keeps a slow older flush from clobbering a faster
    /// newer one once both are queued.
    fn save_in_order(&self, snapshot: &RegistrySnapshot, seq: u64) -> Result<(), EngineError> {
        let mut flush = self.flush.lock().map_err(|_| EngineError::Poisoned)?;
        if flush.saved_seq.is_some_and(|saved| saved >= seq) {
            return Ok(());
        }
        match self.store.save(snapshot) {
            Ok(()) => {
                flush.saved_seq = Some(seq);
                flush.last_error = None;
                Ok(())
            }
            Err(e) => {
                flush.last_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }
}
