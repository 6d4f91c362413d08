//! The datastore handle: an embedded sled database with one tree per
//! collection plus internal index trees.
//!
//! This replaces the source system's module-level connection singleton with
//! an explicit handle whose lifecycle brackets every other operation: open
//! once, pass it around, close at shutdown. All record operations
//! (`records.rs`) and index maintenance (`indexes.rs`) hang off this struct.

mod indexes;
mod records;

pub use indexes::{text_tokens, IndexPlan};
pub use records::kind_in_collection;

use log::info;
use serde_json::Value;
use std::collections::HashMap;

use crate::config::CatalogConfig;
use crate::error::{CatalogError, CatalogResult};
use crate::schema::{schema_registry, SchemaRegistry};

/// Persisted document shape: a flat JSON object keyed by field name.
pub type Document = serde_json::Map<String, Value>;

/// Handle to the underlying store. One per process; all operations borrow
/// it. Dropping (or calling [`Datastore::close`]) flushes and releases the
/// database.
pub struct Datastore {
    db: sled::Db,
    /// Cached collection trees, keyed by collection name.
    trees: HashMap<&'static str, sled::Tree>,
    /// Cached unique-index trees, keyed by collection name.
    unique_trees: HashMap<&'static str, sled::Tree>,
    registry: &'static SchemaRegistry,
}

impl Datastore {
    /// Opens (or creates) the store described by `config` and bootstraps
    /// the collection and index trees for every registered entity type.
    pub fn open(config: &CatalogConfig) -> CatalogResult<Self> {
        let db = if config.temporary {
            sled::Config::new().temporary(true).open()?
        } else {
            sled::open(&config.storage_path)?
        };
        Self::with_db(db)
    }

    pub(crate) fn with_db(db: sled::Db) -> CatalogResult<Self> {
        let registry = schema_registry();
        let mut trees = HashMap::new();
        let mut unique_trees = HashMap::new();

        for plan in IndexPlan::for_registry(registry) {
            info!(
                "bootstrapping collection '{}' ({})",
                plan.collection, plan
            );
            trees.insert(plan.collection, db.open_tree(plan.collection)?);
            if plan.unique {
                unique_trees.insert(
                    plan.collection,
                    db.open_tree(format!("unique_index:{}", plan.collection))?,
                );
            }
        }

        Ok(Self {
            db,
            trees,
            unique_trees,
            registry,
        })
    }

    pub fn registry(&self) -> &'static SchemaRegistry {
        self.registry
    }

    /// Flushes and releases the store. Operations issued after this (via a
    /// clone of the handle's trees) fail at the sled layer.
    pub fn close(self) -> CatalogResult<()> {
        self.db.flush()?;
        info!("datastore closed");
        Ok(())
    }

    pub(crate) fn tree(&self, collection: &str) -> CatalogResult<&sled::Tree> {
        self.trees
            .get(collection)
            .ok_or_else(|| CatalogError::Connectivity(format!("unknown collection '{}'", collection)))
    }

    pub(crate) fn unique_tree(&self, collection: &str) -> CatalogResult<&sled::Tree> {
        self.unique_trees.get(collection).ok_or_else(|| {
            CatalogError::Connectivity(format!("no unique index for collection '{}'", collection))
        })
    }

    /// Reads one document, or `None` if the id is absent.
    pub fn get_document(&self, collection: &str, id: &str) -> CatalogResult<Option<Document>> {
        match self.tree(collection)?.get(id.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Reads one document, failing with `NotFound` if absent.
    pub fn fetch_document(&self, collection: &str, id: &str) -> CatalogResult<Document> {
        self.get_document(collection, id)?
            .ok_or_else(|| CatalogError::not_found(collection, id))
    }

    pub fn exists(&self, collection: &str, id: &str) -> CatalogResult<bool> {
        Ok(self.tree(collection)?.contains_key(id.as_bytes())?)
    }

    pub(crate) fn put_document(
        &self,
        collection: &str,
        id: &str,
        document: &Document,
    ) -> CatalogResult<()> {
        let bytes = serde_json::to_vec(document)?;
        let tree = self.tree(collection)?;
        tree.insert(id.as_bytes(), bytes)?;
        tree.flush()?;
        Ok(())
    }

    pub(crate) fn delete_document(&self, collection: &str, id: &str) -> CatalogResult<bool> {
        let tree = self.tree(collection)?;
        let existed = tree.remove(id.as_bytes())?.is_some();
        tree.flush()?;
        Ok(existed)
    }

    /// Iterates every `(id, document)` pair in a collection, in key order.
    pub fn scan_collection(
        &self,
        collection: &str,
    ) -> CatalogResult<impl Iterator<Item = CatalogResult<(String, Document)>>> {
        let tree = self.tree(collection)?.clone();
        Ok(tree.iter().map(|entry| {
            let (key, value) = entry?;
            let id = String::from_utf8_lossy(&key).to_string();
            let document: Document = serde_json::from_slice(&value)?;
            Ok((id, document))
        }))
    }
}
