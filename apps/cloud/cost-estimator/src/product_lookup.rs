//! Disk-backed `ProductLookup` for catalogs past `SPILL_THRESHOLD`, where
//! even the SKU -> product map no longer fits in memory.

use domain_catalog::normalizer::{ProductLookup, RawProduct};
use std::collections::HashMap;

/// Spills the product map to a temporary `sled` database keyed by SKU.
/// Dropped (and its backing directory removed) at the end of the ingest
/// that created it, regardless of outcome.
pub struct SledProductLookup {
    db: sled::Db,
    _dir: tempfile::TempDir,
}

impl SledProductLookup {
    pub fn new() -> std::io::Result<Self> {
        let dir = tempfile::tempdir()?;
        let db = sled::open(dir.path()).map_err(|e| std::io::Error::other(e.to_string()))?;
        Ok(Self { db, _dir: dir })
    }

    pub fn insert(&self, product: &RawProduct) -> std::io::Result<()> {
        let value = serde_json::to_vec(&StoredProduct::from(product)).map_err(std::io::Error::other)?;
        self.db
            .insert(product.sku.as_bytes(), value)
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        Ok(())
    }

    pub fn flush(&self) -> std::io::Result<()> {
        self.db.flush().map_err(|e| std::io::Error::other(e.to_string()))?;
        Ok(())
    }
}

impl ProductLookup for SledProductLookup {
    fn get(&self, sku: &str) -> Option<RawProduct> {
        let bytes = self.db.get(sku.as_bytes()).ok().flatten()?;
        let stored: StoredProduct = serde_json::from_slice(&bytes).ok()?;
        Some(stored.into())
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
struct StoredProduct {
    sku: String,
    product_family: Option<String>,
    attributes: HashMap<String, String>,
}

impl From<&RawProduct> for StoredProduct {
    fn from(p: &RawProduct) -> Self {
        Self {
            sku: p.sku.clone(),
            product_family: p.product_family.clone(),
            attributes: p.attributes.clone(),
        }
    }
}

impl From<StoredProduct> for RawProduct {
    fn from(s: StoredProduct) -> Self {
        RawProduct {
            sku: s.sku,
            product_family: s.product_family,
            attributes: s.attributes,
        }
    }
}
