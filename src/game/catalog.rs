//! Weapon catalog - the weapon kinds every team starts with

use std::path::Path;
use std::sync::Arc;

use tracing::{error, info};

use super::weapon::WeaponAsset;

/// Built-in catalog shipped with the crate
pub const BUILTIN_CATALOG: &str = include_str!("../../data/weapons.json");

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read weapon catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("weapon catalog is not a JSON array: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default)]
pub struct WeaponCatalog {
    assets: Vec<Arc<WeaponAsset>>,
}

impl WeaponCatalog {
    /// Parse a JSON array of weapon definitions.
    ///
    /// Entries with an unknown kind or firing type are logged and skipped;
    /// only a document that is not an array fails.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let entries: Vec<serde_json::Value> = serde_json::from_str(json)?;
        let mut assets: Vec<Arc<WeaponAsset>> = Vec::with_capacity(entries.len());

        for (index, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value::<WeaponAsset>(entry) {
                Ok(asset) => {
                    if assets.iter().any(|a| a.name == asset.name) {
                        error!(weapon = %asset.name, "duplicate weapon kind in catalog, skipping");
                        continue;
                    }
                    assets.push(Arc::new(asset));
                }
                Err(e) => {
                    error!(index, error = %e, "not a recognized weapon definition");
                }
            }
        }

        Ok(Self { assets })
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&json)?;
        info!(path = %path.display(), weapons = catalog.len(), "Loaded weapon catalog");
        Ok(catalog)
    }

    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<WeaponAsset>> {
        self.assets.iter().find(|asset| asset.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<WeaponAsset>> {
        self.assets.iter()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::weapon::FiringType;

    #[test]
    fn builtin_catalog_parses_every_entry() {
        let catalog = WeaponCatalog::builtin().unwrap();
        assert!(catalog.len() >= 5);
        assert_eq!(
            catalog.get("Bazooka").unwrap().firing_type,
            FiringType::Charged
        );
    }

    #[test]
    fn unknown_firing_type_is_skipped_not_fatal() {
        let catalog = WeaponCatalog::from_json(
            r#"[
                {"name": "Broken", "model": "x", "firing_type": "sideways",
                 "behavior": {"kind": "melee", "damage": 1.0, "range": 1.0, "knockback": 1.0}},
                {"name": "Mystery", "model": "x", "firing_type": "instant",
                 "behavior": {"kind": "teleporter"}},
                {"name": "Bat", "model": "x", "firing_type": "instant",
                 "behavior": {"kind": "melee", "damage": 20.0, "range": 40.0, "knockback": 600.0}}
            ]"#,
        )
        .unwrap();

        assert_eq!(catalog.len(), 1);
        assert!(catalog.get("Bat").is_some());
    }

    #[test]
    fn non_array_document_is_an_error() {
        assert!(matches!(
            WeaponCatalog::from_json(r#"{"name": "Bat"}"#),
            Err(CatalogError::Parse(_))
        ));
    }
}
