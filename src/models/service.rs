//! Service catalog offered in the booking form.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const BUNDLED_CATALOG: &str = include_str!("../../assets/services.json");

/// A bookable service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read service catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid service catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("service catalog is empty")]
    Empty,
}

/// Read-only list of services, loaded once at startup.
#[derive(Debug, Clone)]
pub struct ServiceCatalog {
    services: Vec<Service>,
}

impl ServiceCatalog {
    /// The catalog shipped with the binary.
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::from_json(BUNDLED_CATALOG)
    }

    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let services: Vec<Service> = serde_json::from_str(raw)?;
        if services.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(Self { services })
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    /// Drafts reference services by display name.
    pub fn contains(&self, name: &str) -> bool {
        self.services.iter().any(|s| s.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_catalog_loads() {
        let catalog = ServiceCatalog::bundled().unwrap();
        assert!(!catalog.services().is_empty());
        assert!(catalog.contains("Kineziotaping"));
        assert!(!catalog.contains("kineziotaping"));
    }

    #[test]
    fn test_empty_catalog_rejected() {
        assert!(matches!(
            ServiceCatalog::from_json("[]"),
            Err(CatalogError::Empty)
        ));
    }

    #[test]
    fn test_catalog_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("services.json");
        std::fs::write(&path, r#"[{"id": 9, "name": "Masáž"}]"#).unwrap();

        let catalog = ServiceCatalog::from_file(&path).unwrap();
        assert_eq!(catalog.services()[0].id, 9);
        assert!(catalog.contains("Masáž"));
    }
}
