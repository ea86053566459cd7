//! Clean the public directory

use anyhow::{Context, Result};
use std::fs;

use crate::Folio;

/// Remove everything a build produced
pub fn run(site: &Folio) -> Result<()> {
    if site.public_dir.exists() {
        fs::remove_dir_all(&site.public_dir)
            .with_context(|| format!("Failed to delete {:?}", site.public_dir))?;
        tracing::info!("Deleted: {:?}", site.public_dir);
    } else {
        tracing::debug!("Nothing to clean at {:?}", site.public_dir);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;

    #[test]
    fn test_clean_removes_public_only() {
        let tmp = tempfile::tempdir().unwrap();
        let site = Folio::with_config(tmp.path(), SiteConfig::default());
        fs::create_dir_all(site.public_dir.join("2024")).unwrap();
        fs::create_dir_all(&site.source_dir).unwrap();

        run(&site).unwrap();
        assert!(!site.public_dir.exists());
        assert!(site.source_dir.exists());

        // Second run is a no-op
        run(&site).unwrap();
    }
}
