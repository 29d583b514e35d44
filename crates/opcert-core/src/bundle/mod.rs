//! Bundle access: manifest discovery and fact extraction.

pub mod manifest;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::csv::ClusterServiceVersion;
use crate::error::{CheckError, Result};
use crate::image_ref::ImageReference;

pub use manifest::{discover_manifests, Manifest, ManifestKind};

/// Directory under the bundle root holding the operator manifests.
pub const MANIFESTS_DIR: &str = "manifests";

/// An unpacked bundle image handed to the checks. Read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleRef {
    /// The image the bundle was extracted from (used for logging only).
    pub image_uri: String,
    /// Root of the extracted filesystem.
    pub fs_path: PathBuf,
}

impl BundleRef {
    pub fn new(image_uri: impl Into<String>, fs_path: impl Into<PathBuf>) -> Self {
        Self {
            image_uri: image_uri.into(),
            fs_path: fs_path.into(),
        }
    }

    pub fn manifests_dir(&self) -> PathBuf {
        self.fs_path.join(MANIFESTS_DIR)
    }
}

/// Facts extracted from a bundle's manifests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleFacts {
    /// Images used by container specs, in discovery order. May repeat.
    pub image_references: Vec<ImageReference>,
    /// Union of `spec.relatedImages[].image` across every CSV.
    pub related_images: BTreeSet<ImageReference>,
}

impl BundleFacts {
    /// Distinct image references that are not declared as related images,
    /// in first-seen order.
    pub fn undeclared_images(&self) -> Vec<&ImageReference> {
        let mut seen = BTreeSet::new();
        self.image_references
            .iter()
            .filter(|image| !self.related_images.contains(*image))
            .filter(|image| seen.insert(*image))
            .collect()
    }
}

/// Extract image references and related images from `bundle_path/manifests`.
///
/// Any discovery or decode failure aborts the whole extraction.
pub fn extract_facts(bundle_path: &Path) -> Result<BundleFacts> {
    let manifests = discover_manifests(&bundle_path.join(MANIFESTS_DIR))?;

    let image_references = manifests
        .iter()
        .flat_map(Manifest::image_references)
        .collect();

    let mut related_images = BTreeSet::new();
    for manifest in manifests.iter().filter(|m| m.has_related_images()) {
        let csv = manifest.to_csv()?;
        related_images.extend(csv.spec.related_images.into_iter().map(|ri| ri.image));
    }

    Ok(BundleFacts {
        image_references,
        related_images,
    })
}

/// Load the single ClusterServiceVersion of a bundle.
pub fn load_csv(bundle_path: &Path) -> Result<ClusterServiceVersion> {
    let manifests_dir = bundle_path.join(MANIFESTS_DIR);
    let manifests = discover_manifests(&manifests_dir)?;
    let csvs: Vec<&Manifest> = manifests.iter().filter(|m| m.is_csv()).collect();
    match csvs.as_slice() {
        [] => Err(CheckError::CsvNotFound(manifests_dir)),
        [csv] => csv.to_csv(),
        _ => Err(CheckError::MultipleCsvs { count: csvs.len() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undeclared_images_dedupes_in_order() {
        let facts = BundleFacts {
            image_references: vec![
                "quay.io/a:1".into(),
                "quay.io/b:1".into(),
                "quay.io/a:1".into(),
                "quay.io/c:1".into(),
            ],
            related_images: [ImageReference::from("quay.io/b:1")].into_iter().collect(),
        };
        let missing: Vec<&str> = facts
            .undeclared_images()
            .into_iter()
            .map(ImageReference::as_str)
            .collect();
        assert_eq!(missing, vec!["quay.io/a:1", "quay.io/c:1"]);
    }

    #[test]
    fn test_bundle_ref_manifests_dir() {
        let bundle = BundleRef::new("quay.io/acme/bundle:v1", "/tmp/bundle");
        assert_eq!(bundle.manifests_dir(), PathBuf::from("/tmp/bundle/manifests"));
    }

    #[test]
    fn test_load_csv_requires_a_csv() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(dir.path().join(MANIFESTS_DIR)).expect("mkdir");
        let err = load_csv(dir.path()).unwrap_err();
        assert!(matches!(err, CheckError::CsvNotFound(_)));
    }

    #[test]
    fn test_load_csv_rejects_multiple() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manifests = dir.path().join(MANIFESTS_DIR);
        std::fs::create_dir(&manifests).expect("mkdir");
        for name in ["a.yaml", "b.yaml"] {
            std::fs::write(manifests.join(name), "kind: ClusterServiceVersion\n").expect("write");
        }
        let err = load_csv(dir.path()).unwrap_err();
        assert!(matches!(err, CheckError::MultipleCsvs { count: 2 }));
    }
}
