//! Operator manifest discovery.
//!
//! Walks a bundle's manifest directory and keeps the documents that look like
//! operator manifests (CSVs, CRDs, package manifests). Documents of any other
//! kind are skipped; unreadable or unparsable files fail the whole discovery.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_yaml::Value;
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::csv::{ClusterServiceVersion, CSV_KIND, RELATED_IMAGE_ENV_PREFIX};
use crate::error::{CheckError, Result};
use crate::image_ref::ImageReference;

const MANIFEST_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Kinds recognised as operator manifests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManifestKind {
    ClusterServiceVersion,
    CustomResourceDefinition,
    PackageManifest,
}

impl ManifestKind {
    pub fn from_kind(kind: &str) -> Option<Self> {
        match kind {
            CSV_KIND => Some(Self::ClusterServiceVersion),
            "CustomResourceDefinition" => Some(Self::CustomResourceDefinition),
            "PackageManifest" => Some(Self::PackageManifest),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClusterServiceVersion => CSV_KIND,
            Self::CustomResourceDefinition => "CustomResourceDefinition",
            Self::PackageManifest => "PackageManifest",
        }
    }
}

/// One parsed operator manifest document.
#[derive(Debug, Clone)]
pub struct Manifest {
    /// File the document was read from.
    pub path: PathBuf,
    pub kind: ManifestKind,
    /// Raw structured content.
    pub content: Value,
}

impl Manifest {
    pub fn is_csv(&self) -> bool {
        self.kind == ManifestKind::ClusterServiceVersion
    }

    /// Whether this is a CSV with a non-empty `spec.relatedImages` list.
    pub fn has_related_images(&self) -> bool {
        self.is_csv()
            && self
                .content
                .get("spec")
                .and_then(|spec| spec.get("relatedImages"))
                .and_then(Value::as_sequence)
                .is_some_and(|images| !images.is_empty())
    }

    /// Decode this document into the typed CSV model.
    pub fn to_csv(&self) -> Result<ClusterServiceVersion> {
        serde_yaml::from_value(self.content.clone()).map_err(|e| CheckError::MalformedCsv {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    /// Every image used by a container spec in this document, in document order.
    ///
    /// Covers `containers` and `initContainers` sequences at any depth, the
    /// values of their `RELATED_IMAGE_*` environment variables, and the CSV
    /// `containerImage` annotation.
    pub fn image_references(&self) -> Vec<ImageReference> {
        let mut images = Vec::new();
        if self.is_csv() {
            if let Some(image) = self
                .content
                .get("metadata")
                .and_then(|m| m.get("annotations"))
                .and_then(|a| a.get("containerImage"))
                .and_then(Value::as_str)
            {
                images.push(ImageReference::new(image));
            }
        }
        collect_container_images(&self.content, &mut images);
        images
    }
}

fn collect_container_images(value: &Value, out: &mut Vec<ImageReference>) {
    match value {
        Value::Mapping(map) => {
            for (key, child) in map {
                let is_container_list = matches!(
                    key.as_str(),
                    Some("containers") | Some("initContainers")
                );
                if is_container_list {
                    if let Some(containers) = child.as_sequence() {
                        for container in containers {
                            if let Some(image) = container.get("image").and_then(Value::as_str) {
                                out.push(ImageReference::new(image));
                            }
                            collect_related_image_env(container, out);
                        }
                    }
                }
                collect_container_images(child, out);
            }
        }
        Value::Sequence(items) => {
            for item in items {
                collect_container_images(item, out);
            }
        }
        Value::Tagged(tagged) => collect_container_images(&tagged.value, out),
        _ => {}
    }
}

/// Values of `RELATED_IMAGE_*` variables are pull specs handed to the controller.
fn collect_related_image_env(container: &Value, out: &mut Vec<ImageReference>) {
    let Some(env) = container.get("env").and_then(Value::as_sequence) else {
        return;
    };
    for var in env {
        let is_related_image = var
            .get("name")
            .and_then(Value::as_str)
            .is_some_and(|name| name.starts_with(RELATED_IMAGE_ENV_PREFIX));
        if !is_related_image {
            continue;
        }
        if let Some(value) = var.get("value").and_then(Value::as_str) {
            out.push(ImageReference::new(value));
        }
    }
}

fn has_manifest_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| MANIFEST_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

fn discovery_error(path: &Path, reason: impl ToString) -> CheckError {
    CheckError::ManifestDiscovery {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Parse every document in one file, keeping operator manifests only.
fn parse_manifest_file(path: &Path) -> Result<Vec<Manifest>> {
    let raw = std::fs::read_to_string(path).map_err(|e| discovery_error(path, e))?;

    let mut manifests = Vec::new();
    for document in serde_yaml::Deserializer::from_str(&raw) {
        let content = Value::deserialize(document).map_err(|e| discovery_error(path, e))?;
        if content.is_null() {
            continue;
        }
        let Some(kind) = content
            .get("kind")
            .and_then(Value::as_str)
            .and_then(ManifestKind::from_kind)
        else {
            trace!(path = %path.display(), "skipping non-operator manifest document");
            continue;
        };
        trace!(path = %path.display(), kind = kind.as_str(), "found operator manifest");
        manifests.push(Manifest {
            path: path.to_path_buf(),
            kind,
            content,
        });
    }
    Ok(manifests)
}

/// Discover operator manifests under `manifest_dir`, in file-name order.
pub fn discover_manifests(manifest_dir: &Path) -> Result<Vec<Manifest>> {
    if !manifest_dir.is_dir() {
        return Err(discovery_error(manifest_dir, "not a readable directory"));
    }

    let mut manifests = Vec::new();
    for entry in WalkDir::new(manifest_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| discovery_error(manifest_dir, e))?;
        if !entry.file_type().is_file() || !has_manifest_extension(entry.path()) {
            continue;
        }
        manifests.extend(parse_manifest_file(entry.path())?);
    }

    debug!(
        dir = %manifest_dir.display(),
        count = manifests.len(),
        "discovered operator manifests"
    );
    Ok(manifests)
}
