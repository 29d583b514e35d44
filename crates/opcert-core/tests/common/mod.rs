//! Shared bundle fixtures for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use opcert_core::BundleRef;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tempfile::TempDir;

pub const INFRA_ANNOTATION: &str = "operators.openshift.io/infrastructure-features";

/// `sha256:<hex>` digest of `content`.
pub fn digest_of(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("sha256:{}", hex::encode(hasher.finalize()))
}

/// A reference pinned to the digest of its own name.
pub fn pinned(repo: &str) -> String {
    format!("{repo}@{}", digest_of(repo))
}

/// An unpacked bundle under a temporary directory.
pub struct BundleFixture {
    dir: TempDir,
}

impl BundleFixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("manifests")).expect("create manifests dir");
        Self { dir }
    }

    /// A bundle root with no `manifests/` directory.
    pub fn without_manifests() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
        }
    }

    pub fn with_manifest(self, file_name: &str, content: &str) -> Self {
        fs::write(self.dir.path().join("manifests").join(file_name), content)
            .expect("write manifest");
        self
    }

    pub fn with_csv(self, csv: &Value) -> Self {
        self.with_csv_named("operator.clusterserviceversion.yaml", csv)
    }

    pub fn with_csv_named(self, file_name: &str, csv: &Value) -> Self {
        let yaml = serde_yaml::to_string(csv).expect("encode csv");
        self.with_manifest(file_name, &yaml)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn bundle_ref(&self) -> BundleRef {
        BundleRef::new("quay.io/acme/operator-bundle:v0.1.0", self.dir.path())
    }
}

/// Builder for CSV documents.
pub struct CsvBuilder {
    annotations: serde_json::Map<String, Value>,
    related_images: Vec<Value>,
    containers: Vec<Value>,
}

impl CsvBuilder {
    pub fn new() -> Self {
        Self {
            annotations: serde_json::Map::new(),
            related_images: Vec::new(),
            containers: Vec::new(),
        }
    }

    pub fn infrastructure_features(mut self, value: &str) -> Self {
        self.annotations.insert(INFRA_ANNOTATION.to_string(), Value::String(value.to_string()));
        self
    }

    pub fn related_image(mut self, name: &str, image: &str) -> Self {
        self.related_images.push(json!({ "name": name, "image": image }));
        self
    }

    /// A container whose listed env vars all carry its own image.
    pub fn container(self, name: &str, image: &str, env_names: &[&str]) -> Self {
        let env: Vec<(&str, &str)> = env_names.iter().map(|env| (*env, image)).collect();
        self.container_with_env(name, image, &env)
    }

    pub fn container_with_env(mut self, name: &str, image: &str, env: &[(&str, &str)]) -> Self {
        let env: Vec<Value> = env
            .iter()
            .map(|(env, value)| json!({ "name": env, "value": value }))
            .collect();
        self.containers.push(json!({ "name": name, "image": image, "env": env }));
        self
    }

    pub fn build(self) -> Value {
        json!({
            "apiVersion": "operators.coreos.com/v1alpha1",
            "kind": "ClusterServiceVersion",
            "metadata": {
                "name": "acme-operator.v0.1.0",
                "annotations": self.annotations,
            },
            "spec": {
                "relatedImages": self.related_images,
                "install": {
                    "strategy": "deployment",
                    "spec": {
                        "deployments": [{
                            "name": "acme-controller-manager",
                            "spec": {
                                "template": {
                                    "spec": { "containers": self.containers }
                                }
                            }
                        }]
                    }
                }
            }
        })
    }
}
