//! ClusterServiceVersion model and restricted-network predicates.
//!
//! Only the fields read by the checks are modelled; everything else in the
//! document is ignored on decode.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::image_ref::{all_pinned, RelatedImage};

/// Annotation listing the infrastructure features an operator claims to support.
pub const INFRASTRUCTURE_FEATURES_ANNOTATION: &str =
    "operators.openshift.io/infrastructure-features";

/// Feature identifier for restricted-network (disconnected) support.
pub const DISCONNECTED_FEATURE: &str = "disconnected";

/// Prefix of environment variables that pass related images to the controller.
pub const RELATED_IMAGE_ENV_PREFIX: &str = "RELATED_IMAGE_";

/// Kind string of a ClusterServiceVersion document.
pub const CSV_KIND: &str = "ClusterServiceVersion";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterServiceVersion {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: CsvSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvSpec {
    #[serde(default)]
    pub related_images: Vec<RelatedImage>,
    #[serde(default)]
    pub install: InstallStrategy,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstallStrategy {
    #[serde(default)]
    pub strategy: String,
    #[serde(default)]
    pub spec: StrategySpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategySpec {
    #[serde(default)]
    pub deployments: Vec<NamedDeploymentSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedDeploymentSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub spec: DeploymentSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeploymentSpec {
    #[serde(default)]
    pub template: PodTemplateSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PodTemplateSpec {
    #[serde(default)]
    pub spec: PodSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodSpec {
    #[serde(default)]
    pub containers: Vec<Container>,
    #[serde(default)]
    pub init_containers: Vec<Container>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Container {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub env: Vec<EnvVar>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvVar {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub value_from: Option<serde_json::Value>,
}

impl ClusterServiceVersion {
    /// Deployment specs declared by the install strategy, in declaration order.
    pub fn deployment_specs(&self) -> Vec<&DeploymentSpec> {
        self.spec
            .install
            .spec
            .deployments
            .iter()
            .map(|d| &d.spec)
            .collect()
    }

    pub fn infrastructure_features(&self) -> Option<&str> {
        self.metadata
            .annotations
            .get(INFRASTRUCTURE_FEATURES_ANNOTATION)
            .map(String::as_str)
    }
}

impl PodSpec {
    /// Containers followed by init containers.
    pub fn all_containers(&self) -> impl Iterator<Item = &Container> {
        self.containers.iter().chain(self.init_containers.iter())
    }
}

/// Whether the CSV carries the infrastructure-features annotation at all.
pub fn has_infrastructure_features_annotation(csv: &ClusterServiceVersion) -> bool {
    csv.infrastructure_features().is_some()
}

/// Whether the encoded infrastructure-features list contains `disconnected`.
///
/// The annotation is a string-encoded list (JSON or YAML flow syntax). A value
/// that does not decode is treated as not declaring the feature.
pub fn supports_disconnected(infrastructure_features: &str) -> bool {
    let features: Vec<String> = match serde_yaml::from_str(infrastructure_features) {
        Ok(features) => features,
        Err(e) => {
            tracing::debug!(
                error = %e,
                "infrastructure-features annotation did not decode as a list"
            );
            return false;
        }
    };
    features
        .iter()
        .any(|f| f.trim().eq_ignore_ascii_case(DISCONNECTED_FEATURE))
}

pub fn has_related_images(csv: &ClusterServiceVersion) -> bool {
    !csv.spec.related_images.is_empty()
}

pub fn related_images_are_pinned(related_images: &[RelatedImage]) -> bool {
    all_pinned(related_images)
}

/// Names of `RELATED_IMAGE_*` environment variables across every container of
/// every deployment spec.
pub fn related_image_references_in_environment<'a>(
    deployment_specs: impl IntoIterator<Item = &'a DeploymentSpec>,
) -> BTreeSet<String> {
    deployment_specs
        .into_iter()
        .flat_map(|ds| ds.template.spec.all_containers())
        .flat_map(|c| c.env.iter())
        .filter(|env| env.name.starts_with(RELATED_IMAGE_ENV_PREFIX))
        .map(|env| env.name.clone())
        .collect()
}
