//! Restricted-network (disconnected) readiness.
//!
//! A CSV is evaluated through a fixed chain of gates and the first one that
//! does not hold decides the verdict. The first two gates decide whether the
//! policy applies at all; the remaining three detect actual violations.

use async_trait::async_trait;
use tracing::info;

use crate::bundle::{load_csv, BundleRef};
use crate::check::related_images::OPERATOR_REQUIREMENTS_URL;
use crate::check::{Check, HelpText, Level, Metadata, Verdict, VerdictStatus};
use crate::csv::{
    has_infrastructure_features_annotation, has_related_images,
    related_image_references_in_environment, related_images_are_pinned, supports_disconnected,
    ClusterServiceVersion,
};

/// The gates of the restricted-network chain, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestrictedNetworkGate {
    InfrastructureFeaturesAnnotation,
    DisconnectedFeature,
    RelatedImagesPresent,
    RelatedImagesPinned,
    RelatedImageEnvironment,
}

impl RestrictedNetworkGate {
    /// Whether failing this gate means the policy does not apply, rather than
    /// that the bundle violates it.
    pub fn is_applicability(&self) -> bool {
        matches!(
            self,
            Self::InfrastructureFeaturesAnnotation | Self::DisconnectedFeature
        )
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::InfrastructureFeaturesAnnotation => "this operator does not have the infrastructure-features annotation. You can safely ignore this if your operator is not intended to be restricted-network aware.",
            Self::DisconnectedFeature => "the infrastructure-features enabled for this operator did not include the \"disconnected\" identifier. You can safely ignore this if your operator is not intended to be restricted-network aware.",
            Self::RelatedImagesPresent => "this operator did not have any related images, and at least one is expected",
            Self::RelatedImagesPinned => "a related image is not pinned to a digest reference of the same image, and this is required.",
            Self::RelatedImageEnvironment => "no environment variables prefixed with \"RELATED_IMAGE_\" were found in your operator's container definitions. These are expected to pass through values into your controller's runtime environment.",
        }
    }
}

/// Run the gate chain, returning the first gate that does not hold.
pub fn first_failing_gate(csv: &ClusterServiceVersion) -> Option<RestrictedNetworkGate> {
    if !has_infrastructure_features_annotation(csv) {
        return Some(RestrictedNetworkGate::InfrastructureFeaturesAnnotation);
    }

    if !supports_disconnected(csv.infrastructure_features().unwrap_or_default()) {
        return Some(RestrictedNetworkGate::DisconnectedFeature);
    }

    // The controller manager itself counts, so at least one is always expected.
    if !has_related_images(csv) {
        return Some(RestrictedNetworkGate::RelatedImagesPresent);
    }

    if !related_images_are_pinned(&csv.spec.related_images) {
        return Some(RestrictedNetworkGate::RelatedImagesPinned);
    }

    if related_image_references_in_environment(csv.deployment_specs()).is_empty() {
        return Some(RestrictedNetworkGate::RelatedImageEnvironment);
    }

    None
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RestrictedNetworkCheck;

impl RestrictedNetworkCheck {
    /// Evaluate an already-loaded CSV.
    pub fn evaluate_csv(&self, csv: &ClusterServiceVersion) -> Verdict {
        match first_failing_gate(csv) {
            None => Verdict::pass(),
            Some(gate) => {
                if gate == RestrictedNetworkGate::RelatedImagesPinned {
                    let unpinned = csv
                        .spec
                        .related_images
                        .iter()
                        .filter(|ri| !ri.image.is_pinned());
                    for related in unpinned {
                        info!(
                            related_image = %related.name,
                            name = related.image.name(),
                            reference = %related.image,
                            "related image is not pinned"
                        );
                    }
                }
                info!(gate = ?gate, "{}", gate.message());
                if gate.is_applicability() {
                    Verdict::not_applicable(gate.message())
                } else {
                    Verdict::fail(gate.message())
                }
            }
        }
    }
}

#[async_trait]
impl Check for RestrictedNetworkCheck {
    fn name(&self) -> &'static str {
        "FollowsRestrictedNetworkEnablementGuidelines"
    }

    fn metadata(&self) -> Metadata {
        Metadata {
            description: "Checks for indicators that this bundle has implemented guidelines to indicate readiness for running in a disconnected cluster, or a cluster with a restricted network.".to_string(),
            // Enforcing this would need a way to recognise related images injected by other means.
            level: Level::Optional,
            knowledge_base_url: OPERATOR_REQUIREMENTS_URL.to_string(),
            check_url: OPERATOR_REQUIREMENTS_URL.to_string(),
        }
    }

    async fn validate(&self, bundle: &BundleRef) -> Verdict {
        match load_csv(&bundle.fs_path) {
            Ok(csv) => self.evaluate_csv(&csv),
            Err(e) => Verdict::error(e, false),
        }
    }

    fn help(&self, _status: &VerdictStatus) -> HelpText {
        HelpText::new(
            "Check for the implementation of guidelines indicating operator readiness for environments with restricted networking.",
            "If consumers of your operator may need to do so on a restricted network, implement the guidelines outlined in OCP documentation for your cluster version, such as https://docs.openshift.com/container-platform/4.11/operators/operator_sdk/osdk-generating-csvs.html#olm-enabling-operator-for-restricted-network_osdk-generating-csvs for OCP 4.11",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv::{
        Container, DeploymentSpec, EnvVar, NamedDeploymentSpec, PodSpec, PodTemplateSpec,
        INFRASTRUCTURE_FEATURES_ANNOTATION,
    };
    use crate::image_ref::RelatedImage;
    use tracing_test::traced_test;

    const PINNED: &str =
        "quay.io/acme/operator@sha256:0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    fn ready_csv() -> ClusterServiceVersion {
        let mut csv = ClusterServiceVersion::default();
        csv.metadata.annotations.insert(
            INFRASTRUCTURE_FEATURES_ANNOTATION.to_string(),
            r#"["disconnected"]"#.to_string(),
        );
        csv.spec.related_images = vec![RelatedImage::new("controller", PINNED)];
        csv.spec.install.spec.deployments = vec![NamedDeploymentSpec {
            name: "acme-controller".to_string(),
            spec: DeploymentSpec {
                template: PodTemplateSpec {
                    spec: PodSpec {
                        containers: vec![Container {
                            name: "manager".to_string(),
                            image: Some(PINNED.to_string()),
                            env: vec![EnvVar {
                                name: "RELATED_IMAGE_CONTROLLER".to_string(),
                                value: Some(PINNED.to_string()),
                                value_from: None,
                            }],
                        }],
                        init_containers: Vec::new(),
                    },
                },
            },
        }];
        csv
    }

    #[test]
    fn test_ready_csv_passes_every_gate() {
        assert_eq!(first_failing_gate(&ready_csv()), None);
        assert!(RestrictedNetworkCheck.evaluate_csv(&ready_csv()).is_passed());
    }

    #[test]
    fn test_gate_order() {
        // Missing everything: the annotation gate reports first.
        assert_eq!(
            first_failing_gate(&ClusterServiceVersion::default()),
            Some(RestrictedNetworkGate::InfrastructureFeaturesAnnotation)
        );

        let mut csv = ready_csv();
        csv.metadata.annotations.insert(
            INFRASTRUCTURE_FEATURES_ANNOTATION.to_string(),
            r#"["proxy-aware"]"#.to_string(),
        );
        csv.spec.related_images.clear();
        assert_eq!(
            first_failing_gate(&csv),
            Some(RestrictedNetworkGate::DisconnectedFeature)
        );

        let mut csv = ready_csv();
        csv.spec.related_images.clear();
        assert_eq!(
            first_failing_gate(&csv),
            Some(RestrictedNetworkGate::RelatedImagesPresent)
        );

        let mut csv = ready_csv();
        csv.spec
            .related_images
            .push(RelatedImage::new("proxy", "quay.io/acme/proxy:latest"));
        csv.spec.install.spec.deployments.clear();
        assert_eq!(
            first_failing_gate(&csv),
            Some(RestrictedNetworkGate::RelatedImagesPinned)
        );

        let mut csv = ready_csv();
        csv.spec.install.spec.deployments.clear();
        assert_eq!(
            first_failing_gate(&csv),
            Some(RestrictedNetworkGate::RelatedImageEnvironment)
        );
    }

    #[test]
    fn test_undecodable_annotation_is_not_applicable() {
        let mut csv = ready_csv();
        csv.metadata.annotations.insert(
            INFRASTRUCTURE_FEATURES_ANNOTATION.to_string(),
            "{not a list".to_string(),
        );
        let verdict = RestrictedNetworkCheck.evaluate_csv(&csv);
        assert!(matches!(verdict.status, VerdictStatus::NotApplicable));
        assert!(!verdict.into_result().expect("no error"));
    }

    #[traced_test]
    #[test]
    fn test_violation_is_failed_and_logged() {
        let mut csv = ready_csv();
        csv.spec.related_images = vec![
            RelatedImage::new("controller", PINNED),
            RelatedImage::new("proxy", "quay.io/acme/proxy:latest"),
        ];
        let verdict = RestrictedNetworkCheck.evaluate_csv(&csv);
        assert!(matches!(verdict.status, VerdictStatus::Failed));
        assert!(verdict
            .reason
            .as_deref()
            .unwrap_or_default()
            .contains("not pinned"));
        assert!(logs_contain("not pinned to a digest"));
        assert!(logs_contain("related image is not pinned"));
        assert!(logs_contain("quay.io/acme/proxy:latest"));
        assert!(!logs_contain("related_image=controller"));
    }

    #[test]
    fn test_applicability_gates() {
        assert!(RestrictedNetworkGate::InfrastructureFeaturesAnnotation.is_applicability());
        assert!(RestrictedNetworkGate::DisconnectedFeature.is_applicability());
        assert!(!RestrictedNetworkGate::RelatedImagesPresent.is_applicability());
        assert!(!RestrictedNetworkGate::RelatedImagesPinned.is_applicability());
        assert!(!RestrictedNetworkGate::RelatedImageEnvironment.is_applicability());
    }
}
