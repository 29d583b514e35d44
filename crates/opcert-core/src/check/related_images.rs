//! Completeness of the CSV's related images.
//!
//! Informational only: every image used by the bundle's container specs should
//! be declared in `spec.relatedImages`, but omissions are reported as findings
//! and never fail the bundle.

use async_trait::async_trait;
use tracing::debug;

use crate::bundle::{extract_facts, BundleRef};
use crate::check::{Check, Finding, HelpText, Level, Metadata, Verdict, VerdictStatus};
use crate::obs;

pub(crate) const OPERATOR_REQUIREMENTS_URL: &str = "https://access.redhat.com/documentation/en-us/red_hat_software_certification/8.45/html/red_hat_openshift_software_certification_policy_guide/assembly-products-managed-by-an-operator_openshift-sw-cert-policy-container-images#con-operator-requirements_openshift-sw-cert-policy-products-managed";

#[derive(Debug, Clone, Copy, Default)]
pub struct RelatedImagesCheck;

#[async_trait]
impl Check for RelatedImagesCheck {
    fn name(&self) -> &'static str {
        "AllImageRefsInRelatedImages"
    }

    fn metadata(&self) -> Metadata {
        Metadata {
            description: "Check that all images in the CSV are listed in RelatedImages section. Currently, this check is not enforced.".to_string(),
            level: Level::Optional,
            knowledge_base_url: OPERATOR_REQUIREMENTS_URL.to_string(),
            check_url: OPERATOR_REQUIREMENTS_URL.to_string(),
        }
    }

    async fn validate(&self, bundle: &BundleRef) -> Verdict {
        let facts = match extract_facts(&bundle.fs_path) {
            Ok(facts) => facts,
            Err(e) => return Verdict::error(e, false),
        };

        for image in &facts.related_images {
            debug!(
                name = image.name(),
                digest = image.digest().unwrap_or("none"),
                "declared related image"
            );
        }

        let findings: Vec<Finding> = facts
            .undeclared_images()
            .into_iter()
            .map(|image| {
                let message = format!(
                    "warning: image {image} is not in relatedImages. This will eventually cause this check to fail"
                );
                obs::emit_finding(self.name(), image.as_str(), &message);
                Finding::new(image.as_str(), message)
            })
            .collect();

        Verdict::pass().with_findings(findings)
    }

    fn help(&self, _status: &VerdictStatus) -> HelpText {
        HelpText::new(
            "Check that all images referenced in the CSV are in RelatedImages",
            "Either manually or with a tool, populate the RelatedImages section of the CSV",
        )
    }
}
