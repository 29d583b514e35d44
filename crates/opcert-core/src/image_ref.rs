//! Image references and digest pinning.
//!
//! A reference is pinned when it names its image by content digest
//! (`registry/repo@sha256:<64 lowercase hex>`) instead of a mutable tag.
//! The check is purely syntactic; no registry is contacted.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// The only digest algorithm accepted for pinned references.
pub const DIGEST_ALGORITHM: &str = "sha256";

fn pinned_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let pattern = format!(r"^[^@\s]+@{DIGEST_ALGORITHM}:[a-f0-9]{{64}}$");
        Regex::new(&pattern).expect("pinned reference pattern is valid")
    })
}

/// An opaque container image reference.
///
/// Equality is exact string equality; no normalization is performed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageReference(String);

impl ImageReference {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this reference uses digest syntax with a valid sha256 digest.
    pub fn is_pinned(&self) -> bool {
        pinned_pattern().is_match(&self.0)
    }

    /// The `sha256:<hex>` digest, when the reference is pinned.
    pub fn digest(&self) -> Option<&str> {
        if !self.is_pinned() {
            return None;
        }
        self.0.split_once('@').map(|(_, digest)| digest)
    }

    /// The reference with any digest or tag stripped.
    pub fn name(&self) -> &str {
        if let Some((name, _)) = self.0.split_once('@') {
            return name;
        }
        // A ':' after the last '/' is a tag separator; earlier ones belong to a registry port.
        let last_segment = self.0.rfind('/').map(|i| i + 1).unwrap_or(0);
        match self.0[last_segment..].rfind(':') {
            Some(i) => &self.0[..last_segment + i],
            None => &self.0,
        }
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageReference {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ImageReference {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A `(name, image)` entry from a ClusterServiceVersion's `spec.relatedImages`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedImage {
    #[serde(default)]
    pub name: String,
    pub image: ImageReference,
}

impl RelatedImage {
    pub fn new(name: impl Into<String>, image: impl Into<ImageReference>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
        }
    }
}

/// True when every related image is pinned by digest. An empty list is vacuously pinned.
pub fn all_pinned(related_images: &[RelatedImage]) -> bool {
    related_images.iter().all(|ri| ri.image.is_pinned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIGEST: &str = "sha256:0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    #[test]
    fn test_digest_reference_is_pinned() {
        let r = ImageReference::new(format!("quay.io/acme/operator@{DIGEST}"));
        assert!(r.is_pinned());
        assert_eq!(r.digest(), Some(DIGEST));
        assert!(DIGEST.starts_with(DIGEST_ALGORITHM));
        assert_eq!(r.name(), "quay.io/acme/operator");
    }

    #[test]
    fn test_tag_reference_is_not_pinned() {
        let r = ImageReference::new("quay.io/acme/operator:v1.2.3");
        assert!(!r.is_pinned());
        assert_eq!(r.digest(), None);
        assert_eq!(r.name(), "quay.io/acme/operator");
    }

    #[test]
    fn test_registry_port_is_not_a_tag() {
        let r = ImageReference::new("registry.local:5000/acme/operator");
        assert_eq!(r.name(), "registry.local:5000/acme/operator");
        assert!(!r.is_pinned());
    }

    #[test]
    fn test_malformed_digests_are_not_pinned() {
        let uppercase = ImageReference::new(format!(
            "quay.io/acme/op@{}",
            DIGEST.to_uppercase().replace("SHA256", "sha256")
        ));
        assert!(!uppercase.is_pinned());

        let short = ImageReference::new("quay.io/acme/op@sha256:abc123");
        assert!(!short.is_pinned());

        let wrong_algorithm = ImageReference::new(format!(
            "quay.io/acme/op@sha512:{}",
            &DIGEST["sha256:".len()..]
        ));
        assert!(!wrong_algorithm.is_pinned());

        let no_name = ImageReference::new(format!("@{DIGEST}"));
        assert!(!no_name.is_pinned());

        let tag_and_digest_suffix = ImageReference::new(format!("quay.io/acme/op@{DIGEST}:latest"));
        assert!(!tag_and_digest_suffix.is_pinned());
    }

    #[test]
    fn test_tag_and_digest_together_is_pinned() {
        let r = ImageReference::new(format!("quay.io/acme/op:v1@{DIGEST}"));
        assert!(r.is_pinned());
    }

    #[test]
    fn test_all_pinned() {
        assert!(all_pinned(&[]));

        let pinned = RelatedImage::new("controller", format!("quay.io/acme/op@{DIGEST}"));
        let tagged = RelatedImage::new("proxy", "quay.io/acme/proxy:latest");

        assert!(all_pinned(&[pinned.clone()]));
        assert!(!all_pinned(&[pinned.clone(), tagged.clone()]));
        assert!(!all_pinned(&[tagged, pinned]));
    }

    #[test]
    fn test_related_image_deserializes_without_name() {
        let ri: RelatedImage =
            serde_json::from_str(r#"{"image": "quay.io/acme/op:1"}"#).expect("decode");
        assert_eq!(ri.name, "");
        assert_eq!(ri.image.as_str(), "quay.io/acme/op:1");
    }
}
