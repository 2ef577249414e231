//! Rendered artifacts and their deployment paths.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::template::{TemplateFamily, TemplateKey};

/// Metadata about a render, kept out of the artifact text so regeneration
/// stays byte-identical.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactMeta {
    pub generator_version: String,
    pub rendered_at: DateTime<Utc>,
}

/// A rendered configuration text plus the relative path the deployment
/// collaborator should write it to.
#[derive(Debug, Clone, Serialize)]
pub struct Artifact {
    pub key: TemplateKey,
    pub target_path: PathBuf,
    pub content: String,
    pub meta: ArtifactMeta,
}

impl Artifact {
    pub fn new(
        key: TemplateKey,
        target_path: PathBuf,
        content: String,
        generator_version: String,
    ) -> Self {
        Self {
            key,
            target_path,
            content,
            meta: ArtifactMeta {
                generator_version,
                rendered_at: Utc::now(),
            },
        }
    }
}

/// Relative deployment path for a family's artifact.
pub fn target_path(family: TemplateFamily, uri: &str) -> PathBuf {
    match family {
        TemplateFamily::VirtualHost => PathBuf::from("vhost.d").join(uri),
        TemplateFamily::AppSettings => PathBuf::from("sites").join(uri).join("settings.php"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_paths() {
        assert_eq!(
            target_path(TemplateFamily::VirtualHost, "example.com"),
            PathBuf::from("vhost.d/example.com")
        );
        assert_eq!(
            target_path(TemplateFamily::AppSettings, "example.com"),
            PathBuf::from("sites/example.com/settings.php")
        );
    }
}
