// ABOUTME: Resolves an image reference to exactly one image on an engine.
// ABOUTME: Exact reference matching with unique / not found / ambiguous outcomes.

use super::traits::{ImageError, ImageOps, ImageSummary};
use crate::types::ImageRef;

/// Registry prefixes engines add or drop when reporting references.
const IMPLICIT_PREFIXES: [&str; 3] = ["docker.io/library/", "docker.io/", "localhost/"];

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("reference {reference} matches {count} images")]
    Ambiguous { reference: String, count: usize },

    #[error("failed to list images for {reference}: {source}")]
    Failed {
        reference: String,
        #[source]
        source: ImageError,
    },
}

/// Find the single image `reference` names on `engine`.
///
/// The engine's own reference filter is only a first pass; a summary counts
/// when one of its references equals `reference` after stripping implicit
/// registry prefixes.
pub async fn lookup<E>(engine: &E, reference: &ImageRef) -> Result<Option<ImageSummary>, LookupError>
where
    E: ImageOps + ?Sized,
{
    let wanted = reference.full_name();
    let candidates = engine
        .list_images(reference)
        .await
        .map_err(|source| LookupError::Failed {
            reference: wanted.clone(),
            source,
        })?;

    let mut matches: Vec<ImageSummary> = candidates
        .into_iter()
        .filter(|summary| {
            summary
                .references
                .iter()
                .any(|r| normalize_reference(r) == normalize_reference(&wanted))
        })
        .collect();

    match matches.len() {
        0 => Ok(None),
        1 => Ok(matches.pop()),
        count => Err(LookupError::Ambiguous {
            reference: wanted,
            count,
        }),
    }
}

/// Strip the registry prefix an engine may or may not report.
pub(crate) fn normalize_reference(reference: &str) -> &str {
    IMPLICIT_PREFIXES
        .iter()
        .find_map(|prefix| reference.strip_prefix(prefix))
        .unwrap_or(reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::fake::FakeEngine;

    fn image(s: &str) -> ImageRef {
        ImageRef::parse(s).unwrap()
    }

    #[tokio::test]
    async fn no_match_is_none() {
        let engine = FakeEngine::new().with_image("sha256:aaa", &["other:latest"]);
        let found = lookup(&engine, &image("myapp:latest")).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn single_match_is_returned() {
        let engine = FakeEngine::new()
            .with_image("sha256:aaa", &["myapp:latest", "myapp:v1"])
            .with_image("sha256:bbb", &["myapp:v2"]);

        let found = lookup(&engine, &image("myapp:latest")).await.unwrap().unwrap();
        assert_eq!(found.id.as_str(), "sha256:aaa");
    }

    #[tokio::test]
    async fn loose_engine_matches_are_filtered() {
        // The fake lists everything sharing the name, like a glob filter would.
        let engine = FakeEngine::new()
            .with_image("sha256:aaa", &["myapp:latest-rc"])
            .with_image("sha256:bbb", &["myapp:latest"]);

        let found = lookup(&engine, &image("myapp:latest")).await.unwrap().unwrap();
        assert_eq!(found.id.as_str(), "sha256:bbb");
    }

    #[tokio::test]
    async fn two_matches_are_ambiguous() {
        let engine = FakeEngine::new()
            .with_image("sha256:aaa", &["myapp:latest"])
            .with_image("sha256:bbb", &["localhost/myapp:latest"]);

        let err = lookup(&engine, &image("myapp:latest")).await.unwrap_err();
        assert!(matches!(err, LookupError::Ambiguous { count: 2, .. }));
        assert!(err.to_string().contains("myapp:latest"));
    }

    #[tokio::test]
    async fn podman_localhost_prefix_matches() {
        let engine = FakeEngine::new().with_image("sha256:aaa", &["localhost/myapp:latest"]);
        let found = lookup(&engine, &image("myapp:latest")).await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn list_failure_names_reference() {
        let engine = FakeEngine::new().failing_list();
        let err = lookup(&engine, &image("myapp:latest")).await.unwrap_err();
        match err {
            LookupError::Failed { reference, .. } => assert_eq!(reference, "myapp:latest"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn normalize_strips_implicit_registries() {
        assert_eq!(normalize_reference("docker.io/library/nginx:1"), "nginx:1");
        assert_eq!(normalize_reference("docker.io/acme/app:1"), "acme/app:1");
        assert_eq!(normalize_reference("localhost/app:1"), "app:1");
        assert_eq!(
            normalize_reference("localhost:5000/app:1"),
            "localhost:5000/app:1"
        );
    }
}
