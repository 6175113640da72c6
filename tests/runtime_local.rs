// ABOUTME: Integration tests for engine access against the local daemon.
// ABOUTME: Tests skip when no local Docker/Podman engine is reachable.

mod support;

use hauler::runtime::{ImageOps, RuntimeInfo, lookup};
use hauler::types::ImageRef;

/// Skip test if no local engine is available.
macro_rules! require_engine {
    () => {
        match support::local_engine().await {
            Some(engine) => engine,
            None => {
                eprintln!("Skipping test: no local container engine found");
                return;
            }
        }
    };
}

#[tokio::test]
async fn engine_info() {
    let engine = require_engine!();

    let info = engine
        .runtime()
        .info()
        .await
        .expect("should get engine info");
    assert!(!info.name.is_empty());
    assert!(!info.version.is_empty(), "engine version should not be empty");

    engine.close().await.expect("local close should succeed");
}

#[tokio::test]
async fn local_engine_is_not_remote() {
    let engine = require_engine!();
    assert!(!engine.is_remote());
    assert_eq!(engine.label(), "local");
    engine.close().await.unwrap();
}

#[tokio::test]
async fn lookup_of_unknown_reference_is_none() {
    let engine = require_engine!();
    let reference = ImageRef::parse("hauler-test/does-not-exist:never").unwrap();

    let found = lookup(engine.runtime(), &reference)
        .await
        .expect("lookup should not fail");
    assert!(found.is_none());

    engine.close().await.unwrap();
}

#[tokio::test]
async fn list_images_accepts_reference_filter() {
    let engine = require_engine!();
    let reference = ImageRef::parse("hauler-test/does-not-exist:never").unwrap();

    let listed = engine
        .runtime()
        .list_images(&reference)
        .await
        .expect("listing should succeed");
    assert!(listed.is_empty());

    engine.close().await.unwrap();
}

#[tokio::test]
async fn tagging_unknown_image_is_not_found() {
    let engine = require_engine!();
    let source = ImageRef::parse("hauler-test/does-not-exist:never").unwrap();
    let target = ImageRef::parse("hauler-test/does-not-exist:still-never").unwrap();

    let err = engine
        .runtime()
        .tag_image(&source, &target)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not found"), "got: {err}");

    engine.close().await.unwrap();
}
