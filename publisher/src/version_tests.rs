//! Unit tests for version resolution.

use super::*;
use crate::test_utils::{ExpectedCall, StubExecutor, failure_output, output_with_stdout};
use camino::Utf8PathBuf;
use rstest::{fixture, rstest};
use std::collections::HashMap;
use tempfile::TempDir;

/// Config whose version file lives in a temp directory.
#[fixture]
fn versioned() -> (TempDir, PublishConfig) {
    let dir = TempDir::new().expect("temp dir");
    let version_file =
        Utf8PathBuf::from_path_buf(dir.path().join("version")).expect("utf8 temp path");
    std::fs::write(&version_file, "1.2\n").expect("write version file");
    let config = PublishConfig {
        version_file,
        ..PublishConfig::default()
    };
    (dir, config)
}

fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    move |name| map.get(name).cloned()
}

fn tag_calls(head: &'static str, listed: &'static str) -> Vec<ExpectedCall> {
    vec![
        ExpectedCall {
            cmd: "git",
            args: vec!["tag", "--points-at", "HEAD"],
            result: Ok(output_with_stdout(head)),
        },
        ExpectedCall {
            cmd: "git",
            args: vec!["tag", "--list", "v1.2.*"],
            result: Ok(output_with_stdout(listed)),
        },
    ]
}

#[rstest]
fn resolve_uses_git_branch_and_tags(versioned: (TempDir, PublishConfig)) {
    let (_guard, config) = versioned;
    let mut calls = vec![ExpectedCall {
        cmd: "git",
        args: vec!["rev-parse", "--abbrev-ref", "HEAD"],
        result: Ok(output_with_stdout("main\n")),
    }];
    calls.extend(tag_calls("v1.2.3\n", "v1.2.0\nv1.2.3\n"));
    let executor = StubExecutor::new(calls);

    let context = ReleaseContext::resolve(
        &executor,
        &config,
        &ContextOverrides::default(),
        &env(&[]),
    )
    .expect("resolution succeeds");

    executor.assert_finished();
    assert_eq!(context.branch, "main");
    assert!(context.release);
    assert_eq!(context.current_version, Some(Version::new(1, 2, 3)));
    assert_eq!(context.next_version, Version::new(1, 2, 4));
    assert_eq!(context.upload_version().expect("release version"), "1.2.3");
}

#[rstest]
fn resolve_prefers_override_then_environment(versioned: (TempDir, PublishConfig)) {
    let (_guard, config) = versioned;
    let executor = StubExecutor::new(tag_calls("", ""));
    let overrides = ContextOverrides {
        branch: None,
        build_number: Some("7".to_owned()),
    };

    let context = ReleaseContext::resolve(
        &executor,
        &config,
        &overrides,
        &env(&[
            ("GITHUB_REF_NAME", "feature/x"),
            ("GITHUB_RUN_NUMBER", "99"),
        ]),
    )
    .expect("resolution succeeds");

    assert_eq!(context.branch, "feature/x");
    assert!(!context.release);
    assert_eq!(context.build_number.as_deref(), Some("7"));
    assert_eq!(context.upload_version().expect("snapshot version"), "1.2.0-7");
}

#[rstest]
fn resolve_rejects_detached_head(versioned: (TempDir, PublishConfig)) {
    let (_guard, config) = versioned;
    let executor = StubExecutor::new(vec![ExpectedCall {
        cmd: "git",
        args: vec!["rev-parse", "--abbrev-ref", "HEAD"],
        result: Ok(output_with_stdout("HEAD\n")),
    }]);

    let err = ReleaseContext::resolve(
        &executor,
        &config,
        &ContextOverrides::default(),
        &env(&[]),
    )
    .expect_err("detached HEAD should fail");
    assert!(matches!(err, PublishError::VersionResolution { .. }));
}

#[rstest]
fn resolve_propagates_git_failures(versioned: (TempDir, PublishConfig)) {
    let (_guard, config) = versioned;
    let executor = StubExecutor::new(vec![ExpectedCall {
        cmd: "git",
        args: vec!["tag", "--points-at", "HEAD"],
        result: Ok(failure_output("not a git repository")),
    }]);
    let overrides = ContextOverrides {
        branch: Some("main".to_owned()),
        build_number: None,
    };

    let err = ReleaseContext::resolve(&executor, &config, &overrides, &env(&[]))
        .expect_err("git failure should abort");
    assert!(err.to_string().contains("not a git repository"));
}

#[test]
fn resolve_requires_version_file() {
    let config = PublishConfig {
        version_file: Utf8PathBuf::from("/nonexistent/version"),
        ..PublishConfig::default()
    };
    let executor = StubExecutor::new(Vec::new());
    let overrides = ContextOverrides {
        branch: Some("main".to_owned()),
        build_number: None,
    };

    let err = ReleaseContext::resolve(&executor, &config, &overrides, &env(&[]))
        .expect_err("missing version file should fail");
    assert!(matches!(err, PublishError::VersionResolution { .. }));
    executor.assert_finished();
}

#[rstest]
#[case::two_parts("0.31", Some((0, 31)))]
#[case::whitespace("  2.0 \n", Some((2, 0)))]
#[case::three_parts("0.31.1", None)]
#[case::one_part("1", None)]
#[case::garbage("next", None)]
fn parse_base_version_accepts_major_minor(#[case] input: &str, #[case] expected: Option<(u64, u64)>) {
    assert_eq!(parse_base_version(input), expected);
}

#[test]
fn current_version_ignores_non_version_tags() {
    let tags = "latest\nv1.2.3\nv1.10.0\nnightly\n";
    assert_eq!(current_version(tags), Some(Version::new(1, 10, 0)));
    assert_eq!(current_version("latest\n"), None);
}

#[test]
fn next_version_only_counts_matching_base() {
    let tags = "v1.2.9\nv1.3.0\nv0.2.11\n";
    assert_eq!(next_version(1, 2, tags), Version::new(1, 2, 10));
}

#[test]
fn publish_version_falls_back_to_next_version() {
    let context = ReleaseContext {
        branch: "main".to_owned(),
        release: true,
        current_version: None,
        next_version: Version::new(2, 0, 0),
        build_number: None,
    };
    assert_eq!(context.publish_version(), &Version::new(2, 0, 0));
    assert_eq!(context.upload_version().expect("release version"), "2.0.0");
}

#[test]
fn snapshot_version_requires_build_number() {
    let context = ReleaseContext {
        branch: "foo".to_owned(),
        release: false,
        current_version: None,
        next_version: Version::new(1, 3, 0),
        build_number: None,
    };
    let err = context.upload_version().expect_err("build number missing");
    assert!(err.to_string().contains("--build-number"));
}
