//! Behaviour-driven tests for the package build pipeline.
//!
//! Scenarios drive [`Pipeline::run`] against scratch package trees and
//! inspect the archive, the checksum manifest, and the failure report.
//! Tests use the rstest-bdd v0.5.0 mutable world pattern.

use apg_packager::archive::{Compression, CompressionConfig};
use apg_packager::checksum::{CHECKSUM_FILE, ChecksumManifest};
use apg_packager::error::PackagerError;
use apg_packager::layout::Violation;
use apg_packager::pipeline::{BuildRequest, BuildResult, BuildStage, OutputTarget, Pipeline};
use apg_packager::test_support::PackageTree;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

// ---------------------------------------------------------------------------
// World types
// ---------------------------------------------------------------------------

#[derive(Default)]
struct PackagingWorld {
    tree: Option<PackageTree>,
    out_dir: Option<TempDir>,
    compression: Option<CompressionConfig>,
    blocked_destination: Option<PathBuf>,
    result: Option<BuildResult>,
    digests: Vec<Vec<(String, String)>>,
}

#[fixture]
fn world() -> PackagingWorld {
    PackagingWorld {
        out_dir: Some(TempDir::new().expect("temp dir")),
        ..PackagingWorld::default()
    }
}

fn tree(world: &PackagingWorld) -> &PackageTree {
    world.tree.as_ref().expect("tree set")
}

fn out_path(world: &PackagingWorld) -> PathBuf {
    world
        .out_dir
        .as_ref()
        .expect("out_dir set")
        .path()
        .to_path_buf()
}

fn compression(world: &PackagingWorld) -> CompressionConfig {
    world
        .compression
        .unwrap_or_else(|| CompressionConfig::new(Compression::Zstd, 3).expect("valid level"))
}

fn run_build(world: &mut PackagingWorld) {
    let output = world
        .blocked_destination
        .clone()
        .map_or_else(|| OutputTarget::Directory(out_path(world)), OutputTarget::File);
    let request = BuildRequest {
        source_dir: tree(world).root().to_path_buf(),
        output,
        compression: compression(world),
    };
    let result = Pipeline::new().run(&request);
    if result.is_ok() {
        let manifest = read_checksums(tree(world).root());
        world.digests.push(
            manifest
                .digests()
                .map(|(path, digest)| (path.to_owned(), digest.to_string()))
                .collect(),
        );
    }
    world.result = Some(result);
}

fn read_checksums(root: &Path) -> ChecksumManifest {
    let json = fs::read_to_string(root.join(CHECKSUM_FILE)).expect("read checksums.json");
    serde_json::from_str(&json).expect("parse checksums.json")
}

fn failure_stage(world: &PackagingWorld) -> BuildStage {
    match world.result.as_ref().expect("result set") {
        Ok(output) => panic!("expected failure, built {}", output.archive_path.display()),
        Err(failure) => failure.stage,
    }
}

fn violations(world: &PackagingWorld) -> Vec<Violation> {
    let Some(Err(failure)) = world.result.as_ref() else {
        panic!("expected a failed build");
    };
    failure
        .error
        .validation_report()
        .expect("validation report")
        .violations()
        .to_vec()
}

fn unpack(archive: &Path, algorithm: Compression) -> TempDir {
    let file = fs::File::open(archive).expect("open archive");
    let reader: Box<dyn Read> = match algorithm {
        Compression::Zstd => Box::new(zstd::Decoder::new(file).expect("zstd decoder")),
        Compression::Xz => Box::new(xz2::read::XzDecoder::new(file)),
        Compression::Gzip => Box::new(flate2::read::GzDecoder::new(file)),
        Compression::None => Box::new(file),
    };
    let dest = TempDir::new().expect("unpack dir");
    tar::Archive::new(reader)
        .unpack(dest.path())
        .expect("unpack archive");
    dest
}

fn files_under(root: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .map(|entry| entry.expect("walk"))
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let relative = entry
                .path()
                .strip_prefix(root)
                .expect("under root")
                .to_path_buf();
            (relative, fs::read(entry.path()).expect("read file"))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Step definitions
// ---------------------------------------------------------------------------

#[given("a complete package tree")]
fn given_complete_tree(world: &mut PackagingWorld) {
    world.tree = Some(PackageTree::valid());
}

#[given(
    "a complete package tree for \"{name}\" version \"{version}\" release \"{release}\" on \"{arch}\""
)]
fn given_named_tree(
    world: &mut PackagingWorld,
    name: String,
    version: String,
    release: String,
    arch: String,
) {
    let package = PackageTree::valid();
    let metadata = serde_json::json!({
        "name": name,
        "version": version,
        "release": release,
        "architecture": arch,
    });
    package.write_file("metadata.json", metadata.to_string());
    world.tree = Some(package);
}

#[given("the path \"{path}\" is removed")]
fn given_path_removed(world: &mut PackagingWorld, path: String) {
    tree(world).remove(&path);
}

#[given("\"{path}\" contains malformed JSON")]
fn given_malformed_json(world: &mut PackagingWorld, path: String) {
    tree(world).write_file(&path, "{ \"files\": [");
}

#[given("compression \"{algorithm}\" at level \"{level}\"")]
fn given_compression(world: &mut PackagingWorld, algorithm: String, level: String) {
    let algorithm: Compression = algorithm.parse().expect("known algorithm");
    let level: u32 = level.parse().expect("numeric level");
    world.compression = Some(CompressionConfig::new(algorithm, level).expect("valid level"));
}

#[given("the destination is blocked by a directory")]
fn given_blocked_destination(world: &mut PackagingWorld) {
    let destination = out_path(world).join("foo-1.0-1-x86_64.apg");
    fs::create_dir(&destination).expect("create blocking directory");
    world.blocked_destination = Some(destination);
}

#[when("the package is built")]
fn when_built(world: &mut PackagingWorld) {
    run_build(world);
}

#[when("the package is built again")]
fn when_built_again(world: &mut PackagingWorld) {
    run_build(world);
}

#[then("the build succeeds")]
fn then_build_succeeds(world: &mut PackagingWorld) {
    let result = world.result.as_ref().expect("result set");
    assert!(result.is_ok(), "build failed: {:?}", result.as_ref().err());
}

#[then("the archive \"{filename}\" is created")]
fn then_archive_created(world: &mut PackagingWorld, filename: String) {
    let Some(Ok(output)) = world.result.as_ref() else {
        panic!("expected a successful build");
    };
    assert_eq!(
        output.archive_path.file_name().and_then(|n| n.to_str()),
        Some(filename.as_str())
    );
    assert!(out_path(world).join(&filename).is_file());
}

#[then("the archive reproduces the source tree")]
fn then_archive_round_trips(world: &mut PackagingWorld) {
    let Some(Ok(output)) = world.result.as_ref() else {
        panic!("expected a successful build");
    };
    let unpacked = unpack(&output.archive_path, compression(world).algorithm());
    assert_eq!(files_under(unpacked.path()), files_under(tree(world).root()));
}

#[then("the build fails while {stage}")]
fn then_build_fails_while(world: &mut PackagingWorld, stage: String) {
    assert_eq!(failure_stage(world).to_string(), stage);
}

#[then("a missing violation is reported for \"{path}\"")]
fn then_missing_reported(world: &mut PackagingWorld, path: String) {
    assert!(
        violations(world)
            .iter()
            .any(|v| matches!(v, Violation::Missing { .. }) && v.path() == path),
        "no missing violation for {path}"
    );
}

#[then("a malformed JSON violation is reported for \"{path}\"")]
fn then_malformed_reported(world: &mut PackagingWorld, path: String) {
    assert!(
        violations(world)
            .iter()
            .any(|v| matches!(v, Violation::MalformedJson { .. }) && v.path() == path),
        "no malformed JSON violation for {path}"
    );
}

#[then("no archive is created")]
fn then_no_archive(world: &mut PackagingWorld) {
    let entries = fs::read_dir(out_path(world)).expect("read out dir").count();
    assert_eq!(entries, 0, "output directory must stay empty");
    assert!(!tree(world).path(CHECKSUM_FILE).exists());
}

#[then("the checksum manifest lists \"{path}\"")]
fn then_manifest_lists(world: &mut PackagingWorld, path: String) {
    let manifest = read_checksums(tree(world).root());
    assert!(manifest.get(&path).is_some(), "{path} missing from manifest");
}

#[then("the checksum manifest does not list \"{path}\"")]
fn then_manifest_omits(world: &mut PackagingWorld, path: String) {
    let manifest = read_checksums(tree(world).root());
    assert!(manifest.get(&path).is_none(), "{path} must not be listed");
}

#[then("both builds record identical digests")]
fn then_identical_digests(world: &mut PackagingWorld) {
    let [first, second] = world.digests.as_slice() else {
        panic!("expected two successful builds, got {}", world.digests.len());
    };
    assert_eq!(first, second);
}

#[then("only the blocking directory remains in the output directory")]
fn then_only_blocker_remains(world: &mut PackagingWorld) {
    let Some(Err(failure)) = world.result.as_ref() else {
        panic!("expected a failed build");
    };
    assert!(matches!(failure.error, PackagerError::Persist { .. }));
    let remaining: Vec<PathBuf> = fs::read_dir(out_path(world))
        .expect("read out dir")
        .map(|entry| entry.expect("entry").path())
        .collect();
    assert_eq!(
        remaining,
        [world.blocked_destination.clone().expect("blocked destination set")]
    );
}

// ---------------------------------------------------------------------------
// Scenario bindings
// ---------------------------------------------------------------------------

#[scenario(
    path = "tests/features/packaging.feature",
    name = "Build a complete package tree"
)]
fn scenario_build_complete_tree(world: PackagingWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/packaging.feature",
    name = "Report every layout problem at once"
)]
fn scenario_report_every_problem(world: PackagingWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/packaging.feature",
    name = "Checksums exclude their own manifest"
)]
fn scenario_checksums_exclude_manifest(world: PackagingWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/packaging.feature",
    name = "Building twice yields identical checksums"
)]
fn scenario_idempotent_checksums(world: PackagingWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/packaging.feature",
    name = "Build with xz compression"
)]
fn scenario_xz_compression(world: PackagingWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/packaging.feature",
    name = "Build without compression"
)]
fn scenario_no_compression(world: PackagingWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/packaging.feature",
    name = "Unwritable destination leaves no partial archive"
)]
fn scenario_unwritable_destination(world: PackagingWorld) {
    let _ = world;
}
