//! Command-line tests running the `versifier` binary against a temporary store.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const GENESIS: &str = "\\id GEN\n\
\\c 1\n\
\\v 1 In the beginning God created the heaven and the earth.\n\
\\v 2-3 And the earth was without form, and void.\n\
\\v 5 And God called the light Day.\n";

/// Run `versifier` with `args` followed by `--store <store>`
fn versifier<I, S>(store: &Path, args: I) -> Command
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    let mut cmd = Command::cargo_bin("versifier").unwrap();
    cmd.args(args).arg("--store").arg(store);
    cmd
}

fn setup() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("store.json");
    let usfm = dir.path().join("GEN.usfm");
    std::fs::write(&usfm, GENESIS).unwrap();

    versifier(&store, ["upload", "en_KJV_1_bible", "--create"])
        .arg(&usfm)
        .assert()
        .success()
        .stdout(predicate::str::contains("Uploaded 1 book(s)"));
    (dir, store)
}

#[test]
fn test_books_list_embedded_catalog() {
    Command::cargo_bin("versifier")
        .unwrap()
        .args(["books", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("jhn"))
        .stdout(predicate::str::contains("Revelation"));
}

#[test]
fn test_resource_create_and_list() {
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("store.json");

    versifier(&store, ["resource", "create", "hi_IRV_1_bible"])
        .assert()
        .success();
    assert!(store.exists());

    versifier(&store, ["resource", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hi_IRV_1_bible"));

    versifier(&store, ["resource", "create", "hi_IRV_1_bible"])
        .assert()
        .failure();
}

#[test]
fn test_non_bible_resource_rejected() {
    let dir = TempDir::new().unwrap();
    versifier(
        &dir.path().join("store.json"),
        ["resource", "create", "en_TW_1_vocabulary"],
    )
        .assert()
        .failure()
        .stderr(predicate::str::contains("bible"));
}

#[test]
fn test_upload_then_query_verses() {
    let (_dir, store) = setup();

    versifier(&store, ["verses", "en_KJV_1_bible", "--book", "gen", "--chapter", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gen 1:1  In the beginning"))
        .stdout(predicate::str::contains("gen 1:3  \n"));

    versifier(&store, ["verses", "en_KJV_1_bible", "--search", "Day", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"verseNumber\": 5"));
}

#[test]
fn test_versification_json_report() {
    let (_dir, store) = setup();

    let output = versifier(&store, ["versification", "en_KJV_1_bible", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["maxVerses"]["gen"], serde_json::json!([5]));
    assert_eq!(report["excludedVerses"], serde_json::json!(["gen 1:4"]));
    assert_eq!(report["mappedVerses"][0]["published"], "gen 1:2-3");
}

#[test]
fn test_duplicate_upload_fails_and_store_unchanged() {
    let (dir, store) = setup();
    let usfm = dir.path().join("GEN.usfm");

    versifier(&store, ["upload", "en_KJV_1_bible"])
        .arg(&usfm)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no books were applied"));

    versifier(&store, ["books", "uploaded", "en_KJV_1_bible"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gen"));
}

#[test]
fn test_update_active_flag_and_delete() {
    let (_dir, store) = setup();

    versifier(&store, ["update", "en_KJV_1_bible", "--book", "gen", "--active", "false"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Verse rows flagged: 4"));

    versifier(&store, ["verses", "en_KJV_1_bible"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    versifier(&store, ["delete", "en_KJV_1_bible", "gen"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted gen from en_KJV_1_bible"));
}

#[test]
fn test_update_requires_file_or_flag() {
    let (_dir, store) = setup();
    versifier(&store, ["update", "en_KJV_1_bible", "--book", "gen"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nothing to update"));
}

#[test]
fn test_reference_encode_and_decode() {
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("store.json");

    versifier(&store, ["reference", "encode", "jhn", "3", "16"])
        .assert()
        .success()
        .stdout("43003016\n");

    versifier(&store, ["reference", "decode", "043003016"])
        .assert()
        .success()
        .stdout("jhn 3:16\n");

    versifier(&store, ["reference", "encode", "gen", "1000", "1"])
        .assert()
        .failure();
}

#[test]
fn test_unknown_resource_fails() {
    let dir = TempDir::new().unwrap();
    versifier(&dir.path().join("store.json"), ["verses", "en_ULT_1_bible"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("en_ULT_1_bible"));
}
