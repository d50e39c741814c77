//! Shared test utilities for integration tests
//!
//! Provides common fixture creation and artifact parsing helpers
//! used across multiple test files.

#![allow(dead_code)]

use assert_fs::prelude::*;

/// Build the reference tree: two text files plus VCS metadata.
///
/// ```text
/// proj/a.txt        "hello"
/// proj/sub/b.md     "world"
/// proj/.git/config  "[core]"
/// ```
pub fn make_scenario_fixture() -> assert_fs::TempDir
{
    // Initialize the temporary workspace root
    let tmp = assert_fs::TempDir::new().expect("tempdir");

    tmp.child("proj/a.txt")
        .write_str("hello")
        .expect("write a.txt");
    tmp.child("proj/sub/b.md")
        .write_str("world")
        .expect("write b.md");
    tmp.child("proj/.git/config")
        .write_str("[core]\n\trepositoryformatversion = 0\n")
        .expect("write git config");

    tmp
}

/// A wider tree mixing text, binary and nested files so that read
/// completion order has room to differ from path order.
pub fn make_mixed_fixture() -> assert_fs::TempDir
{
    let tmp = assert_fs::TempDir::new().expect("tempdir");

    for i in 0..40
    {
        // Larger bodies for lower indices so slow reads come first
        let body = format!("// unit {i}\n").repeat(200 - i * 4);
        tmp.child(format!("repo/src/unit_{i:02}.rs"))
            .write_str(&body)
            .expect("write unit");
    }

    tmp.child("repo/README.md")
        .write_str("# Mixed Fixture\n")
        .expect("write readme");
    tmp.child("repo/assets/logo.png")
        .write_binary(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0")
        .expect("write png");
    tmp.child("repo/.git/HEAD")
        .write_str("ref: refs/heads/main\n")
        .expect("write HEAD");

    tmp
}

/// Full delimiter line (without the leading blank line) for `path`.
pub fn header(path: &str) -> String
{
    let rule = "-".repeat(80);
    format!("{rule} {path} {rule}")
}

/// Relative paths named by delimiter lines, in artifact order.
pub fn block_paths(artifact: &str) -> Vec<String>
{
    let rule = "-".repeat(80);
    let open = format!("{rule} ");
    let close = format!(" {rule}");

    artifact
        .lines()
        .filter_map(|line| {
            line.strip_prefix(open.as_str())
                .and_then(|rest| rest.strip_suffix(close.as_str()))
                .map(str::to_string)
        })
        .collect()
}

/// Whether a `git` executable can be launched.
pub fn git_available() -> bool
{
    std::process::Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|o| o.status.success())
}

/// Run `git` in `dir` with a throwaway identity; panics on failure.
pub fn git(dir: &std::path::Path, args: &[&str])
{
    let status = std::process::Command::new("git")
        .args(["-c", "user.name=repocat", "-c", "user.email=repocat@example.com"])
        .args(["-c", "commit.gpgsign=false", "-c", "init.defaultBranch=main"])
        .args(args)
        .current_dir(dir)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .expect("spawn git");
    assert!(status.success(), "git {args:?} failed");
}

/// Commit every file under `dir` into a fresh repository there.
pub fn commit_all(dir: &std::path::Path)
{
    git(dir, &["init", "-q"]);
    git(dir, &["add", "."]);
    git(dir, &["commit", "-q", "-m", "fixture"]);
}

/// Scenario tree committed as a git repository at `<tmp>/origin`.
pub fn make_git_origin() -> assert_fs::TempDir
{
    let tmp = assert_fs::TempDir::new().expect("tempdir");

    tmp.child("origin/a.txt")
        .write_str("hello")
        .expect("write a.txt");
    tmp.child("origin/sub/b.md")
        .write_str("world")
        .expect("write b.md");
    commit_all(&tmp.path().join("origin"));

    tmp
}

/// Repository heavy enough that a clone of it takes a noticeable moment.
pub fn make_large_git_origin(files: usize, bytes_per_file: usize) -> assert_fs::TempDir
{
    let tmp = assert_fs::TempDir::new().expect("tempdir");

    // xorshift bytes so packing cannot shrink the payload
    let mut state = 0x9E37_79B9_7F4A_7C15u64;
    for i in 0..files
    {
        let body: Vec<u8> = (0..bytes_per_file)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                (state >> 24) as u8
            })
            .collect();
        tmp.child(format!("origin/blob_{i:04}.bin"))
            .write_binary(&body)
            .expect("write blob");
    }
    commit_all(&tmp.path().join("origin"));

    tmp
}

/// Names of the entries directly inside `dir`.
pub fn dir_names(dir: &std::path::Path) -> Vec<String>
{
    std::fs::read_dir(dir)
        .expect("read_dir")
        .map(|e| {
            e.expect("dir entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect()
}
