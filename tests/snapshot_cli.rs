//! End-to-end runs of the `repocat` binary against on-disk fixtures.

// We use assert_cmd for spawning the compiled binary and
// capturing stdout/stderr in a platform-agnostic way.
use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;

mod util;
use util::{block_paths, header, make_mixed_fixture, make_scenario_fixture};

fn repocat() -> Command {
    Command::cargo_bin("repocat").expect("bin")
}

// Test: the reference scenario. Two blocks in path order, VCS
// metadata absent, exact bytes.
#[test]
fn test_scenario_artifact_is_exact() {
    let tmp = make_scenario_fixture();

    repocat()
        .current_dir(tmp.path())
        .args(["--local", "proj", "--quiet"])
        .assert()
        .success();

    // Default output name comes from the directory name
    let artifact = fs::read_to_string(tmp.path().join("proj.md")).expect("artifact");
    let expected = format!(
        "\n{}\nhello\n\n{}\nworld\n",
        header("a.txt"),
        header("sub/b.md")
    );
    assert_eq!(artifact, expected);
    assert!(!artifact.contains(".git"));
}

// Test: summary line on stdout names the artifact.
#[test]
fn test_summary_output() {
    let tmp = make_scenario_fixture();
    let out = tmp.child("snap.txt");

    repocat()
        .current_dir(tmp.path())
        .args(["--local", "proj", "--no-color", "-o"])
        .arg(out.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 2 files"));

    out.assert(predicate::str::starts_with(format!("\n{}", header("a.txt"))));
}

// Test: block count, ordering, binary exclusion on a wider tree.
#[test]
fn test_mixed_tree_blocks_sorted_and_text_only() {
    let tmp = make_mixed_fixture();
    let out = tmp.child("out.md");

    repocat()
        .current_dir(tmp.path())
        .args(["--local", "repo", "--quiet", "-o"])
        .arg(out.path())
        .assert()
        .success();

    let artifact = fs::read_to_string(out.path()).unwrap();
    let paths = block_paths(&artifact);

    assert_eq!(paths.len(), 41, "40 units + README");
    assert_eq!(paths[0], "README.md");
    assert!(paths.windows(2).all(|w| w[0].as_bytes() < w[1].as_bytes()));
    assert!(!paths.iter().any(|p| p.ends_with(".png") || p.starts_with(".git")));
    for p in &paths {
        assert!(tmp.path().join("repo").join(p).is_file(), "{p} is not a real file");
    }
}

// Test: pool size never changes the artifact; two runs are identical.
#[test]
fn test_idempotent_across_job_counts() {
    let tmp = make_mixed_fixture();
    let mut artifacts = Vec::new();

    for jobs in ["1", "2", "8", "0"] {
        let out = tmp.child(format!("out_{jobs}.md"));
        repocat()
            .current_dir(tmp.path())
            .args(["--local", "repo", "--quiet", "-j", jobs, "-o"])
            .arg(out.path())
            .assert()
            .success();
        artifacts.push(fs::read(out.path()).unwrap());
    }

    assert!(artifacts.windows(2).all(|w| w[0] == w[1]));
}

// Test: extension policy only keeps listed extensions.
#[test]
fn test_extension_policy_flag() {
    let tmp = make_mixed_fixture();
    let out = tmp.child("md_only.md");

    repocat()
        .current_dir(tmp.path())
        .args(["--local", "repo", "--quiet", "--extensions", "md", "-o"])
        .arg(out.path())
        .assert()
        .success();

    let artifact = fs::read_to_string(out.path()).unwrap();
    assert_eq!(block_paths(&artifact), vec!["README.md"]);
}

// Test: a qualifying file that cannot be opened still gets a block
// with a placeholder, and the run succeeds.
#[cfg(unix)]
#[test]
fn test_unreadable_file_gets_placeholder() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = make_scenario_fixture();
    let locked = tmp.child("proj/locked.txt");
    locked.write_str("secret").unwrap();
    fs::set_permissions(locked.path(), fs::Permissions::from_mode(0o000)).unwrap();

    // Privileged users read through permission bits; nothing to observe then.
    let readable = fs::read(locked.path()).is_ok();

    let out = tmp.child("out.md");
    repocat()
        .current_dir(tmp.path())
        .args(["--local", "proj", "--quiet", "--extensions", "txt,md", "-o"])
        .arg(out.path())
        .assert()
        .success();

    fs::set_permissions(locked.path(), fs::Permissions::from_mode(0o644)).unwrap();

    let artifact = fs::read_to_string(out.path()).unwrap();
    assert_eq!(block_paths(&artifact), vec!["a.txt", "locked.txt", "sub/b.md"]);
    if !readable {
        let expected_start = format!("\n{}\n[Error reading file: ", header("locked.txt"));
        assert!(artifact.contains(&expected_start), "{artifact}");
    }
}

// Test: a failed retrieval exits non-zero and leaves no artifact.
#[test]
fn test_retrieval_failure_leaves_nothing() {
    let tmp = assert_fs::TempDir::new().unwrap();

    repocat()
        .current_dir(tmp.path())
        .env("GIT_TERMINAL_PROMPT", "0")
        .args(["--quiet", "/definitely/not/a/repo"])
        .assert()
        .failure()
        .stderr(predicate::str::is_empty().not());

    assert!(!tmp.child("repo.md").path().exists());
    assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
}

// Test: --local on a missing directory is a retrieval failure too.
#[test]
fn test_missing_local_dir_fails() {
    let tmp = assert_fs::TempDir::new().unwrap();

    repocat()
        .current_dir(tmp.path())
        .args(["--local", "nope", "--quiet"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unable to retrieve repository"));

    assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
}

// Test: dry run lists the manifest and writes nothing.
#[test]
fn test_dry_run_lists_manifest() {
    let tmp = make_scenario_fixture();

    repocat()
        .current_dir(tmp.path())
        .args(["--local", "proj", "--dry-run", "--no-color"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Would write 2 files"))
        .stdout(predicate::str::contains("  sub/b.md"));

    assert!(!tmp.child("proj.md").path().exists());
}

// Test: invalid threshold is rejected before any work happens.
#[test]
fn test_invalid_threshold_rejected() {
    let tmp = make_scenario_fixture();

    repocat()
        .current_dir(tmp.path())
        .args(["--local", "proj", "--threshold", "2.5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid configuration"));
}

// Test: config file in the working directory switches policy.
#[test]
fn test_config_file_is_honoured() {
    let tmp = make_mixed_fixture();
    tmp.child("repocat.toml")
        .write_str("selection = \"extensions\"\nextensions = [\"png\"]\n")
        .unwrap();
    let out = tmp.child("png.md");

    repocat()
        .current_dir(tmp.path())
        .args(["--local", "repo", "--quiet", "-o"])
        .arg(out.path())
        .assert()
        .success();

    let artifact = fs::read_to_string(out.path()).unwrap();
    assert_eq!(block_paths(&artifact), vec!["assets/logo.png"]);
}

#[test]
fn test_init_and_completions() {
    let tmp = assert_fs::TempDir::new().unwrap();

    repocat()
        .current_dir(tmp.path())
        .args(["init", "--quiet"])
        .assert()
        .success();
    tmp.child("repocat.toml")
        .assert(predicate::str::contains("selection = \"sample\""));

    repocat()
        .args(["completions", "bash", "--stdout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("repocat"));
}
