use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

const DOC: &str = "# Hello\n\nSome *text*.\n";

fn md2html(dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("md2html").unwrap();
    cmd.current_dir(dir);
    cmd
}

#[test]
fn renders_standalone_page_from_stdin_by_default() {
    let dir = tempdir().unwrap();
    md2html(dir.path())
        .write_stdin(DOC)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("<!DOCTYPE html>"))
        .stdout(predicate::str::contains("<title>Hello</title>"))
        .stdout(predicate::str::contains("<h1 id=\"hello\">Hello</h1>"))
        .stdout(predicate::str::contains("<em>text</em>"))
        .stdout(predicate::str::ends_with("</html>\n"));
}

#[test]
fn reads_from_stdin_when_input_is_dash() {
    let dir = tempdir().unwrap();
    md2html(dir.path())
        .arg("-")
        .write_stdin(DOC)
        .assert()
        .success()
        .stdout(predicate::str::contains("<title>Hello</title>"));
}

#[test]
fn no_page_emits_fragment_only() {
    let dir = tempdir().unwrap();
    md2html(dir.path())
        .arg("--no-page")
        .write_stdin(DOC)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("<article class=\"markdown-body\">"))
        .stdout(predicate::str::contains("<html").not())
        .stdout(predicate::str::contains("<title>").not());
}

#[test]
fn css_flag_forces_page_with_verbatim_link() {
    let dir = tempdir().unwrap();
    md2html(dir.path())
        .args(["--no-page", "--css", "https://cdn.example.com/github.css?v=2&x=1"])
        .write_stdin(DOC)
        .assert()
        .success()
        .stdout(predicate::str::contains("<!DOCTYPE html>"))
        .stdout(predicate::str::contains(
            "href=\"https://cdn.example.com/github.css?v=2&x=1\"",
        ));
}

#[test]
fn converts_file_to_file() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("notes.md");
    let output = dir.path().join("notes.html");
    fs::write(&input, "Notes\n=====\n\n```rust\nfn main() {}\n```\n").unwrap();

    md2html(dir.path())
        .arg(&input)
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let html = fs::read_to_string(&output).unwrap();
    assert!(html.contains("<title>Notes</title>"));
    assert!(html.contains("class=\"hl-code\""));
}

#[test]
fn missing_input_fails() {
    let dir = tempdir().unwrap();
    md2html(dir.path())
        .arg("does-not-exist.md")
        .assert()
        .code(255)
        .stderr(predicate::str::contains("error reading from"));
}

#[test]
fn missing_input_does_not_create_output() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("out.html");
    md2html(dir.path())
        .arg("does-not-exist.md")
        .arg(&output)
        .assert()
        .code(255);
    assert!(!output.exists());
}

#[test]
fn uncreatable_output_fails() {
    let dir = tempdir().unwrap();
    md2html(dir.path())
        .args(["-", "missing/dir/out.html"])
        .write_stdin(DOC)
        .assert()
        .code(255)
        .stderr(predicate::str::contains("error creating"));
}

#[test]
fn invalid_utf8_fails_conversion() {
    let dir = tempdir().unwrap();
    md2html(dir.path())
        .write_stdin(vec![b'#', b' ', 0xff, 0xfe, b'\n'])
        .assert()
        .code(255)
        .stderr(predicate::str::contains("conversion failed"));
}

#[test]
fn too_many_positionals_is_a_usage_error() {
    let dir = tempdir().unwrap();
    md2html(dir.path())
        .args(["a.md", "b.html", "c"])
        .assert()
        .code(255)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn short_v_prints_version() {
    let dir = tempdir().unwrap();
    md2html(dir.path())
        .arg("-v")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "md2html {}",
            env!("CARGO_PKG_VERSION")
        )));
}

#[test]
fn local_config_selects_fragment_mode() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(".md2html.toml"), "[page]\nstandalone = false\n").unwrap();

    md2html(dir.path())
        .write_stdin(DOC)
        .assert()
        .success()
        .stdout(predicate::str::contains("<html").not());

    md2html(dir.path())
        .arg("--page")
        .write_stdin(DOC)
        .assert()
        .success()
        .stdout(predicate::str::contains("<title>Hello</title>"));
}

#[test]
fn invalid_config_fails() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(".md2html.toml"), "[page]\nstandalone = \"maybe\"\n").unwrap();

    md2html(dir.path())
        .write_stdin(DOC)
        .assert()
        .code(255)
        .stderr(predicate::str::contains("failed to parse config"));
}

#[cfg(any(target_os = "linux", target_os = "macos"))]
#[test]
fn cpuprofile_writes_profile_file() {
    let dir = tempdir().unwrap();
    let profile = dir.path().join("cpu.prof");

    md2html(dir.path())
        .arg("--cpuprofile")
        .arg(&profile)
        .write_stdin(DOC)
        .assert()
        .success()
        .stdout(predicate::str::contains("<title>Hello</title>"));

    let written = fs::metadata(&profile).unwrap();
    assert!(written.len() > 0);
}

#[test]
fn uncreatable_cpuprofile_does_not_stop_the_run() {
    let dir = tempdir().unwrap();
    md2html(dir.path())
        .args(["--cpuprofile", "missing/dir/cpu.prof"])
        .write_stdin(DOC)
        .assert()
        .success()
        .stdout(predicate::str::contains("<title>Hello</title>"))
        .stderr(predicate::str::contains("error creating profile"));
}

#[cfg(target_os = "linux")]
#[test]
fn write_failure_on_created_output_fails() {
    let dir = tempdir().unwrap();
    md2html(dir.path())
        .args(["-", "/dev/full"])
        .write_stdin(DOC)
        .assert()
        .code(255)
        .stderr(predicate::str::contains("error writing output"));
}

#[test]
fn unparsable_log_level_is_a_usage_error() {
    let dir = tempdir().unwrap();
    md2html(dir.path())
        .args(["--log-level", "bogus["])
        .write_stdin(DOC)
        .assert()
        .code(255)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("--log-level"));
}

#[test]
fn list_styles_includes_default_theme() {
    let dir = tempdir().unwrap();
    md2html(dir.path())
        .arg("--list-styles")
        .assert()
        .success()
        .stdout(predicate::str::contains("InspiredGitHub"));
}

#[test]
fn output_is_deterministic() {
    let dir = tempdir().unwrap();
    let first = md2html(dir.path()).write_stdin(DOC).output().unwrap();
    let second = md2html(dir.path()).write_stdin(DOC).output().unwrap();
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
}
