//! Integration tests for the `agentlab` binary

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn agentlab(
    dir: &Path,
    args: &[&str],
) -> Output {
    Command::new(env!("CARGO_BIN_EXE_agentlab"))
        .current_dir(dir)
        .env("XDG_CONFIG_HOME", dir.join("config"))
        .env_remove("FORCE_COLOR")
        .env_remove("CLICOLOR_FORCE")
        .args(args)
        .output()
        .unwrap()
}

fn create_test_file(
    dir: &TempDir,
    name: &str,
    content: &str,
) -> PathBuf {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_compile_and_decompile() {
    let temp_dir = TempDir::new().unwrap();
    create_test_file(&temp_dir, "idle.agl", "behaviour Idle { state Wait() { do { Wait(30); } } }");

    let output = agentlab(temp_dir.path(), &["compile", "idle.agl"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(fs::read(temp_dir.path().join("idle.bin")).unwrap().len(), 20);

    let output = agentlab(temp_dir.path(), &["decompile", "idle.bin", "--kind", "behaviour", "--name", "Idle"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("behaviour Idle {"));
    assert!(stdout.contains("Wait(30);"));
}

#[test]
fn test_decompile_targets_without_symbols() {
    let temp_dir = TempDir::new().unwrap();
    create_test_file(
        &temp_dir,
        "p.agl",
        "behaviour P { starter { assign 7; } state S(12) { do { Wait(1); } } }",
    );
    create_test_file(
        &temp_dir,
        "lib.agl",
        "library L { [GlobalIndex(5)] behaviour A { state S() { } } }",
    );

    let output = agentlab(temp_dir.path(), &["compile", "p.agl"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let output = agentlab(temp_dir.path(), &["decompile", "p.bin", "--kind", "behaviour", "--name", "P"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("assign 7;"));
    assert!(stdout.contains("state State_0(12) {"));

    let output = agentlab(temp_dir.path(), &["compile", "lib.agl"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let output = agentlab(temp_dir.path(), &["decompile", "lib.bin", "--kind", "library"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("library lib {"));
    assert!(stdout.contains("[GlobalIndex(5)]"));

    // 只给出部分表时，缺失的表按数字输出
    create_test_file(&temp_dir, "objects.toml", "[objects]\nCrate = 7\n");
    let output = agentlab(
        temp_dir.path(),
        &["decompile", "p.bin", "--kind", "behaviour", "--name", "P", "--symbols", "objects.toml"],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("assign Crate;"));
    assert!(stdout.contains("state State_0(12) {"));
}

#[test]
fn test_compile_with_symbols() {
    let temp_dir = TempDir::new().unwrap();
    create_test_file(
        &temp_dir,
        "guard.agl",
        "behaviour Guard { starter { assign Crate; } state S() { } }",
    );
    create_test_file(&temp_dir, "symbols.toml", "[objects]\nCrate = 400\n");

    let output = agentlab(temp_dir.path(), &["compile", "guard.agl"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Crate"));

    let output = agentlab(temp_dir.path(), &["compile", "guard.agl", "--symbols", "symbols.toml", "-o", "out.bin"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let output = agentlab(
        temp_dir.path(),
        &["decompile", "out.bin", "--kind", "behaviour", "--name", "Guard", "--symbols", "symbols.toml"],
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("assign Crate;"));
}

#[test]
fn test_plain_output_when_piped() {
    let temp_dir = TempDir::new().unwrap();
    create_test_file(&temp_dir, "bad.agl", "sequence C { Dance(); }");
    create_test_file(&temp_dir, "good.agl", "sequence A { Wait(1); }");

    let output = agentlab(temp_dir.path(), &["check", "bad.agl"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error:"));
    assert!(!stderr.contains('\u{1b}'));

    let output = agentlab(temp_dir.path(), &["check", "good.agl"]);
    assert!(output.status.success());
    assert!(!String::from_utf8_lossy(&output.stdout).contains('\u{1b}'));
}

#[test]
fn test_check_directory() {
    let temp_dir = TempDir::new().unwrap();
    create_test_file(&temp_dir, "src/a.agl", "sequence A { Wait(1); }");
    create_test_file(&temp_dir, "src/nested/b.agl", "sequence B { Jump(); }");

    let output = agentlab(temp_dir.path(), &["check", "src"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("All checks passed (2 files)"));

    create_test_file(&temp_dir, "src/bad.agl", "sequence C { Dance(); }");
    let output = agentlab(temp_dir.path(), &["check", "src"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Dance"));
}

#[test]
fn test_fmt_check_and_rewrite() {
    let temp_dir = TempDir::new().unwrap();
    let file = create_test_file(&temp_dir, "s.agl", "sequence S{Wait(1);}");

    let output = agentlab(temp_dir.path(), &["fmt", "s.agl", "--check"]);
    assert!(!output.status.success());

    let output = agentlab(temp_dir.path(), &["fmt", "s.agl"]);
    assert!(output.status.success());
    assert_eq!(fs::read_to_string(&file).unwrap(), "sequence S {\n\tWait(1);\n}\n");

    let output = agentlab(temp_dir.path(), &["fmt", "s.agl", "--check"]);
    assert!(output.status.success());
}

#[test]
fn test_project_config_indentation() {
    let temp_dir = TempDir::new().unwrap();
    create_test_file(&temp_dir, "agentlab.toml", "[fmt]\nuse_tabs = false\nindent_width = 2\n");
    let file = create_test_file(&temp_dir, "s.agl", "sequence S{Wait(1);}");

    let output = agentlab(temp_dir.path(), &["fmt", "s.agl"]);
    assert!(output.status.success());
    assert_eq!(fs::read_to_string(&file).unwrap(), "sequence S {\n  Wait(1);\n}\n");
}

#[test]
fn test_dump_json() {
    let temp_dir = TempDir::new().unwrap();
    create_test_file(&temp_dir, "s.agl", "sequence S { Wait(1); }");

    let output = agentlab(temp_dir.path(), &["dump", "s.agl", "--tokens"]);
    assert!(output.status.success());
    let tokens: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(tokens.as_array().is_some_and(|t| !t.is_empty()));

    let output = agentlab(temp_dir.path(), &["dump", "s.agl", "--ast"]);
    assert!(output.status.success());
    let ast: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(ast.is_object());

    let output = agentlab(temp_dir.path(), &["dump", "s.agl"]);
    assert!(!output.status.success());
}

#[test]
fn test_version() {
    let temp_dir = TempDir::new().unwrap();
    let output = agentlab(temp_dir.path(), &["version"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("AgentLab "));
}
