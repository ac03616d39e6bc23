use assert_cmd::Command;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

fn temp_workspace() -> TempDir {
    tempfile::tempdir().expect("create tempdir")
}

fn wordtally() -> Command {
    let mut cmd = Command::cargo_bin("wordtally").expect("binary exists");
    cmd.args(["--quiet", "--no-progress"]);
    cmd
}

fn stdout_of(cmd: &mut Command, code: i32) -> String {
    let output = cmd.assert().code(code).get_output().stdout.clone();
    String::from_utf8(output).expect("stdout is UTF-8")
}

#[test]
fn counts_words_in_single_file() {
    let workspace = temp_workspace();
    let path = workspace.path().join("single.txt");
    fs::write(&path, "Hello hello hello_world 123").expect("write input");

    let stdout = stdout_of(wordtally().arg(&path), 0);
    assert!(stdout.contains("Processing 1 file(s)..."));
    assert!(stdout.contains("Total unique words: 3"));
    assert!(stdout.contains("Total word occurrences: 4"));
}

#[test]
fn aggregates_across_multiple_files() {
    let workspace = temp_workspace();
    let first = workspace.path().join("a.txt");
    let second = workspace.path().join("b.txt");
    fs::write(&first, "alpha beta alpha").expect("write a");
    fs::write(&second, "beta gamma").expect("write b");

    let stdout = stdout_of(wordtally().arg(&first).arg(&second), 0);
    assert!(stdout.contains("Total unique words: 3"));
    assert!(stdout.contains("Total word occurrences: 5"));
    for word in ["alpha", "beta", "gamma"] {
        assert!(stdout.contains(word), "missing {word}");
    }
}

#[test]
fn handles_very_long_single_line_without_breaking_word() {
    let workspace = temp_workspace();
    let path = workspace.path().join("longline.txt");
    let long_word = "a".repeat(70_000);
    fs::write(&path, format!("{long_word} {long_word}")).expect("write input");

    let stdout = stdout_of(wordtally().args(["--chunk-size", "1024"]).arg(&path), 0);
    assert!(stdout.contains("Total unique words: 1"));
    assert!(stdout.contains("Total word occurrences: 2"));
}

#[test]
fn missing_inputs_are_skipped_with_warning() {
    let workspace = temp_workspace();
    let present = workspace.path().join("present.txt");
    fs::write(&present, "one two").expect("write input");
    let absent = workspace.path().join("absent.txt");

    let stdout = stdout_of(wordtally().arg(&present).arg(&absent), 0);
    assert!(stdout.contains("Warning: 1 file(s) not found and will be skipped."));
    assert!(stdout.contains("Total word occurrences: 2"));
}

#[test]
fn no_valid_files_exits_with_usage_code() {
    let workspace = temp_workspace();
    let stdout = stdout_of(wordtally().arg(workspace.path().join("ghost.txt")), 1);
    assert!(stdout.contains("Error: No valid files found."));

    let stdout = stdout_of(&mut wordtally(), 1);
    assert!(stdout.starts_with("Usage: wordtally"));
}

#[test]
fn malformed_bytes_are_replaced_and_counted() {
    let workspace = temp_workspace();
    let path = workspace.path().join("latin1.txt");
    fs::write(&path, b"caf\xE9 au lait and many more words").expect("write input");

    let stdout = stdout_of(wordtally().arg(&path), 0);
    assert!(!stdout.contains("Error processing file"));
    assert!(stdout.contains("Total word occurrences: 7"));
}

#[test]
fn oversized_chunk_size_is_rejected() {
    let workspace = temp_workspace();
    let path = workspace.path().join("words.txt");
    fs::write(&path, "one two").expect("write input");

    wordtally()
        .arg("--chunk-size")
        .arg(usize::MAX.to_string())
        .arg(&path)
        .assert()
        .failure();
}

#[test]
fn strict_undecodable_file_yields_partial_failure_code() {
    let workspace = temp_workspace();
    let good = workspace.path().join("good.txt");
    let bad = workspace.path().join("bad.txt");
    fs::write(&good, "kept words kept").expect("write good");
    fs::write(&bad, b"broken \xFF bytes").expect("write bad");

    let stdout = stdout_of(
        wordtally()
            .args(["--encoding", "utf8", "--strict"])
            .arg(&good)
            .arg(&bad),
        2,
    );
    assert!(stdout.contains("Error processing file"));
    assert!(stdout.contains("bad.txt"));
    assert!(stdout.contains("Total word occurrences: 3"));
}

#[test]
fn json_output_reports_ranking() {
    let workspace = temp_workspace();
    let path = workspace.path().join("ranked.txt");
    fs::write(&path, "b a b a c").expect("write input");

    let stdout = stdout_of(wordtally().args(["--json", "--top", "2"]).arg(&path), 0);
    let summary: Value = serde_json::from_str(&stdout).expect("valid JSON");
    assert_eq!(summary["unique_words"], 3);
    assert_eq!(summary["total_occurrences"], 5);
    let top = summary["top"].as_array().expect("top array");
    assert_eq!(top.len(), 2);
    assert_eq!(top[0]["word"], "a");
    assert_eq!(top[1]["word"], "b");
    assert!(summary["errors"].as_array().expect("errors").is_empty());
}

#[test]
fn directories_expand_to_their_files() {
    let workspace = temp_workspace();
    let nested = workspace.path().join("docs");
    fs::create_dir(&nested).expect("create dir");
    fs::write(nested.join("one.txt"), "red").expect("write one");
    fs::write(nested.join("two.txt"), "red blue").expect("write two");

    let stdout = stdout_of(wordtally().arg(workspace.path()), 0);
    assert!(stdout.contains("Processing 2 file(s)..."));
    assert!(stdout.contains("Total word occurrences: 3"));
}
