use clap::Parser;
use std::io::Write;
use tempfile::NamedTempFile;

use prov_cli::tracing_config::LogFormat;
use prov_cli::{CliArgs, Outcome, OutputFormat, ProfileArg, run};
use prov_common::limits::{MAX_RESOLVE_ITERATIONS, SHALLOW_RESOLVE_DEPTH};
use prov_resolver::RecursionProfile;

const FIELD_FROM_CONSTRUCTOR: &str = r#"class C
{
    int f = 1;
    C(int x) { f = x; }
    int Read() { return f; }
}"#;

const INJECTED_REPO: &str = r#"public class Service
{
    private readonly Repo repo;
    public Service(Repo repo) { this.repo = repo; }
    public Repo Get() => repo;
}
public class Repo { }"#;

fn source_file(text: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(text.as_bytes()).expect("write source");
    file
}

fn args(file: &NamedTempFile, extra: &[&str]) -> CliArgs {
    let path = file.path().to_str().expect("utf-8 temp path");
    let mut argv = vec!["prov", path, "--no-color"];
    argv.extend_from_slice(extra);
    CliArgs::try_parse_from(argv).expect("valid arguments")
}

fn run_to_strings(args: &CliArgs) -> (Outcome, String, String) {
    let mut out: Vec<u8> = Vec::new();
    let mut err: Vec<u8> = Vec::new();
    let outcome = run(args, &mut out, &mut err).expect("run");
    (
        outcome,
        String::from_utf8(out).expect("utf-8 stdout"),
        String::from_utf8(err).expect("utf-8 stderr"),
    )
}

#[test]
fn test_json_report_lists_entries_with_positions() {
    let file = source_file(FIELD_FROM_CONSTRUCTOR);
    let args = args(&file, &["--line", "5", "--column", "25", "--format", "json"]);
    let (outcome, out, err) = run_to_strings(&args);

    assert_eq!(outcome, Outcome::Resolved);
    assert_eq!(outcome.exit_code(), 0);
    assert!(err.is_empty(), "{err}");

    let report: serde_json::Value = serde_json::from_str(&out).expect("json report");
    assert_eq!(report["expression"]["text"], "f");
    assert_eq!(report["expression"]["line"], 5);
    assert_eq!(report["expression"]["column"], 25);
    assert_eq!(
        report["entries"],
        serde_json::json!([
            { "kind": "Member", "line": 5, "column": 25, "text": "f" },
            { "kind": "Argument", "line": 4, "column": 20, "text": "x" },
            { "kind": "Injected", "line": 4, "column": 7, "text": "int x" },
        ])
    );
}

#[test]
fn test_text_report_flags_injected_values() {
    let file = source_file(INJECTED_REPO);
    let args = args(&file, &["-l", "5", "-c", "26"]);
    let (outcome, out, _) = run_to_strings(&args);

    assert_eq!(outcome, Outcome::Resolved);
    let lines: Vec<&str> = out.lines().collect();
    assert!(lines[0].starts_with("provenance of 5:26"), "{out}");
    assert!(lines[1].trim_start().starts_with("Member"), "{out}");
    assert!(lines[2].trim_start().starts_with("Argument"), "{out}");
    assert!(lines[3].trim_start().starts_with("Injected"), "{out}");
    assert!(lines[3].ends_with("Repo repo"), "{out}");
    assert_eq!(lines.last().copied(), Some("value may be injected from outside"));
}

#[test]
fn test_no_expression_at_position() {
    let file = source_file(FIELD_FROM_CONSTRUCTOR);
    let args = args(&file, &["--line", "2", "--column", "1"]);
    let (outcome, out, err) = run_to_strings(&args);

    assert_eq!(outcome, Outcome::NoExpression);
    assert_eq!(outcome.exit_code(), 1);
    assert!(out.is_empty());
    assert!(err.contains(":2:1: no expression at this position"), "{err}");
}

#[test]
fn test_parse_diagnostics_are_reported_but_do_not_stop_resolution() {
    let file = source_file(
        r#"class C
{
    int Broken() { int x = ; return 0; }
    int Read() => 42;
}"#,
    );
    let args = args(&file, &["--line", "4", "--column", "19", "--format", "json"]);
    let (outcome, out, err) = run_to_strings(&args);

    assert_eq!(outcome, Outcome::Resolved);
    assert!(err.contains(":3:"), "{err}");
    let report: serde_json::Value = serde_json::from_str(&out).expect("json report");
    assert_eq!(report["entries"][0]["kind"], "Constant");
}

#[test]
fn test_missing_file_is_an_error() {
    let args = CliArgs::try_parse_from(["prov", "/nonexistent/Missing.cs", "-l", "1", "-c", "1"])
        .expect("valid arguments");
    let error = run(&args, &mut Vec::<u8>::new(), &mut Vec::<u8>::new()).expect_err("missing file");
    assert!(error.to_string().starts_with("failed to read"), "{error}");
}

#[test]
fn test_positions_are_one_based() {
    assert!(CliArgs::try_parse_from(["prov", "A.cs", "--line", "0", "--column", "1"]).is_err());
    assert!(CliArgs::try_parse_from(["prov", "A.cs", "--line", "1", "--column", "0"]).is_err());
}

#[test]
fn test_profile_and_limit_overrides() {
    let defaults = CliArgs::try_parse_from(["prov", "A.cs", "-l", "1", "-c", "1"]).expect("args");
    assert_eq!(defaults.format, OutputFormat::Text);
    assert_eq!(defaults.profile, ProfileArg::Resolve);
    assert_eq!(defaults.resolver_options().profile, RecursionProfile::Resolve);
    assert!(!defaults.binder_options().index_external_writes);

    let shallow =
        CliArgs::try_parse_from(["prov", "A.cs", "-l", "1", "-c", "1", "--profile", "shallow"])
            .expect("args");
    assert_eq!(shallow.resolver_options().profile, RecursionProfile::Shallow);

    let limited = CliArgs::try_parse_from([
        "prov",
        "A.cs",
        "-l",
        "1",
        "-c",
        "1",
        "--profile",
        "shallow",
        "--max-iterations",
        "50",
        "--external-writes",
    ])
    .expect("args");
    assert_eq!(
        limited.resolver_options().profile,
        RecursionProfile::Custom {
            max_depth: SHALLOW_RESOLVE_DEPTH,
            max_iterations: 50,
        }
    );
    assert!(limited.binder_options().index_external_writes);

    let deep = CliArgs::try_parse_from(["prov", "A.cs", "-l", "1", "-c", "1", "--max-depth", "3"])
        .expect("args");
    assert_eq!(
        deep.resolver_options().profile,
        RecursionProfile::Custom {
            max_depth: 3,
            max_iterations: MAX_RESOLVE_ITERATIONS,
        }
    );
}

#[test]
fn test_log_format_names() {
    assert_eq!(LogFormat::parse("tree"), LogFormat::Tree);
    assert_eq!(LogFormat::parse("JSON"), LogFormat::Json);
    assert_eq!(LogFormat::parse(""), LogFormat::Text);
    assert_eq!(LogFormat::parse("pretty"), LogFormat::Text);
}
