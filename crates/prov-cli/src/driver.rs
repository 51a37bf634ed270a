//! Parse, bind, resolve and report.

use anyhow::{Context, Result};
use colored::{ColoredString, Colorize};
use serde::Serialize;
use std::io::Write;
use tracing::{Level, info, span};

use prov_binder::BinderState;
use prov_common::{CancellationToken, Position};
use prov_resolver::{Provenance, ProvenanceResolver, SourceKind};
use prov_syntax::{NodeIndex, SyntaxTree};

use crate::args::{CliArgs, OutputFormat};

/// Longest snippet printed in text output, in characters.
const SNIPPET_WIDTH: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Resolved,
    /// Nothing at the requested position is an expression.
    NoExpression,
}

impl Outcome {
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Resolved => 0,
            Self::NoExpression => 1,
        }
    }
}

#[derive(Serialize)]
struct Report<'t> {
    file: String,
    expression: Location<'t>,
    entries: Vec<ReportEntry<'t>>,
}

#[derive(Serialize)]
struct ReportEntry<'t> {
    kind: SourceKind,
    #[serde(flatten)]
    location: Location<'t>,
}

#[derive(Serialize)]
struct Location<'t> {
    line: u32,
    column: u32,
    text: &'t str,
}

impl<'t> Location<'t> {
    fn of(tree: &'t SyntaxTree, node: NodeIndex) -> Self {
        let Position { line, character } = tree.position(node);
        Location {
            line: line + 1,
            column: character + 1,
            text: tree.text(node),
        }
    }
}

/// Run one query. The report goes to `out`; parse diagnostics and the
/// "no expression" notice go to `err`.
pub fn run(args: &CliArgs, out: &mut dyn Write, err: &mut dyn Write) -> Result<Outcome> {
    if args.no_color {
        colored::control::set_override(false);
    }

    let source = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let tree = SyntaxTree::parse(source)
        .with_context(|| format!("failed to parse {}", args.file.display()))?;
    for diagnostic in tree.diagnostics() {
        let position = tree
            .line_map()
            .offset_to_position(diagnostic.span.start, tree.source());
        writeln!(
            err,
            "{}:{}:{}: {}",
            args.file.display(),
            position.line + 1,
            position.character + 1,
            diagnostic.message
        )?;
    }

    let position = Position::new(args.line - 1, args.column - 1);
    let Some(expression) = tree.expression_at(position) else {
        writeln!(
            err,
            "{}:{}:{}: no expression at this position",
            args.file.display(),
            args.line,
            args.column
        )?;
        return Ok(Outcome::NoExpression);
    };

    let binder = BinderState::bind_tree_with_options(&tree, args.binder_options());
    let resolver = ProvenanceResolver::with_options(&binder, args.resolver_options());
    let token = CancellationToken::new();

    let span = span!(Level::INFO, "query", line = args.line, column = args.column);
    let _enter = span.enter();
    let provenance = resolver
        .resolve(expression, &token)
        .with_context(|| format!("resolving `{}`", tree.text(expression)))?;
    info!(entries = provenance.len(), "resolved");

    match args.format {
        OutputFormat::Text => write_text(out, &tree, expression, &provenance)?,
        OutputFormat::Json => write_json(out, args, &tree, expression, &provenance)?,
    }
    Ok(Outcome::Resolved)
}

fn write_text(
    out: &mut dyn Write,
    tree: &SyntaxTree,
    expression: NodeIndex,
    provenance: &Provenance,
) -> Result<()> {
    let head = Location::of(tree, expression);
    writeln!(
        out,
        "{} {}:{}  {}",
        "provenance of".bold(),
        head.line,
        head.column,
        snippet(head.text)
    )?;
    for entry in provenance {
        let location = Location::of(tree, entry.node);
        writeln!(
            out,
            "  {} {:>4}:{:<4} {}",
            paint(entry.kind),
            location.line,
            location.column,
            snippet(location.text)
        )?;
    }
    if provenance.is_locally_created() {
        writeln!(out, "{}", "value is created locally".green())?;
    } else if provenance.any_injected() {
        writeln!(out, "{}", "value may be injected from outside".red())?;
    }
    Ok(())
}

fn write_json(
    out: &mut dyn Write,
    args: &CliArgs,
    tree: &SyntaxTree,
    expression: NodeIndex,
    provenance: &Provenance,
) -> Result<()> {
    let report = Report {
        file: args.file.display().to_string(),
        expression: Location::of(tree, expression),
        entries: provenance
            .iter()
            .map(|entry| ReportEntry {
                kind: entry.kind,
                location: Location::of(tree, entry.node),
            })
            .collect(),
    };
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}

fn paint(kind: SourceKind) -> ColoredString {
    // Pad before coloring so escape codes don't count toward the width.
    let label = format!("{:<20}", kind.as_str());
    match kind {
        SourceKind::Constant | SourceKind::Created | SourceKind::Cached => label.green(),
        SourceKind::Injected | SourceKind::PotentiallyInjected => label.red().bold(),
        SourceKind::External | SourceKind::Unknown => label.yellow(),
        SourceKind::Recursion => label.dimmed(),
        _ => label.cyan(),
    }
}

/// First line of `text`, cut to [`SNIPPET_WIDTH`] characters.
fn snippet(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default().trim();
    if line.chars().count() <= SNIPPET_WIDTH && !text.trim().contains('\n') {
        return line.to_string();
    }
    let cut: String = line.chars().take(SNIPPET_WIDTH).collect();
    format!("{cut}...")
}
