//! Statecraft CLI library
//!
//! This module contains the core CLI logic for the Statecraft tool. Each
//! subcommand reads one document, runs one pipeline stage and writes the
//! result to a file or to standard output.

pub mod error_adapter;

mod args;
mod config;

pub use args::{Args, Command};

use std::{
    fs,
    io::{self, Write},
};

use log::{info, warn};
use serde::Serialize;

use statecraft::{
    Diagnostic, ParseError, Severity, StatecraftError, Workbench, metadata::SerializeOptions,
};
use statecraft_parser::LineIndex;

/// One diagnostic as printed by `check --json`.
#[derive(Debug, Serialize)]
struct DiagnosticReport<'a> {
    severity: &'static str,
    code: Option<&'static str>,
    message: &'a str,
    line: Option<usize>,
    column: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    related: Vec<RelatedReport<'a>>,
}

/// A secondary label, such as the first definition of a duplicated id.
#[derive(Debug, Serialize)]
struct RelatedReport<'a> {
    message: &'a str,
    line: usize,
    column: usize,
}

impl<'a> DiagnosticReport<'a> {
    fn new(diagnostic: &'a Diagnostic, index: &LineIndex<'_>) -> Self {
        let related = diagnostic
            .labels()
            .iter()
            .filter(|label| !label.is_primary())
            .map(|label| {
                let location = label.location(index);
                RelatedReport {
                    message: label.message(),
                    line: location.line,
                    column: location.column,
                }
            })
            .collect();

        Self {
            severity: match diagnostic.severity() {
                Severity::Error => "error",
                Severity::Warning => "warning",
            },
            code: diagnostic.code().map(|code| code.as_str()),
            message: diagnostic.message(),
            line: diagnostic.line(),
            column: diagnostic.column(),
            related,
        }
    }
}

/// Run the Statecraft CLI application
///
/// # Errors
///
/// Returns `StatecraftError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Documents with error diagnostics
/// - Layout errors
pub fn run(args: &Args) -> Result<(), StatecraftError> {
    info!(input_path = args.command.input(); "Processing document");

    let mut app_config = config::load_config(args.config.as_ref())?;
    if let Command::Layout {
        policy: Some(policy),
        ..
    } = &args.command
    {
        app_config = app_config.with_policy(*policy);
    }

    let source = fs::read_to_string(args.command.input())?;
    let workbench = Workbench::new(app_config);

    match &args.command {
        Command::Check { json, .. } => check(&workbench, &source, *json),
        Command::Layout { input, write, .. } => {
            if *write {
                let placed = workbench.auto_layout(&source)?;
                fs::write(input, placed)?;
                info!(output_file = input; "Layout written");
                Ok(())
            } else {
                let document = workbench.parse(&source)?;
                let metadata = workbench.metadata(&source, &document);
                let layout = workbench.layout(&document, &metadata)?;
                let json = serde_json::to_string_pretty(&layout).map_err(io::Error::from)?;
                print_output(&json)
            }
        }
        Command::Export { output, clean, .. } => {
            let options = if *clean {
                SerializeOptions::clean()
            } else {
                SerializeOptions::default()
            };
            let exported = workbench.export(&source, options.with_validate(true))?;
            match output {
                Some(output) => {
                    fs::write(output, exported)?;
                    info!(output_file = output; "Document exported successfully");
                    Ok(())
                }
                None => print_output(&exported),
            }
        }
    }
}

/// Validate `source`; error diagnostics are returned as a parse error so
/// they are rendered with the source snippet.
fn check(workbench: &Workbench, source: &str, json: bool) -> Result<(), StatecraftError> {
    let (_, diagnostics) = workbench.validate(source).into_parts();

    if json {
        let index = LineIndex::new(source);
        let reports: Vec<DiagnosticReport<'_>> = diagnostics
            .iter()
            .map(|diagnostic| DiagnosticReport::new(diagnostic, &index))
            .collect();
        let text = serde_json::to_string_pretty(&reports).map_err(io::Error::from)?;
        print_output(&text)?;
    }

    if diagnostics
        .iter()
        .any(|diagnostic| diagnostic.severity() == Severity::Error)
    {
        return Err(StatecraftError::new_parse_error(
            ParseError::new(diagnostics),
            source,
        ));
    }

    for diagnostic in &diagnostics {
        warn!(
            code:? = diagnostic.code(),
            line:? = diagnostic.line(),
            column:? = diagnostic.column();
            "{}",
            diagnostic.message()
        );
    }
    info!(warnings = diagnostics.len(); "Document is valid");
    Ok(())
}

fn print_output(text: &str) -> Result<(), StatecraftError> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.write_all(b"\n")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use statecraft::ErrorCode;

    #[test]
    fn test_report_points_at_first_definition() {
        let source = "<scxml>\n  <state id=\"s1\"/>\n  <state id=\"s1\"/>\n</scxml>";
        let (_, diagnostics) = Workbench::default().validate(source).into_parts();
        let duplicate = diagnostics
            .iter()
            .find(|diagnostic| diagnostic.code() == Some(ErrorCode::E201))
            .expect("duplicate reported");

        let index = LineIndex::new(source);
        let report = DiagnosticReport::new(duplicate, &index);
        assert_eq!(report.severity, "error");
        assert_eq!(report.line, Some(3));
        assert_eq!(report.related.len(), 1);
        assert_eq!(report.related[0].message, "first defined here");
        assert_eq!((report.related[0].line, report.related[0].column), (2, 3));

        let json = serde_json::to_value(&report).expect("serializable");
        assert_eq!(json["related"][0]["line"], 2);
    }

    #[test]
    fn test_report_omits_empty_related() {
        let diagnostic = Diagnostic::warning("document has no states");
        let index = LineIndex::new("");
        let json = serde_json::to_value(DiagnosticReport::new(&diagnostic, &index))
            .expect("serializable");
        assert!(json.get("related").is_none());
        assert_eq!(json["severity"], "warning");
    }
}
