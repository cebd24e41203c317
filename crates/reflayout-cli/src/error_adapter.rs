//! Converts a [`ReflayoutError`] into miette reports for the CLI.
//!
//! A [`ReflayoutError::Parse`] yields one report per diagnostic, each
//! pointing into the template text. Other errors yield a single report.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, Severity, SourceSpan};

use reflayout::ReflayoutError;
use reflayout_parser::{Span, error::Diagnostic};

/// A single report that miette can render.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A template diagnostic and the template text it points into.
    Diagnostic { diag: &'a Diagnostic, src: &'a str },
    /// An error without source location.
    Error(&'a ReflayoutError),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Diagnostic { diag, .. } => f.write_str(diag.message()),
            Reportable::Error(err) => fmt::Display::fmt(err, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic { diag, .. } => {
                diag.code().map(|c| Box::new(c) as Box<dyn fmt::Display>)
            }
            Reportable::Error(err) => {
                error_code(err).map(|c| Box::new(c) as Box<dyn fmt::Display>)
            }
        }
    }

    fn severity(&self) -> Option<Severity> {
        match self {
            Reportable::Diagnostic { diag, .. } if diag.severity().is_warning() => {
                Some(Severity::Warning)
            }
            _ => Some(Severity::Error),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help: &'a str = match self {
            Reportable::Diagnostic { diag, .. } => diag.help()?,
            Reportable::Error(err) => error_help(err)?,
        };
        Some(Box::new(help))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Diagnostic { src, .. } => Some(src as &dyn miette::SourceCode),
            Reportable::Error(_) => None,
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let Reportable::Diagnostic { diag, .. } = self else {
            return None;
        };
        if diag.labels().is_empty() {
            return None;
        }

        Some(Box::new(diag.labels().iter().map(|label| {
            let span = span_to_miette(label.span());
            let message = Some(label.message().to_string());
            if label.is_primary() {
                LabeledSpan::new_primary_with_span(message, span)
            } else {
                LabeledSpan::new_with_span(message, span)
            }
        })))
    }
}

fn error_code(err: &ReflayoutError) -> Option<&'static str> {
    let code = match err {
        ReflayoutError::Io(_) => "reflayout::io",
        ReflayoutError::Template { .. } => "reflayout::template",
        ReflayoutError::Parse { .. } => return None,
        ReflayoutError::Render(_) => "reflayout::render",
        ReflayoutError::Config(_) | ReflayoutError::PostFormatterAlreadySet => "reflayout::config",
        ReflayoutError::Entries(_) => "reflayout::entries",
    };
    Some(code)
}

fn error_help(err: &ReflayoutError) -> Option<&'static str> {
    match err {
        ReflayoutError::Template { .. } => {
            Some("check --layout-dir and --name; `<name>.layout` must exist")
        }
        ReflayoutError::Render(_) => Some(
            "`\\encoding`, `\\filename` and `\\filepath` belong in begin and end layouts, \
             fields and blocks in entry layouts",
        ),
        _ => None,
    }
}

fn span_to_miette(span: Span) -> SourceSpan {
    SourceSpan::new(span.start().into(), span.len())
}

/// Convert a [`ReflayoutError`] into the reports to render, one per
/// diagnostic for a parse error.
pub fn to_reportables(err: &ReflayoutError) -> Vec<Reportable<'_>> {
    match err {
        ReflayoutError::Parse { err: parse_err, src } => parse_err
            .diagnostics()
            .iter()
            .map(|diag| Reportable::Diagnostic {
                diag,
                src: src.as_str(),
            })
            .collect(),
        _ => vec![Reportable::Error(err)],
    }
}

#[cfg(test)]
mod tests {
    use reflayout::RenderError;
    use reflayout_parser::{ErrorCode, ParseError};

    use super::*;

    #[test]
    fn test_single_diagnostic() {
        let diag = Diagnostic::error("empty command name")
            .with_code(ErrorCode::E001)
            .with_label(Span::new(6..7), "here")
            .with_help("write `\\\\` for a literal backslash");
        let err = ReflayoutError::new_parse_error(ParseError::from(diag), "Cost: \\$5");

        let reportables = to_reportables(&err);
        assert_eq!(reportables.len(), 1);
        assert!(matches!(reportables[0], Reportable::Diagnostic { .. }));
        assert_eq!(reportables[0].to_string(), "empty command name");
        assert_eq!(
            reportables[0].code().map(|c| c.to_string()).as_deref(),
            Some("E001")
        );
        assert!(reportables[0].source_code().is_some());
    }

    #[test]
    fn test_multiple_diagnostics() {
        let diags = vec![
            Diagnostic::error("first error").with_label(Span::new(0..5), "first"),
            Diagnostic::error("second error")
                .with_label(Span::new(10..15), "second")
                .with_help("help for second"),
        ];
        let err = ReflayoutError::new_parse_error(ParseError::new(diags), "source code here...");

        let reportables = to_reportables(&err);
        assert_eq!(reportables.len(), 2);
        assert_eq!(reportables[0].to_string(), "first error");
        assert_eq!(reportables[1].to_string(), "second error");
        assert!(reportables[0].help().is_none());
        assert_eq!(
            reportables[1].help().map(|h| h.to_string()).as_deref(),
            Some("help for second")
        );
    }

    #[test]
    fn test_non_parse_error() {
        let err = ReflayoutError::Render(RenderError::DatabaseMarkerInEntry {
            marker: "\\encoding",
        });

        let reportables = to_reportables(&err);
        assert_eq!(reportables.len(), 1);
        let report = &reportables[0];
        assert!(matches!(report, Reportable::Error(_)));
        assert_eq!(
            report.to_string(),
            "Render error: `\\encoding` is only available in begin and end layouts"
        );
        assert_eq!(
            report.code().map(|c| c.to_string()).as_deref(),
            Some("reflayout::render")
        );
        assert!(report.help().is_some());
        assert!(report.source_code().is_none());
        assert!(report.labels().is_none());
    }

    #[test]
    fn test_labels_keep_primary_flag() {
        let diag = Diagnostic::error("error with labels")
            .with_label(Span::new(0..5), "primary")
            .with_secondary_label(Span::new(10..15), "secondary");
        let report = Reportable::Diagnostic {
            diag: &diag,
            src: "some source code",
        };

        let labels: Vec<_> = report.labels().expect("labels").collect();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0].label(), Some("primary"));
        assert!(labels[0].primary());
        assert!(!labels[1].primary());
    }

    #[test]
    fn test_warning_severity() {
        let diag = Diagnostic::warning("unknown formatter").with_code(ErrorCode::W200);
        let report = Reportable::Diagnostic { diag: &diag, src: "" };
        assert_eq!(report.severity(), Some(Severity::Warning));

        let diag = Diagnostic::error("empty command name");
        let report = Reportable::Diagnostic { diag: &diag, src: "" };
        assert_eq!(report.severity(), Some(Severity::Error));
    }
}
