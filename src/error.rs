//! Source-context rendering for errors that point into a string

use ariadne::{Color, Label, Report, ReportKind, Source};

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// Render `message` against `source` with the offending `span` underlined
///
/// Used for errors raised while scanning template strings and field paths,
/// where the caller still has the original text at hand.
pub fn render_report(
    source: &str,
    filename: &str,
    span: Span,
    message: &str,
    label: &str,
    note: Option<&str>,
) -> String {
    let mut buf = Vec::new();
    let mut report = Report::build(ReportKind::Error, filename, span.start)
        .with_message(message)
        .with_label(
            Label::new((filename, span))
                .with_message(label)
                .with_color(Color::Red),
        );
    if let Some(note) = note {
        report = report.with_note(note);
    }
    // Writing into a Vec cannot fail
    let _ = report
        .finish()
        .write((filename, Source::from(source)), &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}
