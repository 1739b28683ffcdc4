use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use std::fmt;
use std::io::{self, Write};
use thiserror::Error;

use crate::lexer::Token;

/// Byte range into the source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn single(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos + 1,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lexical,
    Syntax,
    /// Reserved for a type-checking stage; the front end never produces it.
    Semantic,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Lexical => "Lexical Error",
            ErrorKind::Syntax => "Syntax Error",
            ErrorKind::Semantic => "Semantic Error",
        }
    }

    fn color(&self) -> Color {
        match self {
            ErrorKind::Lexical => Color::Red,
            ErrorKind::Syntax => Color::Yellow,
            ErrorKind::Semantic => Color::Magenta,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How diagnostics are written to standard error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ErrorFormat {
    /// `file:line:col` header, source line and caret
    #[default]
    Plain,
    /// Colored report rendered by ariadne
    Pretty,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}: {message}")]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub span: Span,
    pub line: usize,
    pub column: usize,
    pub message: String,
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn new(
        kind: ErrorKind,
        span: Span,
        line: usize,
        column: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            span,
            line,
            column,
            message: message.into(),
            help: None,
        }
    }

    /// A diagnostic located at `token`.
    pub fn at(kind: ErrorKind, token: &Token<'_>, message: impl Into<String>) -> Self {
        Self::new(kind, token.span, token.line, token.column, message)
    }

    pub fn syntax_error(token: &Token<'_>, message: impl Into<String>) -> Self {
        Self::at(ErrorKind::Syntax, token, message)
    }

    pub fn syntax_error_with_help(
        token: &Token<'_>,
        message: impl Into<String>,
        help: impl Into<String>,
    ) -> Self {
        Self::syntax_error(token, message).with_help(help)
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Render the plain form: a `file:line:col` header, the full source line
    /// and a caret under the offending column.
    pub fn render(&self, source: &str, filename: &str) -> String {
        let start = floor_char_boundary(source, self.span.start);
        let line_start = source[..start].rfind('\n').map_or(0, |i| i + 1);
        let line_end = source[start..]
            .find('\n')
            .map_or(source.len(), |i| start + i);
        let text = source[line_start..line_end].trim_end_matches('\r');

        // Tabs are copied so the caret lines up however the terminal expands them.
        let alignment: String = source[line_start..start]
            .chars()
            .map(|c| if c == '\t' { '\t' } else { ' ' })
            .collect();

        let gutter = self.line.to_string();
        let pad = " ".repeat(gutter.len());

        let mut out = format!("{}:{}:{}: {}\n", filename, self.line, self.column, self);
        out.push_str(&format!("    {} | {}\n", gutter, text));
        out.push_str(&format!("    {} | {}^\n", pad, alignment));
        if let Some(ref help) = self.help {
            out.push_str(&format!("    {} = help: {}\n", pad, help));
        }
        out
    }

    pub fn report(&self, source: &str, filename: &str, format: ErrorFormat) -> io::Result<()> {
        match format {
            ErrorFormat::Plain => io::stderr().write_all(self.render(source, filename).as_bytes()),
            ErrorFormat::Pretty => self.write_pretty(source, filename, io::stderr()),
        }
    }

    /// Write the colored ariadne report to `out`.
    pub fn write_pretty<W: Write>(&self, source: &str, filename: &str, out: W) -> io::Result<()> {
        let color = self.kind.color();

        // ariadne positions are character indices; spans are bytes.
        let start = char_offset(source, self.span.start);
        let end = char_offset(source, self.span.end).max(start);

        let mut report_builder = Report::build(ReportKind::Error, filename, start)
            .with_message(format!("{}: {}", self.kind.fg(color), self.message))
            .with_label(
                Label::new((filename, start..end))
                    .with_message(&self.message)
                    .with_color(color),
            );

        if let Some(ref help_text) = self.help {
            report_builder =
                report_builder.with_note(format!("{}: {}", "help".fg(Color::Cyan), help_text));
        }

        report_builder
            .finish()
            .write((filename, Source::from(source)), out)
    }
}

/// `byte` clamped to the source and moved back onto a char boundary.
fn floor_char_boundary(source: &str, byte: usize) -> usize {
    let mut byte = byte.min(source.len());
    while !source.is_char_boundary(byte) {
        byte -= 1;
    }
    byte
}

fn char_offset(source: &str, byte: usize) -> usize {
    source[..floor_char_boundary(source, byte)].chars().count()
}
