use std::fmt::Write as _;

use log::{debug, info};

use crate::ast::Node;
use crate::error::{Diagnostic, ErrorFormat};
use crate::lexer::{TokenBuffer, TokenKind};
use crate::parser::Parser;

/// What the driver does with a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Print every token, one per line.
    DumpTokens,
    /// Print the syntax tree.
    #[default]
    DumpAst,
    /// Parse only; success is silent.
    Check,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    pub mode: Mode,
    pub error_format: ErrorFormat,
}

/// Lex and parse a whole source file. The first error, lexical or
/// syntactic, is returned.
pub fn parse_source(source: &str) -> Result<Node, Diagnostic> {
    let tokens = TokenBuffer::tokenize(source)?;
    Parser::parse(tokens.as_slice())
}

/// One `line:column Kind 'lexeme'` line per token, `Eof` excluded, along
/// with every lexical diagnostic found on the way.
pub fn dump_tokens(source: &str) -> (String, Vec<Diagnostic>) {
    let (tokens, diagnostics) = TokenBuffer::scan(source);
    let mut out = String::new();

    for token in tokens.iter().filter(|t| t.kind != TokenKind::Eof) {
        // Writing into a String cannot fail.
        let _ = writeln!(out, "{}:{} {} '{}'", token.line, token.column, token.kind, token.lexeme);
    }

    (out, diagnostics)
}

pub fn dump_ast(source: &str) -> Result<String, Diagnostic> {
    parse_source(source).map(|program| program.tree().to_string())
}

/// Run one file in the selected mode. Output goes to stdout, diagnostics to
/// stderr. Returns false when the file had errors.
pub fn run(source: &str, filename: &str, options: &Options) -> bool {
    info!("compiling {} ({:?})", filename, options.mode);

    match options.mode {
        Mode::DumpTokens => {
            let (listing, diagnostics) = dump_tokens(source);
            print!("{}", listing);
            for diagnostic in &diagnostics {
                report(diagnostic, source, filename, options.error_format);
            }
            diagnostics.is_empty()
        }
        Mode::DumpAst | Mode::Check => match parse_source(source) {
            Ok(program) => {
                if options.mode == Mode::DumpAst {
                    print!("{}", program.tree());
                }
                debug!("{} nodes", program.node_count());
                true
            }
            Err(error) => {
                report(&error, source, filename, options.error_format);
                eprintln!("obsidian: parsing failed");
                false
            }
        },
    }
}

fn report(diagnostic: &Diagnostic, source: &str, filename: &str, format: ErrorFormat) {
    if let Err(error) = diagnostic.report(source, filename, format) {
        // stderr itself is gone; fall back to the one-line form.
        eprintln!("{}: {}", filename, diagnostic);
        debug!("failed to write diagnostic: {}", error);
    }
}
