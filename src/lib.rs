// Obsidian compiler front end
//
// Turns Obsidian source text into a syntax tree: the lexer produces a token
// buffer, the parser builds the tree, and diagnostics point back into the
// source when either stage fails.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod runner;

// Re-export commonly used items
pub use ast::{Node, TypeName};
pub use error::{Diagnostic, ErrorFormat, ErrorKind, Span};
pub use lexer::{Lexer, Token, TokenBuffer, TokenKind};
pub use parser::{BindingPower, ParseResult, Parser};

pub use runner::{parse_source, run};
