//! ECMAScript parser producing an ESTree syntax tree
//!
//! # Example
//!
//! ```
//! use jsparse::{parse_script, ast::Statement};
//!
//! let program = parse_script("let answer = 6 * 7;").unwrap();
//! assert!(matches!(program.body[0], Statement::VariableDeclaration(_)));
//! ```
//!
//! The tree serializes to ESTree JSON with `serde_json`:
//!
//! ```
//! let program = jsparse::parse_script("x").unwrap();
//! let json = serde_json::to_value(&program).unwrap();
//! assert_eq!(json["type"], "Program");
//! ```

pub mod ast;
pub mod context;
pub mod error;
pub mod lexer;
pub mod options;
pub mod parser;
pub mod printer;
pub mod scope;
pub mod string_dict;

pub use ast::Program;
pub use error::{ErrorKind, ParseError};
pub use lexer::TokenRecord;
pub use options::Options;
pub use parser::Parser;

use string_dict::StringDict;

/// Parse `source` with the given options
pub fn parse(source: &str, options: &Options) -> Result<Program, ParseError> {
    let mut dict = StringDict::with_common_strings();
    Parser::new(source, options, &mut dict)?.parse_program()
}

/// Parse `source` as a classic script
pub fn parse_script(source: &str) -> Result<Program, ParseError> {
    parse(source, &Options::default())
}

/// Parse `source` with the module goal (strict, `import`/`export` allowed)
pub fn parse_module(source: &str) -> Result<Program, ParseError> {
    parse(source, &Options::new().module())
}

/// The tokens of `source` in order. Tokens are collected by the parser so
/// that `/` and `}` are scanned with their syntactic meaning.
pub fn tokenize(source: &str, options: &Options) -> Result<Vec<TokenRecord>, ParseError> {
    let options = options.clone().tokenize();
    let program = parse(source, &options)?;
    Ok(program.tokens.unwrap_or_default())
}
