//! Parser configuration
//!
//! `Options` can be built in code or loaded from a JSON config file:
//!
//! ```
//! use jsparse::Options;
//!
//! let opts = Options::from_json(r#"{ "module": true, "ranges": true }"#).unwrap();
//! assert!(opts.module);
//! assert_eq!(opts.max_depth, 48);
//! ```

use serde::Deserialize;

use crate::error::{ErrorKind, ParseError};

/// Default nesting limit for expressions, statements, functions and classes.
/// A parenthesised or bracketed level costs over 20 KiB of stack in
/// unoptimized builds; the default leaves headroom inside a 2 MiB thread stack.
pub const DEFAULT_MAX_DEPTH: u32 = 48;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Options {
    /// Parse with the Module goal (implies strict mode)
    pub module: bool,
    /// Enable staged grammar: class fields, private names, static blocks,
    /// numeric separators, BigInt literals, top-level await
    pub next: bool,
    /// Reserve JSX syntax for an extension grammar
    pub jsx: bool,
    /// Keep the raw source text of literals and identifiers
    pub raw: bool,
    /// Emit `start`/`end` offsets on every node
    pub ranges: bool,
    /// Emit `loc` line/column information on every node
    pub loc: bool,
    /// Treat the whole source as strict code
    pub implied_strict: bool,
    /// Permit `return` at the top level
    pub global_return: bool,
    /// Enable decorators and `do` expressions
    pub experimental: bool,
    /// Collect the token list alongside the tree
    pub tokenize: bool,
    /// Maximum nesting depth before the parse is aborted
    pub max_depth: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            module: false,
            next: false,
            jsx: false,
            raw: false,
            ranges: false,
            loc: false,
            implied_strict: false,
            global_return: false,
            experimental: false,
            tokenize: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from a JSON object; unknown keys are rejected.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn module(mut self) -> Self {
        self.module = true;
        self
    }

    pub fn next(mut self) -> Self {
        self.next = true;
        self
    }

    pub fn jsx(mut self) -> Self {
        self.jsx = true;
        self
    }

    pub fn raw(mut self) -> Self {
        self.raw = true;
        self
    }

    pub fn ranges(mut self) -> Self {
        self.ranges = true;
        self
    }

    pub fn loc(mut self) -> Self {
        self.loc = true;
        self
    }

    pub fn implied_strict(mut self) -> Self {
        self.implied_strict = true;
        self
    }

    pub fn global_return(mut self) -> Self {
        self.global_return = true;
        self
    }

    pub fn experimental(mut self) -> Self {
        self.experimental = true;
        self
    }

    pub fn tokenize(mut self) -> Self {
        self.tokenize = true;
        self
    }

    pub fn max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    /// Reject combinations the parser cannot honour.
    pub(crate) fn validate(&self) -> Result<(), ParseError> {
        if self.max_depth == 0 {
            return Err(ParseError::new(ErrorKind::NestingTooDeep, &["0"], 0, 1, 0));
        }
        Ok(())
    }
}
