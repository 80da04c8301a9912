//! Grammar context and session flags
//!
//! [`Context`] is the parameterised-production state (`[In]`, `[Yield]`,
//! `[Await]`, strictness, ...). It is `Copy`, passed by value to every parse
//! function and modified only on the way down, so a callee never has to
//! restore anything.
//!
//! [`Flags`] is the opposite: a small bitset on the parser session that inner
//! productions set and an enclosing production reads back once it knows what
//! the construct actually was. Each bit is claimed by one disambiguation point:
//!
//! | bit              | set by                                 | claimed by                              |
//! |------------------|----------------------------------------|-----------------------------------------|
//! | `NEW_LINE`       | token-stream adapter on every advance  | ASI, restricted productions             |
//! | `SEEN_YIELD`     | `yield` expression                     | arrow parameter reinterpretation        |
//! | `SEEN_AWAIT`     | `await` expression                     | arrow parameter reinterpretation        |
//! | `AWAIT_IDENT`    | `await` used as an identifier          | async arrow parameter reinterpretation  |
//! | `COVER_INIT`     | `{ a = 1 }` shorthand initialiser      | assignment / arrow / for-in-of patterns |
//! | `DUPLICATE_PROTO`| second `__proto__: v` in one literal   | assignment / arrow / for-in-of patterns |
//! | `OCTAL`          | legacy octal literal or escape         | directive prologue (`"use strict"`)     |
//! | `IN_ITERATION`   | loop bodies                            | `break` / `continue`                    |
//! | `IN_SWITCH`      | switch case blocks                     | `break`                                 |

use bitflags::bitflags;

use crate::options::Options;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Context: u32 {
        const STRICT = 1 << 0;
        const MODULE = 1 << 1;
        /// `[In]`: the `in` operator is a relational operator here
        const ALLOW_IN = 1 << 2;
        /// `[Yield]`: inside a generator body
        const YIELD = 1 << 3;
        /// `[Await]`: inside an async body (or module top level with `next`)
        const AWAIT = 1 << 4;
        const IN_PARAMETERS = 1 << 5;
        const IN_PARENTHESIS = 1 << 6;
        const SUPER_PROPERTY = 1 << 7;
        const SUPER_CALL = 1 << 8;
        const DISALLOW_ESCAPED_KEYWORD = 1 << 9;
        /// `return` is legal
        const RETURN = 1 << 10;
        /// `new.target` is legal
        const NEW_TARGET = 1 << 11;
        const IN_CLASS = 1 << 12;
        const IN_FUNCTION = 1 << 13;
        /// Parsing the operand of a tag, invalid escapes are tolerated
        const TAGGED_TEMPLATE = 1 << 14;

        const OPTION_NEXT = 1 << 20;
        const OPTION_JSX = 1 << 21;
        const OPTION_RAW = 1 << 22;
        const OPTION_RANGES = 1 << 23;
        const OPTION_LOC = 1 << 24;
        const OPTION_EXPERIMENTAL = 1 << 25;
        const OPTION_TOKENIZE = 1 << 26;
        const OPTION_GLOBAL_RETURN = 1 << 27;

        /// Bits reset at every function boundary
        const FUNCTION_BOUNDARY = Self::YIELD.bits()
            | Self::AWAIT.bits()
            | Self::IN_PARAMETERS.bits()
            | Self::IN_PARENTHESIS.bits()
            | Self::SUPER_PROPERTY.bits()
            | Self::SUPER_CALL.bits()
            | Self::TAGGED_TEMPLATE.bits();
    }
}

impl Context {
    /// Initial context for a source unit
    pub fn from_options(options: &Options) -> Self {
        let mut ctx = Context::ALLOW_IN;
        if options.module {
            ctx |= Context::MODULE | Context::STRICT;
            if options.next {
                ctx |= Context::AWAIT;
            }
        }
        if options.implied_strict {
            ctx |= Context::STRICT;
        }
        if options.global_return {
            ctx |= Context::RETURN | Context::OPTION_GLOBAL_RETURN;
        }
        ctx.set(Context::OPTION_NEXT, options.next);
        ctx.set(Context::OPTION_JSX, options.jsx);
        ctx.set(Context::OPTION_RAW, options.raw);
        ctx.set(Context::OPTION_RANGES, options.ranges);
        ctx.set(Context::OPTION_LOC, options.loc);
        ctx.set(Context::OPTION_EXPERIMENTAL, options.experimental);
        ctx.set(Context::OPTION_TOKENIZE, options.tokenize);
        ctx
    }

    #[inline]
    pub fn is_strict(self) -> bool {
        self.contains(Self::STRICT)
    }

    #[inline]
    pub fn is_module(self) -> bool {
        self.contains(Self::MODULE)
    }

    #[inline]
    pub fn has_in(self) -> bool {
        self.contains(Self::ALLOW_IN)
    }

    #[inline]
    pub fn has_yield(self) -> bool {
        self.contains(Self::YIELD)
    }

    #[inline]
    pub fn has_await(self) -> bool {
        self.contains(Self::AWAIT)
    }

    #[inline]
    pub fn has_next(self) -> bool {
        self.contains(Self::OPTION_NEXT)
    }

    #[inline]
    pub fn has_experimental(self) -> bool {
        self.contains(Self::OPTION_EXPERIMENTAL)
    }

    /// Derive a copy with `flags` set or cleared according to `include`
    #[inline]
    pub fn with(self, flags: Context, include: bool) -> Self {
        if include { self | flags } else { self - flags }
    }

    #[inline]
    pub fn with_in(self) -> Self {
        self | Self::ALLOW_IN
    }

    #[inline]
    pub fn without_in(self) -> Self {
        self - Self::ALLOW_IN
    }

    /// Context for a new (non-arrow) function body and its parameters
    pub fn enter_function(self, is_async: bool, is_generator: bool) -> Self {
        (self - Self::FUNCTION_BOUNDARY)
            .with(Self::AWAIT, is_async)
            .with(Self::YIELD, is_generator)
            | Self::RETURN
            | Self::NEW_TARGET
            | Self::IN_FUNCTION
            | Self::ALLOW_IN
    }

    /// Context for an arrow function body: `this`, `super` and `new.target`
    /// are inherited, `yield` is not.
    pub fn enter_arrow(self, is_async: bool) -> Self {
        (self - (Self::YIELD | Self::AWAIT | Self::IN_PARAMETERS | Self::IN_PARENTHESIS))
            .with(Self::AWAIT, is_async)
            | Self::RETURN
            | Self::IN_FUNCTION
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Flags: u32 {
        const NEW_LINE = 1 << 0;
        const SEEN_YIELD = 1 << 1;
        const SEEN_AWAIT = 1 << 2;
        const AWAIT_IDENT = 1 << 3;
        const COVER_INIT = 1 << 4;
        const DUPLICATE_PROTO = 1 << 5;
        const OCTAL = 1 << 6;
        const IN_ITERATION = 1 << 7;
        const IN_SWITCH = 1 << 8;

        /// Flags that describe a possibly-reinterpreted expression
        const COVER = Self::SEEN_YIELD.bits()
            | Self::SEEN_AWAIT.bits()
            | Self::AWAIT_IDENT.bits()
            | Self::COVER_INIT.bits()
            | Self::DUPLICATE_PROTO.bits();

        /// Flags that describe the enclosing statement nesting
        const NESTING = Self::IN_ITERATION.bits() | Self::IN_SWITCH.bits();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_implies_strict() {
        let ctx = Context::from_options(&Options::new().module());
        assert!(ctx.is_strict());
        assert!(ctx.is_module());
        assert!(!ctx.has_await());
    }

    #[test]
    fn test_module_next_allows_top_level_await() {
        let ctx = Context::from_options(&Options::new().module().next());
        assert!(ctx.has_await());
    }

    #[test]
    fn test_enter_function_resets_boundary_bits() {
        let outer = Context::ALLOW_IN | Context::YIELD | Context::SUPER_CALL;
        let inner = outer.without_in().enter_function(true, false);
        assert!(inner.has_await());
        assert!(!inner.has_yield());
        assert!(!inner.contains(Context::SUPER_CALL));
        assert!(inner.has_in());
        assert!(inner.contains(Context::RETURN | Context::NEW_TARGET));
    }

    #[test]
    fn test_enter_arrow_inherits_super() {
        let outer = Context::SUPER_PROPERTY | Context::NEW_TARGET | Context::YIELD;
        let inner = outer.enter_arrow(false);
        assert!(inner.contains(Context::SUPER_PROPERTY | Context::NEW_TARGET));
        assert!(!inner.has_yield());
    }
}
