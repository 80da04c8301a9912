//! Scope and binding bookkeeping for early errors
//!
//! The parser keeps a stack of [`Scope`]s mirroring the nesting of blocks,
//! functions, catch clauses, loop heads and switch bodies. A scope only
//! records which names were declared and how; it is dropped as soon as the
//! construct that opened it has been parsed.

use indexmap::{IndexMap, IndexSet};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::lexer::Span;
use crate::string_dict::JsString;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Script,
    Module,
    /// Function parameters and body share one scope
    Function,
    ClassStaticBlock,
    Block,
    /// Holds the catch parameter; the catch body is a `Block` child
    Catch,
    /// `for (let ...)` head
    For,
    Switch,
}

impl ScopeKind {
    /// `var` declarations stop hoisting here
    fn is_var_boundary(self) -> bool {
        matches!(
            self,
            ScopeKind::Script | ScopeKind::Module | ScopeKind::Function | ScopeKind::ClassStaticBlock
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Var,
    Let,
    Const,
    Class,
    /// Function declaration; lexical in blocks and modules, var-like elsewhere
    Function,
    Param,
    /// `catch (e)`
    CatchParam,
    /// `catch ({ e })`
    CatchPattern,
    Import,
}

impl BindingKind {
    pub fn is_lexical(self) -> bool {
        matches!(
            self,
            BindingKind::Let | BindingKind::Const | BindingKind::Class | BindingKind::Import
        )
    }
}

/// The name is already bound in a way that forbids this declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redeclaration;

#[derive(Debug)]
pub struct Scope {
    kind: ScopeKind,
    /// Names declared directly in this scope
    names: FxHashMap<JsString, BindingKind>,
    /// `var` names declared in or hoisted through this scope
    hoisted: FxHashSet<JsString>,
}

impl Scope {
    fn new(kind: ScopeKind) -> Self {
        Self {
            kind,
            names: FxHashMap::default(),
            hoisted: FxHashSet::default(),
        }
    }

    /// Function declarations count as lexical in blocks and module top level
    fn function_is_lexical(&self) -> bool {
        !matches!(
            self.kind,
            ScopeKind::Script | ScopeKind::Function | ScopeKind::ClassStaticBlock
        )
    }
}

/// Stack of open scopes, innermost last
#[derive(Debug)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
    /// Exported names in declaration order
    exports: IndexSet<JsString>,
    /// Local bindings named by `export { x }`, resolved when the module ends
    export_refs: IndexMap<JsString, Span>,
}

impl ScopeStack {
    pub fn new(root: ScopeKind) -> Self {
        Self {
            scopes: vec![Scope::new(root)],
            exports: IndexSet::new(),
            export_refs: IndexMap::new(),
        }
    }

    pub fn push(&mut self, kind: ScopeKind) {
        self.scopes.push(Scope::new(kind));
    }

    /// Leave the innermost scope. The root scope stays in place.
    pub fn pop(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn current_kind(&self) -> ScopeKind {
        self.scopes.last().map_or(ScopeKind::Script, |s| s.kind)
    }

    /// Record a binding in the innermost scope. `sloppy_function_dup` permits
    /// repeated function declarations in a block (web-compatibility rule for
    /// sloppy mode).
    pub fn declare(
        &mut self,
        name: &JsString,
        kind: BindingKind,
        sloppy_function_dup: bool,
    ) -> Result<(), Redeclaration> {
        match kind {
            BindingKind::Var => self.declare_var(name),
            BindingKind::Function => {
                let lexical = self.scopes.last().is_some_and(|s| s.function_is_lexical());
                if lexical {
                    self.declare_lexical(name, kind, sloppy_function_dup)
                } else {
                    self.declare_top_level_function(name)
                }
            }
            BindingKind::Param => {
                if let Some(scope) = self.scopes.last_mut() {
                    scope.names.entry(name.clone()).or_insert(kind);
                }
                Ok(())
            }
            BindingKind::CatchParam | BindingKind::CatchPattern => {
                let Some(scope) = self.scopes.last_mut() else {
                    return Ok(());
                };
                if scope.names.contains_key(name) {
                    return Err(Redeclaration);
                }
                scope.names.insert(name.clone(), kind);
                Ok(())
            }
            _ => self.declare_lexical(name, kind, false),
        }
    }

    fn declare_lexical(
        &mut self,
        name: &JsString,
        kind: BindingKind,
        sloppy_function_dup: bool,
    ) -> Result<(), Redeclaration> {
        let len = self.scopes.len();
        let Some(scope) = self.scopes.last() else {
            return Ok(());
        };

        if let Some(existing) = scope.names.get(name) {
            let both_functions = kind == BindingKind::Function && *existing == BindingKind::Function;
            if !(both_functions && sloppy_function_dup) {
                return Err(Redeclaration);
            }
        }
        if scope.hoisted.contains(name) {
            return Err(Redeclaration);
        }

        // A catch body may not redeclare the catch parameter
        if scope.kind == ScopeKind::Block && len >= 2 {
            if let Some(parent) = self.scopes.get(len - 2) {
                if parent.kind == ScopeKind::Catch && parent.names.contains_key(name) {
                    return Err(Redeclaration);
                }
            }
        }

        if let Some(scope) = self.scopes.last_mut() {
            scope.names.insert(name.clone(), kind);
        }
        Ok(())
    }

    fn declare_top_level_function(&mut self, name: &JsString) -> Result<(), Redeclaration> {
        let Some(scope) = self.scopes.last_mut() else {
            return Ok(());
        };
        match scope.names.get(name) {
            Some(existing) if existing.is_lexical() => Err(Redeclaration),
            Some(_) => Ok(()),
            None => {
                scope.names.insert(name.clone(), BindingKind::Function);
                Ok(())
            }
        }
    }

    /// Hoist a `var` to the nearest function-like scope, checking every scope
    /// on the way for a conflicting lexical binding.
    fn declare_var(&mut self, name: &JsString) -> Result<(), Redeclaration> {
        for scope in self.scopes.iter_mut().rev() {
            match scope.names.get(name) {
                Some(BindingKind::CatchParam) if scope.kind == ScopeKind::Catch => {}
                Some(BindingKind::Function) if !scope.function_is_lexical() => {}
                Some(BindingKind::Var | BindingKind::Param) => {}
                Some(_) => return Err(Redeclaration),
                None => {}
            }
            scope.hoisted.insert(name.clone());
            if scope.kind.is_var_boundary() {
                scope.names.entry(name.clone()).or_insert(BindingKind::Var);
                break;
            }
        }
        Ok(())
    }

    /// Binding kind of `name` in the innermost scope, if declared there
    pub fn lookup_current(&self, name: &str) -> Option<BindingKind> {
        self.scopes.last().and_then(|s| s.names.get(name).copied())
    }

    /// Whether `name` is declared at the outermost (module or script) level
    pub fn is_declared_at_root(&self, name: &str) -> bool {
        self.scopes
            .first()
            .is_some_and(|s| s.names.contains_key(name) || s.hoisted.contains(name))
    }

    /// Record an exported name; each may be exported once per module.
    pub fn declare_export(&mut self, name: &JsString) -> Result<(), Redeclaration> {
        if self.exports.insert(name.clone()) {
            Ok(())
        } else {
            Err(Redeclaration)
        }
    }

    /// Remember a local name used by an export clause without `from`
    pub fn reference_export(&mut self, name: &JsString, span: Span) {
        self.export_refs.entry(name.clone()).or_insert(span);
    }

    /// First export reference that names no top-level binding
    pub fn unresolved_export(&self) -> Option<(&JsString, Span)> {
        self.export_refs
            .iter()
            .find(|(name, _)| !self.is_declared_at_root(name.as_str()))
            .map(|(name, span)| (name, *span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(name: &str) -> JsString {
        JsString::from(name)
    }

    #[test]
    fn test_let_conflicts_with_let() {
        let mut scopes = ScopeStack::new(ScopeKind::Script);
        assert!(scopes.declare(&s("a"), BindingKind::Let, false).is_ok());
        assert_eq!(scopes.declare(&s("a"), BindingKind::Let, false), Err(Redeclaration));
    }

    #[test]
    fn test_var_and_let_conflict_both_orders() {
        let mut scopes = ScopeStack::new(ScopeKind::Script);
        assert!(scopes.declare(&s("a"), BindingKind::Var, false).is_ok());
        assert!(scopes.declare(&s("a"), BindingKind::Let, false).is_err());

        let mut scopes = ScopeStack::new(ScopeKind::Script);
        assert!(scopes.declare(&s("b"), BindingKind::Let, false).is_ok());
        assert!(scopes.declare(&s("b"), BindingKind::Var, false).is_err());
    }

    #[test]
    fn test_var_hoists_through_blocks() {
        let mut scopes = ScopeStack::new(ScopeKind::Script);
        scopes.push(ScopeKind::Block);
        assert!(scopes.declare(&s("x"), BindingKind::Var, false).is_ok());
        scopes.pop();
        assert!(scopes.is_declared_at_root("x"));
        assert!(scopes.declare(&s("x"), BindingKind::Let, false).is_err());
    }

    #[test]
    fn test_var_in_block_conflicts_with_outer_let() {
        let mut scopes = ScopeStack::new(ScopeKind::Function);
        assert!(scopes.declare(&s("x"), BindingKind::Let, false).is_ok());
        scopes.push(ScopeKind::Block);
        assert!(scopes.declare(&s("x"), BindingKind::Var, false).is_err());
    }

    #[test]
    fn test_shadowing_in_nested_block_is_allowed() {
        let mut scopes = ScopeStack::new(ScopeKind::Script);
        assert!(scopes.declare(&s("x"), BindingKind::Let, false).is_ok());
        scopes.push(ScopeKind::Block);
        assert!(scopes.declare(&s("x"), BindingKind::Const, false).is_ok());
    }

    #[test]
    fn test_catch_parameter_rules() {
        let mut scopes = ScopeStack::new(ScopeKind::Script);
        scopes.push(ScopeKind::Catch);
        assert!(scopes.declare(&s("e"), BindingKind::CatchParam, false).is_ok());
        scopes.push(ScopeKind::Block);
        // catch (e) { var e } is permitted
        assert!(scopes.declare(&s("e"), BindingKind::Var, false).is_ok());
        assert!(scopes.declare(&s("e"), BindingKind::Let, false).is_err());
    }

    #[test]
    fn test_catch_pattern_blocks_var() {
        let mut scopes = ScopeStack::new(ScopeKind::Script);
        scopes.push(ScopeKind::Catch);
        assert!(scopes.declare(&s("e"), BindingKind::CatchPattern, false).is_ok());
        scopes.push(ScopeKind::Block);
        assert!(scopes.declare(&s("e"), BindingKind::Var, false).is_err());
    }

    #[test]
    fn test_block_function_duplicates() {
        let mut scopes = ScopeStack::new(ScopeKind::Script);
        scopes.push(ScopeKind::Block);
        assert!(scopes.declare(&s("f"), BindingKind::Function, true).is_ok());
        assert!(scopes.declare(&s("f"), BindingKind::Function, true).is_ok());
        assert!(scopes.declare(&s("f"), BindingKind::Function, false).is_err());
    }

    #[test]
    fn test_top_level_functions_are_var_like() {
        let mut scopes = ScopeStack::new(ScopeKind::Function);
        assert!(scopes.declare(&s("f"), BindingKind::Var, false).is_ok());
        assert!(scopes.declare(&s("f"), BindingKind::Function, false).is_ok());
        assert!(scopes.declare(&s("f"), BindingKind::Function, false).is_ok());
        assert!(scopes.declare(&s("f"), BindingKind::Let, false).is_err());
    }

    #[test]
    fn test_module_functions_are_lexical() {
        let mut scopes = ScopeStack::new(ScopeKind::Module);
        assert!(scopes.declare(&s("f"), BindingKind::Function, false).is_ok());
        assert!(scopes.declare(&s("f"), BindingKind::Var, false).is_err());
    }

    #[test]
    fn test_parameter_conflicts_with_body_let() {
        let mut scopes = ScopeStack::new(ScopeKind::Script);
        scopes.push(ScopeKind::Function);
        assert!(scopes.declare(&s("a"), BindingKind::Param, false).is_ok());
        assert!(scopes.declare(&s("a"), BindingKind::Var, false).is_ok());
        assert!(scopes.declare(&s("a"), BindingKind::Let, false).is_err());
    }

    #[test]
    fn test_duplicate_export() {
        let mut scopes = ScopeStack::new(ScopeKind::Module);
        assert!(scopes.declare_export(&s("default")).is_ok());
        assert!(scopes.declare_export(&s("x")).is_ok());
        assert_eq!(scopes.declare_export(&s("default")), Err(Redeclaration));
    }

    #[test]
    fn test_export_references_resolve_against_root() {
        let mut scopes = ScopeStack::new(ScopeKind::Module);
        scopes.reference_export(&s("later"), Span::default());
        scopes.reference_export(&s("missing"), Span::new(10, 17, 2, 9));
        assert!(scopes.declare(&s("later"), BindingKind::Const, false).is_ok());
        let unresolved = scopes.unresolved_export().map(|(name, span)| (name.to_string(), span.start));
        assert_eq!(unresolved, Some(("missing".to_string(), 10)));
    }

    #[test]
    fn test_pop_keeps_root() {
        let mut scopes = ScopeStack::new(ScopeKind::Script);
        scopes.pop();
        assert_eq!(scopes.depth(), 1);
        assert_eq!(scopes.current_kind(), ScopeKind::Script);
    }
}
