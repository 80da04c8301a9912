//! Source code generator for the ESTree [`Program`]
//!
//! Output is not a pretty-printer: it keeps no comments or original
//! formatting. Parentheses are inserted from operator precedence wherever the
//! tree would otherwise re-parse differently, so that printing and parsing
//! again yields the same tree apart from positions.

use crate::ast::*;

// Binding power of an expression's outermost operator
const SEQUENCE: u8 = 0;
const ASSIGN: u8 = 1;
const CONDITIONAL: u8 = 2;
/// Binary and logical operators sit at `BINARY_BASE + precedence()`
const BINARY_BASE: u8 = 2;
const UNARY: u8 = 15;
const POSTFIX: u8 = 16;
const NEW_NO_ARGS: u8 = 17;
const CALL: u8 = 18;
const MEMBER: u8 = 19;
const PRIMARY: u8 = 20;

/// Print a program as JavaScript source
pub fn print(program: &Program) -> String {
    let mut printer = Printer::default();
    printer.statements(&program.body);
    printer.out
}

#[derive(Default)]
struct Printer {
    out: String,
    indent: usize,
    /// Inside a `for` head, where a bare `in` would end the initialiser
    no_in: bool,
}

impl Printer {
    fn push(&mut self, s: impl AsRef<str>) {
        self.out.push_str(s.as_ref());
    }

    fn newline(&mut self) {
        self.out.push('\n');
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
    }

    fn comma_list<T>(&mut self, items: &[T], mut f: impl FnMut(&mut Self, &T)) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            f(self, item);
        }
    }

    // ============ STATEMENTS ============

    fn statements(&mut self, body: &[Statement]) {
        for (i, stmt) in body.iter().enumerate() {
            if i > 0 {
                self.newline();
            }
            self.statement(stmt);
        }
    }

    fn block(&mut self, body: &[Statement]) {
        if body.is_empty() {
            self.push("{}");
            return;
        }
        self.push("{");
        self.indent += 1;
        self.newline();
        self.statements(body);
        self.indent -= 1;
        self.newline();
        self.push("}");
    }

    fn statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::VariableDeclaration(decl) => {
                self.variable_declaration(decl);
                self.push(";");
            }
            Statement::FunctionDeclaration(function) => self.function(function),
            Statement::ClassDeclaration(class) => self.class(class),
            Statement::Block(block) => self.block(&block.body),
            Statement::If(s) => {
                self.push("if (");
                self.expression(&s.test, SEQUENCE);
                self.push(") ");
                self.statement(&s.consequent);
                if let Some(alternate) = &s.alternate {
                    self.push(" else ");
                    self.statement(alternate);
                }
            }
            Statement::Switch(s) => {
                self.push("switch (");
                self.expression(&s.discriminant, SEQUENCE);
                self.push(") {");
                self.indent += 1;
                for case in &s.cases {
                    self.newline();
                    match &case.test {
                        Some(test) => {
                            self.push("case ");
                            self.expression(test, SEQUENCE);
                            self.push(":");
                        }
                        None => self.push("default:"),
                    }
                    self.indent += 1;
                    for stmt in &case.consequent {
                        self.newline();
                        self.statement(stmt);
                    }
                    self.indent -= 1;
                }
                self.indent -= 1;
                self.newline();
                self.push("}");
            }
            Statement::For(s) => {
                self.push("for (");
                self.no_in = true;
                match &s.init {
                    Some(ForInit::Variable(decl)) => self.variable_declaration(decl),
                    Some(ForInit::Expression(expr)) => self.expression(expr, SEQUENCE),
                    None => {}
                }
                self.no_in = false;
                self.push(";");
                if let Some(test) = &s.test {
                    self.push(" ");
                    self.expression(test, SEQUENCE);
                }
                self.push(";");
                if let Some(update) = &s.update {
                    self.push(" ");
                    self.expression(update, SEQUENCE);
                }
                self.push(") ");
                self.statement(&s.body);
            }
            Statement::ForIn(s) => {
                self.push("for (");
                self.for_target(&s.left);
                self.push(" in ");
                self.expression(&s.right, SEQUENCE);
                self.push(") ");
                self.statement(&s.body);
            }
            Statement::ForOf(s) => {
                self.push(if s.is_await { "for await (" } else { "for (" });
                self.for_target(&s.left);
                self.push(" of ");
                self.expression(&s.right, ASSIGN);
                self.push(") ");
                self.statement(&s.body);
            }
            Statement::While(s) => {
                self.push("while (");
                self.expression(&s.test, SEQUENCE);
                self.push(") ");
                self.statement(&s.body);
            }
            Statement::DoWhile(s) => {
                self.push("do ");
                self.statement(&s.body);
                self.push(" while (");
                self.expression(&s.test, SEQUENCE);
                self.push(");");
            }
            Statement::Try(s) => {
                self.push("try ");
                self.block(&s.block.body);
                if let Some(handler) = &s.handler {
                    self.push(" catch ");
                    if let Some(param) = &handler.param {
                        self.push("(");
                        self.pattern(param);
                        self.push(") ");
                    }
                    self.block(&handler.body.body);
                }
                if let Some(finalizer) = &s.finalizer {
                    self.push(" finally ");
                    self.block(&finalizer.body);
                }
            }
            Statement::With(s) => {
                self.push("with (");
                self.expression(&s.object, SEQUENCE);
                self.push(") ");
                self.statement(&s.body);
            }
            Statement::Return(s) => {
                self.push("return");
                if let Some(argument) = &s.argument {
                    self.push(" ");
                    self.expression(argument, SEQUENCE);
                }
                self.push(";");
            }
            Statement::Break(s) => self.jump("break", s.label.as_ref()),
            Statement::Continue(s) => self.jump("continue", s.label.as_ref()),
            Statement::Throw(s) => {
                self.push("throw ");
                self.expression(&s.argument, SEQUENCE);
                self.push(";");
            }
            Statement::Import(s) => self.import_declaration(s),
            Statement::ExportNamed(s) => self.export_named(s),
            Statement::ExportDefault(s) => {
                self.push("export default ");
                match &s.declaration {
                    ExportDefaultKind::Function(function) => self.function(function),
                    ExportDefaultKind::Class(class) => self.class(class),
                    ExportDefaultKind::Expression(expr) => {
                        self.statement_expression(expr, ASSIGN);
                        self.push(";");
                    }
                }
            }
            Statement::ExportAll(s) => {
                self.push("export *");
                if let Some(exported) = &s.exported {
                    self.push(" as ");
                    self.module_export_name(exported);
                }
                self.push(" from ");
                self.literal(&s.source);
                self.push(";");
            }
            Statement::Expression(s) => self.expression_statement(s),
            Statement::Empty(_) => self.push(";"),
            Statement::Debugger(_) => self.push("debugger;"),
            Statement::Labeled(s) => {
                self.push(&s.label.name);
                self.push(": ");
                self.statement(&s.body);
            }
        }
    }

    fn jump(&mut self, keyword: &str, label: Option<&Identifier>) {
        self.push(keyword);
        if let Some(label) = label {
            self.push(" ");
            self.push(&label.name);
        }
        self.push(";");
    }

    fn expression_statement(&mut self, stmt: &ExpressionStatement) {
        if let Some(directive) = &stmt.directive {
            // The directive keeps its source spelling, escapes included
            if !directive.as_str().contains('"') {
                self.push("\"");
                self.push(directive);
                self.push("\";");
                return;
            }
            if !directive.as_str().contains('\'') {
                self.push("'");
                self.push(directive);
                self.push("';");
                return;
            }
        }
        let is_string = matches!(&stmt.expression, Expression::Literal(lit) if lit.is_string());
        if is_string && stmt.directive.is_none() {
            // Otherwise it could become part of a directive prologue
            self.push("(");
            self.expression(&stmt.expression, SEQUENCE);
            self.push(");");
            return;
        }
        self.statement_expression(&stmt.expression, SEQUENCE);
        self.push(";");
    }

    /// Expression in statement position, where `{`, `function`, `class`,
    /// `let [` and `do` would start a different production
    fn statement_expression(&mut self, expr: &Expression, min: u8) {
        if starts_ambiguously(expr) {
            self.push("(");
            self.expression(expr, SEQUENCE);
            self.push(")");
        } else {
            self.expression(expr, min);
        }
    }

    fn variable_declaration(&mut self, decl: &VariableDeclaration) {
        self.push(match decl.kind {
            VariableKind::Var => "var ",
            VariableKind::Let => "let ",
            VariableKind::Const => "const ",
        });
        self.comma_list(&decl.declarations, |p, declarator| {
            p.pattern(&declarator.id);
            if let Some(init) = &declarator.init {
                p.push(" = ");
                p.expression(init, ASSIGN);
            }
        });
    }

    fn for_target(&mut self, target: &ForTarget) {
        self.no_in = true;
        match target {
            ForTarget::Variable(decl) => self.variable_declaration(decl),
            ForTarget::Pattern(pattern) => self.pattern(pattern),
        }
        self.no_in = false;
    }

    // ============ MODULES ============

    fn module_export_name(&mut self, name: &ModuleExportName) {
        match name {
            ModuleExportName::Identifier(id) => self.push(&id.name),
            ModuleExportName::String(lit) => self.literal(lit),
        }
    }

    fn import_declaration(&mut self, decl: &ImportDeclaration) {
        self.push("import ");
        let mut named = Vec::new();
        let mut first = true;
        for clause in &decl.specifiers {
            match clause {
                ImportClause::Default(s) => {
                    self.push(&s.local.name);
                    first = false;
                }
                ImportClause::Namespace(s) => {
                    if !first {
                        self.push(", ");
                    }
                    self.push("* as ");
                    self.push(&s.local.name);
                    first = false;
                }
                ImportClause::Named(s) => named.push(s),
            }
        }
        if !named.is_empty() {
            if !first {
                self.push(", ");
            }
            self.push("{ ");
            self.comma_list(&named, |p, s| {
                p.module_export_name(&s.imported);
                p.push(" as ");
                p.push(&s.local.name);
            });
            self.push(" }");
            first = false;
        }
        if !first {
            self.push(" from ");
        }
        self.literal(&decl.source);
        self.push(";");
    }

    fn export_named(&mut self, decl: &ExportNamedDeclaration) {
        self.push("export ");
        if let Some(declaration) = &decl.declaration {
            self.statement(declaration);
            return;
        }
        self.push("{ ");
        self.comma_list(&decl.specifiers, |p, s| {
            p.module_export_name(&s.local);
            p.push(" as ");
            p.module_export_name(&s.exported);
        });
        self.push(" }");
        if let Some(source) = &decl.source {
            self.push(" from ");
            self.literal(source);
        }
        self.push(";");
    }

    // ============ FUNCTIONS AND CLASSES ============

    fn function(&mut self, function: &Function) {
        if function.is_async {
            self.push("async ");
        }
        self.push(if function.generator { "function* " } else { "function " });
        if let Some(id) = &function.id {
            self.push(&id.name);
        }
        self.function_tail(function);
    }

    /// Parameters and body
    fn function_tail(&mut self, function: &Function) {
        self.params(&function.params);
        self.push(" ");
        self.function_body(&function.body);
    }

    fn function_body(&mut self, body: &BlockStatement) {
        let saved = std::mem::replace(&mut self.no_in, false);
        self.block(&body.body);
        self.no_in = saved;
    }

    fn params(&mut self, params: &[Pattern]) {
        let saved = std::mem::replace(&mut self.no_in, false);
        self.push("(");
        self.comma_list(params, |p, param| p.pattern(param));
        self.push(")");
        self.no_in = saved;
    }

    fn decorators(&mut self, decorators: &[Decorator]) {
        for decorator in decorators {
            self.push("@");
            self.expression(&decorator.expression, CALL);
            self.push(" ");
        }
    }

    fn class(&mut self, class: &Class) {
        let saved = std::mem::replace(&mut self.no_in, false);
        self.decorators(&class.decorators);
        self.push("class ");
        if let Some(id) = &class.id {
            self.push(&id.name);
            self.push(" ");
        }
        if let Some(super_class) = &class.super_class {
            self.push("extends ");
            self.expression(super_class, CALL);
            self.push(" ");
        }
        if class.body.body.is_empty() {
            self.push("{}");
            self.no_in = saved;
            return;
        }
        self.push("{");
        self.indent += 1;
        for element in &class.body.body {
            self.newline();
            self.class_element(element);
        }
        self.indent -= 1;
        self.newline();
        self.push("}");
        self.no_in = saved;
    }

    fn class_element(&mut self, element: &ClassElement) {
        match element {
            ClassElement::Method(method) => {
                self.decorators(&method.decorators);
                if method.is_static {
                    self.push("static ");
                }
                let flavor = match method.kind {
                    MethodKind::Get => Some("get "),
                    MethodKind::Set => Some("set "),
                    MethodKind::Constructor | MethodKind::Method => None,
                };
                self.method(&method.key, method.computed, flavor, &method.value);
            }
            ClassElement::Property(field) => {
                self.decorators(&field.decorators);
                if field.is_static {
                    self.push("static ");
                }
                self.property_key(&field.key, field.computed);
                if let Some(value) = &field.value {
                    self.push(" = ");
                    self.expression(value, ASSIGN);
                }
                self.push(";");
            }
            ClassElement::StaticBlock(block) => {
                self.push("static ");
                self.block(&block.body);
            }
        }
    }

    /// Method shorthand shared by classes and object literals
    fn method(&mut self, key: &Expression, computed: bool, flavor: Option<&str>, function: &Function) {
        match flavor {
            Some(flavor) => self.push(flavor),
            None => {
                if function.is_async {
                    self.push("async ");
                }
                if function.generator {
                    self.push("*");
                }
            }
        }
        self.property_key(key, computed);
        self.function_tail(function);
    }

    fn property_key(&mut self, key: &Expression, computed: bool) {
        if computed {
            self.push("[");
            self.expression(key, ASSIGN);
            self.push("]");
            return;
        }
        match key {
            Expression::Identifier(id) => self.push(&id.name),
            Expression::PrivateIdentifier(id) => {
                self.push("#");
                self.push(&id.name);
            }
            Expression::Literal(lit) => self.literal(lit),
            other => self.expression(other, ASSIGN),
        }
    }

    fn arrow(&mut self, arrow: &ArrowFunctionExpression) {
        if arrow.is_async {
            self.push("async ");
        }
        self.params(&arrow.params);
        self.push(" => ");
        match &arrow.body {
            ArrowBody::Block(body) => self.function_body(body),
            ArrowBody::Expression(expr) => {
                if starts_ambiguously(expr) {
                    self.push("(");
                    self.expression(expr, SEQUENCE);
                    self.push(")");
                } else {
                    self.expression(expr, ASSIGN);
                }
            }
        }
    }

    // ============ PATTERNS ============

    fn pattern(&mut self, pattern: &Pattern) {
        match pattern {
            Pattern::Identifier(id) => self.push(&id.name),
            Pattern::Member(member) => self.member(member),
            Pattern::Rest(rest) => {
                self.push("...");
                self.pattern(&rest.argument);
            }
            Pattern::Assignment(assign) => {
                self.pattern(&assign.left);
                self.push(" = ");
                self.expression(&assign.right, ASSIGN);
            }
            Pattern::Array(array) => {
                self.push("[");
                self.comma_list(&array.elements, |p, element| {
                    if let Some(element) = element {
                        p.pattern(element);
                    }
                });
                if matches!(array.elements.last(), Some(None)) {
                    self.push(",");
                }
                self.push("]");
            }
            Pattern::Object(object) => {
                self.push("{");
                self.comma_list(&object.properties, |p, member| match member {
                    ObjectPatternMember::Property(prop) => p.assignment_property(prop),
                    ObjectPatternMember::Rest(rest) => {
                        p.push("...");
                        p.pattern(&rest.argument);
                    }
                });
                self.push("}");
            }
        }
    }

    fn assignment_property(&mut self, prop: &AssignmentProperty) {
        if prop.shorthand {
            match &prop.value {
                Pattern::Identifier(id) => {
                    self.push(&id.name);
                    return;
                }
                Pattern::Assignment(assign) if matches!(*assign.left, Pattern::Identifier(_)) => {
                    self.pattern(&prop.value);
                    return;
                }
                _ => {}
            }
        }
        self.property_key(&prop.key, prop.computed);
        self.push(": ");
        self.pattern(&prop.value);
    }

    // ============ EXPRESSIONS ============

    /// Print `expr`, parenthesised when it binds looser than `min`
    fn expression(&mut self, expr: &Expression, min: u8) {
        let needs_in_parens = self.no_in && matches!(expr, Expression::Binary(b) if b.operator == BinaryOp::In);
        if precedence(expr) < min || needs_in_parens {
            let saved = std::mem::replace(&mut self.no_in, false);
            self.push("(");
            self.expression_inner(expr);
            self.push(")");
            self.no_in = saved;
        } else {
            self.expression_inner(expr);
        }
    }

    fn expression_inner(&mut self, expr: &Expression) {
        match expr {
            Expression::Literal(lit) => self.literal(lit),
            Expression::Identifier(id) => self.push(&id.name),
            Expression::PrivateIdentifier(id) => {
                self.push("#");
                self.push(&id.name);
            }
            Expression::This(_) => self.push("this"),
            Expression::Super(_) => self.push("super"),
            Expression::Array(array) => {
                let saved = std::mem::replace(&mut self.no_in, false);
                self.push("[");
                self.comma_list(&array.elements, |p, element| {
                    if let Some(element) = element {
                        p.expression(element, ASSIGN);
                    }
                });
                if matches!(array.elements.last(), Some(None)) {
                    self.push(",");
                }
                self.push("]");
                self.no_in = saved;
            }
            Expression::Object(object) => {
                let saved = std::mem::replace(&mut self.no_in, false);
                self.push("{");
                self.comma_list(&object.properties, |p, member| match member {
                    ObjectMember::Property(prop) => p.object_property(prop),
                    ObjectMember::Spread(spread) => {
                        p.push("...");
                        p.expression(&spread.argument, ASSIGN);
                    }
                });
                self.push("}");
                self.no_in = saved;
            }
            Expression::Function(function) => self.function(function),
            Expression::ArrowFunction(arrow) => self.arrow(arrow),
            Expression::Class(class) => self.class(class),
            Expression::Template(template) => self.template(template),
            Expression::TaggedTemplate(tagged) => {
                self.callee(&tagged.tag, CALL);
                self.template(&tagged.quasi);
            }
            Expression::Unary(unary) => {
                self.push(unary.operator.as_str());
                // Keeps `- -a` and `typeof x` apart
                if !matches!(unary.operator, UnaryOp::Not | UnaryOp::BitNot) {
                    self.push(" ");
                }
                self.expression(&unary.argument, UNARY);
            }
            Expression::Update(update) => {
                if update.prefix {
                    self.push(update.operator.as_str());
                    self.expression(&update.argument, UNARY);
                } else {
                    self.expression(&update.argument, NEW_NO_ARGS);
                    self.push(update.operator.as_str());
                }
            }
            Expression::Binary(binary) => {
                let prec = BINARY_BASE + binary.operator.precedence();
                let (left_min, right_min) = if binary.operator == BinaryOp::Exp {
                    (POSTFIX, prec)
                } else {
                    (prec, prec + 1)
                };
                self.expression(&binary.left, left_min);
                self.push(" ");
                self.push(binary.operator.as_str());
                self.push(" ");
                self.expression(&binary.right, right_min);
            }
            Expression::Logical(logical) => {
                let prec = BINARY_BASE + logical.operator.precedence();
                // `??` never mixes with unparenthesised `||` / `&&`
                let (left_min, right_min) = if logical.operator == LogicalOp::NullishCoalescing {
                    let above_logical = BINARY_BASE + LogicalOp::And.precedence() + 1;
                    (above_logical, above_logical)
                } else {
                    (prec, prec + 1)
                };
                self.expression(&logical.left, left_min);
                self.push(" ");
                self.push(logical.operator.as_str());
                self.push(" ");
                self.expression(&logical.right, right_min);
            }
            Expression::Conditional(cond) => {
                self.expression(&cond.test, CONDITIONAL + 1);
                self.push(" ? ");
                let saved = std::mem::replace(&mut self.no_in, false);
                self.expression(&cond.consequent, ASSIGN);
                self.no_in = saved;
                self.push(" : ");
                self.expression(&cond.alternate, ASSIGN);
            }
            Expression::Assignment(assign) => {
                if matches!(*assign.left, Pattern::Object(_)) && self.no_in {
                    self.push("(");
                    self.pattern(&assign.left);
                    self.push(")");
                } else {
                    self.pattern(&assign.left);
                }
                self.push(" ");
                self.push(assign.operator.as_str());
                self.push(" ");
                self.expression(&assign.right, ASSIGN);
            }
            Expression::Sequence(seq) => {
                self.comma_list(&seq.expressions, |p, e| p.expression(e, ASSIGN));
            }
            Expression::Member(member) => self.member(member),
            Expression::Chain(chain) => self.expression_inner(&chain.expression),
            Expression::Call(call) => {
                self.callee(&call.callee, CALL);
                if call.optional {
                    self.push("?.");
                }
                self.arguments(&call.arguments);
            }
            Expression::New(new) => {
                self.push("new ");
                if contains_call(&new.callee) {
                    self.push("(");
                    self.expression(&new.callee, SEQUENCE);
                    self.push(")");
                } else {
                    self.callee(&new.callee, MEMBER);
                }
                self.arguments(&new.arguments);
            }
            Expression::MetaProperty(meta) => {
                self.push(&meta.meta.name);
                self.push(".");
                self.push(&meta.property.name);
            }
            Expression::Import(import) => {
                self.push("import(");
                let saved = std::mem::replace(&mut self.no_in, false);
                self.expression(&import.source, ASSIGN);
                self.no_in = saved;
                self.push(")");
            }
            Expression::Spread(spread) => {
                self.push("...");
                self.expression(&spread.argument, ASSIGN);
            }
            Expression::Yield(y) => {
                self.push(if y.delegate { "yield* " } else { "yield" });
                if let Some(argument) = &y.argument {
                    if !y.delegate {
                        self.push(" ");
                    }
                    self.expression(argument, ASSIGN);
                }
            }
            Expression::Await(a) => {
                self.push("await ");
                self.expression(&a.argument, UNARY);
            }
            Expression::Do(d) => {
                self.push("do ");
                self.function_body(&d.body);
            }
        }
    }

    /// Object of a member access, callee or tag. An optional chain must be
    /// closed before the access continues.
    fn callee(&mut self, expr: &Expression, min: u8) {
        let is_number = matches!(expr, Expression::Literal(lit) if matches!(lit.value, LiteralValue::Number(_)));
        if matches!(expr, Expression::Chain(_)) || is_number {
            self.push("(");
            self.expression(expr, SEQUENCE);
            self.push(")");
        } else {
            self.expression(expr, min);
        }
    }

    fn member(&mut self, member: &MemberExpression) {
        self.callee(&member.object, CALL);
        if member.computed {
            self.push(if member.optional { "?.[" } else { "[" });
            let saved = std::mem::replace(&mut self.no_in, false);
            self.expression(&member.property, SEQUENCE);
            self.no_in = saved;
            self.push("]");
            return;
        }
        self.push(if member.optional { "?." } else { "." });
        self.expression(&member.property, PRIMARY);
    }

    fn arguments(&mut self, arguments: &[Expression]) {
        let saved = std::mem::replace(&mut self.no_in, false);
        self.push("(");
        self.comma_list(arguments, |p, arg| p.expression(arg, ASSIGN));
        self.push(")");
        self.no_in = saved;
    }

    fn object_property(&mut self, prop: &Property) {
        match prop.kind {
            PropertyKind::Get | PropertyKind::Set => {
                let flavor = if prop.kind == PropertyKind::Get { "get " } else { "set " };
                if let Expression::Function(function) = &prop.value {
                    self.method(&prop.key, prop.computed, Some(flavor), function);
                }
            }
            PropertyKind::Init if prop.method => {
                if let Expression::Function(function) = &prop.value {
                    self.method(&prop.key, prop.computed, None, function);
                }
            }
            PropertyKind::Init => {
                if prop.shorthand {
                    if let Expression::Identifier(id) = &prop.value {
                        self.push(&id.name);
                        return;
                    }
                }
                self.property_key(&prop.key, prop.computed);
                self.push(": ");
                self.expression(&prop.value, ASSIGN);
            }
        }
    }

    fn template(&mut self, template: &TemplateLiteral) {
        let saved = std::mem::replace(&mut self.no_in, false);
        self.push("`");
        for (i, quasi) in template.quasis.iter().enumerate() {
            self.push(&quasi.value.raw);
            if let Some(expr) = template.expressions.get(i) {
                self.push("${");
                self.expression(expr, SEQUENCE);
                self.push("}");
            }
        }
        self.push("`");
        self.no_in = saved;
    }

    fn literal(&mut self, lit: &Literal) {
        match &lit.value {
            LiteralValue::Null => self.push("null"),
            LiteralValue::Boolean(true) => self.push("true"),
            LiteralValue::Boolean(false) => self.push("false"),
            LiteralValue::Number(n) if n.is_infinite() => self.push("1e999"),
            LiteralValue::Number(n) => self.push(n.to_string()),
            LiteralValue::String(s) => self.string(s),
            LiteralValue::BigInt(digits) => {
                self.push(digits);
                self.push("n");
            }
            LiteralValue::RegExp { pattern, flags } => {
                self.push("/");
                self.push(pattern);
                self.push("/");
                self.push(flags);
            }
        }
    }

    fn string(&mut self, s: &str) {
        self.out.push('"');
        for c in s.chars() {
            match c {
                '"' => self.push("\\\""),
                '\\' => self.push("\\\\"),
                '\n' => self.push("\\n"),
                '\r' => self.push("\\r"),
                '\t' => self.push("\\t"),
                '\u{2028}' => self.push("\\u2028"),
                '\u{2029}' => self.push("\\u2029"),
                c if c.is_control() => {
                    self.push(format!("\\u{:04x}", u32::from(c)));
                }
                c => self.out.push(c),
            }
        }
        self.out.push('"');
    }
}

fn precedence(expr: &Expression) -> u8 {
    match expr {
        Expression::Sequence(_) => SEQUENCE,
        Expression::Assignment(_)
        | Expression::ArrowFunction(_)
        | Expression::Yield(_)
        | Expression::Spread(_) => ASSIGN,
        Expression::Conditional(_) => CONDITIONAL,
        Expression::Logical(l) => BINARY_BASE + l.operator.precedence(),
        Expression::Binary(b) => BINARY_BASE + b.operator.precedence(),
        Expression::Unary(_) | Expression::Await(_) => UNARY,
        Expression::Update(u) if u.prefix => UNARY,
        Expression::Update(_) => POSTFIX,
        Expression::New(n) if n.arguments.is_empty() => NEW_NO_ARGS,
        Expression::Call(_) | Expression::Chain(_) | Expression::Import(_) => CALL,
        Expression::New(_) | Expression::Member(_) | Expression::TaggedTemplate(_) => MEMBER,
        _ => PRIMARY,
    }
}

/// The leftmost token would start a declaration, block, or `do` statement
fn starts_ambiguously(expr: &Expression) -> bool {
    match expr {
        Expression::Object(_) | Expression::Function(_) | Expression::Class(_) | Expression::Do(_) => true,
        Expression::Member(m) => member_starts_ambiguously(m),
        Expression::Call(c) => starts_ambiguously(&c.callee),
        Expression::TaggedTemplate(t) => starts_ambiguously(&t.tag),
        Expression::Chain(c) => starts_ambiguously(&c.expression),
        Expression::Binary(b) => starts_ambiguously(&b.left),
        Expression::Logical(l) => starts_ambiguously(&l.left),
        Expression::Conditional(c) => starts_ambiguously(&c.test),
        Expression::Sequence(s) => s.expressions.first().is_some_and(starts_ambiguously),
        Expression::Update(u) if !u.prefix => starts_ambiguously(&u.argument),
        Expression::Assignment(a) => match &*a.left {
            Pattern::Object(_) => true,
            Pattern::Member(m) => member_starts_ambiguously(m),
            _ => false,
        },
        _ => false,
    }
}

fn member_starts_ambiguously(member: &MemberExpression) -> bool {
    let let_bracket =
        member.computed && matches!(&*member.object, Expression::Identifier(id) if id.name == "let");
    let_bracket || starts_ambiguously(&member.object)
}

/// `new` callee whose member chain includes a call
fn contains_call(expr: &Expression) -> bool {
    match expr {
        Expression::Call(_) | Expression::Chain(_) => true,
        Expression::Member(m) => contains_call(&m.object),
        Expression::TaggedTemplate(t) => contains_call(&t.tag),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;

    #[allow(clippy::unwrap_used)]
    fn reprint(source: &str) -> String {
        let program = crate::parse(source, &Options::default()).unwrap();
        print(&program)
    }

    #[test]
    fn test_print_precedence_parens() {
        assert_eq!(reprint("(a + b) * c;"), "(a + b) * c;");
        assert_eq!(reprint("a + b * c;"), "a + b * c;");
        assert_eq!(reprint("(a, b);"), "a, b;");
    }

    #[test]
    fn test_print_exponent_operands() {
        assert_eq!(reprint("(-a) ** b;"), "(- a) ** b;");
        assert_eq!(reprint("(a ** b) ** c;"), "(a ** b) ** c;");
        assert_eq!(reprint("a ** b ** c;"), "a ** b ** c;");
    }

    #[test]
    fn test_print_statement_start() {
        assert_eq!(reprint("({}).x;"), "({}.x);");
        assert_eq!(reprint("(function () {})();"), "(function () {}());");
    }

    #[test]
    fn test_print_string_escapes() {
        assert_eq!(reprint("x = 'a\"b\\n';"), "x = \"a\\\"b\\n\";");
    }

    #[test]
    fn test_print_new_with_call_callee() {
        assert_eq!(reprint("new (a().b)();"), "new (a().b)();");
        assert_eq!(reprint("new a.b();"), "new a.b();");
    }
}
