//! ESTree syntax tree
//!
//! Node structs serialize with their ESTree `type` discriminator; the enums
//! grouping them (`Statement`, `Expression`, `Pattern`, ...) are untagged so
//! the JSON shape is exactly the node's own. Children are boxed and owned by
//! their parent.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::lexer::{Span, TokenRecord};
use crate::string_dict::JsString;

/// A complete program (script or module)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub struct Program {
    pub body: Vec<Statement>,
    pub source_type: SourceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<Vec<TokenRecord>>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Script,
    Module,
}

// ============ STATEMENTS ============

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Statement {
    // Declarations
    VariableDeclaration(VariableDeclaration),
    FunctionDeclaration(Box<Function>),
    ClassDeclaration(Box<Class>),

    // Control flow
    Block(BlockStatement),
    If(IfStatement),
    Switch(SwitchStatement),
    For(ForStatement),
    ForIn(ForInStatement),
    ForOf(ForOfStatement),
    While(WhileStatement),
    DoWhile(DoWhileStatement),
    Try(TryStatement),
    With(WithStatement),

    // Jump
    Return(ReturnStatement),
    Break(BreakStatement),
    Continue(ContinueStatement),
    Throw(ThrowStatement),

    // Module
    Import(ImportDeclaration),
    ExportNamed(ExportNamedDeclaration),
    ExportDefault(ExportDefaultDeclaration),
    ExportAll(ExportAllDeclaration),

    // Other
    Expression(ExpressionStatement),
    Empty(EmptyStatement),
    Debugger(DebuggerStatement),
    Labeled(LabeledStatement),
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::VariableDeclaration(s) => s.span,
            Statement::FunctionDeclaration(f) => f.span,
            Statement::ClassDeclaration(c) => c.span,
            Statement::Block(s) => s.span,
            Statement::If(s) => s.span,
            Statement::Switch(s) => s.span,
            Statement::For(s) => s.span,
            Statement::ForIn(s) => s.span,
            Statement::ForOf(s) => s.span,
            Statement::While(s) => s.span,
            Statement::DoWhile(s) => s.span,
            Statement::Try(s) => s.span,
            Statement::With(s) => s.span,
            Statement::Return(s) => s.span,
            Statement::Break(s) => s.span,
            Statement::Continue(s) => s.span,
            Statement::Throw(s) => s.span,
            Statement::Import(s) => s.span,
            Statement::ExportNamed(s) => s.span,
            Statement::ExportDefault(s) => s.span,
            Statement::ExportAll(s) => s.span,
            Statement::Expression(s) => s.span,
            Statement::Empty(s) => s.span,
            Statement::Debugger(s) => s.span,
            Statement::Labeled(s) => s.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ExpressionStatement {
    pub expression: Expression,
    /// Raw text of a directive prologue entry (`"use strict"`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directive: Option<JsString>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct BlockStatement {
    pub body: Vec<Statement>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct EmptyStatement {
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct DebuggerStatement {
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct VariableDeclaration {
    pub declarations: Vec<VariableDeclarator>,
    pub kind: VariableKind,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    Var,
    Let,
    Const,
}

impl VariableKind {
    pub fn as_str(self) -> &'static str {
        match self {
            VariableKind::Var => "var",
            VariableKind::Let => "let",
            VariableKind::Const => "const",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct VariableDeclarator {
    pub id: Pattern,
    pub init: Option<Expression>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct IfStatement {
    pub test: Expression,
    pub consequent: Box<Statement>,
    pub alternate: Option<Box<Statement>>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct SwitchStatement {
    pub discriminant: Expression,
    pub cases: Vec<SwitchCase>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct SwitchCase {
    /// `None` for `default:`
    pub test: Option<Expression>,
    pub consequent: Vec<Statement>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ForStatement {
    pub init: Option<ForInit>,
    pub test: Option<Expression>,
    pub update: Option<Expression>,
    pub body: Box<Statement>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ForInit {
    Variable(VariableDeclaration),
    Expression(Expression),
}

/// Left side of `for-in` / `for-of`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ForTarget {
    Variable(VariableDeclaration),
    Pattern(Pattern),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ForInStatement {
    pub left: ForTarget,
    pub right: Expression,
    pub body: Box<Statement>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ForOfStatement {
    pub left: ForTarget,
    pub right: Expression,
    pub body: Box<Statement>,
    #[serde(rename = "await")]
    pub is_await: bool,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct WhileStatement {
    pub test: Expression,
    pub body: Box<Statement>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct DoWhileStatement {
    pub body: Box<Statement>,
    pub test: Expression,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct TryStatement {
    pub block: BlockStatement,
    pub handler: Option<CatchClause>,
    pub finalizer: Option<BlockStatement>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct CatchClause {
    pub param: Option<Pattern>,
    pub body: BlockStatement,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct WithStatement {
    pub object: Expression,
    pub body: Box<Statement>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ReturnStatement {
    pub argument: Option<Expression>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct BreakStatement {
    pub label: Option<Identifier>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ContinueStatement {
    pub label: Option<Identifier>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ThrowStatement {
    pub argument: Expression,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct LabeledStatement {
    pub label: Identifier,
    pub body: Box<Statement>,
    #[serde(flatten)]
    pub span: Span,
}

// ============ MODULES ============

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ImportDeclaration {
    pub specifiers: Vec<ImportClause>,
    pub source: Literal,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ImportClause {
    Named(ImportSpecifier),
    Default(ImportDefaultSpecifier),
    Namespace(ImportNamespaceSpecifier),
}

impl ImportClause {
    pub fn local(&self) -> &Identifier {
        match self {
            ImportClause::Named(s) => &s.local,
            ImportClause::Default(s) => &s.local,
            ImportClause::Namespace(s) => &s.local,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ImportSpecifier {
    pub imported: ModuleExportName,
    pub local: Identifier,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ImportDefaultSpecifier {
    pub local: Identifier,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ImportNamespaceSpecifier {
    pub local: Identifier,
    #[serde(flatten)]
    pub span: Span,
}

/// Identifier or string literal naming an import/export binding
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ModuleExportName {
    Identifier(Identifier),
    String(Literal),
}

impl ModuleExportName {
    pub fn name(&self) -> &str {
        match self {
            ModuleExportName::Identifier(id) => id.name.as_str(),
            ModuleExportName::String(lit) => match &lit.value {
                LiteralValue::String(s) => s.as_str(),
                _ => "",
            },
        }
    }

    pub fn span(&self) -> Span {
        match self {
            ModuleExportName::Identifier(id) => id.span,
            ModuleExportName::String(lit) => lit.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ExportNamedDeclaration {
    pub declaration: Option<Box<Statement>>,
    pub specifiers: Vec<ExportSpecifier>,
    pub source: Option<Literal>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ExportSpecifier {
    pub local: ModuleExportName,
    pub exported: ModuleExportName,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ExportDefaultDeclaration {
    pub declaration: ExportDefaultKind,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExportDefaultKind {
    Function(Box<Function>),
    Class(Box<Class>),
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ExportAllDeclaration {
    pub exported: Option<ModuleExportName>,
    pub source: Literal,
    #[serde(flatten)]
    pub span: Span,
}

// ============ EXPRESSIONS ============

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Expression {
    // Literals
    Literal(Literal),
    Array(ArrayExpression),
    Object(ObjectExpression),
    Function(Box<Function>),
    ArrowFunction(Box<ArrowFunctionExpression>),
    Class(Box<Class>),
    Template(TemplateLiteral),
    TaggedTemplate(TaggedTemplateExpression),

    // Identifiers
    Identifier(Identifier),
    PrivateIdentifier(PrivateIdentifier),
    This(ThisExpression),
    Super(Super),

    // Operations
    Unary(UnaryExpression),
    Binary(BinaryExpression),
    Logical(LogicalExpression),
    Conditional(ConditionalExpression),
    Assignment(AssignmentExpression),
    Update(UpdateExpression),
    Sequence(SequenceExpression),

    // Access
    Member(MemberExpression),
    Chain(ChainExpression),
    Call(CallExpression),
    New(NewExpression),
    MetaProperty(MetaProperty),
    Import(ImportExpression),

    // Special
    Spread(SpreadElement),
    Yield(YieldExpression),
    Await(AwaitExpression),
    Do(DoExpression),
}

impl Expression {
    pub fn span(&self) -> Span {
        match self {
            Expression::Literal(e) => e.span,
            Expression::Array(e) => e.span,
            Expression::Object(e) => e.span,
            Expression::Function(e) => e.span,
            Expression::ArrowFunction(e) => e.span,
            Expression::Class(e) => e.span,
            Expression::Template(e) => e.span,
            Expression::TaggedTemplate(e) => e.span,
            Expression::Identifier(e) => e.span,
            Expression::PrivateIdentifier(e) => e.span,
            Expression::This(e) => e.span,
            Expression::Super(e) => e.span,
            Expression::Unary(e) => e.span,
            Expression::Binary(e) => e.span,
            Expression::Logical(e) => e.span,
            Expression::Conditional(e) => e.span,
            Expression::Assignment(e) => e.span,
            Expression::Update(e) => e.span,
            Expression::Sequence(e) => e.span,
            Expression::Member(e) => e.span,
            Expression::Chain(e) => e.span,
            Expression::Call(e) => e.span,
            Expression::New(e) => e.span,
            Expression::MetaProperty(e) => e.span,
            Expression::Import(e) => e.span,
            Expression::Spread(e) => e.span,
            Expression::Yield(e) => e.span,
            Expression::Await(e) => e.span,
            Expression::Do(e) => e.span,
        }
    }

    pub fn as_identifier(&self) -> Option<&Identifier> {
        match self {
            Expression::Identifier(id) => Some(id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct Identifier {
    pub name: JsString,
    /// Source spelling when it differs from `name` or `raw` output is enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<JsString>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct PrivateIdentifier {
    pub name: JsString,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value: LiteralValue,
    pub raw: Option<JsString>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Null,
    Boolean(bool),
    Number(f64),
    String(JsString),
    /// Digits without the `n` suffix or separators
    BigInt(JsString),
    RegExp { pattern: JsString, flags: JsString },
}

impl Literal {
    pub fn is_string(&self) -> bool {
        matches!(self.value, LiteralValue::String(_))
    }
}

impl Serialize for Literal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", "Literal")?;
        match &self.value {
            LiteralValue::Null => map.serialize_entry("value", &())?,
            LiteralValue::Boolean(b) => map.serialize_entry("value", b)?,
            LiteralValue::Number(n) => {
                // Integral values print without a trailing `.0`
                if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
                    map.serialize_entry("value", &(*n as i64))?
                } else {
                    map.serialize_entry("value", n)?
                }
            }
            LiteralValue::String(s) => map.serialize_entry("value", s)?,
            LiteralValue::BigInt(digits) => {
                map.serialize_entry("value", &())?;
                map.serialize_entry("bigint", digits)?;
            }
            LiteralValue::RegExp { pattern, flags } => {
                map.serialize_entry("value", &())?;
                map.serialize_entry("regex", &RegExpValue { pattern, flags })?;
            }
        }
        if let Some(raw) = &self.raw {
            map.serialize_entry("raw", raw)?;
        }
        self.span.write_fields(&mut map)?;
        map.end()
    }
}

#[derive(Serialize)]
struct RegExpValue<'a> {
    pattern: &'a JsString,
    flags: &'a JsString,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ThisExpression {
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct Super {
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ArrayExpression {
    /// `None` for holes; spread elements appear as `Expression::Spread`
    pub elements: Vec<Option<Expression>>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ObjectExpression {
    pub properties: Vec<ObjectMember>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ObjectMember {
    Property(Property),
    Spread(SpreadElement),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct Property {
    pub key: Expression,
    pub value: Expression,
    pub kind: PropertyKind,
    pub method: bool,
    pub shorthand: bool,
    pub computed: bool,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    Init,
    Get,
    Set,
}

/// Shared shape of function declarations, expressions and methods
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub id: Option<Identifier>,
    pub params: Vec<Pattern>,
    pub body: BlockStatement,
    pub generator: bool,
    pub is_async: bool,
    /// Serialized as `FunctionDeclaration` rather than `FunctionExpression`
    pub declaration: bool,
    pub span: Span,
}

impl Serialize for Function {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        let kind = if self.declaration {
            "FunctionDeclaration"
        } else {
            "FunctionExpression"
        };
        map.serialize_entry("type", kind)?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("params", &self.params)?;
        map.serialize_entry("body", &self.body)?;
        map.serialize_entry("generator", &self.generator)?;
        map.serialize_entry("async", &self.is_async)?;
        self.span.write_fields(&mut map)?;
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ArrowFunctionExpression {
    pub params: Vec<Pattern>,
    pub body: ArrowBody,
    #[serde(rename = "async")]
    pub is_async: bool,
    /// Body is a bare expression
    pub expression: bool,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ArrowBody {
    Block(BlockStatement),
    Expression(Box<Expression>),
}

/// Shared shape of class declarations and expressions
#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    pub id: Option<Identifier>,
    pub super_class: Option<Box<Expression>>,
    pub body: ClassBody,
    pub decorators: Vec<Decorator>,
    pub declaration: bool,
    pub span: Span,
}

impl Serialize for Class {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        let kind = if self.declaration {
            "ClassDeclaration"
        } else {
            "ClassExpression"
        };
        map.serialize_entry("type", kind)?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("superClass", &self.super_class)?;
        map.serialize_entry("body", &self.body)?;
        if !self.decorators.is_empty() {
            map.serialize_entry("decorators", &self.decorators)?;
        }
        self.span.write_fields(&mut map)?;
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ClassBody {
    pub body: Vec<ClassElement>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ClassElement {
    Method(MethodDefinition),
    Property(PropertyDefinition),
    StaticBlock(StaticBlock),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct MethodDefinition {
    pub key: Expression,
    pub value: Box<Function>,
    pub kind: MethodKind,
    pub computed: bool,
    #[serde(rename = "static")]
    pub is_static: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub decorators: Vec<Decorator>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodKind {
    Constructor,
    Method,
    Get,
    Set,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct PropertyDefinition {
    pub key: Expression,
    pub value: Option<Expression>,
    pub computed: bool,
    #[serde(rename = "static")]
    pub is_static: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub decorators: Vec<Decorator>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct StaticBlock {
    pub body: Vec<Statement>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct Decorator {
    pub expression: Expression,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct TemplateLiteral {
    pub quasis: Vec<TemplateElement>,
    pub expressions: Vec<Expression>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct TemplateElement {
    pub value: TemplateValue,
    pub tail: bool,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateValue {
    pub raw: JsString,
    /// `None` for an invalid escape in a tagged template
    pub cooked: Option<JsString>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct TaggedTemplateExpression {
    pub tag: Box<Expression>,
    pub quasi: TemplateLiteral,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct UnaryExpression {
    pub operator: UnaryOp,
    pub prefix: bool,
    pub argument: Box<Expression>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    #[serde(rename = "-")]
    Minus,
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "!")]
    Not,
    #[serde(rename = "~")]
    BitNot,
    #[serde(rename = "typeof")]
    Typeof,
    #[serde(rename = "void")]
    Void,
    #[serde(rename = "delete")]
    Delete,
}

impl UnaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Minus => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::Typeof => "typeof",
            UnaryOp::Void => "void",
            UnaryOp::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct BinaryExpression {
    pub operator: BinaryOp,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "%")]
    Mod,
    #[serde(rename = "**")]
    Exp,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
    #[serde(rename = "===")]
    StrictEq,
    #[serde(rename = "!==")]
    StrictNotEq,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    LtEq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    GtEq,
    #[serde(rename = "&")]
    BitAnd,
    #[serde(rename = "|")]
    BitOr,
    #[serde(rename = "^")]
    BitXor,
    #[serde(rename = "<<")]
    LShift,
    #[serde(rename = ">>")]
    RShift,
    #[serde(rename = ">>>")]
    URShift,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "instanceof")]
    Instanceof,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Exp => "**",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::StrictEq => "===",
            BinaryOp::StrictNotEq => "!==",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::LShift => "<<",
            BinaryOp::RShift => ">>",
            BinaryOp::URShift => ">>>",
            BinaryOp::In => "in",
            BinaryOp::Instanceof => "instanceof",
        }
    }

    /// Binding power, same scale as `TokenClass::precedence`
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::BitOr => 4,
            BinaryOp::BitXor => 5,
            BinaryOp::BitAnd => 6,
            BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::StrictEq | BinaryOp::StrictNotEq => 7,
            BinaryOp::Lt
            | BinaryOp::LtEq
            | BinaryOp::Gt
            | BinaryOp::GtEq
            | BinaryOp::In
            | BinaryOp::Instanceof => 8,
            BinaryOp::LShift | BinaryOp::RShift | BinaryOp::URShift => 9,
            BinaryOp::Add | BinaryOp::Sub => 10,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 11,
            BinaryOp::Exp => 12,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct LogicalExpression {
    pub operator: LogicalOp,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogicalOp {
    #[serde(rename = "&&")]
    And,
    #[serde(rename = "||")]
    Or,
    #[serde(rename = "??")]
    NullishCoalescing,
}

impl LogicalOp {
    pub fn as_str(self) -> &'static str {
        match self {
            LogicalOp::And => "&&",
            LogicalOp::Or => "||",
            LogicalOp::NullishCoalescing => "??",
        }
    }

    pub fn precedence(self) -> u8 {
        match self {
            LogicalOp::NullishCoalescing => 1,
            LogicalOp::Or => 2,
            LogicalOp::And => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ConditionalExpression {
    pub test: Box<Expression>,
    pub consequent: Box<Expression>,
    pub alternate: Box<Expression>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct AssignmentExpression {
    pub operator: AssignmentOp,
    pub left: Box<Pattern>,
    pub right: Box<Expression>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssignmentOp {
    #[serde(rename = "=")]
    Assign,
    #[serde(rename = "+=")]
    AddAssign,
    #[serde(rename = "-=")]
    SubAssign,
    #[serde(rename = "*=")]
    MulAssign,
    #[serde(rename = "/=")]
    DivAssign,
    #[serde(rename = "%=")]
    ModAssign,
    #[serde(rename = "**=")]
    ExpAssign,
    #[serde(rename = "&=")]
    BitAndAssign,
    #[serde(rename = "|=")]
    BitOrAssign,
    #[serde(rename = "^=")]
    BitXorAssign,
    #[serde(rename = "<<=")]
    LShiftAssign,
    #[serde(rename = ">>=")]
    RShiftAssign,
    #[serde(rename = ">>>=")]
    URShiftAssign,
    #[serde(rename = "&&=")]
    AndAssign,
    #[serde(rename = "||=")]
    OrAssign,
    #[serde(rename = "??=")]
    NullishAssign,
}

impl AssignmentOp {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignmentOp::Assign => "=",
            AssignmentOp::AddAssign => "+=",
            AssignmentOp::SubAssign => "-=",
            AssignmentOp::MulAssign => "*=",
            AssignmentOp::DivAssign => "/=",
            AssignmentOp::ModAssign => "%=",
            AssignmentOp::ExpAssign => "**=",
            AssignmentOp::BitAndAssign => "&=",
            AssignmentOp::BitOrAssign => "|=",
            AssignmentOp::BitXorAssign => "^=",
            AssignmentOp::LShiftAssign => "<<=",
            AssignmentOp::RShiftAssign => ">>=",
            AssignmentOp::URShiftAssign => ">>>=",
            AssignmentOp::AndAssign => "&&=",
            AssignmentOp::OrAssign => "||=",
            AssignmentOp::NullishAssign => "??=",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct UpdateExpression {
    pub operator: UpdateOp,
    pub prefix: bool,
    pub argument: Box<Expression>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UpdateOp {
    #[serde(rename = "++")]
    Increment,
    #[serde(rename = "--")]
    Decrement,
}

impl UpdateOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UpdateOp::Increment => "++",
            UpdateOp::Decrement => "--",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct SequenceExpression {
    pub expressions: Vec<Expression>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct MemberExpression {
    pub object: Box<Expression>,
    /// `Identifier` / `PrivateIdentifier` for dot access, any expression when computed
    pub property: Box<Expression>,
    pub computed: bool,
    pub optional: bool,
    #[serde(flatten)]
    pub span: Span,
}

/// Wrapper around an optional chain `a?.b.c()`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ChainExpression {
    pub expression: Box<Expression>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct CallExpression {
    pub callee: Box<Expression>,
    pub arguments: Vec<Expression>,
    pub optional: bool,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct NewExpression {
    pub callee: Box<Expression>,
    pub arguments: Vec<Expression>,
    #[serde(flatten)]
    pub span: Span,
}

/// `new.target` / `import.meta`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct MetaProperty {
    pub meta: Identifier,
    pub property: Identifier,
    #[serde(flatten)]
    pub span: Span,
}

/// Dynamic `import(source)`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ImportExpression {
    pub source: Box<Expression>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct SpreadElement {
    pub argument: Box<Expression>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct YieldExpression {
    pub argument: Option<Box<Expression>>,
    pub delegate: bool,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct AwaitExpression {
    pub argument: Box<Expression>,
    #[serde(flatten)]
    pub span: Span,
}

/// `do { ... }` expression (experimental)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct DoExpression {
    pub body: BlockStatement,
    #[serde(flatten)]
    pub span: Span,
}

// ============ PATTERNS ============

/// Binding and assignment targets. `Member` only occurs in assignment
/// targets (`a.b = 1`, `[x.y] = z`), never in declarations or parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Pattern {
    Identifier(Identifier),
    Object(ObjectPattern),
    Array(ArrayPattern),
    Rest(RestElement),
    Assignment(AssignmentPattern),
    Member(MemberExpression),
}

impl Pattern {
    pub fn span(&self) -> Span {
        match self {
            Pattern::Identifier(p) => p.span,
            Pattern::Object(p) => p.span,
            Pattern::Array(p) => p.span,
            Pattern::Rest(p) => p.span,
            Pattern::Assignment(p) => p.span,
            Pattern::Member(p) => p.span,
        }
    }

    /// Names bound by this pattern, in source order
    pub fn bound_names<'a>(&'a self, out: &mut Vec<&'a Identifier>) {
        match self {
            Pattern::Identifier(id) => out.push(id),
            Pattern::Object(obj) => {
                for prop in &obj.properties {
                    match prop {
                        ObjectPatternMember::Property(p) => p.value.bound_names(out),
                        ObjectPatternMember::Rest(r) => r.argument.bound_names(out),
                    }
                }
            }
            Pattern::Array(arr) => {
                for elem in arr.elements.iter().flatten() {
                    elem.bound_names(out);
                }
            }
            Pattern::Rest(r) => r.argument.bound_names(out),
            Pattern::Assignment(a) => a.left.bound_names(out),
            Pattern::Member(_) => {}
        }
    }

    /// A plain identifier with no destructuring or default value
    pub fn is_simple(&self) -> bool {
        matches!(self, Pattern::Identifier(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ObjectPattern {
    pub properties: Vec<ObjectPatternMember>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ObjectPatternMember {
    Property(AssignmentProperty),
    Rest(RestElement),
}

/// `key: pattern` inside an object pattern
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentProperty {
    pub key: Expression,
    pub value: Pattern,
    pub shorthand: bool,
    pub computed: bool,
    pub span: Span,
}

impl Serialize for AssignmentProperty {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", "Property")?;
        map.serialize_entry("key", &self.key)?;
        map.serialize_entry("value", &self.value)?;
        map.serialize_entry("kind", "init")?;
        map.serialize_entry("method", &false)?;
        map.serialize_entry("shorthand", &self.shorthand)?;
        map.serialize_entry("computed", &self.computed)?;
        self.span.write_fields(&mut map)?;
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ArrayPattern {
    pub elements: Vec<Option<Pattern>>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct RestElement {
    pub argument: Box<Pattern>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct AssignmentPattern {
    pub left: Box<Pattern>,
    pub right: Box<Expression>,
    #[serde(flatten)]
    pub span: Span,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Identifier {
        Identifier {
            name: JsString::from(name),
            raw: None,
            span: Span::default(),
        }
    }

    #[test]
    fn test_identifier_serializes_with_type() {
        let json = serde_json::to_value(ident("a")).ok();
        assert_eq!(json, Some(serde_json::json!({"type": "Identifier", "name": "a"})));
    }

    #[test]
    fn test_literal_values() {
        let lit = Literal {
            value: LiteralValue::Number(2.0),
            raw: None,
            span: Span::default(),
        };
        let json = serde_json::to_value(&lit).ok();
        assert_eq!(json, Some(serde_json::json!({"type": "Literal", "value": 2})));

        let re = Literal {
            value: LiteralValue::RegExp {
                pattern: JsString::from("a+"),
                flags: JsString::from("g"),
            },
            raw: Some(JsString::from("/a+/g")),
            span: Span::default(),
        };
        let json = serde_json::to_value(&re).ok();
        assert_eq!(
            json,
            Some(serde_json::json!({
                "type": "Literal",
                "value": null,
                "regex": {"pattern": "a+", "flags": "g"},
                "raw": "/a+/g"
            }))
        );
    }

    #[test]
    fn test_bound_names_walks_nested_patterns() {
        let pattern = Pattern::Array(ArrayPattern {
            elements: vec![
                Some(Pattern::Identifier(ident("a"))),
                None,
                Some(Pattern::Rest(RestElement {
                    argument: Box::new(Pattern::Identifier(ident("b"))),
                    span: Span::default(),
                })),
            ],
            span: Span::default(),
        });
        let mut names = Vec::new();
        pattern.bound_names(&mut names);
        let names: Vec<&str> = names.iter().map(|id| id.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
