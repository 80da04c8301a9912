//! Tests for expression parsing
//!
//! Operator precedence, cover grammars (arrows, destructuring assignment),
//! optional chains, templates and the contextual keywords.

use jsparse::ast::*;
use jsparse::{ErrorKind, Options};

#[allow(clippy::unwrap_used)]
fn parse_with(source: &str, options: &Options) -> Program {
    jsparse::parse(source, options).unwrap()
}

/// Expression of the first statement
fn expr(source: &str) -> Expression {
    first_expression(parse_with(source, &Options::default()))
}

fn first_expression(program: Program) -> Expression {
    match program.body.into_iter().next() {
        Some(Statement::Expression(stmt)) => stmt.expression,
        other => panic!("Expected ExpressionStatement, got {:?}", other),
    }
}

fn parse_err(source: &str) -> Option<ErrorKind> {
    jsparse::parse_script(source).err().map(|e| e.kind)
}

fn is_ident(expr: &Expression, name: &str) -> bool {
    matches!(expr, Expression::Identifier(id) if id.name == name)
}

// ============ OPERATORS ============

#[test]
fn test_multiplication_binds_tighter() {
    let Expression::Binary(add) = expr("a + b * c;") else {
        panic!("Expected Binary expression");
    };
    assert_eq!(add.operator, BinaryOp::Add);
    assert!(is_ident(&add.left, "a"));
    assert!(matches!(&*add.right, Expression::Binary(mul) if mul.operator == BinaryOp::Mul));
}

#[test]
fn test_left_associative_subtraction() {
    let Expression::Binary(outer) = expr("a - b - c;") else {
        panic!("Expected Binary expression");
    };
    assert!(matches!(&*outer.left, Expression::Binary(inner) if inner.operator == BinaryOp::Sub));
    assert!(is_ident(&outer.right, "c"));
}

#[test]
fn test_exponent_is_right_associative() {
    let Expression::Binary(outer) = expr("a ** b ** c;") else {
        panic!("Expected Binary expression");
    };
    assert_eq!(outer.operator, BinaryOp::Exp);
    assert!(is_ident(&outer.left, "a"));
    assert!(matches!(&*outer.right, Expression::Binary(inner) if inner.operator == BinaryOp::Exp));
}

#[test]
fn test_unary_before_exponent() {
    assert_eq!(parse_err("-a ** b;"), Some(ErrorKind::UnaryBeforeExponent));
    assert!(parse_err("(-a) ** b;").is_none());
    assert!(parse_err("a ** -b;").is_none());
}

#[test]
fn test_logical_precedence() {
    let Expression::Logical(or) = expr("a || b && c;") else {
        panic!("Expected Logical expression");
    };
    assert_eq!(or.operator, LogicalOp::Or);
    assert!(matches!(&*or.right, Expression::Logical(and) if and.operator == LogicalOp::And));
}

#[test]
fn test_coalesce_cannot_mix_with_logical() {
    assert_eq!(parse_err("a ?? b || c;"), Some(ErrorKind::MixedCoalesce));
    assert_eq!(parse_err("a && b ?? c;"), Some(ErrorKind::MixedCoalesce));
    assert!(parse_err("(a ?? b) || c;").is_none());
    assert!(parse_err("a ?? (b && c);").is_none());
    assert!(parse_err("a ?? b ?? c;").is_none());
}

#[test]
fn test_assignment_is_right_associative() {
    let Expression::Assignment(outer) = expr("a = b = c;") else {
        panic!("Expected Assignment expression");
    };
    assert!(matches!(&*outer.left, Pattern::Identifier(id) if id.name == "a"));
    assert!(matches!(&*outer.right, Expression::Assignment(_)));
}

#[test]
fn test_compound_assignment_operators() {
    let Expression::Assignment(assign) = expr("a.b **= 2;") else {
        panic!("Expected Assignment expression");
    };
    assert_eq!(assign.operator, AssignmentOp::ExpAssign);
    assert!(matches!(&*assign.left, Pattern::Member(_)));
    let Expression::Assignment(logical) = expr("a ??= b;") else {
        panic!("Expected Assignment expression");
    };
    assert_eq!(logical.operator, AssignmentOp::NullishAssign);
}

#[test]
fn test_conditional_nesting() {
    let Expression::Conditional(cond) = expr("a ? b : c ? d : e;") else {
        panic!("Expected Conditional expression");
    };
    assert!(is_ident(&cond.test, "a"));
    assert!(matches!(&*cond.alternate, Expression::Conditional(_)));
}

#[test]
fn test_sequence_expression() {
    let Expression::Sequence(seq) = expr("a, b, c;") else {
        panic!("Expected Sequence expression");
    };
    assert_eq!(seq.expressions.len(), 3);
}

#[test]
fn test_update_expressions() {
    assert!(matches!(expr("a++;"), Expression::Update(u) if !u.prefix));
    assert!(matches!(expr("--a;"), Expression::Update(u) if u.prefix && u.operator == UpdateOp::Decrement));
    assert_eq!(parse_err("1++;"), Some(ErrorKind::InvalidLhsPostfix));
    assert_eq!(parse_err("++f();"), Some(ErrorKind::InvalidLhsPrefix));
}

#[test]
fn test_postfix_operator_not_across_newline() {
    let program = parse_with("a\n++b", &Options::default());
    assert_eq!(program.body.len(), 2);
}

#[test]
fn test_invalid_assignment_targets() {
    assert_eq!(parse_err("1 = 2;"), Some(ErrorKind::InvalidLhsAssignment));
    assert_eq!(parse_err("a + b = c;"), Some(ErrorKind::InvalidLhsAssignment));
    assert_eq!(parse_err("f() += 1;"), Some(ErrorKind::InvalidLhsAssignment));
    assert!(parse_err("(a) = 1;").is_none());
    assert!(parse_err("(a.b) = 1;").is_none());
}

#[test]
fn test_unary_operators() {
    let Expression::Unary(unary) = expr("typeof void !x;") else {
        panic!("Expected Unary expression");
    };
    assert_eq!(unary.operator, UnaryOp::Typeof);
    assert!(matches!(&*unary.argument, Expression::Unary(inner) if inner.operator == UnaryOp::Void));
}

// ============ REGEXP VS DIVISION ============

#[test]
fn test_slash_after_identifier_is_division() {
    let Expression::Binary(div) = expr("a / b / c;") else {
        panic!("Expected Binary expression");
    };
    assert_eq!(div.operator, BinaryOp::Div);
}

#[test]
fn test_slash_at_expression_start_is_regexp() {
    let Expression::Call(call) = expr("f(/=+/g);") else {
        panic!("Expected Call expression");
    };
    let Some(Expression::Literal(lit)) = call.arguments.first() else {
        panic!("Expected Literal expression");
    };
    assert!(matches!(&lit.value, LiteralValue::RegExp { pattern, flags }
        if pattern.as_str() == "=+" && flags.as_str() == "g"));
}

// ============ ARROWS ============

#[test]
fn test_arrow_function() {
    let Expression::ArrowFunction(arrow) = expr("(a, b) => a + b;") else {
        panic!("Expected ArrowFunction expression");
    };
    assert_eq!(arrow.params.len(), 2);
    assert!(arrow.expression);
    assert!(!arrow.is_async);
}

#[test]
fn test_arrow_with_patterns() {
    let Expression::ArrowFunction(arrow) = expr("({a, b: [c]}, d = 1, ...rest) => {};") else {
        panic!("Expected ArrowFunction expression");
    };
    assert_eq!(arrow.params.len(), 3);
    assert!(matches!(arrow.params.first(), Some(Pattern::Object(_))));
    assert!(matches!(arrow.params.get(1), Some(Pattern::Assignment(_))));
    assert!(matches!(arrow.params.get(2), Some(Pattern::Rest(_))));
    assert!(!arrow.expression);
}

#[test]
fn test_single_parameter_arrow() {
    assert!(matches!(expr("x => x * 2;"), Expression::ArrowFunction(a) if a.params.len() == 1));
}

#[test]
fn test_async_arrow_versus_async_call() {
    assert!(matches!(expr("async (a) => a;"), Expression::ArrowFunction(a) if a.is_async));
    assert!(matches!(expr("async x => x;"), Expression::ArrowFunction(a) if a.is_async));
    let Expression::Call(call) = expr("async(a, b);") else {
        panic!("Expected Call expression");
    };
    assert!(is_ident(&call.callee, "async"));
    assert_eq!(call.arguments.len(), 2);
}

#[test]
fn test_async_as_identifier() {
    assert!(is_ident(&expr("async;"), "async"));
}

#[test]
fn test_invalid_arrow_parameters() {
    assert!(parse_err("(a + b) => 1;").is_some());
    assert!(parse_err("(a, ...b, c) => 1;").is_some());
    assert!(parse_err("(...a);").is_some());
    assert_eq!(parse_err("(a)\n=> 1;"), Some(ErrorKind::UnexpectedArrowNewline));
}

#[test]
fn test_arrow_cannot_be_operand() {
    assert!(parse_err("() => {} + 1;").is_some());
    assert!(parse_err("(() => {}) + 1;").is_none());
}

#[test]
fn test_arrow_rejected_as_operator_operand() {
    let cases = [
        "a + x => 1;",
        "!x => 1;",
        "a || (b) => 1;",
        "void async x => x;",
        "typeof (a) => a;",
        "a * async (b) => b;",
        "a ?? () => {};",
        "++x => 1;",
        "async function f() { await x => 1; }",
    ];
    for source in cases {
        assert_eq!(parse_err(source), Some(ErrorKind::UnexpectedToken), "source: {}", source);
    }
}

#[test]
fn test_arrow_accepted_where_assignment_expression_is() {
    let cases = [
        "a || (x => 1);",
        "!(x => 1);",
        "a = b => c;",
        "f(x => 1, async y => y);",
        "a ? x => 1 : y => 2;",
        "[...x => 1];",
        "`${x => 1}`;",
        "x => y => x + y;",
    ];
    for source in cases {
        assert!(parse_err(source).is_none(), "source: {}", source);
    }
}

// ============ DESTRUCTURING ASSIGNMENT ============

#[test]
fn test_array_destructuring_assignment() {
    let Expression::Assignment(assign) = expr("[a, b] = [b, a];") else {
        panic!("Expected Assignment expression");
    };
    let Pattern::Array(array) = &*assign.left else {
        panic!("Expected Array pattern");
    };
    assert_eq!(array.elements.len(), 2);
}

#[test]
fn test_object_destructuring_assignment() {
    let Expression::Assignment(assign) = expr("({a, b: c.d, e = 1, ...f} = obj);") else {
        panic!("Expected Assignment expression");
    };
    let Pattern::Object(object) = &*assign.left else {
        panic!("Expected Object pattern");
    };
    assert_eq!(object.properties.len(), 4);
    assert!(matches!(object.properties.last(), Some(ObjectPatternMember::Rest(_))));
}

#[test]
fn test_cover_initialized_name() {
    assert_eq!(parse_err("({a = 1});"), Some(ErrorKind::InvalidCoverInitializedName));
    assert!(parse_err("({a = 1} = {});").is_none());
    assert!(parse_err("[{a = 1}] = [];").is_none());
    assert!(parse_err("({a = 1}) => a;").is_none());
    assert_eq!(parse_err("f({a = 1});"), Some(ErrorKind::InvalidCoverInitializedName));
}

#[test]
fn test_duplicate_proto() {
    assert_eq!(
        parse_err("({__proto__: 1, __proto__: 2});"),
        Some(ErrorKind::DuplicateProto)
    );
    assert!(parse_err("({__proto__: a, __proto__: b} = c);").is_none());
    assert!(parse_err("({__proto__: 1, ['__proto__']: 2});").is_none());
    assert!(parse_err("({__proto__: 1, __proto__});").is_none());
}

#[test]
fn test_parenthesized_pattern_target() {
    assert_eq!(parse_err("({a}) = 1;"), Some(ErrorKind::ParenthesizedPattern));
    assert_eq!(parse_err("([a]) = 1;"), Some(ErrorKind::ParenthesizedPattern));
}

#[test]
fn test_rest_element_rules() {
    assert_eq!(parse_err("[...a, b] = c;"), Some(ErrorKind::InvalidRestElement));
    assert_eq!(parse_err("[...a,] = c;"), Some(ErrorKind::RestTrailingComma));
    assert!(parse_err("[...a.b] = c;").is_none());
}

// ============ MEMBERS, CALLS AND CHAINS ============

#[test]
fn test_member_and_call_chain() {
    let Expression::Member(outer) = expr("a.b[c](d).e;") else {
        panic!("Expected Member expression");
    };
    let Expression::Call(call) = &*outer.object else {
        panic!("Expected Call expression");
    };
    assert_eq!(call.arguments.len(), 1);
    assert!(matches!(&*call.callee, Expression::Member(m) if m.computed));
}

#[test]
fn test_keyword_as_property_name() {
    let Expression::Member(member) = expr("a.if;") else {
        panic!("Expected Member expression");
    };
    assert!(is_ident(&member.property, "if"));
    assert!(!member.computed);
}

#[test]
fn test_optional_chain() {
    let Expression::Chain(chain) = expr("a?.b.c();") else {
        panic!("Expected Chain expression");
    };
    let Expression::Call(call) = &*chain.expression else {
        panic!("Expected Call expression");
    };
    assert!(!call.optional);
    assert!(matches!(&*call.callee, Expression::Member(m) if !m.optional));
}

#[test]
fn test_optional_chain_restrictions() {
    assert_eq!(parse_err("a?.b = 1;"), Some(ErrorKind::InvalidOptionalChainTarget));
    assert_eq!(parse_err("a?.b`t`;"), Some(ErrorKind::OptionalChainTemplate));
    assert_eq!(parse_err("new a?.b();"), Some(ErrorKind::NewOptionalChain));
    assert!(parse_err("a?.[0]?.(1);").is_none());
}

#[test]
fn test_optional_dot_before_digit_is_conditional() {
    assert!(matches!(expr("a?.5:b;"), Expression::Conditional(_)));
}

#[test]
fn test_new_expressions() {
    assert!(matches!(expr("new Foo;"), Expression::New(n) if n.arguments.is_empty()));
    let Expression::Member(member) = expr("new Foo(1).bar;") else {
        panic!("Expected Member expression");
    };
    assert!(matches!(&*member.object, Expression::New(n) if n.arguments.len() == 1));
}

#[test]
fn test_new_target() {
    assert_eq!(parse_err("new.target;"), Some(ErrorKind::InvalidNewTarget));
    assert!(parse_err("function f() { new.target; }").is_none());
    assert!(parse_err("function f() { () => new.target; }").is_none());
}

#[test]
fn test_super_outside_method() {
    assert_eq!(parse_err("super.x;"), Some(ErrorKind::InvalidSuperProperty));
    assert_eq!(parse_err("function f() { super(); }"), Some(ErrorKind::InvalidSuperCall));
    assert!(parse_err("({ m() { return super.x; } });").is_none());
}

#[test]
fn test_dynamic_import_and_import_meta() {
    assert!(matches!(expr("import('./a.js');"), Expression::Import(_)));
    assert_eq!(parse_err("import.meta;"), Some(ErrorKind::InvalidImportMeta));
    let program = parse_with("import.meta.url;", &Options::new().module());
    let Expression::Member(member) = first_expression(program) else {
        panic!("Expected Member expression");
    };
    assert!(matches!(&*member.object, Expression::MetaProperty(_)));
}

// ============ LITERALS ============

#[test]
fn test_object_literal_members() {
    let Expression::Object(object) = expr("({a, b: 1, [c]: 2, d() {}, get e() { return 1; }, set e(v) {}, ...f});") else {
        panic!("Expected Object expression");
    };
    assert_eq!(object.properties.len(), 7);
    let kinds: Vec<Option<PropertyKind>> = object
        .properties
        .iter()
        .map(|m| match m {
            ObjectMember::Property(p) => Some(p.kind),
            ObjectMember::Spread(_) => None,
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            Some(PropertyKind::Init),
            Some(PropertyKind::Init),
            Some(PropertyKind::Init),
            Some(PropertyKind::Init),
            Some(PropertyKind::Get),
            Some(PropertyKind::Set),
            None,
        ]
    );
}

#[test]
fn test_accessor_arity() {
    assert_eq!(parse_err("({ get a(x) {} });"), Some(ErrorKind::GetterArity));
    assert_eq!(parse_err("({ set a() {} });"), Some(ErrorKind::SetterArity));
    assert_eq!(parse_err("({ set a(...v) {} });"), Some(ErrorKind::SetterRest));
}

#[test]
fn test_array_holes() {
    let Expression::Array(array) = expr("[, a, , ...b];") else {
        panic!("Expected Array expression");
    };
    assert_eq!(array.elements.len(), 4);
    assert!(array.elements.first().is_some_and(Option::is_none));
    assert!(matches!(array.elements.get(3), Some(Some(Expression::Spread(_)))));
}

#[test]
fn test_template_literal() {
    let Expression::Template(template) = expr("`a${b}c${d}e`;") else {
        panic!("Expected Template expression");
    };
    assert_eq!(template.quasis.len(), 3);
    assert_eq!(template.expressions.len(), 2);
    assert!(template.quasis.last().is_some_and(|q| q.tail));
    assert_eq!(template.quasis.first().map(|q| q.value.raw.as_str()), Some("a"));
}

#[test]
fn test_tagged_template_allows_invalid_escapes() {
    let Expression::TaggedTemplate(tagged) = expr("tag`\\unicode`;") else {
        panic!("Expected TaggedTemplate expression");
    };
    assert!(tagged.quasi.quasis.first().is_some_and(|q| q.value.cooked.is_none()));
    assert_eq!(parse_err("`\\unicode`;"), Some(ErrorKind::InvalidTemplateEscape));
}

#[test]
fn test_unterminated_template() {
    assert!(parse_err("`abc").is_some());
    assert!(parse_err("`a${b`").is_some());
}

// ============ GENERATORS AND ASYNC ============

#[test]
fn test_yield_in_generator() {
    assert!(parse_err("function* g() { yield; yield 1; yield* a; }").is_none());
    assert!(parse_err("function f() { var yield = 1; }").is_none());
    assert!(parse_err("function* g() { var yield = 1; }").is_some());
    assert_eq!(parse_err("function* g(a = yield) {}"), Some(ErrorKind::YieldInParameter));
}

#[test]
fn test_await_in_async_function() {
    assert!(parse_err("async function f() { await x; }").is_none());
    assert!(parse_err("var await = 1;").is_none());
    assert!(parse_err("async function f() { var await; }").is_some());
    assert_eq!(parse_err("async function f(a = await x) {}"), Some(ErrorKind::AwaitInParameter));
    assert!(parse_err("async (a = await 1) => a;").is_some());
}

#[test]
fn test_top_level_await_requires_next() {
    assert!(jsparse::parse("await x;", &Options::new().module()).is_err());
    assert!(jsparse::parse("await x;", &Options::new().module().next()).is_ok());
}

#[test]
fn test_private_in() {
    assert!(jsparse::parse("class A { #x; m(o) { return #x in o; } }", &Options::new().next()).is_ok());
}
