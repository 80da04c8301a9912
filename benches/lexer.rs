use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use jsparse::Options;
use jsparse::context::Context;
use jsparse::lexer::{Lexer, TokenKind};
use jsparse::string_dict::StringDict;

const SIMPLE_EXPR: &str = "1 + 2 * 3 - 4 / 5";

const VARIABLES: &str = r#"
let x = 1;
const y = "hello";
var z = true;
let arr = [1, 2, 3];
let obj = { a: 1, b: 2 };
"#;

const STRINGS: &str = r#"
const s1 = "double quoted string";
const s2 = 'single quoted string';
const s3 = "string with \"escapes\" and \n newlines";
const s4 = `template ${x} literal ${y + z}`;
const s5 = "unicode: A\u{1F600}";
"#;

const OPERATORS: &str = r#"
a + b - c * d / e % f ** g;
a && b || c ?? d;
a == b != c === d !== e;
a < b > c <= d >= e;
a << b >> c >>> d;
a & b | c ^ d;
a += b -= c *= d /= e;
a &&= b ||= c ??= d;
a?.b?.[c]?.(d);
++a; --b; a++; b--;
"#;

const CLASS_DEF: &str = r#"
class Counter extends Base {
    static instances = 0;
    #count = 0;

    constructor(name) {
        super(name);
        Counter.instances++;
    }

    get count() {
        return this.#count;
    }

    increment() {
        this.#count++;
        return this;
    }

    static {
        Counter.ready = true;
    }
}
"#;

const FUNCTIONS: &str = r#"
function simple(a, b) { return a + b; }
function defaultParams(x = 1, y = 2) { return x + y; }
function restParams(...args) { return args.reduce((a, b) => a + b, 0); }
function destructured({ x, y }, [a, b]) { return x + y + a + b; }
const arrow = x => x * 2;
const arrowBlock = (x) => { return x * 2; };
async function asyncFn() { return await Promise.resolve(42); }
function* generator() { yield 1; yield* other(); }
"#;

const CONTROL_FLOW: &str = r#"
if (condition) {
    doSomething();
} else {
    doDefault();
}
for (let i = 0; i < 10; i++) { console.log(i); }
for (const item of items) { process(item); }
for (const key in object) { console.log(key, object[key]); }
while (running) { tick(); }
do { attempt(); } while (shouldRetry);
switch (value) {
    case 1: handleOne(); break;
    default: handleDefault();
}
try { risky(); } catch (error) { handle(error); } finally { cleanup(); }
"#;

const REGEXPS: &str = r#"
const a = /ab+c/gi.test(s);
const b = s.replace(/[a-z]+/g, "x") / 2;
const c = x / y / z;
if (/^\d{3}-\d{4}$/.test(phone)) { ok(); }
"#;

const NUMBERS: &str = r#"
const decimal = 42;
const float = 3.14159;
const scientific = 6.022e23;
const hex = 0xFF;
const octal = 0o755;
const binary = 0b1010;
const bigint = 9007199254740991n;
const separated = 1_000_000;
"#;

const COMMENTS: &str = r#"
// line comment
const a = 1; // trailing
/* block
   comment */
const b = 2;
/**
 * @param x first
 * @returns sum
 */
function add(x, y) { return x + y; }
"#;

fn generate_large_source(size: usize) -> String {
    let mut source = String::with_capacity(size);
    let patterns = [CLASS_DEF, FUNCTIONS, CONTROL_FLOW, OPERATORS, REGEXPS];

    let mut i = 0;
    while source.len() < size {
        source.push_str(patterns[i % patterns.len()]);
        source.push_str("\n\n");
        i += 1;
    }
    source
}

fn lex_all(source: &str) {
    let ctx = Context::from_options(&Options::new().next());
    let mut dict = StringDict::new();
    let mut lexer = Lexer::new(source, ctx, &mut dict);
    while let Ok(token) = lexer.next_token() {
        if token.kind == TokenKind::Eof {
            break;
        }
        black_box(&token);
    }
}

fn bench_lexer_individual(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer/individual");

    let cases = [
        ("simple_expr", SIMPLE_EXPR),
        ("variables", VARIABLES),
        ("strings", STRINGS),
        ("operators", OPERATORS),
        ("class_def", CLASS_DEF),
        ("functions", FUNCTIONS),
        ("control_flow", CONTROL_FLOW),
        ("regexps", REGEXPS),
        ("numbers", NUMBERS),
        ("comments", COMMENTS),
    ];

    for (name, source) in cases {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::new("bytes", name), source, |b, s| {
            b.iter(|| lex_all(black_box(s)));
        });
    }

    group.finish();
}

fn bench_lexer_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer/throughput");

    for size in [1_000, 10_000, 100_000] {
        let source = generate_large_source(size);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("large_source", format!("{}KB", source.len() / 1024)),
            &source,
            |b, s| b.iter(|| lex_all(black_box(s))),
        );
    }

    group.finish();
}

fn bench_lexer_token_types(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer/token_types");

    let identifiers = "foo bar baz qux let const var function class async await yield \\u0061bc";
    group.bench_function("identifiers_keywords", |b| {
        b.iter(|| lex_all(black_box(identifiers)))
    });

    let numbers = "1 2 3 42 3.14 1e10 0xFF 0o755 0b1010 123n 1_000_000 .5";
    group.bench_function("numbers", |b| b.iter(|| lex_all(black_box(numbers))));

    let punctuators = "{ } ( ) [ ] ; , < > <= >= == != === !== + - * / % ** ++ -- << >> >>> & | ^ ! ~ && || ?? ? ?. : = += => ...";
    group.bench_function("punctuators", |b| {
        b.iter(|| lex_all(black_box(punctuators)))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_lexer_individual,
    bench_lexer_throughput,
    bench_lexer_token_types
);
criterion_main!(benches);
