#![no_main]

use jsparse::Options;
use jsparse::context::Context;
use jsparse::lexer::{Lexer, TokenKind};
use jsparse::string_dict::StringDict;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };

    if source.len() > 100_000 {
        return;
    }

    let ctx = Context::from_options(&Options::new().next());
    let mut dict = StringDict::new();
    let mut lexer = Lexer::new(source, ctx, &mut dict);

    // Every token either lexes or reports an error; the scanner must never panic
    let mut last_end = 0;
    while let Ok(token) = lexer.next_token() {
        assert!(token.span.end >= last_end, "lexer went backwards at {}", token.span.start);
        last_end = token.span.end;
        if matches!(token.kind, TokenKind::Eof) {
            break;
        }
    }
});
