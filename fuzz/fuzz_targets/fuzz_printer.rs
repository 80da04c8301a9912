#![no_main]

use jsparse::Options;
use jsparse::printer::print;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };

    if source.len() > 10_000 {
        return;
    }

    let options = Options::new().next();
    let Ok(program) = jsparse::parse(source, &options) else {
        return;
    };

    // Anything that parsed must print back to source that parses the same way
    let printed = print(&program);
    let reparsed = match jsparse::parse(&printed, &options) {
        Ok(reparsed) => reparsed,
        Err(e) => panic!("printed source {:?} failed to parse: {}", printed, e),
    };
    assert_eq!(
        serde_json::to_value(&program).ok(),
        serde_json::to_value(&reparsed).ok(),
        "source {:?}\nprinted {:?}",
        source,
        printed
    );
});
