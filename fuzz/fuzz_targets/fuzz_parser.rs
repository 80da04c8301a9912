#![no_main]

use jsparse::Options;
use libfuzzer_sys::fuzz_target;

/// First input byte picks the option set
fn options_for(selector: u8) -> Options {
    let mut options = Options::new();
    if selector & 1 != 0 {
        options = options.module();
    }
    if selector & 2 != 0 {
        options = options.next();
    }
    if selector & 4 != 0 {
        options = options.ranges().loc().raw();
    }
    if selector & 8 != 0 {
        options = options.global_return();
    }
    if selector & 16 != 0 {
        options = options.experimental();
    }
    options
}

fuzz_target!(|data: &[u8]| {
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };
    let Ok(source) = std::str::from_utf8(rest) else {
        return;
    };

    if source.len() > 100_000 {
        return;
    }

    // Parse should return Ok or Err, never panic
    let options = options_for(selector);
    let _ = jsparse::parse(source, &options);
    let _ = jsparse::tokenize(source, &options);
});
