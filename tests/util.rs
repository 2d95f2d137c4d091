use regex_scanner::{DfaMatcher, Input, Matcher, Pattern, EMPTY};

/// Compile a regex with an options string, panicking on errors.
pub fn compile(regex: &str, options: &str) -> Pattern {
    match Pattern::compile(regex, options) {
        Ok(pat) => pat,
        Err(err) => panic!("failed to compile {:?}: {}", regex, err),
    }
}

/// A matcher over an owned copy of the input, with matcher options.
pub fn matcher(regex: &str, input: &[u8], options: &str) -> DfaMatcher {
    DfaMatcher::with_options(compile(regex, ""), Input::from(input.to_vec()), options)
        .unwrap()
}

/// The accept indexes of repeated scans.
pub fn scans(regex: &str, input: &str) -> Vec<usize> {
    let mut m = matcher(regex, input.as_bytes(), "");
    m.scan_iter().map(|t| t.accept).collect()
}

/// The texts of repeated finds.
pub fn finds(regex: &str, input: &str, options: &str) -> Vec<String> {
    let mut m = matcher(regex, input.as_bytes(), options);
    m.find_iter().map(|t| String::from_utf8(t.text).unwrap()).collect()
}

/// The split segments, each followed by a `/`.
pub fn splits(regex: &str, input: &str) -> String {
    let mut m = matcher(regex, input.as_bytes(), "");
    let mut out = String::new();
    loop {
        let accept = m.split();
        if accept == 0 {
            break;
        }
        out.push_str(std::str::from_utf8(m.text()).unwrap());
        out.push('/');
        if accept == EMPTY {
            break;
        }
    }
    out
}
