//! Numeric character reference decoding for stored setting values.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static DECIMAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&#(0*[0-9]{1,7});").expect("valid regex"));
static HEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&#[xX](0*[0-9A-Fa-f]{1,6});").expect("valid regex"));

/// Decode `&#NNN;` and `&#xHH;` references. Named entities and references
/// to invalid code points are left as written.
///
/// Decimal references are decoded first and hex references second, over the
/// result of the first pass, so `&#38;#x41;` reads as `A`.
pub fn decode_numeric_entities(input: &str) -> String {
    if !input.contains("&#") {
        return input.to_string();
    }

    let decimal = DECIMAL.replace_all(input, |caps: &Captures<'_>| {
        decode(&caps[1], 10).unwrap_or_else(|| caps[0].to_string())
    });
    HEX.replace_all(&decimal, |caps: &Captures<'_>| decode(&caps[1], 16).unwrap_or_else(|| caps[0].to_string()))
        .into_owned()
}

fn decode(digits: &str, radix: u32) -> Option<String> {
    let code = u32::from_str_radix(digits, radix).ok()?;
    char::from_u32(code).map(String::from)
}
