#![allow(dead_code)]

use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

/// Codes that are already in canonical (ISO 639-3) form.
pub const CANONICAL_CODES: &[&str] = &[
    "deu", "eng", "fra", "ces", "fin", "spa", "por", "ita", "nld", "pol", "rus", "jpn", "kor",
    "ara", "hin", "swe", "tur", "ukr",
];

/// ISO 639-1 codes that canonicalize to a different, three-letter form.
pub const TWO_LETTER_CODES: &[&str] = &[
    "de", "en", "fr", "cs", "fi", "es", "pt", "it", "nl", "pl", "ru", "ja", "ko", "ar", "hi",
    "sv", "tr", "uk",
];

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

pub fn arb_canonical_code() -> impl Strategy<Value = &'static str> {
    proptest::sample::select(CANONICAL_CODES)
}

pub fn arb_any_code() -> impl Strategy<Value = String> {
    prop_oneof![
        proptest::sample::select(CANONICAL_CODES).prop_map(str::to_string),
        proptest::sample::select(TWO_LETTER_CODES).prop_map(str::to_string),
        proptest::sample::select(TWO_LETTER_CODES).prop_map(str::to_ascii_uppercase),
    ]
}

/// A valid group, name or version field.
pub fn arb_id_field() -> impl Strategy<Value = String> {
    "[A-Za-z0-9][A-Za-z0-9_.]{0,11}"
}

/// A well-formed dataset id, possibly with surrounding whitespace.
pub fn arb_dataset_id_string() -> impl Strategy<Value = String> {
    (
        arb_id_field(),
        arb_id_field(),
        arb_id_field(),
        arb_any_code(),
        arb_any_code(),
        "[ \t]{0,2}",
        "[ \t]{0,2}",
    )
        .prop_map(|(group, name, version, l1, l2, pre, post)| {
            format!("{pre}{group}-{name}-{version}-{l1}-{l2}{post}")
        })
}

/// Hyphen-joined strings with any number of fields except five.
pub fn arb_wrong_arity_id() -> impl Strategy<Value = String> {
    prop_oneof![1usize..=4, 6usize..=9]
        .prop_flat_map(|n| proptest::collection::vec("[A-Za-z0-9_.]{1,8}", n))
        .prop_map(|fields| fields.join("-"))
}
