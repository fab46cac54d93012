// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use ulrim::share::{wrap_text, FixedAdvance};
use ulrim::sync::Bundle;

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    payload: &'a str,
    text: &'a str,
    width: u8,
}

fuzz_target!(|input: Input<'_>| {
    if let Ok(bundle) = Bundle::from_json(input.payload) {
        let records = bundle.to_records();
        assert_eq!(records.len(), bundle.quotes.len());
    }

    let max_width = input.width as f32;
    for line in wrap_text(input.text, &FixedAdvance(1.0), max_width) {
        // Only single words may exceed the budget
        if line.chars().count() as f32 > max_width {
            assert!(!line.contains(' '));
        }
    }
});
