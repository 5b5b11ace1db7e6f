#![no_main]

use libfuzzer_sys::fuzz_target;
use modkit_problem::{DetailsError, marshal_json};

fuzz_target!(|data: &[u8]| {
    // Whatever decodes must encode again
    if let Ok(problem) = DetailsError::unmarshal(data) {
        let _ = marshal_json(&problem).unwrap();
    }
});
