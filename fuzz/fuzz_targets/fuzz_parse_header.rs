#![no_main]

use libfuzzer_sys::fuzz_target;
use tr31::Header;

fuzz_target!(|data: &str| {
    // Header parsing must never panic, whatever the input.
    let _ = Header::load(data);
});
