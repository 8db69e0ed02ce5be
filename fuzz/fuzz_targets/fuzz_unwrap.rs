#![no_main]

use libfuzzer_sys::fuzz_target;
use tr31::KeyBlock;

fuzz_target!(|data: &str| {
    // Unwrapping attacker-controlled text must fail cleanly, never panic.
    let kb = KeyBlock::new(vec![0x42u8; 16]).expect("non-empty KBPK");
    let _ = kb.unwrap(data);

    let kb = KeyBlock::new(vec![0x42u8; 32]).expect("non-empty KBPK");
    let _ = kb.unwrap(data);
});
