//! Fuzz target for IPC message decoding.
//!
//! Arbitrary bytes must decode to Ok or Err, never panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mlops_agent::ipc::{decode_message, decode_reply, DEFAULT_MAX_MESSAGE_SIZE};

fuzz_target!(|data: &[u8]| {
    let _ = decode_message(data, DEFAULT_MAX_MESSAGE_SIZE);
    let _ = decode_reply(data, DEFAULT_MAX_MESSAGE_SIZE);
});
