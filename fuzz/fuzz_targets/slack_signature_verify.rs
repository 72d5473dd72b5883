#![no_main]

use libfuzzer_sys::fuzz_target;
use shipit_slack_runtime::{sign_slack_request, verify_slack_request};

const SECRET: &str = "fuzz-signing-secret";

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);
    let mut parts = raw.splitn(3, '\n');
    let signature = parts.next().unwrap_or_default();
    let timestamp = parts.next().unwrap_or_default();
    let body = parts.next().unwrap_or_default().as_bytes();

    // Arbitrary headers must never panic and should almost never verify.
    let _ = verify_slack_request(body, signature, timestamp, SECRET, 1_700_000_000, 300);

    if let Ok(expected) = sign_slack_request(body, "1700000000", SECRET) {
        assert!(
            verify_slack_request(body, &expected, "1700000000", SECRET, 1_700_000_000, 300)
                .is_ok()
        );
    }
});
