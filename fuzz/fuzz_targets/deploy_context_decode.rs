#![no_main]

use libfuzzer_sys::fuzz_target;
use shipit_slack_runtime::{DeployDialogMetadata, DeployRequestContext};

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);
    match DeployDialogMetadata::decode(Some(&raw)) {
        Ok(metadata) => {
            assert!(!metadata.channel_id.trim().is_empty());
            let context = DeployRequestContext::from_metadata("U-fuzz", metadata.clone());
            let round_trip = context.dialog_metadata().expect("channel is known");
            assert_eq!(round_trip, metadata);
            if let Ok(encoded) = metadata.encode() {
                let decoded = DeployDialogMetadata::decode(Some(&encoded)).expect("re-decode");
                assert_eq!(decoded, metadata);
            }
        }
        Err(error) => assert!(!error.to_string().is_empty()),
    }
});
