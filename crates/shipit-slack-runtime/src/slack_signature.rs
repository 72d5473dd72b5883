//! Slack request signing (`v0`) verification for the HTTP webhook receiver.

use anyhow::{anyhow, bail, Context, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use shipit_core::unix_skew_seconds;

pub const SLACK_SIGNATURE_HEADER: &str = "x-slack-signature";
pub const SLACK_TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";

/// Verifies a Slack request signature and its timestamp freshness.
///
/// `max_skew_seconds == 0` disables the freshness check.
pub fn verify_slack_request(
    body: &[u8],
    signature: &str,
    timestamp: &str,
    signing_secret: &str,
    now_unix: u64,
    max_skew_seconds: u64,
) -> Result<()> {
    let timestamp = timestamp.trim();
    if timestamp.is_empty() {
        bail!("slack request is missing {SLACK_TIMESTAMP_HEADER}");
    }
    validate_timestamp_skew(timestamp, now_unix, max_skew_seconds)?;
    verify_slack_v0_signature(body, signature.trim(), timestamp, signing_secret)
}

fn verify_slack_v0_signature(
    payload: &[u8],
    signature: &str,
    timestamp: &str,
    secret: &str,
) -> Result<()> {
    let Some(digest_hex) = signature.strip_prefix("v0=") else {
        bail!("slack webhook signature must use v0=<hex> format");
    };
    let signature_bytes = decode_hex(digest_hex)?;
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .context("failed to initialize webhook HMAC verifier")?;
    mac.update(b"v0:");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(payload);
    mac.verify_slice(&signature_bytes)
        .map_err(|_| anyhow!("webhook signature verification failed"))
}

fn decode_hex(value: &str) -> Result<Vec<u8>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        bail!("signature digest cannot be empty");
    }
    if trimmed.len() % 2 != 0 {
        bail!("signature digest must have an even number of hex characters");
    }

    let mut bytes = Vec::with_capacity(trimmed.len() / 2);
    let raw = trimmed.as_bytes();
    for pair in raw.chunks(2) {
        let hex = std::str::from_utf8(pair).context("invalid utf-8 in digest")?;
        let byte = u8::from_str_radix(hex, 16)
            .with_context(|| format!("invalid hex byte '{hex}' in signature digest"))?;
        bytes.push(byte);
    }
    Ok(bytes)
}

fn validate_timestamp_skew(timestamp: &str, now_unix: u64, max_skew_seconds: u64) -> Result<()> {
    let timestamp_seconds = timestamp
        .parse::<u64>()
        .with_context(|| format!("invalid webhook timestamp '{timestamp}'"))?;
    if max_skew_seconds == 0 {
        return Ok(());
    }
    let skew = unix_skew_seconds(now_unix, timestamp_seconds);
    if skew > max_skew_seconds {
        bail!("webhook timestamp skew {skew}s exceeds max {max_skew_seconds}s");
    }
    Ok(())
}

/// Computes the `v0=<hex>` header value Slack would send for `body`.
pub fn sign_slack_request(body: &[u8], timestamp: &str, signing_secret: &str) -> Result<String> {
    let mut mac = Hmac::<Sha256>::new_from_slice(signing_secret.as_bytes())
        .context("failed to initialize webhook HMAC signer")?;
    mac.update(b"v0:");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    let digest = mac.finalize().into_bytes();
    Ok(format!(
        "v0={}",
        digest
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect::<String>()
    ))
}
