//! Deploy request context carried through the confirmation modal.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Slack caps `private_metadata` at 3000 characters.
const PRIVATE_METADATA_MAX_CHARS: usize = 3_000;

#[derive(Debug, Error)]
/// Enumerates `DeployContextError` values.
pub enum DeployContextError {
    #[error("modal private_metadata is missing")]
    Missing,
    #[error("modal private_metadata is not valid deploy context json: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("modal private_metadata has an empty channel id")]
    EmptyChannel,
    #[error("deploy context exceeds slack private_metadata limit ({0} chars)")]
    TooLarge(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Wire shape of the modal's `private_metadata`.
pub struct DeployDialogMetadata {
    pub channel_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_ts: Option<String>,
}

impl DeployDialogMetadata {
    pub fn encode(&self) -> Result<String, DeployContextError> {
        if self.channel_id.trim().is_empty() {
            return Err(DeployContextError::EmptyChannel);
        }
        let encoded = serde_json::to_string(self)?;
        let chars = encoded.chars().count();
        if chars > PRIVATE_METADATA_MAX_CHARS {
            return Err(DeployContextError::TooLarge(chars));
        }
        Ok(encoded)
    }

    pub fn decode(raw: Option<&str>) -> Result<Self, DeployContextError> {
        let raw = raw
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(DeployContextError::Missing)?;
        let mut metadata = serde_json::from_str::<Self>(raw)?;
        if metadata.channel_id.trim().is_empty() {
            return Err(DeployContextError::EmptyChannel);
        }
        metadata.message_ts = metadata
            .message_ts
            .filter(|value| !value.trim().is_empty());
        Ok(metadata)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Where a deploy was requested from and who requested it.
///
/// `channel_id` is `None` when the originating channel could not be
/// recovered; outcome reports then fall back to a direct message.
pub struct DeployRequestContext {
    pub user_id: String,
    pub channel_id: Option<String>,
    pub message_ts: Option<String>,
}

impl DeployRequestContext {
    pub fn from_metadata(user_id: &str, metadata: DeployDialogMetadata) -> Self {
        Self {
            user_id: user_id.to_string(),
            channel_id: Some(metadata.channel_id),
            message_ts: metadata.message_ts,
        }
    }

    pub fn direct_only(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            channel_id: None,
            message_ts: None,
        }
    }

    pub fn dialog_metadata(&self) -> Option<DeployDialogMetadata> {
        self.channel_id
            .as_ref()
            .map(|channel_id| DeployDialogMetadata {
                channel_id: channel_id.clone(),
                message_ts: self.message_ts.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::{DeployContextError, DeployDialogMetadata, DeployRequestContext};

    #[test]
    fn unit_encode_uses_camel_case_keys() {
        let metadata = DeployDialogMetadata {
            channel_id: "C1".to_string(),
            message_ts: Some("123.45".to_string()),
        };
        assert_eq!(
            metadata.encode().expect("encode"),
            r#"{"channelId":"C1","messageTs":"123.45"}"#
        );
    }

    #[test]
    fn unit_encode_omits_absent_message_ts() {
        let metadata = DeployDialogMetadata {
            channel_id: "C9".to_string(),
            message_ts: None,
        };
        assert_eq!(metadata.encode().expect("encode"), r#"{"channelId":"C9"}"#);
    }

    #[test]
    fn functional_decode_restores_context_for_submitting_user() {
        let metadata =
            DeployDialogMetadata::decode(Some(r#"{"channelId":"C1","messageTs":"123.45"}"#))
                .expect("decode");
        let context = DeployRequestContext::from_metadata("U1", metadata);
        assert_eq!(context.channel_id.as_deref(), Some("C1"));
        assert_eq!(context.message_ts.as_deref(), Some("123.45"));
        assert_eq!(context.user_id, "U1");
    }

    #[test]
    fn regression_decode_rejects_missing_malformed_and_channelless_metadata() {
        assert!(matches!(
            DeployDialogMetadata::decode(None),
            Err(DeployContextError::Missing)
        ));
        assert!(matches!(
            DeployDialogMetadata::decode(Some("  ")),
            Err(DeployContextError::Missing)
        ));
        assert!(matches!(
            DeployDialogMetadata::decode(Some("C1")),
            Err(DeployContextError::Malformed(_))
        ));
        assert!(matches!(
            DeployDialogMetadata::decode(Some(r#"{"channelId":" "}"#)),
            Err(DeployContextError::EmptyChannel)
        ));
    }

    #[test]
    fn regression_decode_drops_blank_message_ts() {
        let metadata = DeployDialogMetadata::decode(Some(r#"{"channelId":"C1","messageTs":""}"#))
            .expect("decode");
        assert_eq!(metadata.message_ts, None);
    }

    #[test]
    fn unit_direct_only_context_has_no_dialog_metadata() {
        assert_eq!(DeployRequestContext::direct_only("U1").dialog_metadata(), None);
    }
}
