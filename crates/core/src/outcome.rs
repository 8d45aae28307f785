//! The result value every domain operation and every tool produces.

use serde::{Deserialize, Serialize};

/// Outcome of one unit of domain work.
///
/// `success == false` is an ordinary value: validation and resolution
/// failures are reported here with a user-facing `message`, and the optional
/// `error` carries a technical description when something broke underneath.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationOutcome {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OperationOutcome {
    /// A successful outcome with a message only.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            error: None,
        }
    }

    /// A successful outcome with structured data.
    pub fn ok_with(message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            data: Some(data),
            ..Self::ok(message)
        }
    }

    /// A business failure (validation, resolution) with a corrective message.
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error: None,
        }
    }

    /// A failure caused by an unexpected fault.
    pub fn fault(message: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::fail(message)
        }
    }

    /// Attach data to any outcome.
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// The most specific description of a failure: the error if present,
    /// otherwise the message.
    pub fn failure_reason(&self) -> &str {
        self.error.as_deref().unwrap_or(&self.message)
    }

    /// Serialize for a tool-result message.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"success":false,"message":"serialization failed","error":"{e}"}}"#)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fail_omits_empty_fields() {
        let json = OperationOutcome::fail("Quantos animais você comprou?").to_json_string();
        assert!(json.contains(r#""success":false"#));
        assert!(!json.contains("data"));
        assert!(!json.contains("error"));
    }

    #[test]
    fn failure_reason_prefers_error() {
        let outcome = OperationOutcome::fault("Ops", "disk full");
        assert_eq!(outcome.failure_reason(), "disk full");
        assert_eq!(OperationOutcome::fail("sem valor").failure_reason(), "sem valor");
    }
}
