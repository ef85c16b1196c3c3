//! `Action` — the sum type over post-capture completion effects.

use serde::{Deserialize, Serialize};

/// A post-event completion effect.
///
/// Tagged sum type, not a runtime-type hack: the dispatcher matches on the
/// variant directly and an unrecognized `type` tag falls through to
/// `Unknown`, which fails with `UnsupportedAction` at dispatch time rather
/// than at config-parse time — this is a safety net for future action
/// kinds, not a way to smuggle arbitrary payloads through.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Upload {
        remote_path: String,
        #[serde(default)]
        extra_args: Vec<String>,
        #[serde(default = "default_enabled")]
        enabled: bool,
    },
    Command {
        /// Space-separated argv. No shell, no quoting — callers must not
        /// embed whitespace inside a single argument.
        program: String,
        #[serde(default = "default_enabled")]
        enabled: bool,
    },
    #[serde(other)]
    Unknown,
}

fn default_enabled() -> bool {
    true
}

impl Action {
    /// Whether this action is enabled. Disabled actions are skipped before
    /// reaching the dispatcher; unknown variants are a dispatcher-time
    /// failure, not a filter, so this only governs the `enabled` flag
    /// itself.
    pub fn enabled(&self) -> bool {
        match self {
            Action::Upload { enabled, .. } => *enabled,
            Action::Command { enabled, .. } => *enabled,
            Action::Unknown => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_action_variant_deserializes() {
        let json = r#"{"type": "webhook"}"#;
        let action: Action = serde_json::from_str(json).unwrap();
        assert!(matches!(action, Action::Unknown));
    }

    #[test]
    fn command_action_defaults_to_enabled() {
        let json = r#"{"type": "command", "program": "echo hi"}"#;
        let action: Action = serde_json::from_str(json).unwrap();
        assert!(action.enabled());
    }

    #[test]
    fn disabled_flag_is_respected() {
        let json = r#"{"type": "upload", "remote_path": "r", "enabled": false}"#;
        let action: Action = serde_json::from_str(json).unwrap();
        assert!(!action.enabled());
    }
}
