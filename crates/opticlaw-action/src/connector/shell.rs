//! Shell command connector.
//!
//! In sandbox mode (the default) an admitted command is only reported.
//! Execute mode runs it through `sh -c` with captured output and a hard
//! timeout; the child is killed when the timeout fires.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use opticlaw_core::config::{ConnectorConfig, ShellMode};
use tokio::process::Command;

use super::{Connector, ConnectorKind, ConnectorResult};

pub struct ShellConnector {
    mode: ShellMode,
    timeout: Duration,
    denylist: Vec<String>,
    max_output_chars: usize,
}

impl ShellConnector {
    /// Build a shell connector from the `[connectors]` section.
    pub fn from_config(config: &ConnectorConfig) -> Self {
        Self {
            mode: config.shell_mode,
            timeout: Duration::from_secs(config.shell_timeout_secs),
            denylist: config
                .shell_denylist
                .iter()
                .map(|d| d.to_lowercase())
                .collect(),
            max_output_chars: config.max_output_chars,
        }
    }

    /// Reason the command is refused, if any.
    fn blocked_reason(&self, command: &str) -> Option<String> {
        if command.is_empty() {
            return Some("empty instruction".to_string());
        }
        let lower = command.to_lowercase();
        self.denylist
            .iter()
            .find(|fragment| lower.contains(fragment.as_str()))
            .map(|fragment| format!("matches denylisted fragment '{}'", fragment))
    }

    async fn execute(&self, command: &str) -> ConnectorResult {
        let child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) => {
                return ConnectorResult::failed(format!("[shell-exec] failed to start: {}", e))
            }
        };

        // Dropping the output future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return ConnectorResult::failed(format!("[shell-exec] failed: {}", e)),
            Err(_) => {
                return ConnectorResult::failed(format!(
                    "[shell-exec] timed out after {}s: {}",
                    self.timeout.as_secs(),
                    command
                ))
            }
        };

        if output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            ConnectorResult::ok(format!(
                "[shell-exec] {}",
                truncate_chars(stdout.trim(), self.max_output_chars)
            ))
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let code = output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            ConnectorResult::failed(format!(
                "[shell-exec] exit {}: {}",
                code,
                truncate_chars(stderr.trim(), self.max_output_chars)
            ))
        }
    }
}

impl Default for ShellConnector {
    fn default() -> Self {
        Self::from_config(&ConnectorConfig::default())
    }
}

#[async_trait]
impl Connector for ShellConnector {
    fn kind(&self) -> ConnectorKind {
        ConnectorKind::Shell
    }

    async fn run(&self, instruction: &str) -> ConnectorResult {
        let command = instruction.trim();
        if let Some(reason) = self.blocked_reason(command) {
            tracing::warn!(command = %command, reason = %reason, "Shell command blocked");
            return ConnectorResult::failed(format!("[shell-sandbox] blocked: {}", reason));
        }

        match self.mode {
            ShellMode::Sandbox => {
                tracing::info!(command = %command, "Shell command reported in sandbox");
                ConnectorResult::ok(format!("[shell-sandbox] executed: {}", command))
            }
            ShellMode::Execute => {
                tracing::info!(command = %command, "Executing shell command");
                self.execute(command).await
            }
        }
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn execute_connector(timeout_secs: u64) -> ShellConnector {
        ShellConnector::from_config(&ConnectorConfig {
            shell_mode: ShellMode::Execute,
            shell_timeout_secs: timeout_secs,
            ..ConnectorConfig::default()
        })
    }

    fn sh_available() -> bool {
        std::process::Command::new("sh")
            .arg("-c")
            .arg("true")
            .status()
            .is_ok()
    }

    // =========================================================================
    // Sandbox mode
    // =========================================================================

    #[tokio::test]
    async fn test_sandbox_reports_command() {
        let result = ShellConnector::default().run("echo ok").await;
        assert!(result.success);
        assert_eq!(result.detail, "[shell-sandbox] executed: echo ok");
    }

    #[tokio::test]
    async fn test_empty_instruction_blocked() {
        let result = ShellConnector::default().run("   ").await;
        assert!(!result.success);
        assert_eq!(result.detail, "[shell-sandbox] blocked: empty instruction");
    }

    #[tokio::test]
    async fn test_denylisted_fragment_blocked_case_insensitive() {
        let connector = ShellConnector::default();
        for cmd in ["rm -rf /", "sudo SHUTDOWN now", "dd if=/dev/zero of=/dev/sda"] {
            let result = connector.run(cmd).await;
            assert!(!result.success, "{} should be blocked", cmd);
            assert!(result.detail.starts_with("[shell-sandbox] blocked:"));
        }
    }

    #[tokio::test]
    async fn test_denylist_applies_in_execute_mode() {
        let result = execute_connector(5).run("reboot").await;
        assert!(!result.success);
        assert!(result.detail.contains("blocked"));
    }

    // =========================================================================
    // Execute mode
    // =========================================================================

    #[tokio::test]
    async fn test_execute_captures_stdout() {
        if !sh_available() {
            return;
        }
        let result = execute_connector(5).run("echo ok").await;
        assert!(result.success);
        assert_eq!(result.detail, "[shell-exec] ok");
    }

    #[tokio::test]
    async fn test_execute_non_zero_exit_fails_with_stderr() {
        if !sh_available() {
            return;
        }
        let result = execute_connector(5).run("echo broken >&2; exit 3").await;
        assert!(!result.success);
        assert_eq!(result.detail, "[shell-exec] exit 3: broken");
    }

    #[tokio::test]
    async fn test_execute_timeout_reports_failure() {
        if !sh_available() {
            return;
        }
        let connector = ShellConnector {
            timeout: Duration::from_millis(100),
            ..execute_connector(1)
        };
        let result = connector.run("sleep 5").await;
        assert!(!result.success);
        assert!(result.detail.contains("timed out"));
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 5), "hello");
        assert_eq!(truncate_chars("hello world", 5), "hello...");
        assert_eq!(truncate_chars("héllo", 2), "hé...");
    }
}
