//! Email connector. Prepares drafts only; nothing is delivered.

use async_trait::async_trait;
use regex::Regex;

use super::{Connector, ConnectorKind, ConnectorResult};

pub struct EmailConnector {
    recipient: Regex,
}

impl EmailConnector {
    /// Create an email connector that validates recipients before drafting.
    pub fn new() -> Self {
        Self {
            recipient: Regex::new(r"(?i)to=\s*([^;]*)").expect("Invalid recipient regex"),
        }
    }

    fn recipient<'a>(&self, instruction: &'a str) -> Option<&'a str> {
        self.recipient
            .captures(instruction)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
    }
}

impl Default for EmailConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for EmailConnector {
    fn kind(&self) -> ConnectorKind {
        ConnectorKind::Email
    }

    async fn run(&self, instruction: &str) -> ConnectorResult {
        let instruction = instruction.trim();
        if let Some(to) = self.recipient(instruction) {
            if !to.contains('@') {
                tracing::warn!(recipient = %to, "Email recipient rejected");
                return ConnectorResult::failed(format!(
                    "[email-oauth] invalid recipient: '{}'",
                    to
                ));
            }
        }
        tracing::info!(instruction = %instruction, "Email action prepared");
        ConnectorResult::ok(format!("[email-oauth] prepared action: {}", instruction))
    }
}
