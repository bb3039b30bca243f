use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered MCP tool that agents can be bound to.
///
/// Tools are immutable once created; only registration and deletion are
/// supported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpTool {
    /// Store-assigned identifier
    pub id: i64,

    /// Unique tool name
    pub name: String,

    /// Installable package reference (passed verbatim to the installer)
    pub package: String,

    /// Human readable description
    pub description: String,

    /// Ordered list of environment variables an association must supply
    pub required_env: Vec<String>,

    /// Registration timestamp
    pub created_at: DateTime<Utc>,
}

/// Registration payload for a new tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMcpTool {
    pub name: String,
    pub package: String,
    pub description: String,
    pub required_env: Vec<String>,
}

impl NewMcpTool {
    pub fn new(name: impl Into<String>, package: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            package: package.into(),
            description: String::new(),
            required_env: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_required_env<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_env = names.into_iter().map(Into::into).collect();
        self
    }

    /// Basic shape checks performed before the store sees the record.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Tool name cannot be empty".to_string());
        }
        if self.package.trim().is_empty() {
            return Err("Tool package cannot be empty".to_string());
        }
        if let Some(blank) = self.required_env.iter().find(|n| n.trim().is_empty()) {
            return Err(format!("Invalid environment variable name: '{blank}'"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let tool = NewMcpTool::new("search", "pkg-search")
            .with_description("Web search")
            .with_required_env(["API_KEY", "REGION"]);
        assert_eq!(tool.name, "search");
        assert_eq!(tool.required_env, vec!["API_KEY", "REGION"]);
        assert!(tool.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_fields() {
        assert!(NewMcpTool::new(" ", "pkg").validate().is_err());
        assert!(NewMcpTool::new("x", "").validate().is_err());
        assert!(NewMcpTool::new("x", "pkg")
            .with_required_env(["OK", " "])
            .validate()
            .is_err());
    }
}
