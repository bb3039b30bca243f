use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::McpTool;

/// Binding of one tool to one agent with concrete environment values.
///
/// At most one association exists per (agent, tool) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolAssociation {
    pub id: i64,
    pub agent_id: Uuid,
    pub tool_id: i64,
    /// Required variable name -> value
    pub env_values: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
}

/// Association payload before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewToolAssociation {
    pub agent_id: Uuid,
    pub tool_id: i64,
    pub env_values: BTreeMap<String, String>,
}

/// An association joined with the tool it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAssociation {
    pub association: ToolAssociation,
    pub tool: McpTool,
}

impl ResolvedAssociation {
    pub fn new(association: ToolAssociation, tool: McpTool) -> Self {
        Self { association, tool }
    }

    pub fn env_values(&self) -> &BTreeMap<String, String> {
        &self.association.env_values
    }
}
