use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Default canvas position (centre of a 1920x1080 editor surface).
pub const DEFAULT_POSITION_X: i64 = 960;
pub const DEFAULT_POSITION_Y: i64 = 540;

/// Agent type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AgentType {
    #[default]
    Single,
    Orchestrator,
    Worker,
}

impl AgentType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Orchestrator => "orchestrator",
            Self::Worker => "worker",
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "orchestrator" => Ok(Self::Orchestrator),
            "worker" => Ok(Self::Worker),
            _ => Err(anyhow::anyhow!("Invalid agent type: {s}")),
        }
    }
}

/// Agent entity: a deployable assistant definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    /// Server-generated identifier
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// System instruction text
    pub instruction: String,

    /// Model identifier
    pub model: String,

    /// Agent type tag
    pub agent_type: AgentType,

    pub usecase_id: Option<String>,
    pub api_key: Option<String>,
    pub consumer_key: Option<String>,
    pub consumer_secret: Option<String>,

    /// Canvas position in the visual editor
    pub position_x: i64,
    pub position_y: i64,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// The complete set of mutable agent fields.
///
/// Used both for creation and for full-replace updates. Identity and
/// timestamps are not part of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentUpdate {
    pub name: String,
    pub instruction: String,
    pub model: String,
    pub agent_type: AgentType,
    pub usecase_id: Option<String>,
    pub api_key: Option<String>,
    pub consumer_key: Option<String>,
    pub consumer_secret: Option<String>,
    pub position_x: i64,
    pub position_y: i64,
}

impl AgentUpdate {
    pub fn new(
        name: impl Into<String>,
        instruction: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            instruction: instruction.into(),
            model: model.into(),
            agent_type: AgentType::default(),
            usecase_id: None,
            api_key: None,
            consumer_key: None,
            consumer_secret: None,
            position_x: DEFAULT_POSITION_X,
            position_y: DEFAULT_POSITION_Y,
        }
    }

    pub fn with_credentials(
        mut self,
        usecase_id: Option<String>,
        api_key: Option<String>,
        consumer_key: Option<String>,
        consumer_secret: Option<String>,
    ) -> Self {
        self.usecase_id = usecase_id;
        self.api_key = api_key;
        self.consumer_key = consumer_key;
        self.consumer_secret = consumer_secret;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Agent name cannot be empty".to_string());
        }
        if self.model.trim().is_empty() {
            return Err("Agent model cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Agent {
    /// Create an agent with a fresh identifier.
    pub fn new(fields: AgentUpdate) -> Self {
        let mut agent = Self {
            id: Uuid::new_v4(),
            name: String::new(),
            instruction: String::new(),
            model: String::new(),
            agent_type: AgentType::default(),
            usecase_id: None,
            api_key: None,
            consumer_key: None,
            consumer_secret: None,
            position_x: DEFAULT_POSITION_X,
            position_y: DEFAULT_POSITION_Y,
            created_at: Utc::now(),
        };
        agent.apply_update(fields);
        agent
    }

    /// Overwrite every mutable field. `id` and `created_at` stay as they are.
    pub fn apply_update(&mut self, update: AgentUpdate) {
        let AgentUpdate {
            name,
            instruction,
            model,
            agent_type,
            usecase_id,
            api_key,
            consumer_key,
            consumer_secret,
            position_x,
            position_y,
        } = update;

        self.name = name;
        self.instruction = instruction;
        self.model = model;
        self.agent_type = agent_type;
        self.usecase_id = usecase_id;
        self.api_key = api_key;
        self.consumer_key = consumer_key;
        self.consumer_secret = consumer_secret;
        self.position_x = position_x;
        self.position_y = position_y;
    }
}
