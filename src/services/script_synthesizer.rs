//! Agent runner script generation.
//!
//! Renders an agent and its tool associations into a standalone Python
//! script. Every user-controlled value passes through an escaping layer:
//! `{{value}}` expands to the contents of a double-quoted Python string
//! literal, and `{{{py_block ...}}}` to the contents of a triple-quoted one
//! with line breaks preserved.

use handlebars::{handlebars_helper, Handlebars};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use thiserror::Error;

use crate::domain::models::{Agent, ResolvedAssociation};

const TEMPLATE_NAME: &str = "agent_script";

const AGENT_SCRIPT_TEMPLATE: &str = r#"import os
from google.genai import Client

# Service endpoints
{{#each bootstrap_env}}
os.environ["{{name}}"] = "{{value}}"
{{/each}}

# Agent configuration
os.environ["USECASE_ID"] = "{{usecase_id}}"
os.environ["API_KEY"] = "{{api_key}}"
os.environ["CONSUMER_KEY"] = "{{consumer_key}}"
os.environ["CONSUMER_SECRET"] = "{{consumer_secret}}"

# Initialize client
client = Client()

# Create agent
agent = client.agents.create(
    name="{{agent_name}}",
    model="{{model}}",
    system_instruction="""{{{py_block instruction}}}""",
    tools=[],
)

# MCP tools
{{#each tools}}
{{#each env}}
os.environ["{{name}}"] = "{{value}}"
{{/each}}
# Tool: {{{label}}} ({{{package}}})
{{/each}}

# Start chat interface
if __name__ == "__main__":
    port = os.environ.get("AGENT_PORT", "unassigned")
    print("Agent " + "{{agent_name}}" + " is running on port " + port)
"#;

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Invalid script template: {0}")]
    Template(#[from] Box<handlebars::TemplateError>),

    #[error("Failed to render agent script: {0}")]
    Render(#[from] handlebars::RenderError),
}

#[derive(Serialize)]
struct EnvEntry<'a> {
    name: &'a str,
    value: &'a str,
}

#[derive(Serialize)]
struct ToolSection<'a> {
    label: String,
    package: String,
    env: Vec<EnvEntry<'a>>,
}

#[derive(Serialize)]
struct ScriptContext<'a> {
    bootstrap_env: Vec<EnvEntry<'a>>,
    usecase_id: &'a str,
    api_key: &'a str,
    consumer_key: &'a str,
    consumer_secret: &'a str,
    agent_name: &'a str,
    model: &'a str,
    instruction: &'a str,
    tools: Vec<ToolSection<'a>>,
}

handlebars_helper!(py_block: |text: str| escape_triple_quoted(text));

/// Produces the runner script for an agent.
///
/// Output depends only on the agent, its associations (in the given order)
/// and the bootstrap variables supplied at construction.
pub struct ScriptSynthesizer {
    registry: Handlebars<'static>,
    bootstrap_env: BTreeMap<String, String>,
}

impl ScriptSynthesizer {
    pub fn new(bootstrap_env: BTreeMap<String, String>) -> Result<Self, SynthesisError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_escape_fn(escape_python_str);
        registry.register_helper("py_block", Box::new(py_block));
        registry
            .register_template_string(TEMPLATE_NAME, AGENT_SCRIPT_TEMPLATE)
            .map_err(Box::new)?;

        Ok(Self {
            registry,
            bootstrap_env,
        })
    }

    pub fn render(&self, agent: &Agent, associations: &[ResolvedAssociation]) -> Result<String, SynthesisError> {
        let context = ScriptContext {
            bootstrap_env: self
                .bootstrap_env
                .iter()
                .map(|(name, value)| EnvEntry { name, value })
                .collect(),
            usecase_id: agent.usecase_id.as_deref().unwrap_or_default(),
            api_key: agent.api_key.as_deref().unwrap_or_default(),
            consumer_key: agent.consumer_key.as_deref().unwrap_or_default(),
            consumer_secret: agent.consumer_secret.as_deref().unwrap_or_default(),
            agent_name: &agent.name,
            model: &agent.model,
            instruction: &agent.instruction,
            tools: associations
                .iter()
                .map(|resolved| ToolSection {
                    label: flatten_for_comment(&resolved.tool.name),
                    package: flatten_for_comment(&resolved.tool.package),
                    env: resolved
                        .env_values()
                        .iter()
                        .map(|(name, value)| EnvEntry { name, value })
                        .collect(),
                })
                .collect(),
        };

        Ok(self.registry.render(TEMPLATE_NAME, &context)?)
    }
}

/// Contents of a double-quoted Python string literal that evaluates to `raw`.
pub fn escape_python_str(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\x{:02x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out
}

/// Contents of a triple-quoted Python string literal that evaluates to
/// `raw`, keeping line breaks as real newlines.
pub fn escape_triple_quoted(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' | '\t' => out.push(c),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => {
                let _ = write!(out, "\\x{:02x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out
}

fn flatten_for_comment(raw: &str) -> String {
    raw.chars().map(|c| if c.is_control() { ' ' } else { c }).collect()
}
