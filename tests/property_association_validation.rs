//! Property tests for environment validation and script synthesis.

use std::collections::{BTreeMap, BTreeSet};

use agentdeck::domain::models::{Agent, AgentUpdate, McpTool, ResolvedAssociation, ToolAssociation};
use agentdeck::domain::EnvValidationError;
use agentdeck::services::{EnvValidator, ScriptSynthesizer};
use proptest::prelude::*;

fn var_name() -> impl Strategy<Value = String> {
    "[A-Z][A-Z0-9_]{0,7}"
}

fn var_names() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set(var_name(), 0..6)
}

proptest! {
    #[test]
    fn prop_exact_nonblank_mapping_is_accepted(required in var_names(), value in "[a-z0-9]{1,12}") {
        let required: Vec<String> = required.into_iter().collect();
        let provided: BTreeMap<String, String> =
            required.iter().map(|name| (name.clone(), value.clone())).collect();

        prop_assert!(EnvValidator::default().validate(&required, &provided).is_ok());
    }

    #[test]
    fn prop_dropping_a_required_name_is_reported(required in var_names().prop_filter("non-empty", |s| !s.is_empty())) {
        let required: Vec<String> = required.into_iter().collect();
        let mut provided: BTreeMap<String, String> =
            required.iter().map(|name| (name.clone(), "v".to_string())).collect();
        let dropped = required[0].clone();
        provided.remove(&dropped);

        let err = EnvValidator::default().validate(&required, &provided).unwrap_err();
        prop_assert_eq!(err, EnvValidationError::Missing(vec![dropped]));
    }

    #[test]
    fn prop_extra_name_is_reported(required in var_names().prop_filter("non-empty", |s| !s.is_empty()), extra in "[a-z]{3,8}") {
        let required: Vec<String> = required.into_iter().collect();
        let mut provided: BTreeMap<String, String> =
            required.iter().map(|name| (name.clone(), "v".to_string())).collect();
        provided.insert(extra.clone(), "v".to_string());

        let err = EnvValidator::default().validate(&required, &provided).unwrap_err();
        prop_assert_eq!(err, EnvValidationError::Unknown(vec![extra]));
    }

    #[test]
    fn prop_script_is_deterministic(name in ".{0,20}", instruction in ".{0,80}", value in ".{0,20}") {
        let synthesizer = ScriptSynthesizer::new(BTreeMap::new()).unwrap();
        let mut fields = AgentUpdate::new(name, instruction, "gemini-2.0-flash");
        fields.api_key = Some(value.clone());
        let agent = Agent::new(fields);

        let tool = McpTool {
            id: 1,
            name: "search".to_string(),
            package: "pkg-search".to_string(),
            description: String::new(),
            required_env: vec!["API_KEY".to_string()],
            created_at: agent.created_at,
        };
        let association = ToolAssociation {
            id: 1,
            agent_id: agent.id,
            tool_id: 1,
            env_values: BTreeMap::from([("API_KEY".to_string(), value)]),
            created_at: agent.created_at,
        };
        let resolved = vec![ResolvedAssociation { association, tool }];

        let first = synthesizer.render(&agent, &resolved).unwrap();
        let second = synthesizer.render(&agent, &resolved).unwrap();
        prop_assert_eq!(first, second);
    }
}
