//! Environment value validation for tool associations.
//!
//! Checks run in a fixed order and the first failing one is reported:
//! missing required names, then names the tool does not declare, then blank
//! values.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::errors::EnvValidationError;
use crate::domain::models::ValidationConfig;

/// Validates caller-supplied environment values against a tool's declared
/// required variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvValidator {
    reject_unknown_without_requirements: bool,
}

impl EnvValidator {
    pub fn new(config: &ValidationConfig) -> Self {
        Self {
            reject_unknown_without_requirements: config.reject_unknown_without_requirements,
        }
    }

    /// Validator that also reports undeclared names for tools with no
    /// required variables.
    pub const fn strict() -> Self {
        Self {
            reject_unknown_without_requirements: true,
        }
    }

    pub fn validate(
        &self,
        required: &[String],
        provided: &BTreeMap<String, String>,
    ) -> Result<(), EnvValidationError> {
        if required.is_empty() && !self.reject_unknown_without_requirements {
            return Ok(());
        }

        let required: BTreeSet<&str> = required.iter().map(String::as_str).collect();
        let provided_names: BTreeSet<&str> = provided.keys().map(String::as_str).collect();

        let missing = sorted_names(required.difference(&provided_names));
        if !missing.is_empty() {
            return Err(EnvValidationError::Missing(missing));
        }

        let unknown = sorted_names(provided_names.difference(&required));
        if !unknown.is_empty() {
            return Err(EnvValidationError::Unknown(unknown));
        }

        let empty = sorted_names(
            provided
                .iter()
                .filter(|(_, value)| value.trim().is_empty())
                .map(|(name, _)| name),
        );
        if !empty.is_empty() {
            return Err(EnvValidationError::Empty(empty));
        }

        Ok(())
    }
}

fn sorted_names<'a, I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a S>,
    S: AsRef<str> + ?Sized + 'a,
{
    let mut names: Vec<String> = names.into_iter().map(|s| s.as_ref().to_string()).collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    fn env(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
    }

    #[test]
    fn test_exact_match_passes() {
        let validator = EnvValidator::default();
        let result = validator.validate(&required(&["API_KEY", "REGION"]), &env(&[("API_KEY", "x"), ("REGION", "eu")]));
        assert!(result.is_ok());
    }

    #[test]
    fn test_missing_only() {
        let err = EnvValidator::default()
            .validate(&required(&["API_KEY", "REGION"]), &env(&[("REGION", "eu")]))
            .unwrap_err();
        assert_eq!(err, EnvValidationError::Missing(vec!["API_KEY".to_string()]));
        assert_eq!(err.to_string(), "Missing required environment variables: API_KEY");
    }

    #[test]
    fn test_unknown_only() {
        let err = EnvValidator::default()
            .validate(&required(&["API_KEY"]), &env(&[("API_KEY", "x"), ("EXTRA", "y")]))
            .unwrap_err();
        assert_eq!(err, EnvValidationError::Unknown(vec!["EXTRA".to_string()]));
    }

    #[test]
    fn test_empty_only() {
        let err = EnvValidator::default()
            .validate(&required(&["API_KEY", "TOKEN"]), &env(&[("API_KEY", "   "), ("TOKEN", "")]))
            .unwrap_err();
        assert_eq!(err, EnvValidationError::Empty(vec!["API_KEY".to_string(), "TOKEN".to_string()]));
    }

    #[test]
    fn test_missing_reported_before_unknown_and_empty() {
        let err = EnvValidator::default()
            .validate(&required(&["API_KEY", "TOKEN"]), &env(&[("TOKEN", ""), ("EXTRA", "y")]))
            .unwrap_err();
        assert!(matches!(err, EnvValidationError::Missing(_)));
    }

    #[test]
    fn test_unknown_reported_before_empty() {
        let err = EnvValidator::default()
            .validate(&required(&["API_KEY"]), &env(&[("API_KEY", ""), ("EXTRA", "y")]))
            .unwrap_err();
        assert!(matches!(err, EnvValidationError::Unknown(_)));
    }

    #[test]
    fn test_no_requirements_accepts_anything_by_default() {
        let validator = EnvValidator::default();
        assert!(validator.validate(&[], &env(&[("EXTRA", "")])).is_ok());
        assert!(validator.validate(&[], &BTreeMap::new()).is_ok());
    }

    #[test]
    fn test_strict_policy_rejects_unknown_without_requirements() {
        let validator = EnvValidator::strict();
        let err = validator.validate(&[], &env(&[("EXTRA", "y")])).unwrap_err();
        assert_eq!(err, EnvValidationError::Unknown(vec!["EXTRA".to_string()]));
        assert!(validator.validate(&[], &BTreeMap::new()).is_ok());
    }

    #[test]
    fn test_from_config() {
        let validator = EnvValidator::new(&ValidationConfig {
            reject_unknown_without_requirements: true,
        });
        assert!(validator.validate(&[], &env(&[("X", "1")])).is_err());
    }
}
