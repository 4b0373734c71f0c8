//! Workflow configuration loading.

use serde::{Deserialize, Serialize};

use bankrecon_core::{validate_settings, MatchSettings, ReconError, ReconResult};

use crate::corporate::CorporateColumns;
use crate::workflow::WorkflowKind;

/// A full workflow configuration: variant, matcher settings, and the
/// Corporate column bindings when that variant is selected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Which bank workflow to run
    pub workflow: WorkflowKind,
    /// Matcher settings for the standard engine
    #[serde(default)]
    pub settings: MatchSettings,
    /// Settlement column bindings for the Corporate engine
    #[serde(default)]
    pub corporate: CorporateColumns,
}

impl WorkflowConfig {
    /// Parse and validate a YAML configuration document.
    pub fn from_yaml(source: &str) -> ReconResult<Self> {
        let config: Self = serde_yaml::from_str(source)
            .map_err(|e| ReconError::config(format!("invalid workflow config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the parsed configuration.
    pub fn validate(&self) -> ReconResult<()> {
        validate_settings(&self.settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bankrecon_core::AmountMode;

    #[test]
    fn minimal_yaml_fills_defaults() {
        let config = WorkflowConfig::from_yaml("workflow: fnb\n").unwrap();
        assert_eq!(config.workflow, WorkflowKind::Fnb);
        assert!(config.settings.match_dates);
        assert_eq!(config.settings.similarity_threshold, 85);
    }

    #[test]
    fn settings_overrides_apply() {
        let source = r"
workflow: absa
settings:
  amount_mode: credits_only
  similarity_threshold: 90
  date_tolerance: true
";
        let config = WorkflowConfig::from_yaml(source).unwrap();
        assert_eq!(config.settings.amount_mode, AmountMode::CreditsOnly);
        assert_eq!(config.settings.similarity_threshold, 90);
        assert!(config.settings.date_tolerance);
    }

    #[test]
    fn corporate_columns_parse() {
        let source = r"
workflow: corporate
corporate:
  debit: FD Amount
  credit: FC Amount
";
        let config = WorkflowConfig::from_yaml(source).unwrap();
        assert_eq!(config.corporate.debit, "FD Amount");
        assert_eq!(config.corporate.journal, "Journal");
    }

    #[test]
    fn invalid_threshold_is_rejected() {
        let source = r"
workflow: fnb
settings:
  similarity_threshold: 150
";
        assert!(WorkflowConfig::from_yaml(source).is_err());
    }

    #[test]
    fn unknown_workflow_is_rejected() {
        assert!(WorkflowConfig::from_yaml("workflow: barclays\n").is_err());
    }
}
