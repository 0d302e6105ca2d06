use std::fs;
use std::path::Path;

use atomkit_core::Operation;
use serde::Deserialize;

use crate::error::{CliError, Result};

/// Operations to run as one transaction, in submission order.
///
/// Read from JSON, or YAML when the file ends in `.yaml`/`.yml`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Plan {
    #[serde(default)]
    pub(crate) operations: Vec<Operation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlanFormat {
    Json,
    Yaml,
}

impl PlanFormat {
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Self::Yaml
            }
            _ => Self::Json,
        }
    }
}

impl Plan {
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        match PlanFormat::from_path(path) {
            PlanFormat::Json => serde_json::from_str(&content).map_err(|source| CliError::PlanJson {
                path: path.to_path_buf(),
                source,
            }),
            PlanFormat::Yaml => serde_yml::from_str(&content).map_err(|source| CliError::PlanYaml {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use atomkit_core::OperationKind;

    use super::*;

    #[test]
    fn format_follows_extension() {
        assert_eq!(PlanFormat::from_path(Path::new("plan.json")), PlanFormat::Json);
        assert_eq!(PlanFormat::from_path(Path::new("plan.yaml")), PlanFormat::Yaml);
        assert_eq!(PlanFormat::from_path(Path::new("plan.YML")), PlanFormat::Yaml);
        assert_eq!(PlanFormat::from_path(Path::new("plan")), PlanFormat::Json);
    }

    #[test]
    fn json_plan_keeps_operation_order() {
        let plan: Plan = serde_json::from_str(
            r#"{"operations": [
                {"type": "create", "collection": "widgets", "data": {"name": "a"}},
                {"type": "delete", "collection": "gadgets", "filter": {"id": 1}}
            ]}"#,
        )
        .expect("parse plan");

        let kinds: Vec<_> = plan.operations.iter().map(Operation::kind).collect();
        assert_eq!(kinds, vec![OperationKind::Create, OperationKind::Delete]);
    }

    #[test]
    fn yaml_plan_is_accepted() {
        let plan: Plan = serde_yml::from_str(
            "operations:\n  - type: update\n    collection: widgets\n    data: {name: b}\n    filter: {id: a-id}\n",
        )
        .expect("parse plan");

        assert_eq!(plan.operations.len(), 1);
        assert_eq!(plan.operations[0].collection(), "widgets");
    }

    #[test]
    fn invalid_operation_is_rejected() {
        let result: std::result::Result<Plan, _> = serde_json::from_str(
            r#"{"operations": [{"type": "delete", "collection": "widgets", "filter": {}}]}"#,
        );

        assert!(result.is_err());
    }

    #[test]
    fn missing_operations_key_is_an_empty_plan() {
        let plan: Plan = serde_json::from_str("{}").expect("parse plan");

        assert!(plan.operations.is_empty());
    }
}
