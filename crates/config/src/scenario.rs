//! Scenario files: an allocation table plus a script of requests and releases
//!
//! ```toml
//! name = "classic"
//! total = [10, 5, 7]
//! max_need = [[7, 5, 3], [3, 2, 2], [9, 0, 2]]
//!
//! [[steps]]
//! action = "request"
//! process = 0
//! amounts = [0, 1, 0]
//! ```
//!
//! `allocated` is optional and only describes a starting table to be checked
//! for safety; replayed scenarios always start from an empty allocation.

use banker_errors::{ConfigError, Error};
use banker_types::{ProcessId, StepAction, Units};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// One scripted allocator call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub action: StepAction,
    pub process: ProcessId,
    pub amounts: Vec<Units>,
}

impl Step {
    #[must_use]
    pub fn request(process: usize, amounts: Vec<Units>) -> Self {
        Self {
            action: StepAction::Request,
            process: ProcessId(process),
            amounts,
        }
    }

    #[must_use]
    pub fn release(process: usize, amounts: Vec<Units>) -> Self {
        Self {
            action: StepAction::Release,
            process: ProcessId(process),
            amounts,
        }
    }
}

/// Allocation table and step script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Display name; defaults to the file stem when loaded from disk
    #[serde(default)]
    pub name: String,
    pub total: Vec<Units>,
    pub max_need: Vec<Vec<Units>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocated: Option<Vec<Vec<Units>>>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Load and validate a scenario file
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the file cannot be read, `ParseError` for invalid
    /// TOML and `InvalidScenario` if the tables or steps are inconsistent.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => ConfigError::NotFound {
                    path: path.display().to_string(),
                }
                .into(),
                _ => Error::io_with_path(&e, path),
            })?;

        let mut scenario: Self = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            message: format!("{}: {e}", path.display()),
        })?;
        if scenario.name.is_empty() {
            scenario.name = path
                .file_stem()
                .map_or_else(|| "scenario".to_string(), |s| s.to_string_lossy().into_owned());
        }

        scenario.validate()?;
        debug!(
            name = %scenario.name,
            processes = scenario.processes(),
            resource_types = scenario.resource_types(),
            steps = scenario.steps.len(),
            "loaded scenario"
        );
        Ok(scenario)
    }

    /// Parse and validate a scenario from TOML text
    ///
    /// # Errors
    ///
    /// Same as [`Scenario::load_from_file`], minus the I/O.
    pub fn from_toml(contents: &str) -> Result<Self, Error> {
        let scenario: Self = toml::from_str(contents).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Check that every row and step matches the table dimensions
    ///
    /// Whether the declarations are admissible (`max_need <= total`) is left
    /// to the allocator, which reports it with its own error.
    ///
    /// # Errors
    ///
    /// Returns `InvalidScenario` naming the first inconsistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let resource_types = self.resource_types();
        let processes = self.processes();

        if let Some(i) = self
            .max_need
            .iter()
            .position(|row| row.len() != resource_types)
        {
            return Err(self.invalid(format!(
                "max_need row {i} has {} entries, expected {resource_types}",
                self.max_need[i].len()
            )));
        }

        if let Some(allocated) = &self.allocated {
            if allocated.len() != processes {
                return Err(self.invalid(format!(
                    "allocated has {} rows, expected {processes}",
                    allocated.len()
                )));
            }
            if let Some(i) = allocated.iter().position(|row| row.len() != resource_types) {
                return Err(self.invalid(format!(
                    "allocated row {i} has {} entries, expected {resource_types}",
                    allocated[i].len()
                )));
            }
        }

        for (index, step) in self.steps.iter().enumerate() {
            if step.process.index() >= processes {
                return Err(self.invalid(format!(
                    "step {index} names {} but only {processes} processes exist",
                    step.process
                )));
            }
            if step.amounts.len() != resource_types {
                return Err(self.invalid(format!(
                    "step {index} has {} amounts, expected {resource_types}",
                    step.amounts.len()
                )));
            }
        }

        Ok(())
    }

    #[must_use]
    pub fn processes(&self) -> usize {
        self.max_need.len()
    }

    #[must_use]
    pub fn resource_types(&self) -> usize {
        self.total.len()
    }

    /// Starting allocation: the declared one, or all zeros
    #[must_use]
    pub fn initial_allocation(&self) -> Vec<Vec<Units>> {
        self.allocated
            .clone()
            .unwrap_or_else(|| vec![vec![0; self.resource_types()]; self.processes()])
    }

    fn invalid(&self, message: String) -> ConfigError {
        ConfigError::InvalidScenario {
            name: self.name.clone(),
            message,
        }
    }

    /// Three processes over `{10, 5, 7}`, ending in a request that would
    /// risk deadlock
    #[must_use]
    pub fn classic() -> Self {
        Self {
            name: "classic".to_string(),
            total: vec![10, 5, 7],
            max_need: vec![vec![7, 5, 3], vec![3, 2, 2], vec![9, 0, 2]],
            allocated: None,
            steps: vec![
                Step::request(0, vec![0, 1, 0]),
                Step::request(1, vec![2, 0, 0]),
                Step::request(2, vec![3, 0, 2]),
                Step::release(0, vec![0, 1, 0]),
                Step::request(0, vec![5, 4, 3]),
            ],
        }
    }

    /// Two processes over `{6, 4}` that are both granted
    #[must_use]
    pub fn small() -> Self {
        Self {
            name: "small".to_string(),
            total: vec![6, 4],
            max_need: vec![vec![4, 2], vec![3, 3]],
            allocated: None,
            steps: vec![
                Step::request(0, vec![1, 1]),
                Step::request(1, vec![2, 1]),
                Step::release(0, vec![1, 1]),
            ],
        }
    }

    /// Five processes over `{10, 5, 7}` with no script; the stress default
    #[must_use]
    pub fn textbook() -> Self {
        Self {
            name: "textbook".to_string(),
            total: vec![10, 5, 7],
            max_need: vec![
                vec![7, 5, 3],
                vec![3, 2, 2],
                vec![9, 0, 2],
                vec![2, 2, 2],
                vec![4, 3, 3],
            ],
            allocated: None,
            steps: Vec::new(),
        }
    }

    /// Look up a built-in scenario by name
    #[must_use]
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "classic" => Some(Self::classic()),
            "small" => Some(Self::small()),
            "textbook" => Some(Self::textbook()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_are_valid() {
        for name in ["classic", "small", "textbook"] {
            let scenario = Scenario::builtin(name).unwrap();
            assert_eq!(scenario.name, name);
            scenario.validate().unwrap();
        }
        assert!(Scenario::builtin("missing").is_none());
    }

    #[test]
    fn test_step_with_unknown_process() {
        let mut scenario = Scenario::small();
        scenario.steps.push(Step::request(2, vec![1, 1]));
        let err = scenario.validate().unwrap_err();
        assert!(err.to_string().contains("step 3 names P2"));
    }

    #[test]
    fn test_ragged_tables() {
        let mut scenario = Scenario::small();
        scenario.max_need[1].push(1);
        assert!(matches!(
            scenario.validate(),
            Err(ConfigError::InvalidScenario { .. })
        ));

        let mut scenario = Scenario::small();
        scenario.allocated = Some(vec![vec![0, 0]]);
        assert!(scenario.validate().is_err());
    }

    #[test]
    fn test_initial_allocation_defaults_to_zero() {
        let scenario = Scenario::small();
        assert_eq!(scenario.initial_allocation(), vec![vec![0, 0], vec![0, 0]]);
    }

    #[test]
    fn test_from_toml() {
        let scenario = Scenario::from_toml(
            r#"
name = "pair"
total = [2]
max_need = [[2], [2]]

[[steps]]
action = "request"
process = 0
amounts = [1]

[[steps]]
action = "release"
process = 0
amounts = [1]
"#,
        )
        .unwrap();
        assert_eq!(scenario.steps.len(), 2);
        assert_eq!(scenario.steps[1], Step::release(0, vec![1]));
    }
}
