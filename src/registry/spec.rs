use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::tool::ParamMap;
use crate::error::RegistryError;

/// Parameter name -> accepted literal values. An empty list marks the
/// parameter as open-ended.
pub type Candidates = IndexMap<String, Vec<String>>;

/// The declarative shape every tool module exposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    #[serde(default)]
    pub intent: String,
    #[serde(default)]
    pub description: String,
    pub commands: IndexMap<String, CommandSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandSpec {
    #[serde(default)]
    pub examples: Vec<String>,
    /// Required parameters, in prompt order.
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub defaults: ParamMap,
    /// Closed value lists for parameters the generic extractor may fill.
    #[serde(default)]
    pub choices: Candidates,
    #[serde(default)]
    pub function: String,
}

impl CommandSpec {
    /// Every parameter named in `defaults` or `choices` must be declared.
    pub fn validate(&self, intent: &str, command: &str) -> Result<(), RegistryError> {
        let undeclared = self
            .defaults
            .keys()
            .chain(self.choices.keys())
            .find(|name| !self.declares(name));

        match undeclared {
            Some(param) => Err(RegistryError::UndeclaredParam {
                intent: intent.to_string(),
                command: command.to_string(),
                param: param.clone(),
            }),
            None => Ok(()),
        }
    }

    pub fn declares(&self, param: &str) -> bool {
        self.params.iter().any(|p| p == param)
    }

    /// Candidates for the declared closed-value parameters only.
    pub fn closed_candidates(&self) -> Candidates {
        self.params
            .iter()
            .filter_map(|p| {
                self.choices
                    .get(p)
                    .filter(|values| !values.is_empty())
                    .map(|values| (p.clone(), values.clone()))
            })
            .collect()
    }

    /// Candidates for the given parameters; those without choices are open-ended.
    pub fn candidates_for<'a>(&self, params: impl IntoIterator<Item = &'a String>) -> Candidates {
        params
            .into_iter()
            .map(|p| (p.clone(), self.choices.get(p).cloned().unwrap_or_default()))
            .collect()
    }
}
