use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::connections::{ConnectionDict, ConnectionEntry, move_item};
use crate::filename::{extension_from_filename, to_valid_filename};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Kernel {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_name: String,
}

/// A pipeline step as stored in the pipeline definition.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub uuid: String,
    pub title: String,
    #[serde(default)]
    pub file_path: String,
    #[serde(default)]
    pub kernel: Kernel,
    #[serde(default)]
    pub environment: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
    #[serde(default)]
    pub incoming_connections: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct KernelPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// A partial update of a [`Step`], as handed to whoever persists the pipeline.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct StepPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kernel: Option<KernelPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incoming_connections: Option<Vec<String>>,
    /// Replace `parameters` wholesale instead of merging keys.
    #[serde(skip)]
    pub replace: bool,
}

impl Step {
    pub fn apply(&mut self, patch: &StepPatch) {
        if let Some(title) = &patch.title {
            self.title.clone_from(title);
        }
        if let Some(file_path) = &patch.file_path {
            self.file_path.clone_from(file_path);
        }
        if let Some(kernel) = &patch.kernel {
            if let Some(name) = &kernel.name {
                self.kernel.name.clone_from(name);
            }
            if let Some(display_name) = &kernel.display_name {
                self.kernel.display_name.clone_from(display_name);
            }
        }
        if let Some(environment) = &patch.environment {
            self.environment.clone_from(environment);
        }
        if let Some(parameters) = &patch.parameters {
            if patch.replace {
                self.parameters = parameters.clone();
            } else {
                for (key, value) in parameters {
                    self.parameters.insert(key.clone(), value.clone());
                }
            }
        }
        if let Some(connections) = &patch.incoming_connections {
            self.incoming_connections.clone_from(connections);
        }
    }
}

/// Editing model behind the step properties panel.
///
/// Every mutation is applied to the owned [`Step`] and returned as the
/// [`StepPatch`] the host has to persist.
#[derive(Clone, Debug)]
pub struct StepProperties {
    step: Step,
    editable_parameters: String,
    autogenerate_file_path: bool,
}

impl StepProperties {
    pub fn new(step: Step) -> Self {
        let editable_parameters =
            serde_json::to_string_pretty(&step.parameters).unwrap_or_else(|_| "{}".to_string());
        let autogenerate_file_path = step.file_path.is_empty();
        Self {
            step,
            editable_parameters,
            autogenerate_file_path,
        }
    }

    pub fn step(&self) -> &Step {
        &self.step
    }

    pub fn editable_parameters(&self) -> &str {
        &self.editable_parameters
    }

    pub fn autogenerate_file_path(&self) -> bool {
        self.autogenerate_file_path
    }

    pub fn is_notebook_step(&self) -> bool {
        extension_from_filename(&self.step.file_path) == "ipynb"
    }

    fn save(&mut self, patch: StepPatch) -> StepPatch {
        tracing::debug!(step = %self.step.uuid, ?patch, "saving step properties");
        self.step.apply(&patch);
        patch
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> StepPatch {
        let title = title.into();
        let file_path = self
            .autogenerate_file_path
            .then(|| to_valid_filename(&title));
        self.save(StepPatch {
            title: Some(title),
            file_path,
            ..Default::default()
        })
    }

    pub fn set_file_name(&mut self, file_name: impl Into<String>, autogenerated: bool) -> StepPatch {
        let file_name = file_name.into();
        if !autogenerated && !file_name.is_empty() {
            self.autogenerate_file_path = false;
        }
        self.save(StepPatch {
            file_path: Some(file_name),
            ..Default::default()
        })
    }

    /// Keep the raw editor text; only valid JSON objects are saved.
    pub fn set_parameters_json(&mut self, text: impl Into<String>) -> Option<StepPatch> {
        self.editable_parameters = text.into();
        let parameters = parse_parameters(&self.editable_parameters).ok()?;
        Some(self.save(StepPatch {
            parameters: Some(parameters),
            replace: true,
            ..Default::default()
        }))
    }

    /// Why the current parameter text cannot be saved, if it cannot.
    pub fn parameters_error(&self) -> Option<String> {
        parse_parameters(&self.editable_parameters).err()
    }

    pub fn set_kernel(&mut self, name: impl Into<String>) -> StepPatch {
        self.save(StepPatch {
            kernel: Some(KernelPatch {
                name: Some(name.into()),
                display_name: None,
            }),
            ..Default::default()
        })
    }

    pub fn set_environment(
        &mut self,
        environment_uuid: impl Into<String>,
        environment_name: impl Into<String>,
    ) -> StepPatch {
        self.save(StepPatch {
            environment: Some(environment_uuid.into()),
            kernel: Some(KernelPatch {
                name: None,
                display_name: Some(environment_name.into()),
            }),
            ..Default::default()
        })
    }

    /// Move the incoming connection at `from` to `to`.
    ///
    /// Returns `None` when there is nothing to do.
    pub fn move_connection(&mut self, from: usize, to: usize) -> Option<StepPatch> {
        let mut connections = self.step.incoming_connections.clone();
        if !move_item(&mut connections, from, to) {
            return None;
        }
        Some(self.save(StepPatch {
            incoming_connections: Some(connections),
            ..Default::default()
        }))
    }

    pub fn connections(&self, dict: &ConnectionDict) -> Vec<ConnectionEntry> {
        self.step
            .incoming_connections
            .iter()
            .map(|uuid| ConnectionEntry::resolve(uuid, dict))
            .collect()
    }
}

fn parse_parameters(text: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("parameters must be a JSON object".to_string()),
        Err(err) => Err(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn step() -> Step {
        serde_json::from_value(json!({
            "uuid": "step-1",
            "title": "",
            "file_path": "",
            "kernel": { "name": "python", "display_name": "Python 3" },
            "environment": "env-1",
            "parameters": { "alpha": 1 },
            "incoming_connections": ["a", "b", "c"]
        }))
        .unwrap()
    }

    #[test]
    fn apply_merges_parameters_unless_replacing() {
        let mut step = step();
        let mut extra = Map::new();
        extra.insert("beta".into(), json!(2));

        step.apply(&StepPatch {
            parameters: Some(extra.clone()),
            ..Default::default()
        });
        assert_eq!(step.parameters.len(), 2);

        step.apply(&StepPatch {
            parameters: Some(extra),
            replace: true,
            ..Default::default()
        });
        assert_eq!(Value::Object(step.parameters), json!({ "beta": 2 }));
    }

    #[test]
    fn patch_serializes_only_set_fields() {
        let patch = StepPatch {
            title: Some("Load".into()),
            replace: true,
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&patch).unwrap(), json!({ "title": "Load" }));
    }

    #[test]
    fn editable_parameters_are_pretty_printed() {
        let props = StepProperties::new(step());
        assert_eq!(props.editable_parameters(), "{\n  \"alpha\": 1\n}");
        assert!(props.parameters_error().is_none());
    }

    #[test]
    fn non_object_parameters_are_rejected() {
        let mut props = StepProperties::new(step());
        assert!(props.set_parameters_json("[1, 2]").is_none());
        assert!(props.parameters_error().is_some());
        assert_eq!(Value::Object(props.step().parameters.clone()), json!({ "alpha": 1 }));
    }
}
