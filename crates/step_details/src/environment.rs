use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KernelOption {
    pub value: &'static str,
    pub label: &'static str,
}

pub const KERNEL_OPTIONS: &[KernelOption] = &[
    KernelOption {
        value: "python",
        label: "Python",
    },
    KernelOption {
        value: "r",
        label: "R",
    },
    KernelOption {
        value: "julia",
        label: "Julia",
    },
    KernelOption {
        value: "javascript",
        label: "JavaScript",
    },
];

/// An environment as listed by the environment store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub uuid: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnvironmentOption {
    pub value: String,
    pub label: String,
}

/// Environment options for a step, plus the environment the step has to switch
/// to when its current one is no longer offered.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnvironmentChoice {
    pub options: Vec<EnvironmentOption>,
    /// `Some(None)` clears the step's environment.
    pub replacement: Option<Option<EnvironmentOption>>,
}

pub fn kernel_name_to_language(kernel_name: &str) -> &str {
    match kernel_name {
        "ir" => "r",
        other => other,
    }
}

/// Store endpoint listing the environments usable by a step.
///
/// Notebook steps only get environments matching their kernel language.
pub fn environments_endpoint(project_uuid: &str, notebook_kernel: Option<&str>) -> String {
    let mut endpoint = format!("/store/environments/{project_uuid}");
    if let Some(kernel) = notebook_kernel {
        endpoint.push_str("?language=");
        endpoint.push_str(kernel_name_to_language(kernel));
    }
    endpoint
}

pub fn environment_options(environments: &[Environment], current: &str) -> EnvironmentChoice {
    let options: Vec<_> = environments
        .iter()
        .map(|env| EnvironmentOption {
            value: env.uuid.clone(),
            label: env.name.clone(),
        })
        .collect();

    let replacement = if options.iter().any(|option| option.value == current) {
        None
    } else {
        tracing::debug!(%current, "current environment no longer offered");
        Some(options.first().cloned())
    };

    EnvironmentChoice {
        options,
        replacement,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envs() -> Vec<Environment> {
        vec![
            Environment {
                uuid: "e1".into(),
                name: "Python 3".into(),
            },
            Environment {
                uuid: "e2".into(),
                name: "R".into(),
            },
        ]
    }

    #[test]
    fn endpoint_filters_notebooks_by_language() {
        assert_eq!(environments_endpoint("p", None), "/store/environments/p");
        assert_eq!(
            environments_endpoint("p", Some("ir")),
            "/store/environments/p?language=r"
        );
    }

    #[test]
    fn known_environment_is_kept() {
        let choice = environment_options(&envs(), "e2");
        assert_eq!(choice.options.len(), 2);
        assert_eq!(choice.replacement, None);
    }

    #[test]
    fn missing_environment_falls_back_to_first_option() {
        let choice = environment_options(&envs(), "gone");
        assert_eq!(
            choice.replacement,
            Some(Some(EnvironmentOption {
                value: "e1".into(),
                label: "Python 3".into(),
            }))
        );
        assert_eq!(environment_options(&[], "gone").replacement, Some(None));
    }
}
