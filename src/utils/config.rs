use std::env;
use std::path::PathBuf;

use crate::utils::error::Error;
use crate::utils::render::{DEFAULT_DATA_ROOT, DEFAULT_EXEC_TEMPLATE};

/// Runtime settings, read from `GUEST_*` environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    // name and namespace of the Cluster resource
    pub cluster_name: String,
    pub namespace: String,

    pub data_root: PathBuf,
    pub exec_template: String,

    // fail on undefined $(NAME) instead of passing it through
    pub strict_expansion: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            cluster_name: "default".to_string(),
            namespace: "default".to_string(),
            data_root: PathBuf::from(DEFAULT_DATA_ROOT),
            exec_template: DEFAULT_EXEC_TEMPLATE.to_string(),
            strict_expansion: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Config, Error> {
        Config::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Config, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(cluster_name) = lookup("GUEST_CLUSTER_NAME") {
            config.cluster_name = cluster_name;
        }
        if let Some(namespace) = lookup("GUEST_NAMESPACE") {
            config.namespace = namespace;
        }
        if let Some(data_root) = lookup("GUEST_DATA_ROOT") {
            config.data_root = PathBuf::from(data_root);
        }
        if let Some(exec_template) = lookup("GUEST_EXEC_TEMPLATE") {
            config.exec_template = exec_template;
        }
        if let Some(strict) = lookup("GUEST_STRICT_EXPANSION") {
            config.strict_expansion = parse_bool("GUEST_STRICT_EXPANSION", &strict)?;
        }

        Ok(config)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, Error> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        _ => Err(Error::UserInputError(format!(
            "{} must be true or false, got {:?}",
            key, value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;

    use super::Config;
    use crate::utils::error::Error;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| values.get(key).cloned()
    }

    #[test]
    fn can_use_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.data_root, PathBuf::from("/var/lib/sealos/data"));
        assert_eq!(config.strict_expansion, false);
    }

    #[test]
    fn can_read_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("GUEST_CLUSTER_NAME", "prod"),
            ("GUEST_NAMESPACE", "infra"),
            ("GUEST_DATA_ROOT", "/opt/data"),
            ("GUEST_STRICT_EXPANSION", "True"),
        ]))
        .unwrap();

        assert_eq!(config.cluster_name, "prod");
        assert_eq!(config.namespace, "infra");
        assert_eq!(config.data_root, PathBuf::from("/opt/data"));
        assert_eq!(config.strict_expansion, true);
    }

    #[test]
    fn can_not_read_invalid_bool() {
        match Config::from_lookup(lookup(&[("GUEST_STRICT_EXPANSION", "maybe")])) {
            Err(Error::UserInputError(message)) => assert!(message.contains("maybe")),
            other => panic!("expected user input error, got {:?}", other),
        }
    }
}
