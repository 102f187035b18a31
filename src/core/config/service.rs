use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use super::paths::AppPaths;
use super::settings::RagConfig;
use super::validation::validate_config;
use crate::core::errors::RagError;

const REDACT_PLACEHOLDER: &str = "****";

const SENSITIVE_PATTERNS: [&str; 8] = [
    "api_key",
    "secret",
    "password",
    "_token",
    "token_",
    "credential",
    "private_key",
    "bearer",
];

const SENSITIVE_WHITELIST: [&str; 3] = ["max_tokens", "token_count", "tokens"];

/// Environment variables that override a single leaf of the config tree.
const ENV_OVERRIDES: [(&str, &[&str]); 5] = [
    ("QDRANT_URL", &["vector_store", "url"]),
    ("QDRANT_API_KEY", &["vector_store", "api_key"]),
    ("MISTRAL_API_KEY", &["embedding", "api_key"]),
    ("OPENAI_API_KEY", &["generation", "api_key"]),
    ("PORT", &["server", "port"]),
];

#[derive(Clone)]
pub struct ConfigService {
    paths: Arc<AppPaths>,
}

impl ConfigService {
    pub fn new(paths: Arc<AppPaths>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    pub fn config_path(&self) -> PathBuf {
        if let Ok(path) = env::var("RAG_CONFIG_PATH") {
            return PathBuf::from(path);
        }

        let user_config = self.paths.user_data_dir.join("config.yml");
        if user_config.exists() {
            return user_config;
        }

        self.paths.project_root.join("config.yml")
    }

    pub fn secrets_path(&self) -> PathBuf {
        self.paths.secrets_path.clone()
    }

    /// Merged config tree: `config.yml`, then `secrets.yaml`, then environment.
    pub fn load_config(&self) -> Result<Value, RagError> {
        let public_config = load_yaml_file(&self.config_path());
        let secrets_config = load_yaml_file(&self.secrets_path());
        let mut merged = deep_merge(&public_config, &secrets_config);
        apply_env_overrides(&mut merged, |key| env::var(key).ok());
        validate_config(&merged)?;
        Ok(merged)
    }

    pub fn load(&self) -> Result<RagConfig, RagError> {
        let merged = self.load_config()?;
        tracing::debug!(config = %redact_sensitive_values(&merged), "Effective configuration");
        parse_config(merged)
    }

    pub fn redact_sensitive_values(&self, value: &Value) -> Value {
        redact_sensitive_values(value)
    }
}

pub fn parse_config(value: Value) -> Result<RagConfig, RagError> {
    serde_json::from_value(value)
        .map_err(|e| RagError::BadRequest(format!("Invalid config: {}", e)))
}

fn load_yaml_file(path: &Path) -> Value {
    if !path.exists() {
        return Value::Object(Map::new());
    }

    match fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str::<Value>(&contents) {
            Ok(value @ Value::Object(_)) => value,
            Ok(_) => Value::Object(Map::new()),
            Err(err) => {
                tracing::warn!("Ignoring unparsable config file {}: {}", path.display(), err);
                Value::Object(Map::new())
            }
        },
        Err(_) => Value::Object(Map::new()),
    }
}

fn deep_merge(base: &Value, override_value: &Value) -> Value {
    match (base, override_value) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            let mut merged: Map<String, Value> = base_map.clone();
            for (key, value) in override_map {
                let merged_value = match merged.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), merged_value);
            }
            Value::Object(merged)
        }
        _ => override_value.clone(),
    }
}

fn apply_env_overrides<F>(config: &mut Value, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    for (var, path) in ENV_OVERRIDES {
        let Some(raw) = lookup(var).filter(|v| !v.trim().is_empty()) else {
            continue;
        };
        let value = match raw.parse::<u64>() {
            Ok(number) if var == "PORT" => Value::from(number),
            _ => Value::String(raw),
        };
        set_path(config, path, value);
    }
}

fn set_path(config: &mut Value, path: &[&str], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };
    let mut cursor = config;
    for key in parents {
        if !cursor.is_object() {
            *cursor = Value::Object(Map::new());
        }
        let Value::Object(map) = cursor else {
            return;
        };
        cursor = map
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    if !cursor.is_object() {
        *cursor = Value::Object(Map::new());
    }
    if let Value::Object(map) = cursor {
        map.insert(last.to_string(), value);
    }
}

fn redact_sensitive_values(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut redacted = Map::new();
            for (key, val) in map {
                if is_sensitive_key(key) && !val.is_null() {
                    redacted.insert(key.clone(), Value::String(REDACT_PLACEHOLDER.to_string()));
                } else {
                    redacted.insert(key.clone(), redact_sensitive_values(val));
                }
            }
            Value::Object(redacted)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_sensitive_values).collect()),
        _ => value.clone(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let key_lower = key.to_lowercase();
    if SENSITIVE_WHITELIST
        .iter()
        .any(|allowed| *allowed == key_lower)
    {
        return false;
    }
    SENSITIVE_PATTERNS
        .iter()
        .any(|pattern| key_lower.contains(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::settings::{ToolMode, VectorBackend};
    use serde_json::json;

    #[test]
    fn deep_merge_lets_secrets_fill_in_credentials() {
        let public_config = json!({
            "vector_store": { "url": "http://qdrant:6333", "collection": "docs" },
            "generation": { "model": "gpt-4o-mini" }
        });
        let secrets = json!({
            "vector_store": { "api_key": "qd-secret" },
            "generation": { "api_key": "sk-secret" }
        });

        let merged = deep_merge(&public_config, &secrets);

        assert_eq!(
            merged,
            json!({
                "vector_store": {
                    "url": "http://qdrant:6333",
                    "collection": "docs",
                    "api_key": "qd-secret"
                },
                "generation": { "model": "gpt-4o-mini", "api_key": "sk-secret" }
            })
        );
    }

    #[test]
    fn env_overrides_win_over_files() {
        let mut config = json!({
            "vector_store": { "url": "http://from-file:6333" },
            "server": "not-an-object"
        });

        apply_env_overrides(&mut config, |key| match key {
            "QDRANT_URL" => Some("https://cloud.qdrant.io".to_string()),
            "OPENAI_API_KEY" => Some("sk-env".to_string()),
            "MISTRAL_API_KEY" => Some("   ".to_string()),
            "PORT" => Some("9000".to_string()),
            _ => None,
        });

        assert_eq!(config["vector_store"]["url"], "https://cloud.qdrant.io");
        assert_eq!(config["generation"]["api_key"], "sk-env");
        assert_eq!(config["server"]["port"], 9000);
        assert!(config.get("embedding").is_none());
    }

    #[test]
    fn empty_tree_parses_to_defaults() {
        let config = parse_config(json!({})).expect("defaults should parse");

        assert_eq!(config.vector_store.backend, VectorBackend::Qdrant);
        assert_eq!(config.vector_store.dimension, 1024);
        assert_eq!(config.embedding.model, "mistral-embed");
        assert_eq!(config.generation.tool_mode, ToolMode::Hosted);
        assert!((config.generation.temperature - 0.2).abs() < f64::EPSILON);
        assert_eq!(config.retrieval.top_k, 5);
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let err = parse_config(json!({ "vector_store": { "backend": "pinecone" } }))
            .expect_err("unknown backend should fail");
        assert!(matches!(err, RagError::BadRequest(_)));
    }

    #[test]
    fn redact_sensitive_values_replaces_secrets_only() {
        let input = json!({
            "embedding": { "api_key": "secret", "model": "mistral-embed" },
            "tools": { "brave_search_api_key": "brave", "max_results": 5 }
        });

        let redacted = redact_sensitive_values(&input);

        assert_eq!(
            redacted,
            json!({
                "embedding": { "api_key": "****", "model": "mistral-embed" },
                "tools": { "brave_search_api_key": "****", "max_results": 5 }
            })
        );
    }

    #[test]
    fn load_reads_config_and_secrets_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = AppPaths::with_dirs(dir.path().to_path_buf(), dir.path().to_path_buf());
        fs::write(
            dir.path().join("config.yml"),
            "vector_store:\n  backend: memory\n  collection: manuals\nretrieval:\n  top_k: 3\n",
        )
        .expect("write config");
        fs::write(
            dir.path().join("secrets.yaml"),
            "generation:\n  api_key: sk-file\n",
        )
        .expect("write secrets");

        let service = ConfigService::new(Arc::new(paths));
        let config = parse_config(
            deep_merge(
                &load_yaml_file(&service.paths().project_root.join("config.yml")),
                &load_yaml_file(&service.secrets_path()),
            ),
        )
        .expect("config should parse");

        assert_eq!(config.vector_store.backend, VectorBackend::Memory);
        assert_eq!(config.vector_store.collection, "manuals");
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.generation.api_key.as_deref(), Some("sk-file"));
    }
}
