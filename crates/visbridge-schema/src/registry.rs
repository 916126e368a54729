use std::collections::HashMap;
use std::path::Path;

use jsonschema::Validator;
use serde_json::Value;
use visbridge_message::{Envelope, Kind};

use crate::config::RegistryConfig;
use crate::error::{Result, SchemaError};
use crate::loader::read_schema_dir;
use crate::validator::validate_value;

/// File name suffix of schema files loaded from a directory.
pub const SCHEMA_FILE_SUFFIX: &str = ".schema.json";

/// Compiled payload schemas, one per message kind.
pub struct SchemaRegistry {
    validators: HashMap<Kind, Validator>,
    config: RegistryConfig,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            validators: HashMap::new(),
            config,
        }
    }

    /// Compile and register the schema for `kind`, replacing any previous one.
    pub fn register(&mut self, kind: Kind, schema_json: &str) -> Result<()> {
        let schema: Value = serde_json::from_str(schema_json)?;
        self.register_value(kind, &schema)
    }

    pub fn register_value(&mut self, kind: Kind, schema: &Value) -> Result<()> {
        let validator = jsonschema::validator_for(schema)
            .map_err(|err| SchemaError::CompileFailed(format!("{kind}: {err}")))?;
        self.validators.insert(kind, validator);
        Ok(())
    }

    /// Load every `<kind>.schema.json` file in `dir`.
    pub fn from_directory(dir: &Path) -> Result<Self> {
        Self::from_directory_with_config(dir, RegistryConfig::default())
    }

    pub fn from_directory_with_config(dir: &Path, config: RegistryConfig) -> Result<Self> {
        let mut registry = Self::with_config(config);
        for file in read_schema_dir(dir, &registry.config)? {
            registry.register(file.kind, &file.source)?;
        }
        tracing::debug!(dir = %dir.display(), count = registry.validators.len(), "schemas loaded");
        Ok(registry)
    }

    /// Build from schema sources compiled into the binary.
    pub fn from_embedded(schemas: &[(Kind, &str)]) -> Result<Self> {
        let mut registry = Self::new();
        for (kind, schema) in schemas {
            registry.register(*kind, schema)?;
        }
        Ok(registry)
    }

    /// Validate a payload value against the schema for `kind`.
    pub fn validate(&self, kind: Kind, payload: &Value) -> Result<()> {
        match self.validators.get(&kind) {
            Some(validator) => validate_value(kind, payload, validator),
            None if self.config.fail_on_missing_schema => Err(SchemaError::NoSchema(kind)),
            None => Ok(()),
        }
    }

    /// Validate serialized payload JSON.
    pub fn validate_bytes(&self, kind: Kind, payload: &[u8]) -> Result<()> {
        let value: Value = serde_json::from_slice(payload)?;
        self.validate(kind, &value)
    }

    /// Validate the payload an envelope would carry on the wire.
    ///
    /// Readiness signals carry nothing and always pass.
    pub fn validate_envelope(&self, envelope: &Envelope) -> Result<()> {
        let Some(kind) = envelope.kind() else {
            return Ok(());
        };
        let wire = envelope.to_value()?;
        self.validate(kind, wire.get("data").unwrap_or(&Value::Null))
    }

    pub fn has_schema(&self, kind: Kind) -> bool {
        self.validators.contains_key(&kind)
    }

    /// Kinds with a registered schema, in wire-table order.
    pub fn kinds(&self) -> Vec<Kind> {
        let mut kinds: Vec<Kind> = self.validators.keys().copied().collect();
        kinds.sort_unstable();
        kinds
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use serde_json::json;
    use visbridge_message::Settings;

    use super::*;

    const SETTINGS_SCHEMA: &str = r#"{
        "type": "object",
        "properties": {
            "theme": { "enum": ["dark", "light"] },
            "zoom": { "type": "number", "minimum": 0 }
        },
        "required": ["theme"]
    }"#;

    fn temp_dir(tag: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!(
            "visbridge-schema-{tag}-{}-{nanos}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn validates_by_kind() {
        let mut registry = SchemaRegistry::new();
        registry.register(Kind::Settings, SETTINGS_SCHEMA).unwrap();

        assert!(registry
            .validate(Kind::Settings, &json!({"theme": "dark", "zoom": 2}))
            .is_ok());

        let err = registry
            .validate(Kind::Settings, &json!({"theme": "blue", "zoom": -1}))
            .unwrap_err();
        match err {
            SchemaError::ValidationFailed { kind, message } => {
                assert_eq!(kind, Kind::Settings);
                assert!(message.contains("; "), "both violations reported: {message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_schema_policy() {
        let permissive = SchemaRegistry::new();
        assert!(permissive.validate(Kind::Schema, &json!(null)).is_ok());

        let strict = SchemaRegistry::with_config(
            RegistryConfig::default().with_fail_on_missing_schema(true),
        );
        assert!(matches!(
            strict.validate(Kind::Schema, &json!({})),
            Err(SchemaError::NoSchema(Kind::Schema))
        ));
    }

    #[test]
    fn envelope_payload_is_validated() {
        let mut registry = SchemaRegistry::new();
        registry.register(Kind::Settings, SETTINGS_SCHEMA).unwrap();

        let good = Envelope::Settings(Settings::new().with("theme", json!("dark")));
        let bad = Envelope::Settings(Settings::new().with("zoom", json!(1)));
        assert!(registry.validate_envelope(&good).is_ok());
        assert!(registry.validate_envelope(&bad).is_err());
        assert!(registry
            .validate_envelope(&Envelope::Ready(Kind::Settings))
            .is_ok());
    }

    #[test]
    fn bytes_must_be_json() {
        let mut registry = SchemaRegistry::new();
        registry.register(Kind::Settings, SETTINGS_SCHEMA).unwrap();
        assert!(matches!(
            registry.validate_bytes(Kind::Settings, b"{theme"),
            Err(SchemaError::InvalidJson(_))
        ));
        assert!(registry
            .validate_bytes(Kind::Settings, br#"{"theme":"dark"}"#)
            .is_ok());
    }

    #[test]
    fn invalid_schema_fails_compile() {
        let mut registry = SchemaRegistry::new();
        assert!(matches!(
            registry.register(Kind::GraphData, r#"{"type":"graph"}"#),
            Err(SchemaError::CompileFailed(_))
        ));
    }

    #[test]
    fn embedded_schemas() {
        let registry = SchemaRegistry::from_embedded(&[
            (Kind::Settings, SETTINGS_SCHEMA),
            (Kind::GraphData, r#"{"type":"object","required":["nodes","edges"]}"#),
        ])
        .unwrap();
        assert_eq!(registry.kinds(), vec![Kind::GraphData, Kind::Settings]);
        assert!(!registry.has_schema(Kind::MLData));
    }

    #[test]
    fn directory_load() {
        let dir = temp_dir("load");
        std::fs::write(dir.join("settings.schema.json"), SETTINGS_SCHEMA).unwrap();
        std::fs::write(dir.join("GraphData.schema.json"), r#"{"type":"object"}"#).unwrap();
        std::fs::write(dir.join("README.md"), "not a schema").unwrap();

        let registry = SchemaRegistry::from_directory(&dir).unwrap();
        assert_eq!(registry.kinds(), vec![Kind::GraphData, Kind::Settings]);
        assert!(registry
            .validate(Kind::Settings, &json!({"theme": "light"}))
            .is_ok());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn directory_rejects_unknown_kind() {
        let dir = temp_dir("unknown");
        std::fs::write(dir.join("layout.schema.json"), "{}").unwrap();
        assert!(matches!(
            SchemaRegistry::from_directory(&dir),
            Err(SchemaError::LoadFailed(_))
        ));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn directory_size_limit() {
        let dir = temp_dir("limits");
        std::fs::write(dir.join("settings.schema.json"), SETTINGS_SCHEMA).unwrap();
        std::fs::write(dir.join("schema.schema.json"), "{}").unwrap();

        let too_small = RegistryConfig {
            max_schema_file_size: 16,
            ..RegistryConfig::default()
        };
        assert!(SchemaRegistry::from_directory_with_config(&dir, too_small).is_err());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_directory() {
        let dir = std::env::temp_dir().join("visbridge-schema-does-not-exist");
        assert!(matches!(
            SchemaRegistry::from_directory(&dir),
            Err(SchemaError::LoadFailed(_))
        ));
    }
}
