//! Registry of form schemas, keyed by unique name.

use indexmap::IndexMap;
use std::path::Path;
use std::sync::Arc;

use super::validator::SchemaValidator;
use crate::domain::{FormSchema, FormSchemaDoc, SchemaError};
use crate::forms;

#[derive(Debug, Default, Clone)]
pub struct FormRegistry {
    forms: IndexMap<String, Arc<FormSchema>>,
}

impl FormRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the built-in schemas
    pub fn with_builtin() -> Result<Self, SchemaError> {
        let mut registry = Self::new();
        for schema in forms::builtin() {
            registry.register(schema)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, schema: FormSchema) -> Result<(), SchemaError> {
        if self.forms.contains_key(&schema.name) {
            return Err(SchemaError::Duplicate(format!("Form name '{}'", schema.name)));
        }
        self.forms.insert(schema.name.clone(), Arc::new(schema));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<FormSchema>> {
        self.forms.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.forms.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }

    /// Parse a schema document; the format is chosen by file extension.
    pub fn parse_document(source_name: &str, content: &str, ext: &str) -> Result<FormSchemaDoc, SchemaError> {
        let malformed = |reason: String| SchemaError::Malformed {
            source_name: source_name.to_string(),
            reason,
        };
        match ext {
            "json" => serde_json::from_str(content).map_err(|e| malformed(e.to_string())),
            "yaml" | "yml" => serde_yaml::from_str(content).map_err(|e| malformed(e.to_string())),
            "toml" => toml::from_str(content).map_err(|e| malformed(e.to_string())),
            other => Err(malformed(format!("unsupported schema format '{}'", other))),
        }
    }

    /// Read, parse and compile one schema file.
    pub fn load_file(path: &Path) -> Result<FormSchema, Vec<SchemaError>> {
        let source_name = path.display().to_string();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        let content = std::fs::read_to_string(path).map_err(|e| {
            vec![SchemaError::Malformed {
                source_name: source_name.clone(),
                reason: e.to_string(),
            }]
        })?;
        let doc = Self::parse_document(&source_name, &content, ext).map_err(|e| vec![e])?;
        SchemaValidator::compile(&doc)
    }

    /// Load every json/yaml/yml/toml schema in `dir`. A directory that does not
    /// exist contributes nothing; any defective schema fails the whole load.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, anyhow::Error> {
        let pattern = format!("{}/*", dir.display());
        let mut errors = Vec::new();
        let mut loaded = 0;

        let mut paths: Vec<_> = glob::glob(&pattern)?
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::warn!("Failed to read glob entry: {}", e);
                    None
                }
            })
            .collect();
        paths.sort();

        for path in paths {
            let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
                continue;
            };
            if !matches!(ext, "json" | "yaml" | "yml" | "toml") {
                continue;
            }
            match Self::load_file(&path) {
                Ok(schema) => {
                    tracing::info!(form = %schema.name, path = %path.display(), "Loaded form schema");
                    if let Err(e) = self.register(schema) {
                        errors.push(format!("{}: {}", path.display(), e));
                    } else {
                        loaded += 1;
                    }
                }
                Err(schema_errors) => {
                    for e in schema_errors {
                        tracing::error!(path = %path.display(), "Schema defect: {}", e);
                        errors.push(format!("{}: {}", path.display(), e));
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(loaded)
        } else {
            Err(anyhow::anyhow!("Form schema validation failed:\n{}", errors.join("\n")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::google_oauth2;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_registry() {
        let registry = FormRegistry::with_builtin().unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.get(google_oauth2::NAME).is_some());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = FormRegistry::with_builtin().unwrap();
        let err = registry.register(google_oauth2::schema()).unwrap_err();
        assert!(matches!(err, SchemaError::Duplicate(_)));
    }

    #[test]
    fn test_parse_document_formats() {
        let toml = r#"
name = "toml_form"

[fields.HOST]
type = "text"
reset = "HOST"
"#;
        let doc = FormRegistry::parse_document("form.toml", toml, "toml").unwrap();
        assert_eq!(doc.name, "toml_form");

        let err = FormRegistry::parse_document("form.ini", "", "ini").unwrap_err();
        assert!(matches!(err, SchemaError::Malformed { .. }));
    }

    #[test]
    fn test_load_dir_reports_defects() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        fs::write(
            dir.path().join("bad.yaml"),
            "name: bad\nfields:\n  A: { type: checkbox, reset: A }\n",
        )?;
        let mut registry = FormRegistry::new();
        let err = registry.load_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains("Unknown field type 'checkbox'"));
        assert!(registry.is_empty());
        Ok(())
    }

    #[test]
    fn test_load_missing_dir_is_empty() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let mut registry = FormRegistry::new();
        assert_eq!(registry.load_dir(&dir.path().join("nope"))?, 0);
        Ok(())
    }
}
