//! Data files: render contexts and globals in JSON, YAML or TOML

use anyhow::{bail, Context as _, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

use crate::context::Context;

/// Serialization format of a data or config file, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Json,
    Yaml,
    Toml,
}

impl DataFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Ok(DataFormat::Json),
            "yml" | "yaml" => Ok(DataFormat::Yaml),
            "toml" => Ok(DataFormat::Toml),
            _ => bail!(
                "Unsupported data file {:?}: expected .json, .yaml, .yml or .toml",
                path
            ),
        }
    }

    pub fn parse<T: DeserializeOwned>(&self, content: &str) -> Result<T> {
        let value = match self {
            DataFormat::Json => serde_json::from_str(content)?,
            DataFormat::Yaml => serde_yaml::from_str(content)?,
            DataFormat::Toml => toml::from_str(content)?,
        };
        Ok(value)
    }
}

/// Read and deserialize a file in the format its extension names
pub fn read_file<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let path = path.as_ref();
    let format = DataFormat::from_path(path)?;
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    format
        .parse(&content)
        .with_context(|| format!("Failed to parse {:?}", path))
}

/// Load a render context. The file must hold a top-level mapping.
pub fn load_context<P: AsRef<Path>>(path: P) -> Result<Context> {
    let path = path.as_ref();
    let json: serde_json::Value = read_file(path)?;
    let Some(context) = Context::from_json(&json) else {
        bail!("{:?} must contain a mapping at the top level", path);
    };
    tracing::debug!("Loaded {} variables from {:?}", context.len(), path);
    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use std::path::PathBuf;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            DataFormat::from_path(&PathBuf::from("a.YAML")).unwrap(),
            DataFormat::Yaml
        );
        assert_eq!(
            DataFormat::from_path(&PathBuf::from("a.toml")).unwrap(),
            DataFormat::Toml
        );
        assert!(DataFormat::from_path(&PathBuf::from("a.txt")).is_err());
        assert!(DataFormat::from_path(&PathBuf::from("noext")).is_err());
    }

    #[test]
    fn test_parse_formats_agree() {
        let json: serde_json::Value = DataFormat::Json.parse(r#"{"a": [1, 2]}"#).unwrap();
        let yaml: serde_json::Value = DataFormat::Yaml.parse("a:\n  - 1\n  - 2\n").unwrap();
        let toml: serde_json::Value = DataFormat::Toml.parse("a = [1, 2]\n").unwrap();
        assert_eq!(json, yaml);
        assert_eq!(json, toml);
        assert_eq!(
            Context::from_json(&json).unwrap().get("a"),
            Some(&Value::from(vec![1, 2]))
        );
    }
}
