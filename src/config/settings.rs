//! Render configuration file (`minibars.yml`, `.toml` or `.json`)

use anyhow::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data::{load_context, read_file};
use crate::context::Context;
use crate::host::StandardHost;
use crate::value::Value;

/// Render-time data for the command line
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Context data file, relative to the config file
    pub context: Option<PathBuf>,
    /// Values for names a template declares with `{{@globals ...}}`
    pub globals: IndexMap<String, serde_json::Value>,
    /// Values for browser-only host globals such as `location`
    pub host: IndexMap<String, serde_json::Value>,
    /// Output file, relative to the config file
    pub output: Option<PathBuf>,
}

impl RenderConfig {
    /// Load a configuration file. Relative paths inside it are resolved
    /// against the file's directory.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config: RenderConfig = read_file(path)?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        config.context = config.context.map(|p| base.join(p));
        config.output = config.output.map(|p| base.join(p));

        tracing::debug!("Loaded render config from {:?}", path);
        Ok(config)
    }

    /// The context named by `context`, or an empty one
    pub fn load_context(&self) -> Result<Context> {
        match &self.context {
            Some(path) => load_context(path),
            None => Ok(Context::new()),
        }
    }

    pub fn globals_context(&self) -> Context {
        self.globals
            .iter()
            .map(|(k, v)| (k.clone(), Value::from_json(v)))
            .collect()
    }

    /// A standard host carrying the configured host values
    pub fn host(&self) -> StandardHost {
        let mut host = StandardHost::new();
        for (name, value) in &self.host {
            host.set(name, Value::from_json(value));
        }
        host
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostEnvironment;
    use std::fs;

    #[test]
    fn test_load_yaml_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("minibars.yml");
        fs::write(
            &path,
            "context: data/page.json\nglobals:\n  siteName: Docs\nhost:\n  location: https://docs.example.com/\n",
        )
        .unwrap();

        let config = RenderConfig::load(&path).unwrap();
        assert_eq!(config.context, Some(dir.path().join("data/page.json")));
        assert_eq!(config.output, None);
        assert_eq!(
            config.globals_context().get("siteName"),
            Some(&Value::from("Docs"))
        );
        assert_eq!(
            config.host().global("location"),
            Some(Value::from("https://docs.example.com/"))
        );
    }

    #[test]
    fn test_load_toml_config_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("minibars.toml");
        fs::write(&path, "output = \"out.html\"\n").unwrap();

        let config = RenderConfig::load(&path).unwrap();
        assert_eq!(config.output, Some(dir.path().join("out.html")));
        assert!(config.globals.is_empty());
        assert!(config.load_context().unwrap().is_empty());
    }
}
