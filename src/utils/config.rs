use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

/// `KEY=VALUE` settings read from a per-project file.
///
/// Values are taken literally. `$VAR` references are rejected rather than
/// expanded, so the process environment never changes a setting.
pub struct Config {
    values: HashMap<String, String>,
}

impl Config {
    /// Loads `file_path`, or an empty config when the file does not exist.
    pub fn new(file_path: &Path) -> Result<Self> {
        let values = if file_path.exists() {
            let content = fs::read_to_string(file_path)
                .with_context(|| format!("Failed to read config file {}", file_path.display()))?;
            Self::parse(&content)
                .with_context(|| format!("Failed to parse config file {}", file_path.display()))?
        } else {
            HashMap::new()
        };

        Ok(Config { values })
    }

    fn parse(content: &str) -> Result<HashMap<String, String>> {
        for (index, line) in content.lines().enumerate() {
            let line = line.trim_start();
            if !line.starts_with('#') && line.contains('$') {
                bail!(
                    "line {}: variable substitution is not supported: {}",
                    index + 1,
                    line
                );
            }
        }

        let values = dotenvy::from_read_iter(content.as_bytes())
            .collect::<Result<HashMap<_, _>, _>>()?;
        Ok(values)
    }

    pub fn get(&self, key: &str) -> Option<&String> {
        self.values.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(&dir.path().join(".specbundle")).unwrap();
        assert!(config.get("SPEC_PATH").is_none());
    }

    #[test]
    fn reads_key_value_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".specbundle");
        fs::write(
            &path,
            "# bundler overrides, no $VARS here\nSPEC_PATH=api/openapi.yaml\nBUNDLER_ARGS=\"--no redocly\"\n",
        )
        .unwrap();

        let config = Config::new(&path).unwrap();
        assert_eq!(config.get("SPEC_PATH").unwrap(), "api/openapi.yaml");
        assert_eq!(config.get("BUNDLER_ARGS").unwrap(), "--no redocly");
        assert!(config.get("OUTPUT_PATH").is_none());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".specbundle");
        fs::write(&path, "NOT A VALID LINE\n").unwrap();

        let err = Config::new(&path).err().unwrap();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn environment_references_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".specbundle");
        fs::write(&path, "SPEC_PATH=$HOME/api.yaml\nOUTPUT_FLAG=-o$X\n").unwrap();

        let err = Config::new(&path).err().unwrap();
        let message = format!("{err:#}");
        assert!(message.contains("Failed to parse config file"));
        assert!(message.contains("line 1: variable substitution is not supported"));
    }

    #[test]
    fn braced_references_are_rejected_on_any_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".specbundle");
        fs::write(&path, "SPEC_PATH=api.yaml\nBUNDLER_ARGS=${BUNDLER_FLAGS}\n").unwrap();

        let err = Config::new(&path).err().unwrap();
        assert!(format!("{err:#}").contains("line 2"));
    }
}
