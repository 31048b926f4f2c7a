use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;

use crate::utils::{CommandExecutor, Config, Invocation};

const DEFAULT_SPEC_PATH: &str = "spec/openapi/posapi-3.0.yaml";
const DEFAULT_OUTPUT_PATH: &str = "spec/openapi/.normalized/posapi-3.0.json";
const DEFAULT_BUNDLER: &str = "npx";
const DEFAULT_BUNDLER_ARGS: &[&str] = &["--no", "redocly"];
const DEFAULT_SUBCOMMAND: &str = "bundle";
const DEFAULT_OUTPUT_FLAG: &str = "--output";

/// Where the specification lives, where the bundle goes, and how the
/// bundling tool is invoked. Paths are relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleSettings {
    pub spec_path: PathBuf,
    pub output_path: PathBuf,
    pub bundler: String,
    pub bundler_args: Vec<String>,
    pub subcommand: String,
    pub output_flag: String,
}

impl Default for BundleSettings {
    fn default() -> Self {
        BundleSettings {
            spec_path: PathBuf::from(DEFAULT_SPEC_PATH),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            bundler: DEFAULT_BUNDLER.to_string(),
            bundler_args: DEFAULT_BUNDLER_ARGS.iter().map(|arg| arg.to_string()).collect(),
            subcommand: DEFAULT_SUBCOMMAND.to_string(),
            output_flag: DEFAULT_OUTPUT_FLAG.to_string(),
        }
    }
}

impl BundleSettings {
    /// Defaults, overridden by whichever keys `config` sets.
    pub fn from_config(config: &Config) -> Self {
        let mut settings = BundleSettings::default();

        if let Some(path) = config.get("SPEC_PATH") {
            settings.spec_path = PathBuf::from(path);
        }
        if let Some(path) = config.get("OUTPUT_PATH") {
            settings.output_path = PathBuf::from(path);
        }
        if let Some(bundler) = config.get("BUNDLER") {
            settings.bundler = bundler.clone();
        }
        if let Some(args) = config.get("BUNDLER_ARGS") {
            settings.bundler_args = args.split_whitespace().map(str::to_string).collect();
        }
        if let Some(subcommand) = config.get("BUNDLER_SUBCOMMAND") {
            settings.subcommand = subcommand.clone();
        }
        if let Some(flag) = config.get("OUTPUT_FLAG") {
            settings.output_flag = flag.clone();
        }

        settings
    }

    /// `<bundler> [args...] <subcommand> <input> <output flag> <output>`
    fn invocation(&self, input: &Path, output: &Path) -> Invocation {
        let args = self
            .bundler_args
            .iter()
            .cloned()
            .chain([
                self.subcommand.clone(),
                input.display().to_string(),
                self.output_flag.clone(),
                output.display().to_string(),
            ]);
        Invocation::new(self.bundler.clone(), args)
    }
}

pub struct BundleCommand {
    root: PathBuf,
    settings: BundleSettings,
    executor: CommandExecutor,
}

impl BundleCommand {
    pub fn new(root: PathBuf, settings: BundleSettings) -> Self {
        BundleCommand {
            root,
            settings,
            executor: CommandExecutor::new(),
        }
    }

    async fn ensure_output_dir(output: &Path) -> Result<()> {
        if let Some(dir) = output.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
            debug!("Output directory {} is ready", dir.display());
        }
        Ok(())
    }

    fn confirmation(&self, output: &Path) -> String {
        format!("OK: wrote {}", relative_path(output, &self.root).display())
    }

    /// Bundles the specification and returns the path of the written bundle.
    pub async fn execute(&self) -> Result<PathBuf> {
        let input = self.root.join(&self.settings.spec_path);
        let output = self.root.join(&self.settings.output_path);

        Self::ensure_output_dir(&output).await?;

        let invocation = self.settings.invocation(&input, &output);
        let bundled = self.executor.execute(&invocation).await?;
        if !bundled.is_empty() {
            debug!("Bundler output:\n{}", bundled);
        }

        println!("{}", self.confirmation(&output));

        Ok(output)
    }
}

// Drops `.` and folds `..` into its parent without touching the filesystem.
fn normalize(path: &Path) -> Vec<Component<'_>> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    parts
}

/// `path` as seen from `base`, stepping out with `..` where the two diverge.
fn relative_path(path: &Path, base: &Path) -> PathBuf {
    let path = normalize(path);
    let base = normalize(base);
    let common = path
        .iter()
        .zip(base.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in &base[common..] {
        relative.push("..");
    }
    for part in &path[common..] {
        relative.push(part.as_os_str());
    }
    relative
}
