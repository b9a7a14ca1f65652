use crate::error::CompilerError;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub env_name: String,
    /// Directory generated files are written to; next to the input when unset.
    #[serde(default)]
    pub out_dir: Option<PathBuf>,
    /// Runtime support script prepended to every generated file.
    #[serde(default)]
    pub runtime_path: Option<PathBuf>,
    #[serde(default = "default_extension")]
    pub output_extension: String,
    #[serde(default)]
    pub verbose: bool,
}

fn default_extension() -> String {
    String::from("js")
}

fn env_name() -> String {
    env::var("AYC_ENV").unwrap_or_else(|_| String::from("default"))
}

impl Default for Config {
    fn default() -> Self {
        Config {
            env_name: env_name(),
            out_dir: None,
            runtime_path: None,
            output_extension: default_extension(),
            verbose: false,
        }
    }
}

impl Config {
    /// Reads the config for the current environment, falling back to
    /// defaults when no file exists, then applies `AYC_*` overrides.
    pub fn load() -> Result<Self, CompilerError> {
        let config_path = Self::get_config_path();
        let config = if config_path.exists() {
            Self::load_from(&config_path)?
        } else {
            Config::default()
        };
        Ok(config.with_env_overrides())
    }

    pub fn load_from(path: &Path) -> Result<Self, CompilerError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, CompilerError> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = env::var("AYC_OUT_DIR") {
            self.out_dir = Some(PathBuf::from(dir));
        }
        if let Ok(path) = env::var("AYC_RUNTIME") {
            self.runtime_path = Some(PathBuf::from(path));
        }
        if let Ok(flag) = env::var("AYC_VERBOSE") {
            self.verbose = matches!(flag.as_str(), "1" | "true" | "yes");
        }
        self
    }

    pub fn save(&self) -> Result<(), CompilerError> {
        let config_path = Self::get_config_path();
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        fs::write(&config_path, contents)?;
        Ok(())
    }

    pub fn get_config_path() -> PathBuf {
        let home = if cfg!(windows) {
            env::var("USERPROFILE")
        } else {
            env::var("HOME")
        };

        PathBuf::from(home.unwrap_or_else(|_| String::from(".")))
            .join(".ayc")
            .join(env_name())
            .join("config.json")
    }

    /// Where `ayc build` writes the output for `input` when no `-o` is given.
    pub fn output_path_for(&self, input: &Path) -> PathBuf {
        let file_name = input
            .with_extension(&self.output_extension)
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(format!("out.{}", self.output_extension)));

        match &self.out_dir {
            Some(dir) => dir.join(file_name),
            None => input.with_extension(&self.output_extension),
        }
    }

    /// Runtime support text, or an empty string when none is configured.
    pub fn load_runtime(&self) -> Result<String, CompilerError> {
        match &self.runtime_path {
            Some(path) if !path.exists() => Err(CompilerError::FileNotFound(path.clone())),
            Some(path) => Ok(fs::read_to_string(path)?),
            None => Ok(String::new()),
        }
    }
}
