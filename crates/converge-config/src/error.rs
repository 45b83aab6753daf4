use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "Config file not found. Looked in:\n\
        - current directory: converge.local.yaml, converge.yaml\n\
        - ./.converge/ directory\n\
        - ~/.config/converge/converge.yaml\n\
        or set CONVERGE_CONFIG_PATH to point at a file"
    )]
    ConfigFileNotFound,

    #[error("Unknown wait profile: {0}")]
    UnknownProfile(String),

    #[error("Invalid wait profile '{name}': {reason}")]
    InvalidProfile { name: String, reason: String },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
