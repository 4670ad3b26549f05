use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the program model itself, as opposed to problems found in
/// the validated code.
#[derive(Debug, Error, Diagnostic)]
pub enum DatabaseError {
    #[error("No scope named '{name}'")]
    #[diagnostic(code(bsc_db::unknown_scope))]
    UnknownScope { name: String },

    #[error("No file with package path '{pkg_path}'")]
    #[diagnostic(code(bsc_db::unknown_file))]
    UnknownFile { pkg_path: String },

    #[error("No component declared in '{xml_pkg_path}'")]
    #[diagnostic(code(bsc_db::unknown_component))]
    UnknownComponent { xml_pkg_path: String },

    #[error("Invalid configuration: {0}")]
    #[diagnostic(code(bsc_db::config), help("Check the TOML syntax and field names of the config file"))]
    Config(#[from] toml::de::Error),

    #[error("Cannot read configuration file {}", .path.display())]
    #[diagnostic(code(bsc_db::config_io))]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for program operations.
pub type DatabaseResult<T> = Result<T, DatabaseError>;
