// Copyright 2023 dns-provider-transip authors
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Error types for configuration, module registration and record delegation.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Position of a token in a configuration source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: Arc<str>,
    pub line: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Errors raised while reading a module's configuration.
///
/// None of these are retried: the host refuses to load the module.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field was assigned twice within the configuration
    #[error("{location} - Error during parsing: {field} already set")]
    AlreadySet { location: Location, field: &'static str },

    /// Sub-directive name not known to the module
    #[error("{location} - Error during parsing: unrecognized subdirective '{name}'")]
    UnrecognizedSubdirective { location: Location, name: String },

    /// Too many arguments on a line
    #[error(
        "{location} - Error during parsing: wrong argument count or unexpected line ending after '{after}'"
    )]
    UnexpectedArgument { location: Location, after: String },

    /// A required field is still empty once all tokens are consumed
    #[error("{location} - Error during parsing: missing {field}")]
    MissingField { location: Location, field: &'static str },

    /// Malformed configuration text
    #[error("{location} - Syntax error: {message}")]
    Syntax { location: Location, message: String },

    /// JSON module configuration could not be read
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    /// Source location of the error, when it came from configuration text.
    pub fn location(&self) -> Option<&Location> {
        match self {
            ConfigError::AlreadySet { location, .. }
            | ConfigError::UnrecognizedSubdirective { location, .. }
            | ConfigError::UnexpectedArgument { location, .. }
            | ConfigError::MissingField { location, .. }
            | ConfigError::Syntax { location, .. } => Some(location),
            ConfigError::Json(_) => None,
        }
    }
}

/// Errors from the module registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("module already registered: {0}")]
    Duplicate(String),

    #[error("module not registered: {0}")]
    Unknown(String),
}

/// Errors from delegated record operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No provider backend was attached to the module
    #[error("no provider client attached to module '{module}'")]
    NotAttached { module: String },

    /// The provider backend reported a failure
    #[error("provider error: {0}")]
    Provider(String),
}

/// Result type for delegated record operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Any error this crate can return.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Client(#[from] ClientError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location() -> Location {
        Location {
            file: Arc::from("Caddyfile"),
            line: 4,
        }
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::AlreadySet {
            location: location(),
            field: "login",
        };
        assert_eq!(
            err.to_string(),
            "Caddyfile:4 - Error during parsing: login already set"
        );

        let err = ConfigError::UnrecognizedSubdirective {
            location: location(),
            name: "api_token".to_string(),
        };
        assert!(err.to_string().contains("unrecognized subdirective 'api_token'"));

        let err = ConfigError::MissingField {
            location: location(),
            field: "private key",
        };
        assert!(err.to_string().ends_with("missing private key"));
        assert_eq!(err.location().map(|l| l.line), Some(4));
    }

    #[test]
    fn test_error_is_transparent() {
        let err: Error = RegistryError::Unknown("dns.providers.nope".to_string()).into();
        assert_eq!(err.to_string(), "module not registered: dns.providers.nope");

        let err: Error = ClientError::NotAttached {
            module: "dns.providers.transip".to_string(),
        }
        .into();
        assert!(err.to_string().contains("dns.providers.transip"));
    }
}
