//! Error types for bucketsync

use std::fmt;
use thiserror::Error;

/// Result type alias for bucketsync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Step of a single-object copy that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyStep {
    /// Opening the source object for reading
    Get,
    /// Draining the source body into memory
    Read,
    /// Writing the buffered body to the destination
    Put,
}

impl fmt::Display for CopyStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CopyStep::Get => "get",
            CopyStep::Read => "read",
            CopyStep::Put => "put",
        };
        f.write_str(name)
    }
}

/// Main error type for bucketsync
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors (config file access)
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// A listing page request failed
    #[error("Listing error in bucket {bucket}: {message}")]
    Listing { bucket: String, message: String },

    /// Copying a single object failed
    #[error("Couldn't {step} object {key}: {message}")]
    Copy {
        step: CopyStep,
        key: String,
        message: String,
    },

    /// Credentials could not be resolved for a profile
    #[error(
        "Couldn't load AWS configuration for profile '{profile}': {message}. \
         Have you set up your AWS account (aws configure --profile {profile})?"
    )]
    Credentials { profile: String, message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Progress display errors
    #[error("Progress error: {message}")]
    Progress { message: String },

    /// Worker pool failure (panicked or cancelled task)
    #[error("Pipeline error: {message}")]
    Pipeline { message: String },

    /// Generic storage backend error
    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a listing error for a bucket
    pub fn listing(bucket: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Listing {
            bucket: bucket.into(),
            message: message.into(),
        }
    }

    /// Create a copy error for the given step and key
    pub fn copy(step: CopyStep, key: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Copy {
            step,
            key: key.into(),
            message: message.to_string(),
        }
    }

    /// The failing copy step, if this is a copy error
    pub fn copy_step(&self) -> Option<CopyStep> {
        match self {
            Error::Copy { step, .. } => Some(*step),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Config {
            message: format!("TOML parse error: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_error_names_step_and_key() {
        let err = Error::copy(CopyStep::Put, "logs/a.txt", "access denied");
        assert_eq!(err.to_string(), "Couldn't put object logs/a.txt: access denied");
        assert_eq!(err.copy_step(), Some(CopyStep::Put));
    }

    #[test]
    fn test_credentials_error_has_hint() {
        let err = Error::Credentials {
            profile: "backup".to_string(),
            message: "no credentials".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("profile 'backup'"));
        assert!(msg.contains("Have you set up your AWS account"));
    }
}
