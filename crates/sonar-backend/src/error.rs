use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("{tool} not found on this machine")]
    ToolNotFound { tool: &'static str },

    #[error("Command failed: {stderr}")]
    CommandFailed { stderr: String },

    #[error("Installing {artifact} failed: {details}")]
    InstallFailed { artifact: String, details: String },

    #[error("Linking {target} failed: {details}")]
    LinkFailed { target: String, details: String },

    #[error("Could not parse {context} output: {details}")]
    Parse {
        context: &'static str,
        details: String,
    },

    #[error("IO error ({kind}): {message}")]
    Io {
        kind: std::io::ErrorKind,
        message: String,
    },
}

impl BackendError {
    pub fn command_failed(stderr: impl Into<String>) -> Self {
        Self::CommandFailed {
            stderr: stderr.into(),
        }
    }

    pub fn install_failed(artifact: impl Into<String>, details: impl Into<String>) -> Self {
        Self::InstallFailed {
            artifact: artifact.into(),
            details: details.into(),
        }
    }

    pub fn link_failed(target: impl Into<String>, details: impl Into<String>) -> Self {
        Self::LinkFailed {
            target: target.into(),
            details: details.into(),
        }
    }

    pub fn parse(context: &'static str, details: impl Into<String>) -> Self {
        Self::Parse {
            context,
            details: details.into(),
        }
    }
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}
