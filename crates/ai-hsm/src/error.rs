use thiserror::Error;

/// Load-time and attach-time failures. Machine descriptions are trusted static content, so these
/// are meant to stop the host at startup rather than be recovered from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HsmError {
    #[error("malformed state machine description at `{path}`: {reason}")]
    Malformed { path: String, reason: String },

    #[error("invalid event expression at `{path}`: {reason}")]
    InvalidExpression { path: String, reason: String },

    #[error("unknown state machine `{name}`")]
    UnknownMachine { name: String },

    #[error("state machine `{machine}` has no state `{state}`")]
    UnknownState { machine: String, state: String },

    #[error("state machine `{machine}` composes itself")]
    SelfReference { machine: String },

    #[error("agent has no {component} component")]
    MissingComponent { component: &'static str },
}

impl HsmError {
    pub(crate) fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        HsmError::Malformed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn expression(path: impl Into<String>, reason: impl Into<String>) -> Self {
        HsmError::InvalidExpression {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
