//! Error types
//!
//! Two families: [`DefinitionError`] is raised while a scene is being built and
//! is always fatal before any thread runs. [`ExecError`] is raised by block
//! bodies while threads are stepping.

use thiserror::Error;

/// Load-time errors: malformed definitions, bad inputs, incomplete scenes
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DefinitionError {
    #[error("malformed input descriptor for `{input}` on `{opcode}`: {reason}")]
    MalformedDescriptor {
        opcode: String,
        input: String,
        reason: String,
    },

    #[error("opcode `{0}` is already defined")]
    DuplicateOpcode(String),

    #[error("unknown opcode `{0}`")]
    UnknownOpcode(String),

    #[error("block `{opcode}` has no execute body")]
    MissingExecute { opcode: String },

    #[error("block `{block}` ({opcode}) has no input named `{input}`")]
    UnexpectedInput {
        block: String,
        opcode: String,
        input: String,
    },

    #[error("block `{block}` ({opcode}) is missing required input `{input}`")]
    MissingInput {
        block: String,
        opcode: String,
        input: String,
    },

    #[error("block `{block}` ({opcode}): input `{input}` does not match its declared shape")]
    InvalidInput {
        block: String,
        opcode: String,
        input: String,
    },

    #[error("scripts must contain at least one block")]
    EmptyScript,

    #[error("hat block `{block}` must be the first block of its script")]
    MisplacedHat { block: String },

    #[error("scene already has a stage (`{existing}`), cannot add `{name}`")]
    DuplicateStage { existing: String, name: String },

    #[error("custom block `{0}` has no body")]
    MissingBody(String),

    #[error("custom block `{0}` already has a body")]
    BodyAlreadyDefined(String),
}

/// Runtime errors raised while stepping threads
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExecError {
    /// A non-suspending evaluation reached a suspension point. This is an
    /// internal contract breach and is never isolated by the error policy.
    #[error("protocol violation in `{opcode}`: {reason}")]
    ProtocolViolation { opcode: String, reason: String },

    #[error("block `{opcode}` failed: {message}")]
    Block { opcode: String, message: String },

    #[error("unknown variable `{0}`")]
    UnknownVariable(String),

    #[error("unknown list `{0}`")]
    UnknownList(String),

    #[error("custom block `{0}` has no body")]
    MissingBody(String),

    #[error("target #{0} is not part of this scene")]
    UnknownTarget(usize),
}

impl ExecError {
    /// Build a block failure with a message
    pub fn block(opcode: impl Into<String>, message: impl Into<String>) -> Self {
        ExecError::Block {
            opcode: opcode.into(),
            message: message.into(),
        }
    }

    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, ExecError::ProtocolViolation { .. })
    }
}
