//! Distributor error types

use std::fmt;

use contracts::InPort;
use thiserror::Error;

/// Which side of a transfer call a buffer belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferDirection {
    Input,
    Output,
}

impl fmt::Display for BufferDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferDirection::Input => f.write_str("input"),
            BufferDirection::Output => f.write_str("output"),
        }
    }
}

/// Distributor-specific errors
#[derive(Debug, Error)]
pub enum DistributorError {
    /// Random dispatch needs at least one destination
    #[error("random dispatch refused: no output ports declared")]
    NoOutputPorts,

    /// Message delivered to an endpoint this node never declared
    #[error("message delivered to undeclared input port '{port}'")]
    PortNotRegistered { port: InPort },

    /// Transfer call carries the wrong number of streams
    #[error("stream count mismatch: expected {expected}, got {inputs} inputs / {outputs} outputs")]
    StreamCountMismatch {
        expected: usize,
        inputs: usize,
        outputs: usize,
    },

    /// Buffer too small for the requested item count
    #[error("invalid {direction} buffer on stream {stream}: need {required} bytes, got {actual}")]
    InvalidBuffer {
        stream: usize,
        direction: BufferDirection,
        required: usize,
        actual: usize,
    },

    /// Item count too large to address in memory
    #[error("item count {item_count} overflows stream {stream} byte length")]
    ItemCountOverflow { stream: usize, item_count: usize },

    /// Configuration / registration error (from contract)
    #[error("contract error: {0}")]
    Contract(#[from] contracts::ContractError),
}

impl DistributorError {
    pub(crate) fn invalid_buffer(
        stream: usize,
        direction: BufferDirection,
        required: usize,
        actual: usize,
    ) -> Self {
        Self::InvalidBuffer {
            stream,
            direction,
            required,
            actual,
        }
    }
}
