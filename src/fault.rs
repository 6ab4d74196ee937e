use std::{error::Error, fmt};

use crate::command::Opcode;

/// A problem encountered while building or running a program.
///
/// Faults are values, never panics. Runtime faults skip the offending instruction and execution
/// carries on; only [`Fault::UnresolvedJumpTarget`] prevents a run from starting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fault {
    /// `INBOX` with nothing left in the inbox.
    EmptyInput,
    /// The instruction needs the worker to carry a value, but their hands are empty.
    WorkerNotCarrying { opcode: Opcode },
    /// The instruction reads a construction slot which holds nothing.
    SlotEmpty { opcode: Opcode, slot: usize },
    /// A jump refers to a command which is not in the program.
    UnresolvedJumpTarget { index: usize },
    /// Anything else.
    Unexpected { message: String },
}

/// Stable identifier for each kind of fault, for hosts to localize or log.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum FaultCode {
    EmptyInput,
    WorkerNotCarrying,
    SlotEmpty,
    UnresolvedJumpTarget,
    Unexpected,
}

impl FaultCode {
    pub fn as_str(self) -> &'static str {
        match self {
            FaultCode::EmptyInput => "runtime::empty_input",
            FaultCode::WorkerNotCarrying => "runtime::not_carrying",
            FaultCode::SlotEmpty => "runtime::slot_empty",
            FaultCode::UnresolvedJumpTarget => "build::unresolved_jump",
            FaultCode::Unexpected => "unexpected",
        }
    }
}

impl fmt::Display for FaultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Fault {
    pub fn code(&self) -> FaultCode {
        match self {
            Fault::EmptyInput => FaultCode::EmptyInput,
            Fault::WorkerNotCarrying { .. } => FaultCode::WorkerNotCarrying,
            Fault::SlotEmpty { .. } => FaultCode::SlotEmpty,
            Fault::UnresolvedJumpTarget { .. } => FaultCode::UnresolvedJumpTarget,
            Fault::Unexpected { .. } => FaultCode::Unexpected,
        }
    }

    /// Whether the fault prevents the program from running at all.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Fault::UnresolvedJumpTarget { .. })
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Fault::Unexpected {
            message: message.into(),
        }
    }
}

impl Error for Fault {}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::EmptyInput => write!(f, "There is nothing left in the inbox"),
            Fault::WorkerNotCarrying { opcode } => {
                write!(f, "Cannot {} with empty hands", opcode)
            }
            Fault::SlotEmpty { opcode, slot } => {
                write!(f, "Cannot {} from slot {}, it is empty", opcode, slot)
            }
            Fault::UnresolvedJumpTarget { index } => {
                write!(
                    f,
                    "Jump at command {} points to a command which no longer exists",
                    index
                )
            }
            Fault::Unexpected { message } => write!(f, "{}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(Fault::EmptyInput.code().as_str(), "runtime::empty_input");
        assert_eq!(
            Fault::WorkerNotCarrying {
                opcode: Opcode::Output
            }
            .code()
            .as_str(),
            "runtime::not_carrying"
        );
        assert_eq!(
            Fault::unexpected("overflow").code(),
            FaultCode::Unexpected
        );
    }

    #[test]
    fn only_unresolved_jumps_are_fatal() {
        assert!(Fault::UnresolvedJumpTarget { index: 2 }.is_fatal());
        assert!(!Fault::EmptyInput.is_fatal());
        assert!(!Fault::SlotEmpty {
            opcode: Opcode::Add,
            slot: 0
        }
        .is_fatal());
    }

    #[test]
    fn messages() {
        assert_eq!(
            Fault::SlotEmpty {
                opcode: Opcode::CopyFrom,
                slot: 3
            }
            .to_string(),
            "Cannot COPYFROM from slot 3, it is empty"
        );
        assert_eq!(
            Fault::WorkerNotCarrying {
                opcode: Opcode::Output
            }
            .to_string(),
            "Cannot OUTBOX with empty hands"
        );
    }
}
