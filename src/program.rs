use std::{error::Error, fmt};

use crate::command::{Arg, CommandId, CommandList, Opcode};
use crate::fault::Fault;

/// Single resolved instruction. Jump targets are absolute indices into the [`Program`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Instruction {
    Input,
    Output,
    CopyFrom(usize),
    CopyTo(usize),
    Add(usize),
    Sub(usize),
    Jump(usize),
    JumpIfZero(usize),
    Label,
}

impl Instruction {
    pub fn opcode(self) -> Opcode {
        match self {
            Instruction::Input => Opcode::Input,
            Instruction::Output => Opcode::Output,
            Instruction::CopyFrom(_) => Opcode::CopyFrom,
            Instruction::CopyTo(_) => Opcode::CopyTo,
            Instruction::Add(_) => Opcode::Add,
            Instruction::Sub(_) => Opcode::Sub,
            Instruction::Jump(_) => Opcode::Jump,
            Instruction::JumpIfZero(_) => Opcode::JumpIfZero,
            Instruction::Label => Opcode::Label,
        }
    }

    pub fn slot(self) -> Option<usize> {
        match self {
            Instruction::CopyFrom(slot)
            | Instruction::CopyTo(slot)
            | Instruction::Add(slot)
            | Instruction::Sub(slot) => Some(slot),
            _ => None,
        }
    }

    pub fn target(self) -> Option<usize> {
        match self {
            Instruction::Jump(target) | Instruction::JumpIfZero(target) => Some(target),
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opcode())?;
        if let Some(slot) = self.slot() {
            write!(f, " {}", slot)?;
        }
        if let Some(target) = self.target() {
            write!(f, " {}", target)?;
        }
        Ok(())
    }
}

/// Resolved, ready to run instruction sequence.
///
/// Built fresh from a [`CommandList`] for every run, as the player may have reordered the
/// commands since the last one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Program {
    instrs: Vec<Instruction>,
    commands_used: usize,
}

/// Reason a command list could not be turned into a [`Program`].
///
/// `index` is always the position of the offending command within the list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BuildError {
    UnresolvedJumpTarget {
        index: usize,
        target: CommandId,
    },
    MissingArgument {
        index: usize,
        opcode: Opcode,
    },
    MismatchedArgument {
        index: usize,
        opcode: Opcode,
    },
    SlotOutOfRange {
        index: usize,
        slot: usize,
        slot_count: usize,
    },
    OpcodeNotAvailable {
        index: usize,
        opcode: Opcode,
    },
}

impl Program {
    /// Resolve every jump reference to the current index of the command it refers to.
    pub fn build(commands: &CommandList) -> Result<Program, BuildError> {
        let mut instrs = Vec::with_capacity(commands.len());

        for (index, command) in commands.iter().enumerate() {
            let opcode = command.opcode();
            let instr = match (opcode, command.arg()) {
                (Opcode::Input, None) => Instruction::Input,
                (Opcode::Output, None) => Instruction::Output,
                (Opcode::Label, None) => Instruction::Label,

                (Opcode::Input | Opcode::Output | Opcode::Label, Some(_)) => {
                    return Err(BuildError::MismatchedArgument { index, opcode })
                }
                (_, None) => return Err(BuildError::MissingArgument { index, opcode }),

                (Opcode::CopyFrom, Some(Arg::Slot(slot))) => Instruction::CopyFrom(slot),
                (Opcode::CopyTo, Some(Arg::Slot(slot))) => Instruction::CopyTo(slot),
                (Opcode::Add, Some(Arg::Slot(slot))) => Instruction::Add(slot),
                (Opcode::Sub, Some(Arg::Slot(slot))) => Instruction::Sub(slot),

                (Opcode::Jump | Opcode::JumpIfZero, Some(Arg::Target(target))) => {
                    let Some(resolved) = commands.position(target) else {
                        return Err(BuildError::UnresolvedJumpTarget { index, target });
                    };
                    if opcode == Opcode::Jump {
                        Instruction::Jump(resolved)
                    } else {
                        Instruction::JumpIfZero(resolved)
                    }
                }

                (_, Some(_)) => return Err(BuildError::MismatchedArgument { index, opcode }),
            };
            instrs.push(instr);
        }

        Ok(Program {
            instrs,
            commands_used: commands.commands_used(),
        })
    }

    /// Check that no instruction refers to a slot past the end of the floor.
    pub fn check_slots(&self, slot_count: usize) -> Result<(), BuildError> {
        for (index, instr) in self.instrs.iter().enumerate() {
            if let Some(slot) = instr.slot().filter(|slot| *slot >= slot_count) {
                return Err(BuildError::SlotOutOfRange {
                    index,
                    slot,
                    slot_count,
                });
            }
        }
        Ok(())
    }

    /// Check that every instruction is one the level offers. Labels are always allowed.
    pub fn check_toolbox(&self, toolbox: &[Opcode]) -> Result<(), BuildError> {
        for (index, instr) in self.instrs.iter().enumerate() {
            let opcode = instr.opcode();
            if opcode != Opcode::Label && !toolbox.contains(&opcode) {
                return Err(BuildError::OpcodeNotAvailable { index, opcode });
            }
        }
        Ok(())
    }

    pub fn get(&self, pc: usize) -> Option<Instruction> {
        self.instrs.get(pc).copied()
    }

    pub fn len(&self) -> usize {
        self.instrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instrs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instruction> {
        self.instrs.iter()
    }

    pub fn commands_used(&self) -> usize {
        self.commands_used
    }
}

impl BuildError {
    pub fn index(&self) -> usize {
        match self {
            BuildError::UnresolvedJumpTarget { index, .. }
            | BuildError::MissingArgument { index, .. }
            | BuildError::MismatchedArgument { index, .. }
            | BuildError::SlotOutOfRange { index, .. }
            | BuildError::OpcodeNotAvailable { index, .. } => *index,
        }
    }

    /// The fault reported on the channel when this error stops a run from starting.
    pub fn fault(&self) -> Fault {
        match self {
            BuildError::UnresolvedJumpTarget { index, .. } => {
                Fault::UnresolvedJumpTarget { index: *index }
            }
            _ => Fault::unexpected(self.to_string()),
        }
    }
}

impl Error for BuildError {}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedJumpTarget { index, target } => write!(
                f,
                "Jump at command {} refers to command {}, which is not in the program",
                index, target
            ),
            Self::MissingArgument { index, opcode } => {
                write!(f, "{} at command {} is missing its argument", opcode, index)
            }
            Self::MismatchedArgument { index, opcode } => write!(
                f,
                "{} at command {} has the wrong kind of argument",
                opcode, index
            ),
            Self::SlotOutOfRange {
                index,
                slot,
                slot_count,
            } => write!(
                f,
                "Command {} uses slot {}, but this floor only has {} slots",
                index, slot, slot_count
            ),
            Self::OpcodeNotAvailable { index, opcode } => write!(
                f,
                "{} at command {} is not available in this level",
                opcode, index
            ),
        }
    }
}
