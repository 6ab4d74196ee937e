// Output macros must be defined before use
#[macro_use]
pub mod output;

// Programs
pub mod command;
pub mod program;
pub use command::{Arg, Command, CommandId, CommandList, Opcode, Value};
pub use program::{BuildError, Instruction, Program};

// Running
pub mod channel;
pub mod fault;
pub mod runtime;
pub use channel::{Channel, Recorder, Silent};
pub use fault::{Fault, FaultCode};
pub use runtime::{Effect, RunOptions, RunState, Stats, Status, StopSignal};

// Levels
pub mod level;
pub mod score;
pub mod session;
pub mod validate;
pub use level::{Level, Workload, LEVELS};
pub use score::Score;
pub use session::{Reseed, Session};
pub use validate::{validate, Verdict};

// Source text
pub mod error;
mod lexer;
pub mod parser;
mod span;
pub use parser::{parse, ParsedProgram};
pub use span::Span;

pub mod debugger;
pub use debugger::{Debugger, DebuggerOptions};

pub mod env;

/// Amount of lines to show as context, each side of focus line (line containing span).
pub const DIAGNOSTIC_CONTEXT_LINES: usize = 8;
