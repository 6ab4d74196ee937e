mod breakpoint;
mod command;
mod error;
mod reader;

pub use self::breakpoint::Breakpoints;
use self::command::Command;
use self::reader::{CommandReader, Read as _};
use crate::channel::Channel;
use crate::output::{Category, Condition, Output};
use crate::runtime::{Effect, RunState, Status as RunStatus};
use crate::session::{Reseed, Session};
use crate::{dprint, dprintln};

/// Leave this as a struct, in case more options are added in the future. Plus it is more explicit.
#[derive(Debug, Default)]
pub struct DebuggerOptions {
    pub command: Option<String>,
}

pub struct Debugger {
    status: Status,
    command_source: CommandReader,

    breakpoints: Breakpoints,
    /// Used to allow breakpoint to be passed on second attempt.
    current_breakpoint: Option<usize>,

    /// Amount of instructions executed since last command.
    instruction_count: u64,
    /// Whether PC should be displayed on next command prompt.
    should_echo_pc: bool,
    /// Halt was already announced, since the last reset.
    halt_announced: bool,
}

/// The current status of the debugger execution loop.
#[derive(Debug, Default)]
enum Status {
    /// Keep executing user commands, until one changes the debugger status.
    #[default]
    WaitForAction,
    /// Execute `count` more instructions after the next one.
    ///
    /// Stop execution early if a breakpoint is reached or the program halts.
    Step { count: u64 },
    /// Execute all instructions until a breakpoint is reached or the program halts.
    Continue,
}

/// What the debugger loop does next.
#[derive(Debug)]
enum Action {
    /// Execute one instruction.
    Proceed,
    /// Leave the debugger.
    Quit,
}

impl Debugger {
    pub fn new(opts: DebuggerOptions) -> Self {
        Self {
            status: Status::default(),
            command_source: CommandReader::from(opts.command),

            breakpoints: Breakpoints::default(),
            current_breakpoint: None,

            instruction_count: 0,
            should_echo_pc: true,
            halt_announced: false,
        }
    }

    /// Drive `state` one instruction at a time, as commanded, until `quit` or end of input.
    pub fn run(&mut self, session: &mut Session, state: &mut RunState, channel: &mut dyn Channel) {
        loop {
            match self.wait_for_action(session, state) {
                Action::Proceed => {
                    let effect = state.step(channel);
                    channel.effect(&effect);
                    if !matches!(effect, Effect::Halt(_)) {
                        self.instruction_count += 1;
                    }
                }
                Action::Quit => break,
            }
        }
    }

    fn wait_for_action(&mut self, session: &mut Session, state: &mut RunState) -> Action {
        if state.status().is_halted() {
            if !self.halt_announced {
                dprintln!(
                    Always,
                    Warning,
                    "{} Pausing execution.",
                    halt_message(state.status())
                );
                self.halt_announced = true;
            }
            self.status = Status::WaitForAction;
        } else {
            self.check_breakpoint(state.pc());
        }

        loop {
            match &mut self.status {
                Status::WaitForAction => {
                    // Continue loop until action is given
                    if let Some(action) = self.next_action(session, state) {
                        return action;
                    }
                }
                Status::Step { count } => {
                    if *count > 0 {
                        *count -= 1;
                    } else {
                        self.status = Status::WaitForAction;
                    }
                    return Action::Proceed;
                }
                Status::Continue => {
                    return Action::Proceed;
                }
            }
        }
    }

    fn check_breakpoint(&mut self, pc: usize) {
        // Remember if previous cycle paused on the same breakpoint. If so, don't break now.
        if self.breakpoints.contains(pc) && self.current_breakpoint != Some(pc) {
            dprintln!(
                Always,
                Warning,
                "Reached breakpoint at instruction {}. Pausing execution.",
                pc
            );
            self.current_breakpoint = Some(pc);
            self.status = Status::WaitForAction;
        } else {
            self.current_breakpoint = None;
        }
    }

    fn next_action(&mut self, session: &mut Session, state: &mut RunState) -> Option<Action> {
        Output::Debugger(Condition::Always, Category::Normal).start_new_line();

        if self.instruction_count > 0 {
            dprintln!(
                Always,
                Info,
                "Executed {} instruction{}.",
                self.instruction_count,
                if self.instruction_count == 1 { "" } else { "s" },
            );
            self.instruction_count = 0;
        }
        if self.should_echo_pc {
            dprintln!(Sometimes, Info, "Program counter at: {}.", state.pc());
            self.should_echo_pc = false;
        }

        // Convert `EOF` to `quit` command
        let command = self.next_command().unwrap_or(Command::Quit);

        match command {
            Command::Quit => return Some(Action::Quit),

            Command::Help => {
                dprintln!(Always, Normal, "\n{}", include_str!("./help.txt"));
            }

            Command::Continue => {
                if !warn_if_halted(state) {
                    self.status = Status::Continue;
                    self.should_echo_pc = true;
                    dprintln!(Always, Info, "Continuing...");
                }
            }

            Command::Step { count } => {
                if !warn_if_halted(state) {
                    self.status = Status::Step { count: count - 1 };
                    self.should_echo_pc = true;
                }
            }

            Command::State => {
                Output::Debugger(Condition::Always, Category::Normal).print_state(state);
            }

            Command::List => self.list(state),

            Command::Reset { seed } => {
                let reseed = seed.map_or(Reseed::Replay, Reseed::Seed);
                session.reset(state, reseed);
                self.current_breakpoint = None;
                self.halt_announced = false;
                self.should_echo_pc = true;
                dprintln!(
                    Always,
                    Warning,
                    "Reset program to initial state (seed {}).",
                    state.seed()
                );
            }

            Command::BreakAdd { index } => {
                if index >= state.program().len() {
                    dprintln!(
                        Always,
                        Error,
                        "No instruction {}. Program has {} instruction{}.",
                        index,
                        state.program().len(),
                        if state.program().len() == 1 { "" } else { "s" },
                    );
                } else if self.breakpoints.insert(index) {
                    dprintln!(Always, Warning, "Added breakpoint at instruction {}.", index);
                } else {
                    dprintln!(
                        Always,
                        Error,
                        "Breakpoint already exists at instruction {}.",
                        index
                    );
                }
            }
            Command::BreakRemove { index } => {
                if self.breakpoints.remove(index) {
                    dprintln!(
                        Always,
                        Warning,
                        "Removed breakpoint at instruction {}.",
                        index
                    );
                } else {
                    dprintln!(Always, Error, "No breakpoint exists at instruction {}.", index);
                }
            }
            Command::BreakList => {
                if self.breakpoints.is_empty() {
                    dprintln!(Always, Info, "No breakpoints exist.");
                } else {
                    dprintln!(Always, Info, "Breakpoints:");
                    for (i, index) in self.breakpoints.iter().enumerate() {
                        if Output::is_minimal() {
                            dprintln!(Always, Info, "{}", index);
                            continue;
                        }
                        let instr = state
                            .program()
                            .get(*index)
                            .map(|instr| instr.to_string())
                            .unwrap_or_default();
                        dprintln!(
                            Always,
                            Info,
                            "{} {:>3}  ──  {}",
                            if i + 1 == self.breakpoints.len() {
                                "╰─"
                            } else {
                                "├─"
                            },
                            index,
                            instr
                        );
                    }
                }
            }
        }

        None
    }

    /// Show every instruction, marking the program counter and breakpoints.
    fn list(&self, state: &RunState) {
        if state.program().is_empty() {
            dprintln!(Always, Info, "Program is empty.");
            return;
        }
        for (index, instr) in state.program().iter().enumerate() {
            let pc = if index == state.pc() { '>' } else { ' ' };
            let breakpoint = if self.breakpoints.contains(index) {
                '*'
            } else {
                ' '
            };
            dprint!(Always, Normal, "{}{} {:>3}  ", pc, breakpoint, index);
            dprintln!(Always, Normal, "{}", instr);
        }
    }

    /// Returns `None` on EOF.
    fn next_command(&mut self) -> Option<Command> {
        // Loop until valid command or EOF
        loop {
            let line = self.command_source.read()?.trim();
            // Necessary, since `Command::try_from` assumes non-empty line
            if line.is_empty() {
                continue;
            }
            match Command::try_from(line) {
                Ok(command) => return Some(command),
                Err(error) => {
                    dprintln!(Always, Error, "{}", error);
                    dprintln!(Always, Error, "Type `help` for a list of commands.");
                }
            }
        }
    }
}

/// Returns `true` if the program cannot execute any further.
fn warn_if_halted(state: &RunState) -> bool {
    if !state.status().is_halted() {
        return false;
    }
    dprintln!(
        Always,
        Error,
        "Program has halted. Use `reset` to run it again."
    );
    true
}

fn halt_message(status: RunStatus) -> &'static str {
    match status {
        RunStatus::HaltedSuccess => "Program finished with the expected output.",
        RunStatus::HaltedError => "Program halted after too many faults.",
        _ => "Program stopped.",
    }
}
