use std::fmt;
use std::str::{FromStr, SplitWhitespace};

use super::error::{ArgumentError, CommandError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    Step { count: u64 },
    Continue,
    State,
    List,
    /// Rewind the run. With a seed, the level's input is generated from it.
    Reset { seed: Option<u64> },
    Quit,
    BreakList,
    BreakAdd { index: usize },
    BreakRemove { index: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandName {
    Help,
    Step,
    Continue,
    State,
    List,
    Reset,
    Quit,
    BreakList,
    BreakAdd,
    BreakRemove,
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Help => write!(f, "help"),
            Self::Step => write!(f, "step"),
            Self::Continue => write!(f, "continue"),
            Self::State => write!(f, "state"),
            Self::List => write!(f, "list"),
            Self::Reset => write!(f, "reset"),
            Self::Quit => write!(f, "quit"),
            Self::BreakList => write!(f, "break list"),
            Self::BreakAdd => write!(f, "break add"),
            Self::BreakRemove => write!(f, "break remove"),
        }
    }
}

#[rustfmt::skip]
const COMMANDS: CommandNameList = &[
    (CommandName::Help,        &["help", "--help", "h", "-h"]),
    (CommandName::Step,        &["step", "s"]),
    (CommandName::Continue,    &["continue", "cont", "c"]),
    (CommandName::State,       &["state", "st"]),
    (CommandName::List,        &["list", "ls"]),
    (CommandName::Reset,       &["reset"]),
    (CommandName::Quit,        &["quit", "exit", "q"]),
    (CommandName::BreakList,   &["breaklist", "bl"]),
    (CommandName::BreakAdd,    &["breakadd", "ba"]),
    (CommandName::BreakRemove, &["breakremove", "br"]),
    // "break" is treated specially
];
const BREAK_COMMAND: CandidateList = &["break", "b"];
#[rustfmt::skip]
const BREAK_SUBCOMMANDS: CommandNameList = &[
    (CommandName::BreakList,   &["list", "l"]),
    (CommandName::BreakAdd,    &["add", "a"]),
    (CommandName::BreakRemove, &["remove", "r"]),
];

/// A [`CommandName`] with a list of name candidates.
type CommandNameList<'a> = &'a [(CommandName, CandidateList<'a>)];
/// List of single-word aliases for a command or subcommand.
type CandidateList<'a> = &'a [&'a str];

impl TryFrom<&str> for Command {
    type Error = CommandError;

    /// Assumes line is non-empty.
    fn try_from(line: &str) -> Result<Self, Self::Error> {
        let mut args = Arguments::new(line);
        let command_name = args.command_name()?;
        args.command(command_name)
            .map_err(|error| CommandError::InvalidArgument {
                command_name,
                error,
            })
    }
}

/// Words of a command line, consumed left to right.
struct Arguments<'a> {
    words: SplitWhitespace<'a>,
    /// Arguments consumed, not including the command name.
    count: usize,
}

impl<'a> Arguments<'a> {
    fn new(line: &'a str) -> Self {
        Self {
            words: line.split_whitespace(),
            count: 0,
        }
    }

    /// Considers multi-word command names (i.e. subcommands) as one name. Eg. "break add".
    fn command_name(&mut self) -> Result<CommandName, CommandError> {
        let command_name = self.words.next().unwrap_or("");

        if let Some(command) = find_name_match(command_name, COMMANDS) {
            return Ok(command);
        }

        if name_matches(command_name, BREAK_COMMAND) {
            let command_name = BREAK_COMMAND[0];
            let Some(subcommand_name) = self.words.next() else {
                return Err(CommandError::MissingSubcommand { command_name });
            };
            let Some(command) = find_name_match(subcommand_name, BREAK_SUBCOMMANDS) else {
                return Err(CommandError::InvalidSubcommand {
                    command_name,
                    subcommand_name: subcommand_name.to_string(),
                });
            };
            return Ok(command);
        }

        Err(CommandError::InvalidCommand {
            command_name: command_name.to_string(),
        })
    }

    fn command(&mut self, name: CommandName) -> Result<Command, ArgumentError> {
        let command = match name {
            CommandName::Help => Command::Help,
            CommandName::Continue => Command::Continue,
            CommandName::State => Command::State,
            CommandName::List => Command::List,
            CommandName::Quit => Command::Quit,
            CommandName::BreakList => Command::BreakList,
            CommandName::Step => {
                let count = self.optional_integer::<u64>("count")?.unwrap_or(1);
                if count == 0 {
                    return Err(ArgumentError::MalformedInteger {
                        argument_name: "count",
                        value: count.to_string(),
                    });
                }
                Command::Step { count }
            }
            CommandName::Reset => Command::Reset {
                seed: self.optional_integer("seed")?,
            },
            CommandName::BreakAdd => Command::BreakAdd {
                index: self.integer("index")?,
            },
            CommandName::BreakRemove => Command::BreakRemove {
                index: self.integer("index")?,
            },
        };
        self.expect_end()?;
        Ok(command)
    }

    fn integer<T: FromStr>(&mut self, argument_name: &'static str) -> Result<T, ArgumentError> {
        self.optional_integer(argument_name)?
            .ok_or(ArgumentError::MissingArgument { argument_name })
    }

    fn optional_integer<T: FromStr>(
        &mut self,
        argument_name: &'static str,
    ) -> Result<Option<T>, ArgumentError> {
        let Some(word) = self.words.next() else {
            return Ok(None);
        };
        self.count += 1;
        word.parse()
            .map(Some)
            .map_err(|_| ArgumentError::MalformedInteger {
                argument_name,
                value: word.to_string(),
            })
    }

    fn expect_end(&mut self) -> Result<(), ArgumentError> {
        let extra = self.words.by_ref().count();
        if extra > 0 {
            return Err(ArgumentError::TooManyArguments {
                expected_count: self.count,
                actual_count: self.count + extra,
            });
        }
        Ok(())
    }
}

fn find_name_match(name: &str, commands: CommandNameList) -> Option<CommandName> {
    for (command, candidates) in commands {
        if name_matches(name, candidates) {
            return Some(*command);
        }
    }
    None
}

/// Case-insensitive.
fn name_matches(name: &str, candidates: CandidateList) -> bool {
    candidates
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(name))
}
