use std::io::{self, BufRead as _};

use crate::{dprint, dprintln};

/// Must be ASCII to ensure `.len() == .chars().count()`
const PROMPT: &str = "DEBUGGER> ";

/// Read from argument first, if `Some`. Then read from stdin.
#[derive(Debug)]
pub struct CommandReader {
    argument: Option<Argument>,
    stdin: Stdin,
}

/// A trait for objects which can yield a command, by iterating a string or reading a stream.
pub trait Read {
    /// `None` indicates EOF.
    /// Returned string slice MAY include leading or trailing whitespace.
    fn read(&mut self) -> Option<&str>;
}

/// Commands separated by `;` or newlines.
#[derive(Debug)]
pub struct Argument {
    buffer: String,
    /// Byte index.
    cursor: usize,
}

/// Stdin, read one line at a time. A line may hold several commands.
#[derive(Debug)]
pub struct Stdin {
    stdin: io::Stdin,
    line: Argument,
}

impl CommandReader {
    pub fn from(argument: Option<String>) -> Self {
        Self {
            argument: argument.map(Argument::from),
            stdin: Stdin::new(),
        }
    }
}

impl Read for CommandReader {
    fn read(&mut self) -> Option<&str> {
        // Always try to read from argument first
        if let Some(argument) = &mut self.argument {
            if let Some(command) = argument.read() {
                echo_command(Some(command));
                return Some(command);
            }
        }
        let command = self.stdin.read();
        echo_command(command);
        command
    }
}

impl Argument {
    pub fn from(source: String) -> Self {
        Self {
            buffer: source,
            cursor: 0,
        }
    }

    fn is_eof(&self) -> bool {
        self.cursor >= self.buffer.len()
    }
}

impl Read for Argument {
    fn read(&mut self) -> Option<&str> {
        if self.is_eof() {
            return None;
        }

        // Take characters until delimiter
        let start = self.cursor;
        let end = self.buffer[start..]
            .find(|ch: char| ch == '\n' || ch == ';')
            .map_or(self.buffer.len(), |offset| start + offset);
        self.cursor = end + 1; // sizeof('\n' or ';')

        self.buffer.get(start..end)
    }
}

impl Stdin {
    fn new() -> Self {
        Self {
            stdin: io::stdin(),
            line: Argument::from(String::new()),
        }
    }
}

impl Read for Stdin {
    fn read(&mut self) -> Option<&str> {
        while self.line.is_eof() {
            let mut buffer = String::new();
            match self.stdin.lock().read_line(&mut buffer) {
                Ok(0) => return None,
                Ok(_) => self.line = Argument::from(buffer),
                Err(error) => {
                    dprintln!(Always, Error, "Failed to read from stdin: {}", error);
                    return None;
                }
            }
        }
        self.line.read()
    }
}

/// Print prompt and command.
fn echo_command(command: Option<&str>) {
    if command.is_some_and(|command| command.trim().is_empty()) {
        return;
    }
    dprint!(Sometimes, Normal, "\x1b[1m{}", PROMPT);
    dprintln!(
        Sometimes,
        Normal,
        "{}\x1b[0m",
        command.unwrap_or("\x1b[3m(end of input)").trim()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argument_splits_commands() {
        let mut argument = Argument::from("step 2; state\nbreak add 1;;quit".to_string());
        assert_eq!(argument.read(), Some("step 2"));
        assert_eq!(argument.read(), Some(" state"));
        assert_eq!(argument.read(), Some("break add 1"));
        assert_eq!(argument.read(), Some(""));
        assert_eq!(argument.read(), Some("quit"));
        assert_eq!(argument.read(), None);
    }

    #[test]
    fn trailing_delimiter() {
        let mut argument = Argument::from("quit\n".to_string());
        assert_eq!(argument.read(), Some("quit"));
        assert_eq!(argument.read(), None);
    }
}
