use std::cell::RefCell;
use std::str::Chars;

use colored::{ColoredString, Colorize};

use crate::command::Value;
use crate::runtime::RunState;

#[macro_export]
macro_rules! dprint {
    ( $cond:expr, $kind:expr, $fmt:literal $($tt:tt)* ) => {{
        #[allow(unused_imports)]
        use $crate::output::Condition::*;
        #[allow(unused_imports)]
        use $crate::output::Category::*;
        let s = format!(
            $fmt
            $($tt)*
        );
        $crate::output::Output::Debugger($cond, $kind).print_str(&s);
    }};
}

#[macro_export]
macro_rules! dprintln {
    ( $cond:expr, $kind:expr ) => {{
        #[allow(unused_imports)]
        use $crate::output::Condition::*;
        #[allow(unused_imports)]
        use $crate::output::Category::*;
        $crate::output::Output::Debugger($cond, $kind).print_str("\n");
    }};
    ( $cond:expr, $kind:expr, $fmt:literal $($tt:tt)* ) => {{
        #[allow(unused_imports)]
        use $crate::output::Condition::*;
        #[allow(unused_imports)]
        use $crate::output::Category::*;
        let s = format!(
            concat!($fmt, "\n")
            $($tt)*
        );
        $crate::output::Output::Debugger($cond, $kind).print_str(&s);
    }};
}

/// Where text goes. `Normal` is the program's own output on stdout, `Debugger` is everything
/// else, on stderr.
#[derive(Clone, Copy, Debug)]
pub enum Output {
    Normal,
    Debugger(Condition, Category),
}

/// Whether text is still shown with `--minimal`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Condition {
    Always,
    Sometimes,
}

/// Decides the color of debugger text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    Normal,
    Info,
    Warning,
    Error,
}

struct Decolored<'a> {
    chars: Chars<'a>,
}

impl Output {
    thread_local! {
        static IS_LINE_START: RefCell<bool> = const { RefCell::new(true) };
        static IS_MINIMAL: RefCell<bool> = const { RefCell::new(false) };
    }

    pub fn set_line_start(new_value: bool) -> bool {
        Self::IS_LINE_START.with(|value| value.replace(new_value))
    }
    /// Private. Use [`Output::start_new_line`].
    fn is_line_start() -> bool {
        Self::IS_LINE_START.with(|value| *value.borrow())
    }
    pub fn set_minimal(new_value: bool) -> bool {
        Self::IS_MINIMAL.with(|value| value.replace(new_value))
    }
    pub fn is_minimal() -> bool {
        Self::IS_MINIMAL.with(|value| *value.borrow())
    }

    fn set_line_start_from_str(string: &str) {
        let last = Decolored::new(string).last();
        if let Some(ch) = last {
            Output::set_line_start(ch == '\n');
        }
    }

    pub fn print_str(&self, string: &str) {
        match self {
            Self::Normal => {
                print!("{}", string);
                Self::set_line_start_from_str(string);
            }

            Self::Debugger(condition, category) => match (Self::is_minimal(), *condition) {
                (false, _) => {
                    let string = ColoredString::from(string);
                    let string = match category {
                        Category::Normal => string,
                        Category::Info => string.blue(),
                        Category::Warning => string.yellow(),
                        Category::Error => string.red(),
                    };
                    eprint!("{}", string);
                    Self::set_line_start_from_str(&string);
                }
                // Always remove color if `--minimal`
                (true, Condition::Always) => {
                    eprint_colorless(string);
                    Self::set_line_start_from_str(string);
                }
                (true, Condition::Sometimes) => (),
            },
        }
    }

    pub fn start_new_line(&self) {
        if !Self::is_line_start() {
            self.print_str("\n");
        }
    }

    /// Show what the worker holds, the floor, and both boxes.
    pub fn print_state(&self, state: &RunState) {
        if Self::is_minimal() {
            self.print_str(&format!("PC {}\n", state.pc()));
            self.print_str(&format!("ACC {}\n", display_value(state.accumulator())));
            for (i, slot) in state.memory().iter().enumerate() {
                self.print_str(&format!("SLOT {} {}\n", i, display_value(*slot)));
            }
            self.print_str(&format!("INBOX {}\n", join(state.inbox().iter())));
            self.print_str(&format!("OUTBOX {}\n", join(state.outbox().iter())));
            self.print_str(&format!("STEPS {}\n", state.instructions_executed()));
            return;
        }

        self.print_str("\x1b[2m┌────────────────────────────────────┐\x1b[0m\n");
        self.print_row("PC", &state.pc().to_string());
        self.print_row("Hands", &display_value(state.accumulator()));
        for (i, slot) in state.memory().iter().enumerate() {
            self.print_row(&format!("[{}]", i), &display_value(*slot));
        }
        self.print_row("Inbox", &join(state.inbox().iter()));
        self.print_row("Outbox", &join(state.outbox().iter()));
        self.print_row("Expected", &join(state.expected().iter()));
        self.print_row("Steps", &state.instructions_executed().to_string());
        self.print_str("\x1b[2m└────────────────────────────────────┘\x1b[0m\n");
    }

    fn print_row(&self, name: &str, value: &str) {
        self.print_str("\x1b[2m│\x1b[0m");
        self.print_str(&format!(" \x1b[1m{:<9}\x1b[0m {:<24} ", name, value));
        self.print_str("\x1b[2m│\x1b[0m\n");
    }
}

fn display_value(value: Option<Value>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => "-".to_string(),
    }
}

fn join<'a>(values: impl Iterator<Item = &'a Value>) -> String {
    values
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

impl<'a> Decolored<'a> {
    pub fn new(string: &'a str) -> Self {
        Self {
            chars: string.chars(),
        }
    }
}

impl Iterator for Decolored<'_> {
    type Item = char;
    fn next(&mut self) -> Option<Self::Item> {
        while let Some(ch) = self.chars.next() {
            // Skip everything between '\x1b' and 'm' (inclusive)
            if ch == '\x1b' {
                while self.chars.next().is_some_and(|ch| ch != 'm') {}
                continue;
            }
            return Some(ch);
        }
        None
    }
}

fn eprint_colorless(string: &str) {
    for ch in Decolored::new(string) {
        eprint!("{}", ch);
    }
}
