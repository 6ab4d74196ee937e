use std::fmt;
use std::str::FromStr;

/// Number carried by the worker or kept on a floor slot.
pub type Value = i64;

/// Every tile a player can place in a program.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Opcode {
    /// Take the next value from the inbox.
    Input,
    /// Put the carried value into the outbox.
    Output,
    CopyFrom,
    CopyTo,
    Add,
    Sub,
    Jump,
    JumpIfZero,
    /// Jump destination. Does nothing when executed.
    Label,
}

impl Opcode {
    pub const ALL: [Opcode; 9] = [
        Opcode::Input,
        Opcode::Output,
        Opcode::CopyFrom,
        Opcode::CopyTo,
        Opcode::Add,
        Opcode::Sub,
        Opcode::Jump,
        Opcode::JumpIfZero,
        Opcode::Label,
    ];

    /// Takes a construction slot index as its argument.
    pub fn takes_slot(self) -> bool {
        matches!(
            self,
            Opcode::CopyFrom | Opcode::CopyTo | Opcode::Add | Opcode::Sub
        )
    }

    /// Takes a reference to another command as its argument.
    pub fn takes_target(self) -> bool {
        matches!(self, Opcode::Jump | Opcode::JumpIfZero)
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Input => "INBOX",
            Opcode::Output => "OUTBOX",
            Opcode::CopyFrom => "COPYFROM",
            Opcode::CopyTo => "COPYTO",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Jump => "JUMP",
            Opcode::JumpIfZero => "JUMPZ",
            Opcode::Label => "LABEL",
        }
    }
}

impl FromStr for Opcode {
    type Err = ();

    /// Case-insensitive. Accepts both the tile names and the long names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "INBOX" | "INPUT" => Ok(Opcode::Input),
            "OUTBOX" | "OUTPUT" => Ok(Opcode::Output),
            "COPYFROM" => Ok(Opcode::CopyFrom),
            "COPYTO" => Ok(Opcode::CopyTo),
            "ADD" => Ok(Opcode::Add),
            "SUB" => Ok(Opcode::Sub),
            "JUMP" => Ok(Opcode::Jump),
            "JUMPZ" | "JUMP_IF_ZERO" => Ok(Opcode::JumpIfZero),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

/// Identity of a command tile. Stays the same when the tile is moved around.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct CommandId(u32);

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Raw argument of a command, before the program is built.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Arg {
    Slot(usize),
    /// Reference to another command in the same list.
    Target(CommandId),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Command {
    id: CommandId,
    opcode: Opcode,
    arg: Option<Arg>,
}

impl Command {
    pub fn id(&self) -> CommandId {
        self.id
    }

    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    pub fn arg(&self) -> Option<Arg> {
        self.arg
    }
}

/// The player's ordered list of commands, as arranged on the program area.
#[derive(Clone, Debug, Default)]
pub struct CommandList {
    commands: Vec<Command>,
    /// Ids are never reused, so stale references stay stale.
    next_id: u32,
}

impl CommandList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command, returning its id.
    pub fn push(&mut self, opcode: Opcode, arg: Option<Arg>) -> CommandId {
        let index = self.commands.len();
        self.insert(index, opcode, arg)
    }

    /// Insert a command at `index`, shifting later commands down.
    ///
    /// Panics if `index > len`, like [`Vec::insert`].
    pub fn insert(&mut self, index: usize, opcode: Opcode, arg: Option<Arg>) -> CommandId {
        let id = CommandId(self.next_id);
        self.next_id += 1;
        self.commands.insert(index, Command { id, opcode, arg });
        id
    }

    /// Remove a command. Jumps which referenced it are left dangling.
    pub fn remove(&mut self, id: CommandId) -> Option<Command> {
        let index = self.position(id)?;
        Some(self.commands.remove(index))
    }

    /// Move a command to a new index (clamped to the end of the list).
    ///
    /// Returns whether the command exists.
    pub fn move_to(&mut self, id: CommandId, index: usize) -> bool {
        let Some(command) = self.remove(id) else {
            return false;
        };
        let index = index.min(self.commands.len());
        self.commands.insert(index, command);
        true
    }

    /// Replace the argument of a command.
    ///
    /// Returns whether the command exists.
    pub fn set_arg(&mut self, id: CommandId, arg: Option<Arg>) -> bool {
        match self.commands.iter_mut().find(|command| command.id == id) {
            Some(command) => {
                command.arg = arg;
                true
            }
            None => false,
        }
    }

    /// Current index of a command. Linear scan; programs are tens of commands long.
    pub fn position(&self, id: CommandId) -> Option<usize> {
        self.commands.iter().position(|command| command.id == id)
    }

    pub fn get(&self, index: usize) -> Option<&Command> {
        self.commands.get(index)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }

    /// Amount of commands which count towards the size challenge (labels are free).
    pub fn commands_used(&self) -> usize {
        self.commands
            .iter()
            .filter(|command| command.opcode != Opcode::Label)
            .count()
    }
}

impl<'a> IntoIterator for &'a CommandList {
    type Item = &'a Command;
    type IntoIter = std::slice::Iter<'a, Command>;
    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}
