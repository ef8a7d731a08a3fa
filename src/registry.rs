//! Command definitions and the registry that owns them.

use std::fmt;
use std::io::Write;

use crate::error::RegistrationError;
use crate::parser::Word;

/// Most arguments a single command may declare.
pub const MAX_ARGS: usize = 2;

/// Semantic type of a command argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgumentKind {
    /// A regular file that must already exist.
    ExistingFile,
    /// A file name that may or may not exist yet.
    NewFile,
    /// An existing regular file or directory.
    ExistingFileOrDir,
    /// An existing directory.
    ExistingDir,
    /// Anything at all.
    FreeText,
    /// A host name, IPv4 or IPv6 literal.
    HostOrIp,
}

/// One positional argument slot of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgumentSpec {
    pub kind: ArgumentKind,
    pub optional: bool,
}

impl ArgumentSpec {
    pub const fn required(kind: ArgumentKind) -> Self {
        Self {
            kind,
            optional: false,
        }
    }

    pub const fn optional(kind: ArgumentKind) -> Self {
        Self {
            kind,
            optional: true,
        }
    }
}

/// What a command does once its arguments are bound and validated.
///
/// `args` holds one entry per declared argument, `None` for an omitted
/// optional one. The return value is the command's exit status.
pub trait CommandHandler {
    fn execute(&self, args: &[Option<String>], out: &mut dyn Write) -> i32;
}

impl<F> CommandHandler for F
where
    F: Fn(&[Option<String>], &mut dyn Write) -> i32,
{
    fn execute(&self, args: &[Option<String>], out: &mut dyn Write) -> i32 {
        self(args, out)
    }
}

/// A registered command.
pub struct Command {
    name: String,
    specs: Vec<ArgumentSpec>,
    handler: Box<dyn CommandHandler>,
}

impl Command {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn specs(&self) -> &[ArgumentSpec] {
        &self.specs
    }

    /// Binds words `1..` of a parsed line to this command's argument slots.
    ///
    /// Word 0 is the command name and is skipped. Words beyond the declared
    /// arity are dropped; slots with no word stay `None`.
    pub fn bind(&self, words: &[Word]) -> Vec<Option<String>> {
        let mut slots = vec![None; self.specs.len()];
        for (slot, word) in slots.iter_mut().zip(words.iter().skip(1)) {
            *slot = Some(word.text.clone());
        }
        slots
    }

    pub fn invoke(&self, args: &[Option<String>], out: &mut dyn Write) -> i32 {
        self.handler.execute(args, out)
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("specs", &self.specs)
            .finish_non_exhaustive()
    }
}

/// Owns every command, kept sorted by name (byte-wise).
///
/// The sorted order is what completion presents to the user, so it is
/// maintained on every insertion rather than computed on demand.
#[derive(Debug, Default)]
pub struct Registry {
    commands: Vec<Command>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a command.
    ///
    /// Nothing is inserted when the name is taken, when a required argument
    /// follows an optional one, or when more than [`MAX_ARGS`] are declared.
    pub fn register(
        &mut self,
        name: &str,
        specs: &[ArgumentSpec],
        handler: impl CommandHandler + 'static,
    ) -> Result<(), RegistrationError> {
        check_specs(name, specs)?;

        let pos = match self.position(name) {
            Ok(_) => return Err(RegistrationError::DuplicateName(name.to_string())),
            Err(pos) => pos,
        };
        self.commands.insert(
            pos,
            Command {
                name: name.to_string(),
                specs: specs.to_vec(),
                handler: Box::new(handler),
            },
        );
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&Command> {
        self.position(name).ok().map(|pos| &self.commands[pos])
    }

    /// All commands in alphabetical order.
    pub fn enumerate(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn position(&self, name: &str) -> Result<usize, usize> {
        self.commands
            .binary_search_by(|cmd| cmd.name.as_str().cmp(name))
    }
}

fn check_specs(name: &str, specs: &[ArgumentSpec]) -> Result<(), RegistrationError> {
    if specs.len() > MAX_ARGS {
        return Err(RegistrationError::TooManyArguments {
            name: name.to_string(),
            count: specs.len(),
        });
    }
    let mut seen_optional = false;
    for spec in specs {
        if spec.optional {
            seen_optional = true;
        } else if seen_optional {
            return Err(RegistrationError::BadArgumentOrder(name.to_string()));
        }
    }
    Ok(())
}
