use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

pub mod builtins;
pub mod complete;
pub mod config;
pub mod dispatch;
pub mod editor;
pub mod error;
pub mod parser;
pub mod registry;
pub mod validate;

pub use complete::{Completion, CompletionKind};
pub use config::Config;
pub use dispatch::Outcome;
pub use error::{ParseError, RegistrationError};
pub use parser::{Mode, Word, tokenize};
pub use registry::{ArgumentKind, ArgumentSpec, CommandHandler, Registry};

/// Shared "stop after this line" flag.
///
/// Cloned into commands that end the session; the loop polls it before
/// reading each line.
#[derive(Debug, Clone, Default)]
pub struct TerminateHandle(Arc<AtomicBool>);

impl TerminateHandle {
    pub fn request(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Anything that can answer completion requests for a line editor.
pub trait Completer {
    fn complete(&self, line: &str, cursor: usize) -> Completion;
}

/// Source of input lines.
pub trait LineEditor {
    /// Reads one line after showing `prompt`.
    ///
    /// Returns `None` at end of input.
    fn read_line(
        &mut self,
        prompt: &str,
        completer: &dyn Completer,
    ) -> anyhow::Result<Option<String>>;
}

/// The interactive shell: its commands, settings and termination flag.
pub struct Shell {
    registry: Registry,
    config: Config,
    terminate: TerminateHandle,
}

impl Shell {
    pub fn new(config: Config) -> Self {
        Self {
            registry: Registry::new(),
            config,
            terminate: TerminateHandle::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn terminate_handle(&self) -> TerminateHandle {
        self.terminate.clone()
    }

    pub fn register(
        &mut self,
        name: &str,
        specs: &[ArgumentSpec],
        handler: impl CommandHandler + 'static,
    ) -> Result<(), RegistrationError> {
        self.registry.register(name, specs, handler)
    }

    /// Runs one input line. See [`dispatch::execute`].
    pub fn execute(&self, line: &str, out: &mut dyn Write) -> Outcome {
        dispatch::execute(&self.registry, line, out)
    }

    /// Reads and executes lines until end of input, an empty line, or a
    /// termination request.
    pub fn run(&self, editor: &mut dyn LineEditor, out: &mut dyn Write) -> anyhow::Result<()> {
        while !self.terminate.is_requested() {
            let Some(line) = editor.read_line(&self.config.prompt, self)? else {
                break;
            };
            if line.trim_matches([' ', '\t']).is_empty() {
                break;
            }

            let outcome = self.execute(&line, out);
            if let Some(message) = outcome.message() {
                writeln!(out, "{message}")?;
            }
            out.flush()?;
        }
        debug!("session finished");
        Ok(())
    }
}

impl Completer for Shell {
    fn complete(&self, line: &str, cursor: usize) -> Completion {
        complete::complete(&self.registry, line, cursor)
    }
}
