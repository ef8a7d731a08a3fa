use std::io::{self, Write};
use std::process;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::registry::{ArgumentKind, ArgumentSpec, CommandHandler};
use crate::{RegistrationError, Shell, TerminateHandle};

/// Exit status reported when a program could not be started.
pub const SPAWN_FAILED: i32 = 127;

/// Exit status of a builtin whose output could not be written.
pub const OUTPUT_FAILED: i32 = 74;

/// Starts external programs on behalf of commands.
pub trait Launcher {
    /// Runs `program` with `args` to completion and returns its exit status.
    fn launch(&self, program: &str, args: &[String], out: &mut dyn Write) -> i32;
}

/// Runs programs directly, without going through `/bin/sh`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn launch(&self, program: &str, args: &[String], out: &mut dyn Write) -> i32 {
        debug!(program, ?args, "launching");
        match process::Command::new(program).args(args).status() {
            // killed by a signal: no code
            Ok(status) => status.code().unwrap_or(-1),
            Err(e) => {
                warn!(program, error = %e, "launch failed");
                if let Err(err) = writeln!(out, "{}: error executing command: {}", program, e) {
                    warn!(program, error = %err, "could not report launch failure");
                }
                SPAWN_FAILED
            }
        }
    }
}

/// Turns the result of a builtin's writes into its exit status.
fn finish(result: io::Result<i32>) -> i32 {
    result.unwrap_or_else(|err| {
        warn!(error = %err, "write failed");
        OUTPUT_FAILED
    })
}

/// A command backed by an external program.
///
/// The program receives its fixed leading arguments followed by every
/// supplied argument, in slot order. Programs that accept `--` should end
/// their fixed arguments with it, so a value like `-rf` is never read as an
/// option. For the others, [`External::refusing_options`] turns such values
/// away before launch.
pub struct External {
    program: String,
    fixed: Vec<String>,
    launcher: Rc<dyn Launcher>,
    refuse_options: bool,
}

impl External {
    pub fn new(program: &str, fixed: &[&str], launcher: Rc<dyn Launcher>) -> Self {
        Self {
            program: program.to_string(),
            fixed: fixed.iter().map(|s| s.to_string()).collect(),
            launcher,
            refuse_options: false,
        }
    }

    /// Refuses to launch when a supplied argument starts with `-`.
    pub fn refusing_options(mut self) -> Self {
        self.refuse_options = true;
        self
    }

    fn argv(&self, args: &[Option<String>]) -> Vec<String> {
        self.fixed
            .iter()
            .cloned()
            .chain(args.iter().flatten().cloned())
            .collect()
    }

    fn run(&self, args: &[Option<String>], out: &mut dyn Write) -> io::Result<i32> {
        if self.refuse_options
            && let Some(arg) = args.iter().flatten().find(|arg| arg.starts_with('-'))
        {
            debug!(program = %self.program, %arg, "option-like argument refused");
            writeln!(out, "{}: {}: arguments may not start with '-'", self.program, arg)?;
            return Ok(2);
        }
        // the child writes straight to the terminal
        out.flush()?;
        Ok(self.launcher.launch(&self.program, &self.argv(args), out))
    }
}

impl CommandHandler for External {
    fn execute(&self, args: &[Option<String>], out: &mut dyn Write) -> i32 {
        finish(self.run(args, out))
    }
}

/// Prints the working directory.
pub struct Pwd;

impl Pwd {
    fn report(out: &mut dyn Write) -> io::Result<i32> {
        match std::env::current_dir() {
            Ok(path) => {
                writeln!(out, "Current directory is {}", path.display())?;
                Ok(0)
            }
            Err(e) => {
                writeln!(out, "Error getting current directory: {}", e)?;
                Ok(1)
            }
        }
    }
}

impl CommandHandler for Pwd {
    fn execute(&self, _args: &[Option<String>], out: &mut dyn Write) -> i32 {
        finish(Self::report(out))
    }
}

/// Changes the working directory, then prints it.
pub struct Cd;

impl CommandHandler for Cd {
    fn execute(&self, args: &[Option<String>], out: &mut dyn Write) -> i32 {
        let Some(dir) = args.first().and_then(Option::as_deref) else {
            return 1;
        };
        if let Err(e) = std::env::set_current_dir(dir) {
            return finish(writeln!(out, "{}: {}", dir, e).map(|()| 1));
        }
        Pwd.execute(&[], out)
    }
}

/// Ends the session after the current line.
pub struct Exit(pub TerminateHandle);

impl CommandHandler for Exit {
    fn execute(&self, _args: &[Option<String>], _out: &mut dyn Write) -> i32 {
        self.0.request();
        0
    }
}

/// Registers the built-in commands on `shell`.
///
/// A command that cannot be registered is logged and skipped; the failures
/// are returned.
pub fn install(shell: &mut Shell, launcher: Rc<dyn Launcher>) -> Vec<RegistrationError> {
    use ArgumentKind::*;

    let ping_count = shell.config().ping_count.to_string();
    let ping_size = shell.config().ping_packet_size.to_string();
    let terminate = shell.terminate_handle();

    let results = [
        shell.register(
            "ls",
            &[ArgumentSpec::optional(ExistingFileOrDir)],
            External::new("ls", &["-FClg", "--"], Rc::clone(&launcher)),
        ),
        shell.register("cd", &[ArgumentSpec::required(ExistingDir)], Cd),
        shell.register("pwd", &[], Pwd),
        shell.register(
            "grep",
            &[
                ArgumentSpec::required(FreeText),
                ArgumentSpec::required(ExistingFile),
            ],
            External::new("grep", &["--"], Rc::clone(&launcher)),
        ),
        shell.register(
            "ping",
            &[ArgumentSpec::required(HostOrIp)],
            External::new("ping", &["-c", &ping_count, "-s", &ping_size], Rc::clone(&launcher))
                .refusing_options(),
        ),
        shell.register(
            "cp",
            &[
                ArgumentSpec::required(ExistingFile),
                ArgumentSpec::required(NewFile),
            ],
            External::new("cp", &["--"], Rc::clone(&launcher)),
        ),
        shell.register("exit", &[], Exit(terminate)),
    ];

    results
        .into_iter()
        .filter_map(Result::err)
        .inspect(|err| warn!(%err, "skipping command"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<(String, Vec<String>)>>,
    }

    impl Launcher for Recorder {
        fn launch(&self, program: &str, args: &[String], _out: &mut dyn Write) -> i32 {
            self.calls
                .borrow_mut()
                .push((program.to_string(), args.to_vec()));
            0
        }
    }

    #[test]
    fn external_appends_supplied_arguments() {
        let recorder = Rc::new(Recorder::default());
        let ls = External::new("ls", &["-FClg"], recorder.clone());
        let mut out: Vec<u8> = Vec::new();

        assert_eq!(ls.execute(&[None], &mut out), 0);
        assert_eq!(ls.execute(&[Some("a b".into())], &mut out), 0);
        assert_eq!(
            *recorder.calls.borrow(),
            vec![
                ("ls".to_string(), vec!["-FClg".to_string()]),
                ("ls".to_string(), vec!["-FClg".to_string(), "a b".to_string()]),
            ]
        );
    }

    #[test]
    fn install_registers_every_builtin() {
        let mut shell = Shell::new(Config::default());
        let failures = install(&mut shell, Rc::new(Recorder::default()));
        assert!(failures.is_empty());

        let names: Vec<_> = shell.registry().enumerate().map(|c| c.name()).collect();
        assert_eq!(names, vec!["cd", "cp", "exit", "grep", "ls", "ping", "pwd"]);
    }

    #[test]
    fn install_reports_names_already_taken() {
        let mut shell = Shell::new(Config::default());
        shell
            .register("pwd", &[], |_: &[Option<String>], _: &mut dyn Write| 0)
            .unwrap();
        let failures = install(&mut shell, Rc::new(Recorder::default()));
        assert_eq!(failures, vec![RegistrationError::DuplicateName("pwd".into())]);
        assert!(shell.registry().lookup("ls").is_some());
    }

    #[test]
    fn ping_uses_configured_count_and_size() {
        let recorder = Rc::new(Recorder::default());
        let config = Config {
            ping_count: 2,
            ping_packet_size: 32,
            ..Config::default()
        };
        let mut shell = Shell::new(config);
        install(&mut shell, recorder.clone());

        let outcome = shell.execute("ping 8.8.8.8", &mut std::io::sink());
        assert_eq!(outcome, crate::Outcome::Executed(0));
        assert_eq!(
            recorder.calls.borrow()[0],
            (
                "ping".to_string(),
                vec!["-c", "2", "-s", "32", "8.8.8.8"]
                    .into_iter()
                    .map(String::from)
                    .collect::<Vec<_>>()
            )
        );
    }

    #[test]
    fn exit_requests_termination() {
        let mut shell = Shell::new(Config::default());
        install(&mut shell, Rc::new(Recorder::default()));
        assert!(!shell.terminate_handle().is_requested());
        shell.execute("exit", &mut std::io::sink());
        assert!(shell.terminate_handle().is_requested());
    }

    #[test]
    fn pwd_prints_current_directory() {
        let mut out: Vec<u8> = Vec::new();
        assert_eq!(Pwd.execute(&[], &mut out), 0);
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Current directory is "));
    }

    #[test]
    fn user_values_are_never_read_as_options() {
        let recorder = Rc::new(Recorder::default());
        let mut shell = Shell::new(Config::default());
        install(&mut shell, recorder.clone());

        let outcome = shell.execute("grep -r Cargo.toml", &mut std::io::sink());
        assert_eq!(outcome, crate::Outcome::Executed(0));
        assert_eq!(
            recorder.calls.borrow()[0],
            ("grep".to_string(), vec!["--".to_string(), "-r".into(), "Cargo.toml".into()])
        );

        let mut out: Vec<u8> = Vec::new();
        let outcome = shell.execute("ping -f", &mut out);
        assert_eq!(outcome, crate::Outcome::Executed(2));
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "ping: -f: arguments may not start with '-'\n"
        );
        assert_eq!(recorder.calls.borrow().len(), 1);
    }

    /// A writer whose every write fails.
    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    #[test]
    fn write_failures_become_a_status() {
        assert_eq!(Pwd.execute(&[], &mut Broken), OUTPUT_FAILED);

        let recorder = Rc::new(Recorder::default());
        let ls = External::new("ls", &[], recorder.clone());
        assert_eq!(ls.execute(&[None], &mut Broken), OUTPUT_FAILED);
        assert!(recorder.calls.borrow().is_empty());
    }
}
