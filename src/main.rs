use std::io;
use std::rc::Rc;

use gatesh::builtins::{self, SystemLauncher};
use gatesh::editor::TermEditor;
use gatesh::{Config, Shell};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Silent unless RUST_LOG is set (e.g. RUST_LOG=gatesh=debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    println!("\ngatesh v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env();
    let mut editor = TermEditor::new(config.history_limit);
    let mut shell = Shell::new(config);
    for err in builtins::install(&mut shell, Rc::new(SystemLauncher)) {
        eprintln!("{err}");
    }

    shell.run(&mut editor, &mut io::stdout())
}
