use clap::{CommandFactory, Parser};
use colored::Colorize;
use pit::action::print_log;
use pit::cli::{Cli, Command};
use pit::{init, project, task, Config, Database, Result, Session};
use std::io::{self, Write};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

fn main() {
    let cli = Cli::parse();

    // Diagnostics go to stderr so they never mix with listings
    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("{} could not install log subscriber", "pit:".yellow());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = run(cli.command, &mut out) {
        let _ = out.flush();
        eprintln!("{} {}", "pit:".red(), e);
        std::process::exit(1);
    }
}

fn run<W: Write>(command: Command, out: &mut W) -> Result<()> {
    match command {
        Command::Init { force } => init::init_store(&init::store_path()?, force, out),
        Command::Completion { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "pit", out);
            Ok(())
        }
        Command::Project(args) => {
            let command = args.into_command()?;
            project::run(&mut open_session(None)?, command, out)
        }
        Command::Task(args) => {
            let command = args.into_command()?;
            task::run(&mut open_session(None)?, command, out)
        }
        Command::Log { limit, project } => {
            let mut session = open_session(limit)?;
            session.load()?;
            let limit = session.config().log.tail;
            print_log(session.log(), project, limit, out)?;
            Ok(())
        }
    }
}

/// A session on the discovered store, with config applied.
fn open_session(log_tail: Option<usize>) -> Result<Session> {
    let mut config = Config::load()?;
    if let Some(tail) = log_tail {
        config.log.tail = tail;
    }
    let user = config.current_user()?;
    Ok(Session::new(Database::db_path(), user).with_config(config))
}
