use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::{error, info, LevelFilter};

use flowreg::db::descriptor::list_descriptors;
use flowreg::db::open::{begin_dry_run, open_db, release_or_rollback};
use flowreg::db::process::list_processes;
use flowreg::db::user::create_user;
use flowreg::register::{register, RegisterError, RegisterOptions};
use flowreg::settings::Settings;

#[derive(Parser)]
#[command(name = "flowreg")]
#[command(about = "Register process and descriptor schemas", long_about = None)]
struct Cli {
    /// Directory holding the database and, optionally, flowreg.yml
    #[arg(short, long, default_value = ".")]
    work_dir: PathBuf,

    /// Settings file, instead of flowreg.yml in the working directory
    #[arg(long)]
    settings: Option<PathBuf>,

    /// 0 = warnings only, 1 = normal, 2 = debug, 3 = trace
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=3))]
    verbosity: u8,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register processes and descriptor schemas
    Register {
        /// Process names to register
        #[arg(short, long, num_args = 0..)]
        schemas: Option<Vec<String>>,

        /// Register also if the same version is installed
        #[arg(short, long)]
        force: bool,

        /// Search paths for processes and descriptors
        #[arg(long, num_args = 0..)]
        path: Vec<PathBuf>,

        /// Roll back all changes once registration finishes
        #[arg(long)]
        dry_run: bool,
    },
    /// Create a superuser, or promote an existing user
    CreateSuperuser {
        #[arg(long)]
        username: String,
    },
    /// List registered processes and descriptor schemas
    List,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbosity);
    info!("flowreg {} starting up", env!("CARGO_PKG_VERSION"));

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<RegisterError>() {
                Some(RegisterError::NoAdmin) => eprintln!("{err}"),
                None => error!("{err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

/// RUST_LOG wins over --verbosity when it's set
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let conn = open_db(&cli.work_dir)
        .with_context(|| format!("Can't open database in {}", cli.work_dir.display()))?;

    match cli.cmd {
        Commands::Register { schemas, force, path, dry_run } => {
            let settings = Settings::load(cli.settings.as_deref(), &cli.work_dir)?;
            let options = RegisterOptions { schemas, force, paths: path };

            begin_dry_run(&conn)?;
            let result = register(&conn, &settings, &options);
            // definitions registered before a failure are kept unless this is a dry run
            release_or_rollback(&conn, dry_run)?;

            let summary = result?;
            if cli.verbosity > 0 && !summary.report().is_empty() {
                println!("{}", summary.report());
            }
        }
        Commands::CreateSuperuser { username } => {
            let user = create_user(&conn, &username, true)?;
            println!("Superuser {} (id {}) ready", user.username, user.id);
        }
        Commands::List => {
            for process in list_processes(&conn)? {
                println!("process     {} {} {} [{}]", process.slug, process.version, process.name, process.process_type);
            }
            for descriptor in list_descriptors(&conn)? {
                println!("descriptor  {} {} {}", descriptor.slug, descriptor.version, descriptor.name);
            }
        }
    }

    Ok(())
}
