use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

use hostswap::{
    commands::{self, InfoDetail},
    paths::Paths,
    store::ProfileStore,
    ui::{ColorMode, Ui},
};

#[derive(Parser)]
#[command(name = "hostswap")]
#[command(about = "Hosts file switcher - keep named hosts files and swap them into place")]
#[command(version)]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// When to use colors: always, auto, never
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: ColorMode,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which hosts file is active (the default command)
    Info {
        /// `all` also prints the active entries, `sys` prints the system hosts file
        #[arg(value_enum)]
        detail: Option<InfoDetail>,
    },

    /// Add hostswap's directory to the persistent PATH
    Setenv,

    /// Flush the DNS resolver cache
    Flush,

    /// List all hosts files
    List,

    /// Swap the global hosts file alone into place
    Reset,

    /// Swap a hosts file into place
    Change {
        /// Name of the hosts file to activate
        name: String,
    },

    /// Create a new hosts file and open it in your editor
    New {
        /// Name of the hosts file to create
        name: String,

        /// Display marker (skips the interactive prompts)
        #[arg(long)]
        marker: Option<String>,

        /// Reset when the session ends (used together with --marker)
        #[arg(long)]
        auto_revert: bool,

        /// Don't open the editor after creating
        #[arg(long)]
        no_edit: bool,
    },

    /// Open a hosts file in your editor
    Edit {
        /// `global`, `temp` (the system hosts file) or a hosts file name
        target: String,
    },

    /// Permanently delete a removed hosts file
    Delete {
        /// Name of the hosts file to delete
        name: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Mark a hosts file as removed
    Remove {
        /// Name of the hosts file to remove
        name: String,
    },

    /// Restore a removed hosts file
    Restore {
        /// Name of the hosts file to restore
        name: String,
    },

    /// Rename a hosts file
    Rename {
        /// Current name
        old_name: String,

        /// New name
        new_name: String,
    },

    /// Export hosts files to a package
    Export {
        /// Package file to write
        file: PathBuf,

        /// Hosts files to include
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Import hosts files from packages
    Import {
        /// Package files to read
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn init_tracing(verbose: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(if verbose { "hostswap=debug" } else { "hostswap=warn" })
    });

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let ui = Ui::new(cli.color, cli.no_color);

    let command = cli.command.unwrap_or(Commands::Info { detail: None });

    match command {
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "hostswap", &mut std::io::stdout());
            Ok(())
        }
        Commands::Setenv => commands::setenv(&ui),
        Commands::Flush => commands::flush(&ui),
        command => {
            let paths = Paths::new()?;
            tracing::debug!(base = %paths.base_dir.display(), "opening profile store");
            let mut store = ProfileStore::open(paths)?;
            run(&mut store, &ui, command)
        }
    }
}

fn run(store: &mut ProfileStore, ui: &Ui, command: Commands) -> Result<()> {
    match command {
        Commands::Info { detail } => commands::info(store, ui, detail),
        Commands::List => commands::list(store, ui),
        Commands::Reset => commands::reset(store, ui),
        Commands::Change { name } => commands::change(store, ui, &name),
        Commands::New {
            name,
            marker,
            auto_revert,
            no_edit,
        } => commands::new(store, ui, &name, marker, auto_revert, !no_edit),
        Commands::Edit { target } => commands::edit(store, ui, &target),
        Commands::Delete { name, force } => commands::delete(store, ui, &name, force),
        Commands::Remove { name } => commands::remove(store, ui, &name),
        Commands::Restore { name } => commands::restore(store, ui, &name),
        Commands::Rename { old_name, new_name } => {
            commands::rename(store, ui, &old_name, &new_name)
        }
        Commands::Export { file, names } => commands::export(store, ui, &file, &names),
        Commands::Import { files } => commands::import(store, ui, &files),
        Commands::Setenv => commands::setenv(ui),
        Commands::Flush => commands::flush(ui),
        Commands::Completions { .. } => Ok(()),
    }
}
