use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use pg_drift::{autogenerate, AutogenerateOptions, DiffConfig};

#[derive(Parser)]
#[command(name = "pg-drift")]
#[command(
    author,
    version,
    about = "Detect drift between declared and live PostgreSQL entities"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare declared entities with a database snapshot and print the migration
    Diff {
        /// File or directory of .sql files with the declared entities
        #[arg(short, long)]
        declared: PathBuf,

        /// Catalog dump of the database's current entities
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Match entities regardless of schema and render unqualified names
        #[arg(long)]
        ignore_schema: bool,

        /// Add CASCADE to drop statements
        #[arg(long)]
        drop_cascade: bool,

        /// Print statements as execute(...) literals instead of plain SQL
        #[arg(long)]
        literals: bool,

        /// Embed literals as multi-line raw blocks (with --literals)
        #[arg(long)]
        multiline: bool,

        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Diff {
            declared,
            snapshot,
            ignore_schema,
            drop_cascade,
            literals,
            multiline,
            verbose,
        } => {
            let level = if verbose { Level::DEBUG } else { Level::WARN };
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;

            let options = AutogenerateOptions {
                declared_path: declared,
                snapshot_path: snapshot,
                config: DiffConfig::new()
                    .ignore_schema(ignore_schema)
                    .drop_cascade(drop_cascade)
                    .render_definition_multiline(multiline),
            };

            let generated = autogenerate(&options)?;
            let parse_failures = generated.report.parse_failures().count();
            if parse_failures > 0 {
                eprintln!(
                    "warning: {parse_failures} routine(s) compared by verbatim text; run with --verbose for details"
                );
            }

            if generated.script.is_empty() {
                println!("-- no changes detected");
            } else if literals {
                print!("{}", generated.script.to_literals(&options.config));
            } else {
                println!("-- upgrade");
                print!("{}", generated.script.upgrade_sql());
                println!();
                println!("-- downgrade");
                print!("{}", generated.script.downgrade_sql());
            }
        }
    }

    Ok(())
}
