//! Point d'entrée CLI pour v-import

use anyhow::Result;
use clap::Parser;
use tracing::{debug, Level};
use tracing_subscriber::{fmt, EnvFilter};

use v_import::cli::{self, ImportArgs};

// Charger .env au démarrage
fn load_env() {
    // Chercher .env dans le répertoire courant ou parent
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

/// Importer une source vecteur dans une location, reprojetée si besoin
#[derive(Parser)]
#[command(name = "v-import")]
#[command(author, version)]
#[command(about = "Importer une source vecteur dans la location courante, avec reprojection à la volée")]
#[command(long_about = "Importe une source GeoJSON (fichier, répertoire ou archive .tar.bz2) dans une location.\n\nSi le CRS de la source diffère de celui de la location, l'import passe par une location temporaire puis est reprojeté.")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(flatten)]
    import: ImportArgs,
}

fn main() -> Result<()> {
    // Charger .env avant tout
    load_env();

    let cli = Cli::parse();

    // Configurer le logging
    init_logging(cli.verbose, cli.quiet);
    debug!(input = %cli.import.input, "Starting");

    cli::cmd_import(&cli.import)
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
