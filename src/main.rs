use anyhow::Result;
use cadence::{
    Catalog, Config, Database, Library, Session, console,
    engine::RodioEngine,
    logging::init_logging,
    session::SessionSettings,
};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cadence", version, about)]
struct Args {
    /// Config file (defaults to the platform config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Add a music folder to the library (repeatable, remembered)
    #[arg(long = "root", value_name = "DIR")]
    roots: Vec<PathBuf>,

    /// Forget a previously added music folder
    #[arg(long = "remove-root", value_name = "DIR")]
    remove_roots: Vec<String>,

    /// Start from the stored catalog without walking the roots
    #[arg(long)]
    no_scan: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;

    let _guard = init_logging(&config.log_directory()?, config.logging.filter.as_deref())?;

    let mut library = Library::init(Database::open(config.database_path()?)?);
    for root in config.roots()?.iter().chain(args.roots.iter()) {
        if let Err(e) = library.add_root(root) {
            tracing::warn!(root = %root.display(), error = %e, "Skipping music folder");
            eprintln!("skipping {}: {e}", root.display());
        }
    }
    for root in &args.remove_roots {
        if let Err(e) = library.delete_root(root) {
            eprintln!("could not remove {root}: {e}");
        }
    }

    let scan = config.library.scan_on_start && !args.no_scan;
    let catalog = Catalog::spawn(library, scan);
    let session = Session::start(Box::new(catalog), SessionSettings::from(&config))?;

    match RodioEngine::connect() {
        Ok((engine, events)) => session.connect(Box::new(engine), events)?,
        Err(e) => {
            tracing::error!(error = %e, "Running without audio output");
            eprintln!("audio unavailable ({e}), playback commands will be ignored");
        }
    }

    console::run(&session)?;
    session.stop();

    Ok(())
}
