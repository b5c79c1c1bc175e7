use clap::Parser;
use dotenv::dotenv;
use env_logger::Env;
use std::path::PathBuf;

use publications_site::bibtex::import::import_bibtex;
use publications_site::db::schema::init_db;

/// Imports a BibTeX file into the publications database.
#[derive(Parser)]
#[command(name = "import_bibtex", version)]
struct Args {
    /// BibTeX file to import
    input: PathBuf,

    /// Database file; overrides DATABASE_PATH
    #[arg(long)]
    database: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    if let Some(database) = &args.database {
        std::env::set_var("DATABASE_PATH", database);
    }

    // Lossy decoding keeps entries with stray non-UTF-8 bytes importable.
    let bytes = std::fs::read(&args.input)?;
    let bibliography = String::from_utf8_lossy(&bytes);

    let mut conn = init_db()?;
    let tx = conn.transaction()?;
    let (imported, errors) = import_bibtex(&tx, &bibliography)?;
    tx.commit()?;

    println!("Imported {} publication(s)", imported.len());
    for publication in &imported {
        println!("  [{}] {}", publication.id_string(), publication.title);
    }
    if !errors.is_empty() {
        eprintln!("{} error(s):", errors.len());
        for error in &errors {
            eprintln!("  {}", error);
        }
        std::process::exit(1);
    }

    Ok(())
}
