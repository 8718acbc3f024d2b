//! ArcDB catalog daemon: loads one database's stored objects and reports them

use anyhow::{bail, Context as _, Result};
use arcdb_catalog::{CatalogConfig, Context, OrdinaryDatabase};
use std::env;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_DATABASE: &str = "default";

struct Args {
    config: CatalogConfig,
    database: String,
}

fn print_usage() {
    println!(
        r#"Usage: catalogd [options]

Options:
  --config <file>      JSON configuration file
  --metadata <dir>     Metadata root (overrides the config file)
  --data <dir>         Data root (overrides the config file)
  --threads <n>        Worker threads for table attach and startup
  --database <name>    Database to load (default: {})
  --help               Show this message"#,
        DEFAULT_DATABASE
    );
}

fn parse_args() -> Result<Option<Args>> {
    let args: Vec<String> = env::args().skip(1).collect();
    let mut config = CatalogConfig::new();
    let mut database = DEFAULT_DATABASE.to_string();

    // The config file is applied first so that flags override it
    if let Some(i) = args.iter().position(|a| a == "--config") {
        let path = args.get(i + 1).context("--config needs a file")?;
        config = CatalogConfig::from_json_file(path)
            .with_context(|| format!("cannot load config {}", path))?;
    }

    let mut i = 0;
    while i < args.len() {
        let value = args.get(i + 1);
        match args[i].as_str() {
            "--help" | "-h" => return Ok(None),
            "--config" => {}
            "--metadata" => config = config.metadata_root(value.context("--metadata needs a directory")?),
            "--data" => config = config.data_root(value.context("--data needs a directory")?),
            "--threads" => {
                let threads = value
                    .context("--threads needs a number")?
                    .parse()
                    .context("--threads needs a number")?;
                config = config.max_threads(threads);
            }
            "--database" => database = value.context("--database needs a name")?.clone(),
            other => bail!("unknown option {}", other),
        }
        i += 2;
    }

    Ok(Some(Args { config, database }))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let Some(args) = parse_args()? else {
        print_usage();
        return Ok(());
    };

    info!(
        database = %args.database,
        metadata_root = %args.config.metadata_root.display(),
        threads = args.config.max_threads,
        "starting ArcDB catalog"
    );

    let database = OrdinaryDatabase::new(&args.database, &args.config)?;
    let context = Context::new(args.config);

    match database.load_stored_objects(&context) {
        Ok(summary) => {
            println!(
                "Loaded {} table(s) and {} dictionary(ies) into '{}'",
                summary.tables,
                summary.dictionaries,
                database.name()
            );
            for table in database.table_names() {
                println!("  table       {}", table);
            }
            for dictionary in database.dictionary_names() {
                println!("  dictionary  {}", dictionary);
            }
            Ok(())
        }
        Err(e) => {
            error!(database = %args.database, error = %e, "load failed");
            Err(e.into())
        }
    }
}
