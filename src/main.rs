use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use products_mongo::config::{Command, Config, OutputFormat};
use products_mongo::prelude::*;

fn printer(format: OutputFormat) -> Box<dyn ProductPrinter> {
    match format {
        OutputFormat::Plain => Box::new(ConsolePrinter::stdout()),
        OutputFormat::Table => Box::new(TablePrinter::stdout()),
    }
}

fn import(config: &Config, store: &MongoStore) -> anyhow::Result<ImportReport> {
    let mut source = MySqlSource::connect(config.source_url()?, config.source_schema.as_str())
        .context("connecting to mysql")?;
    let report = import_products(&mut source, store, config.import_mode())?;
    info!(
        mobiles = report.mobiles,
        headphones = report.headphones,
        cameras = report.cameras,
        inserted = report.inserted,
        "products imported"
    );
    Ok(report)
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let config = Config::parse();
    info!(
        database = %config.database,
        collection = %config.collection,
        schema = %config.source_schema,
        "products-mongo starting"
    );

    let store = MongoStore::connect(&config.mongo_uri, &config.database, &config.collection)
        .context("connecting to mongodb")?;
    let mut out = printer(config.format);

    match &config.command {
        Command::Import => {
            import(&config, &store)?;
        }
        Command::Query { name } => name.run(&store, out.as_mut())?,
        Command::Run => {
            import(&config, &store)?;
            run_all(&store, out.as_mut())?;
        }
    }
    Ok(())
}
