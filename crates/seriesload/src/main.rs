use anyhow::{Context, Result};
use diagnostics::*;
use seriesload::{LoadConfig, MemorySource, RoleSpec, ValueMode, load_series};
use std::env;
use std::path::Path;

fn main() -> Result<()> {
    init_diagnostics();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage(&args[0]);
        return Ok(());
    }

    match args[1].as_str() {
        "init" => {
            let default_config = "seriesload.yaml".to_string();
            let config_path = args.get(2).unwrap_or(&default_config);
            init_config(config_path)
        }
        "load" => load(&args[2..]),
        _ => {
            print_usage(&args[0]);
            Ok(())
        }
    }
}

fn init_config(config_path: &str) -> Result<()> {
    let path = Path::new(config_path);

    if path.exists() {
        info!("Configuration file already exists: {config_path}");
        info!("Delete it first if you want to create a new one.");
        return Ok(());
    }

    seriesload::create_example_config(path)
        .with_context(|| format!("Failed to create configuration file: {config_path}"))?;

    info!("Created example configuration file: {config_path}");
    Ok(())
}

fn load(args: &[String]) -> Result<()> {
    let mut mode = ValueMode::Typed;
    let mut query = "".to_string();
    let mut config = LoadConfig::default();
    let mut positional = Vec::new();

    let mut args = args.iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--textual" => mode = ValueMode::Textual,
            "--query" => {
                query = args
                    .next()
                    .context("--query requires an argument")?
                    .clone();
            }
            "--config" => {
                let config_path = args.next().context("--config requires an argument")?;
                config = seriesload::load_config(config_path)
                    .with_context(|| format!("Failed to load configuration from: {config_path}"))?;
            }
            other => positional.push(other.to_string()),
        }
    }

    let [table_path, spec_path] = positional.as_slice() else {
        anyhow::bail!("load requires a table file and a role spec file");
    };

    debug!("reading table file: {table_path}");
    let table_json: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(table_path)
            .with_context(|| format!("Failed to read table file: {table_path}"))?,
    )
    .with_context(|| format!("Failed to parse table file: {table_path}"))?;
    let mut source = MemorySource::from_json(&table_json, mode)?;

    debug!("reading role spec file: {spec_path}");
    let spec: RoleSpec = serde_json::from_str(
        &std::fs::read_to_string(spec_path)
            .with_context(|| format!("Failed to read role spec file: {spec_path}"))?,
    )
    .with_context(|| format!("Failed to parse role spec file: {spec_path}"))?;

    let series = load_series(&mut source, &query, &spec, &config)
        .context("Materialization failed")?;

    for one in &series {
        println!("{}", serde_json::to_string(one)?);
    }

    Ok(())
}

fn print_usage(program_name: &str) {
    println!("seriesload - materialize tabular query results into series");
    println!();
    println!("USAGE:");
    println!("    {program_name} init [config-file]");
    println!("        Create an example configuration file");
    println!();
    println!("    {program_name} load <table.json> <rolespec.json> [options]");
    println!("        Materialize a JSON table using a role specification");
    println!();
    println!("OPTIONS:");
    println!("    --config <file>    YAML configuration (default time column, tick units)");
    println!("    --textual          Treat string cells as textual payloads to re-type");
    println!("    --query <text>     Query text handed to the source (informational");
    println!("                       for in-memory tables)");
    println!();
    println!("The table file holds {{\"schema\": [...], \"rows\": [[...], ...]}} or an");
    println!("array of such tables; series are printed to stdout as JSON lines.");
}
