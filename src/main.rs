use anyhow::{Context, Result};
use clap::Parser;
use class_discovery::cli::{Cli, Commands, OutputFormat};
use class_discovery::config::{build_finder, load_state, resolve_source};
use class_discovery::{JavaReflector, TypeDescriptor};
use serde::Serialize;
use std::time::Instant;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let source = resolve_source(&cli)?;
    let state = load_state(&source)?;

    match cli.command {
        Commands::List { filters, format } => {
            let reflector = JavaReflector::new(state.clone());
            let finder = build_finder(&source, &state, &filters, reflector)?;

            let start = Instant::now();
            let classes: Vec<TypeDescriptor> = finder.iter().map(|(_, d)| d).collect();
            let result = ListResult {
                count: classes.len(),
                duration_ms: start.elapsed().as_millis() as u64,
                classes,
            };
            write_list_output(&result, format)?;
        }
        Commands::Locate { class_name } => {
            let file = state
                .find_file(class_name.trim())
                .with_context(|| format!("Class not found: {class_name}"))?;
            println!("{}", file.display());
        }
    }

    Ok(())
}

#[derive(Debug, Serialize)]
struct ListResult {
    count: usize,
    duration_ms: u64,
    classes: Vec<TypeDescriptor>,
}

fn write_list_output(result: &ListResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(result)?),
        OutputFormat::Text => {
            for class in &result.classes {
                let file = class
                    .file
                    .as_deref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                println!("{}\t{}", class.name, file);
            }
            eprintln!(
                "[class-discovery] {} classes in {} ms",
                result.count, result.duration_ms
            );
        }
    }
    Ok(())
}
