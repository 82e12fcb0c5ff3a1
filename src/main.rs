use std::fs;
use std::path::PathBuf;
use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use symbolic_memory::graph::GraphFile;
use symbolic_memory::{Config, MemoryModel};

/// Binds every variable of a graph fixture and prints the resulting state.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// JSON graph: types, variables and optional gep queries.
    graph: PathBuf,
    /// JSON configuration overriding the defaults.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            Config::from_json_str(&text)?
        }
        None => Config::default(),
    };
    let text = fs::read_to_string(&args.graph)
        .with_context(|| format!("reading {}", args.graph.display()))?;
    let file: GraphFile = serde_json::from_str(&text)
        .with_context(|| format!("parsing {}", args.graph.display()))?;
    let (graph, queries) = file.into_graph()?;
    let mut model = MemoryModel::new(graph, config)?;
    for query in queries.iter() {
        let offset = model.compute_offset(&query.gep)?;
        let expr = model.gep_address(query.pointer, &query.gep)
            .with_context(|| format!("resolving gep through {:?}", query.pointer))?;
        println!("gep {:?} + {} = {}", query.pointer, offset, model.store().ctx().display(&expr));
    }
    print!("{}", model.report());
    Ok(())
}

pub fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
    if let Err(err) = run(Args::parse()) {
        eprintln!("fatal: {:#}", err);
        std::process::exit(1);
    }
}
