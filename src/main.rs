use anyhow::Context;
use clap::Parser;
use pmmlx::{CompiledModel, Pmml, ScriptEngine, ScriptParams};
use rayon::prelude::*;
use serde_json::{json, Value};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Score JSON documents against a compiled predictive model
#[derive(Parser, Debug)]
#[command(name = "pmmlx")]
#[command(about = "Compile a model spec and score documents with it", long_about = None)]
struct Args {
    /// Path to the JSON model-spec document
    #[arg(short, long)]
    model: PathBuf,

    /// JSON-lines input, one document (or vector payload) per line
    #[arg(short, long)]
    input: PathBuf,

    /// Compile this model of a multi-model document
    #[arg(long)]
    model_index: Option<usize>,

    /// Inputs are pre-computed `{"indices", "values"}` vectors
    #[arg(long, default_value_t = false)]
    precomputed: bool,

    /// Print the debug record instead of the label
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// Scoring threads (0 = one per core)
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn compile(engine: &ScriptEngine, pmml: &Pmml, args: &Args) -> pmmlx::Result<CompiledModel> {
    match (args.precomputed, args.model_index) {
        (true, index) => engine.compile_precomputed(pmml, index.unwrap_or(0)),
        (false, Some(index)) => engine.compile_model(pmml, index),
        (false, None) => engine.compile(pmml),
    }
}

fn score_line(model: &CompiledModel, line: &str, params: &ScriptParams) -> Value {
    let result = serde_json::from_str::<Value>(line)
        .map_err(pmmlx::Error::from)
        .and_then(|document| model.run(&document, params));
    match result {
        Ok(output) => json!(output),
        Err(e) => json!({ "error": e.to_string() }),
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting pmmlx v{}", env!("CARGO_PKG_VERSION"));
    info!("Model: {:?}", args.model);
    info!("Input: {:?}", args.input);

    let file = File::open(&args.model)
        .with_context(|| format!("cannot open model {:?}", args.model))?;
    let pmml = Pmml::from_reader(BufReader::new(file))?;
    let engine = ScriptEngine::new();
    let model = compile(&engine, &pmml, &args)?;
    info!(
        kind = model.model().kind(),
        size = ?model.vector_size(),
        "Model compiled"
    );

    let input = File::open(&args.input)
        .with_context(|| format!("cannot open input {:?}", args.input))?;
    let lines: Vec<String> = BufReader::new(input)
        .lines()
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .filter(|line| !line.trim().is_empty())
        .collect();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads)
        .build()?;
    info!("Scoring {} documents on {} threads", lines.len(), pool.current_num_threads());

    let params = ScriptParams { debug: args.debug };
    let started = Instant::now();
    let results: Vec<Value> = pool.install(|| {
        lines
            .par_iter()
            .map(|line| score_line(&model, line, &params))
            .collect()
    });

    let failures = results.iter().filter(|r| r.get("error").is_some()).count();
    if failures > 0 {
        warn!("{} of {} documents failed to score", failures, results.len());
    }

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for result in &results {
        serde_json::to_writer(&mut out, result)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;

    info!("Scored {} documents in {:?}", results.len(), started.elapsed());
    Ok(())
}
