// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use wasm_bakeoff::config::load_and_validate_config;
use wasm_bakeoff::report::stats::{mean, median};
use wasm_bakeoff::report::{MeasurementResult, ProbeKind};
use wasm_bakeoff::runner::BenchmarkRunner;

const USAGE: &str = "<registry.yaml|registry.toml> [--output <dir>] [--only <name>]...";

struct CliArgs {
    registry: PathBuf,
    output: Option<PathBuf>,
    only: Vec<String>,
}

fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let mut registry = None;
    let mut output = None;
    let mut only = Vec::new();

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--output" => {
                let dir = iter.next().ok_or("--output needs a directory")?;
                output = Some(PathBuf::from(dir));
            }
            "--only" => {
                let name = iter.next().ok_or("--only needs a target name")?;
                only.push(name.clone());
            }
            flag if flag.starts_with("--") => return Err(format!("unknown option {}", flag)),
            path if registry.is_none() => registry = Some(PathBuf::from(path)),
            extra => return Err(format!("unexpected argument {}", extra)),
        }
    }

    Ok(CliArgs {
        registry: registry.ok_or("missing registry file")?,
        output,
        only,
    })
}

fn ms(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{:.3}", v))
}

fn mb(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{:.2}", v))
}

fn print_target(result: &MeasurementResult) {
    println!("\n📦 {} ({}, {})", result.target, result.contract, result.stage);
    println!(
        "   Size: {:.2} KB ({:.2} KB gzipped, {:.1}% smaller)",
        result.size.raw_bytes as f64 / 1024.0,
        result.size.gzipped_bytes as f64 / 1024.0,
        result.size.compression_percent
    );
    println!(
        "   Cold start: {} ms avg, {} ms median",
        ms(mean(&result.cold_start_ms)),
        ms(median(&result.cold_start_ms))
    );

    if result.is_unsupported(ProbeKind::Execution) {
        println!("   Execution: N/A");
    }
    for (class, samples) in &result.execution_ms {
        let throughput = result
            .throughput_mb_s
            .get(class)
            .map_or_else(|| "N/A".to_string(), |t| format!("{:.2} MB/s", t));
        println!("   {}: {} ms avg, {}", class.title(), ms(mean(samples)), throughput);
    }

    println!(
        "   Memory: {} → {} → {} MB",
        mb(result.memory.baseline_mb),
        mb(result.memory.loaded_mb),
        mb(result.memory.peak_mb)
    );
    if result.has_errors() {
        println!("   ⚠️  Errors: {}", result.errors.len());
        for error in &result.errors {
            println!("      - {}", error);
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("wasm-bakeoff");
    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("❌ {}", e);
            eprintln!("Usage: {} {}", program, USAGE);
            eprintln!("Example: {} configs/bakeoff.yaml --only rust --only tinygo", program);
            return ExitCode::FAILURE;
        }
    };

    let registry = match load_and_validate_config(&cli.registry) {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("❌ Failed to load {}: {}", cli.registry.display(), e);
            return ExitCode::FAILURE;
        }
    };
    let targets = match registry.select(&cli.only) {
        Ok(targets) => targets,
        Err(e) => {
            eprintln!("❌ {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut runner = BenchmarkRunner::new(&registry);
    if let Some(output) = cli.output {
        runner = runner.with_output_dir(output);
    }

    println!("🚀 WebAssembly Bake-off");
    println!("{}", "═".repeat(80));
    println!("Registry: {}", cli.registry.display());
    println!("Targets: {}", targets.len());

    let results = runner.run(&targets).await;

    println!("\n📊 Results");
    println!("{}", "═".repeat(80));
    for result in &results {
        print_target(result);
    }

    println!("\n✅ Benchmark complete! Results saved to {}", runner.writer().output_dir().display());
    ExitCode::SUCCESS
}
