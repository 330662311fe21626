mod config;
mod report;
mod trace_file;

use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use vm::{LruPageReplacer, Process, SimConfig, Simulator};

use crate::{config::GeneratorConfig, report::RunLog};

#[derive(Parser)]
#[command(name = "paging-sim")]
#[command(about = "Demand paging simulator over matrix access traces")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate proc<pid>.txt trace files from a configuration file
    Generate {
        /// Configuration file with TP, NPROC and TAMS
        config: PathBuf,

        /// Directory for the generated trace files
        #[arg(long, default_value = "input")]
        out: PathBuf,
    },

    /// Run the simulation over previously generated trace files
    Simulate {
        /// Total number of physical frames
        #[arg(long)]
        frames: usize,

        /// Number of processes expected in the input directory
        #[arg(long)]
        processes: usize,

        /// Directory holding the proc<pid>.txt files
        #[arg(long, default_value = "input")]
        input: PathBuf,

        /// Directory for stats.csv and the run log
        #[arg(long, default_value = "output")]
        out: PathBuf,
    },
}

fn generate(config: PathBuf, out: PathBuf) -> Result<()> {
    let config = GeneratorConfig::from_file(&config)?;

    let processes = config
        .dimensions
        .iter()
        .enumerate()
        .map(|(pid, &(rows, cols))| Process::generate(pid, config.page_size, rows, cols))
        .collect::<Result<Vec<_>, _>>()?;

    trace_file::write_processes(&out, &processes)?;

    println!("Generated {} trace files in {}", config.processes, out.display());

    Ok(())
}

fn simulate(frames: usize, processes: usize, input: PathBuf, out: PathBuf) -> Result<()> {
    let config = SimConfig::new(frames, processes)?;

    let (mut run_log, log_path) = RunLog::create(&out)?;
    run_log.line("Start:");

    let loaded = trace_file::read_processes(&input, config.processes)?;
    config.check_processes(&loaded)?;

    info!("loaded {} processes from {}", loaded.len(), input.display());

    let mut simulator =
        Simulator::with_parts(loaded, config.total_frames, LruPageReplacer::new(), run_log)?;
    simulator.run();

    let (processes, mut run_log) = simulator.into_parts();
    run_log.line("End.");
    run_log.finish().with_context(|| format!("writing {}", log_path.display()))?;

    let stats_path = report::write_stats(&out, &processes)?;

    for process in &processes {
        println!("{}", report::summary(process));
    }

    info!("stats in {}, run log in {}", stats_path.display(), log_path.display());

    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate { config, out } => generate(config, out),
        Commands::Simulate {
            frames,
            processes,
            input,
            out,
        } => simulate(frames, processes, input, out),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
