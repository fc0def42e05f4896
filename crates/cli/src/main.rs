//! Teaching VM kernel CLI.
//!
//! This binary provides a single entry point for running programs. It performs:
//! 1. **Run:** Load one or more JSON programs as processes and tick until they all exit.
//! 2. **Disassemble:** Print a numbered listing of a JSON program.
//!
//! Terminal output of the simulated processes goes to stdout; kernel logs go
//! to stderr and are filtered with `RUST_LOG`.

use std::{fs, process};

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tvm_core::config::Config;
use tvm_core::core::Cpu;
use tvm_core::isa::disasm;
use tvm_core::sim::Program;

#[derive(Parser, Debug)]
#[command(
    name = "tvm",
    author,
    version,
    about = "Tick-driven teaching VM kernel",
    long_about = "Run JSON programs as processes on a paged, priority-scheduled teaching kernel.\n\nExamples:\n  tvm run programs/count.json\n  tvm run producer.json consumer.json --input 7 --stats\n  tvm disasm programs/count.json"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load programs as processes and run until they all exit.
    Run {
        /// Program files (JSON), loaded in order.
        #[arg(required = true)]
        programs: Vec<String>,

        /// Machine configuration (JSON); defaults are used when omitted.
        #[arg(short, long)]
        config: Option<String>,

        /// Value queued on the terminal input; may be repeated.
        #[arg(short, long)]
        input: Vec<u32>,

        /// Stop after this many ticks.
        #[arg(long, default_value_t = 1_000_000)]
        max_ticks: u64,

        /// Log every executed instruction.
        #[arg(long)]
        trace: bool,

        /// Print statistics when the run ends.
        #[arg(long)]
        stats: bool,
    },

    /// Print a numbered listing of a program.
    Disasm {
        /// Program file (JSON).
        program: String,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            programs,
            config,
            input,
            max_ticks,
            trace,
            stats,
        } => {
            init_logging(trace);
            cmd_run(&programs, config.as_deref(), &input, max_ticks, trace, stats);
        }
        Commands::Disasm { program } => {
            init_logging(false);
            print!("{}", disasm::disassemble(&read_program(&program).instructions));
        }
    }
}

/// Installs the stderr subscriber; `--trace` lowers the default level to `trace`.
fn init_logging(trace: bool) {
    let default = if trace { "trace" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Boots the kernel, loads every program and ticks until all have exited.
///
/// On a fatal fault, dumps the current process and exits with code 1.
fn cmd_run(
    programs: &[String],
    config_path: Option<&str>,
    input: &[u32],
    max_ticks: u64,
    trace: bool,
    stats: bool,
) {
    let mut config = match config_path {
        Some(path) => {
            let text = read_file(path);
            Config::from_json(&text).unwrap_or_else(|e| fatal(&format!("bad config '{path}': {e}")))
        }
        None => Config::default(),
    };
    config.general.trace_instructions |= trace;

    let mut cpu = Cpu::new(&config).unwrap_or_else(|e| fatal(&format!("boot failed: {e}")));
    cpu.set_output_sink(Box::new(|pid, value| println!("[pid {pid}] {value}")));
    for &value in input {
        cpu.push_input(value);
    }

    let mut pids = Vec::with_capacity(programs.len());
    for path in programs {
        let program = read_program(path);
        let pid = cpu
            .load(&program)
            .unwrap_or_else(|e| fatal(&format!("could not load '{path}': {e}")));
        info!(pid, path = %path, "loaded");
        pids.push((pid, path));
    }

    let result = cpu.run(max_ticks);
    if let Err(e) = result {
        eprintln!("\n[!] FATAL: {e}");
        cpu.dump_state();
        if stats {
            cpu.stats().print();
        }
        process::exit(1);
    }

    if !cpu.is_finished() {
        eprintln!("[!] stopped after {max_ticks} ticks with live processes");
    }
    for (pid, path) in &pids {
        match cpu.process(*pid).and_then(|p| p.exit_code) {
            Some(code) => println!("[*] pid {pid} ({path}) exit code {code}"),
            None => println!("[*] pid {pid} ({path}) no exit code"),
        }
    }
    if stats {
        cpu.stats().print();
    }
}

fn read_program(path: &str) -> Program {
    Program::from_json(&read_file(path))
        .unwrap_or_else(|e| fatal(&format!("could not parse '{path}': {e}")))
}

fn read_file(path: &str) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| fatal(&format!("could not read file '{path}': {e}")))
}

fn fatal(message: &str) -> ! {
    eprintln!("\n[!] FATAL: {message}");
    process::exit(1);
}
