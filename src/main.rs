mod config;
mod data;
mod input;
mod occupancy;
mod render;
mod server;
mod solver;

use clap::{Parser, Subcommand};
use config::Config;
use std::io::{self, Write};

#[derive(Parser, Debug)]
#[command(
    name = "timetable_gen",
    about = "Weekly timetables for two sections sharing a teacher pool",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    /// Seed for the interactive run (overrides TIMETABLE_SEED)
    #[arg(long)]
    seed: Option<u64>,

    #[command(subcommand)]
    cmd: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Serve the JSON API
    Serve {
        /// Address to listen on (overrides TIMETABLE_BIND)
        #[arg(long)]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(2);
        }
    };

    let result = match cli.cmd {
        Some(Commands::Serve { bind }) => {
            let config = config.with_overrides(bind, None);
            server::run_server(&config.bind_addr)
                .await
                .map_err(|e| e.to_string())
        }
        None => run_interactive(&config.with_overrides(None, cli.seed)),
    };

    if let Err(e) = result {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run_interactive(config: &Config) -> Result<(), String> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    let (section_a, section_b) = input::read_sections(&mut input, &mut output)?;
    let run = solver::run_sections(&section_a, &section_b, config.seed)?;

    write!(
        output,
        "{}{}",
        render::render_timetable("Section-A", &run.section_a),
        render::render_timetable("Section-B", &run.section_b)
    )
    .map_err(|e| e.to_string())?;
    writeln!(output, "\nSeed: {}", run.seed).map_err(|e| e.to_string())
}
