use anyhow::Result;
use clap::{Parser, Subcommand};
use farmsort::config::{parse_size, Config};
use farmsort::error::SortError;
use farmsort::record::check_sorted;
use farmsort::{distributed, generator, sorter};
use log::info;

#[derive(Parser, Debug)]
#[command(name = "farmsort", version, about = "A hybrid shared-memory and distributed parallel merge-sort engine.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sort a generated array with one node's worker farm.
    Local(RunArgs),
    /// Sort a generated array across a simulated group of ranks.
    Distributed(DistributedArgs),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Number of records to generate. Accepts a `K` or `M` suffix.
    #[arg(long, default_value = "10240", value_parser = parse_size)]
    array_size: usize,
    /// Bytes per record's payload.
    #[arg(long, default_value_t = 1024)]
    payload_size: usize,
    /// Leaf Sort range length; 0 derives it from array size and worker count.
    #[arg(long, default_value_t = 0)]
    base_case_size: usize,
    /// Per-node worker thread count.
    #[arg(long, default_value_t = num_cpus::get())]
    worker_threads: usize,
}

impl RunArgs {
    fn into_config(self) -> Config {
        Config {
            array_size: self.array_size,
            payload_size: self.payload_size,
            base_case_size: self.base_case_size,
            worker_threads: self.worker_threads,
        }
    }
}

#[derive(Parser, Debug)]
struct DistributedArgs {
    #[command(flatten)]
    run: RunArgs,
    /// Number of simulated participants.
    #[arg(long, default_value_t = 1)]
    ranks: usize,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        let code = err
            .downcast_ref::<SortError>()
            .map(SortError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}

fn run() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let start = std::time::Instant::now();

    let sorted = match cli.command {
        Commands::Local(args) => {
            let config = args.into_config();
            let mut records = generator::generate(config.array_size, config.payload_size);
            sorter::sort(&mut records, config.effective_worker_threads(), config.effective_base_case_size())?;
            records
        }
        Commands::Distributed(args) => {
            let ranks = args.ranks;
            let config = args.run.into_config();
            let records = generator::generate(config.array_size, config.payload_size);
            distributed::run(
                records,
                ranks,
                config.effective_worker_threads(),
                config.effective_base_case_size(),
            )?
        }
    };

    let elapsed = start.elapsed();
    if !check_sorted(&sorted) {
        return Err(SortError::PostCondition("output is not sorted by key".to_string()).into());
    }

    info!("sorted {} records in {:.3}s", sorted.len(), elapsed.as_secs_f64());
    println!("sorted");
    Ok(())
}
