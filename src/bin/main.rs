use std::path::{
    Path,
    PathBuf,
};
use std::process::ExitCode;

use clap::{
    Args,
    Parser,
    Subcommand,
};
use esp_partition_planner::{
    parse_number,
    BuildOptions,
    Error,
    PartitionTable,
    DEFAULT_TABLE_TITLE,
};
use log::{
    info,
    warn,
};

#[derive(Parser)]
#[command(name = "esp-partition-planner")]
#[command(version, about = "ESP-IDF flash partition table planner", long_about = None)]
struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan the flash layout and write the partition table CSV
    Generate(GenerateArgs),
    /// Validate an existing partition table CSV
    Check {
        /// Input CSV file path
        input: PathBuf,

        /// Flash size in bytes (decimal, 0x hex, K or M suffix); enables the end-of-flash check
        #[arg(long, value_parser = parse_number)]
        flash_size: Option<u32>,
    },
}

#[derive(Args)]
struct GenerateArgs {
    /// Flash size in bytes (decimal, 0x hex, K or M suffix)
    #[arg(long, value_parser = parse_number)]
    flash_size: Option<u32>,

    /// Partition table offset (hex)
    #[arg(long, value_parser = parse_hex)]
    table_offset: Option<u32>,

    /// Size of the NVS partition in bytes
    #[arg(long, value_parser = parse_number)]
    nvs_size: Option<u32>,

    /// Size of the storage partition in bytes
    #[arg(long, value_parser = parse_number)]
    storage_size: Option<u32>,

    /// Reserve a storage partition
    #[arg(long)]
    storage: bool,

    /// Use SPIFFS for the storage partition
    #[arg(long)]
    spiffs: bool,

    /// Use LittleFS for the storage partition
    #[arg(long)]
    lfs: bool,

    /// Add an otadata partition and two OTA app slots
    #[arg(long)]
    ota: bool,

    /// Keep a factory app slot next to the OTA slots
    #[arg(long)]
    ota_factory: bool,

    /// Store PHY calibration data in its own partition
    #[arg(long)]
    phy_init_in_partition: bool,

    /// Title written into the first line of the table
    #[arg(long, default_value = DEFAULT_TABLE_TITLE)]
    title: String,

    /// Output CSV file path
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl GenerateArgs {
    fn build_options(&self) -> BuildOptions {
        BuildOptions {
            flash_size: self.flash_size,
            table_offset: self.table_offset,
            nvs_size: self.nvs_size,
            storage_size: self.storage_size,
            storage: self.storage,
            spiffs: self.spiffs,
            lfs: self.lfs,
            ota: self.ota,
            ota_factory: self.ota_factory,
            phy_init: self.phy_init_in_partition,
            output: self.output.clone(),
        }
    }
}

fn parse_hex(s: &str) -> Result<u32, String> {
    let hex = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u32::from_str_radix(hex, 16).map_err(|e| e.to_string())
}

fn generate(args: &GenerateArgs) -> Result<(), Error> {
    let config = args.build_options().resolve()?;
    let plan = esp_partition_planner::plan(&config)?;

    if let Err(e) = plan.write_report(&mut std::io::stderr()) {
        warn!("Failed to print layout report: {}", e);
    }

    plan.to_csv_file(config.output(), &args.title)?;
    info!(
        "Generated partition table: {} ({} app partition(s) of {} bytes)",
        config.output().display(),
        plan.app_count,
        plan.app_size
    );
    Ok(())
}

fn check(input: &Path, flash_size: Option<u32>) -> Result<(), Error> {
    info!("Parsing partition table: {}", input.display());
    let table = PartitionTable::from_csv_file(input)?;

    if let Err(e) = table.write_report(&mut std::io::stderr()) {
        warn!("Failed to print layout report: {}", e);
    }

    table.check(flash_size)?;
    info!("{} partitions, layout is valid", table.entries.len());
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG takes precedence over -v
    let default_filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let result = match &cli.command {
        Commands::Generate(args) => generate(args),
        Commands::Check { input, flash_size } => check(input, *flash_size),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
