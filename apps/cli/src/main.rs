use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use cvt_batch_system::{BatchController, OutputContext};
use cvt_transforms::{collect_work_items, ExternalConverter, TargetFormat, SUPPORTED_EXTENSIONS};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod config;
mod controls;
mod ui;

use config::AppConfig;
use ui::ProgressBarSink;

/// Exit status for a batch that was cancelled or had failed items
const EXIT_PARTIAL: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "cvt", version, about = "Batch converter for DWG and DXF drawings")]
struct Cli {
	/// Path to the config file
	#[arg(long, global = true)]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Convert a drawing, or every drawing below a directory
	Convert(ConvertArgs),
	/// List the output formats
	Formats,
	/// Write a default config file
	InitConfig {
		/// Overwrite an existing config
		#[arg(long, default_value_t = false)]
		force: bool,
	},
}

#[derive(Parser, Debug, Clone)]
struct ConvertArgs {
	/// Drawing file or directory to convert
	pub input: PathBuf,

	/// Output directory, the input tree is mirrored below it
	#[arg(short, long)]
	pub output: PathBuf,

	/// Output format code, e.g. ACAD2018 or DXF2007
	#[arg(short, long)]
	pub format: Option<TargetFormat>,

	/// Converter executable
	#[arg(long, env = "CVT_CONVERTER")]
	pub converter: Option<PathBuf>,

	/// Do not audit drawings while converting
	#[arg(long, default_value_t = false)]
	pub no_audit: bool,

	/// Ignore stdin, only Ctrl-C can cancel
	#[arg(long, default_value_t = false)]
	pub no_input: bool,
}

fn init_logging(level: &str) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

	if let Err(e) = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.try_init()
	{
		eprintln!("Failed to initialize logging: {e}");
	}
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
	let cli = Cli::parse();
	let config_path = match cli.config {
		Some(path) => path,
		None => AppConfig::default_path()?,
	};

	match cli.command {
		Commands::Formats => {
			for format in TargetFormat::all() {
				println!("{:<10} {}", format.code(), format.label());
			}
		}
		Commands::InitConfig { force } => {
			if config_path.exists() && !force {
				bail!(
					"Config already exists at {}, pass --force to overwrite",
					config_path.display()
				);
			}
			AppConfig::default().save_to(&config_path)?;
			println!("Wrote {}", config_path.display());
		}
		Commands::Convert(args) => {
			let existed = config_path.exists();
			let config = AppConfig::load_from(&config_path)?;
			init_logging(&config.log_level);
			if !existed {
				info!(path = %config_path.display(), "Created default config");
			}

			return convert(args, config).await;
		}
	}

	Ok(ExitCode::SUCCESS)
}

async fn convert(args: ConvertArgs, config: AppConfig) -> Result<ExitCode> {
	let Some(executable) = args.converter.or(config.converter_path) else {
		bail!("No converter configured: pass --converter, set CVT_CONVERTER or set converter_path in the config");
	};
	let format = args.format.unwrap_or(config.default_format);
	let audit = config.audit && !args.no_audit;

	let items = collect_work_items(&args.input, SUPPORTED_EXTENSIONS)
		.with_context(|| format!("Failed to scan {}", args.input.display()))?;
	debug!(count = items.len(), %format, audit, "Collected drawings");

	let sink = ProgressBarSink::new();
	let controller = BatchController::builder()
		.config(config.batch)
		.progress_sink(sink.clone())
		.build();

	let handle = controller.start(
		items,
		ExternalConverter::new(executable, format).with_audit(audit),
		OutputContext::new(&args.output),
	)?;

	let report = controls::drive(&controller, handle, &sink, !args.no_input).await?;
	sink.finish();

	for failed in &report.failed {
		println!("Failed: {}: {}", failed.item.input().display(), failed.error);
	}

	Ok(if report.is_clean() {
		ExitCode::SUCCESS
	} else {
		ExitCode::from(EXIT_PARTIAL)
	})
}
