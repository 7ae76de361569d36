//! CLI tool for ONNX Bench (onnx-bench)

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use colored::Colorize;
#[cfg(feature = "cli")]
use onnxbench::{
    bench,
    config::{BenchConfig, ConfigOverrides, OptimizationLevel, OutputFormat},
    device::{self, DeviceKind},
    prompt::Prompter,
    report::{self, BenchReport, LatencyStats},
    session::{self, ModelSession},
    shape::{self, ShapeRequest},
    BenchError,
};
use std::io::{self, Write};
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "onnx-bench")]
#[command(about = "ONNX Bench: measure per-call and average inference latency of an ONNX model on CPU or GPU", long_about = None)]
#[command(version)]
struct Cli {
    /// ONNX file path
    model_path: Option<PathBuf>,

    /// Input width (rounded down to a multiple of 32)
    #[arg(value_parser = clap::value_parser!(u32).range(32..))]
    input_width: Option<u32>,

    /// Input height (rounded down to a multiple of 32)
    #[arg(value_parser = clap::value_parser!(u32).range(32..))]
    input_height: Option<u32>,

    /// Number of timed inferences
    #[arg(value_parser = clap::value_parser!(u32).range(1..))]
    inference_count: Option<u32>,

    /// Execution device: cpu (0) or gpu (1). Prompts when omitted
    #[arg(short, long)]
    device: Option<DeviceKind>,

    /// GPU adapter index. Prompts when omitted
    #[arg(short, long)]
    adapter: Option<usize>,

    /// Input channel count
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    channels: Option<u32>,

    /// Untimed evaluations before measuring
    #[arg(long)]
    warmup: Option<u32>,

    /// Output format (json or text)
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Graph optimization level: disable, basic, extended or all
    #[arg(long)]
    opt_level: Option<OptimizationLevel>,

    /// Intra-op thread count for the runtime
    #[arg(long)]
    intra_threads: Option<usize>,

    /// List GPU adapters and exit
    #[arg(long)]
    list_adapters: bool,

    /// Print a sample configuration file and exit
    #[arg(long)]
    print_config: bool,
}

#[cfg(feature = "cli")]
impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            model_path: self.model_path.clone(),
            input_width: self.input_width,
            input_height: self.input_height,
            input_channels: self.channels,
            iterations: self.inference_count,
            warmup: self.warmup,
            device: self.device,
            adapter: self.adapter,
            format: self.format,
            optimization: self.opt_level,
            intra_threads: self.intra_threads,
        }
    }
}

#[cfg(feature = "cli")]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    env_logger::init();

    if cli.print_config {
        print!("{}", BenchConfig::sample_toml());
        return Ok(());
    }

    if cli.list_adapters {
        handle_list_adapters();
        return Ok(());
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "[ERROR]".red(), e);
            std::process::exit(2);
        }
    };

    if config.format == OutputFormat::Text {
        println!("Usage: onnx-bench [ ONNX file path ] [ Input width ] [ Input height ] [ Inference times ]");
    }

    match run(&config) {
        Ok(()) => Ok(()),
        // A missing model is reported but is not a failure
        Err(e) if e.is_model_not_found() => {
            report::write_model_not_found(&mut status_output(config.format))?;
            log::info!("{}", e);
            Ok(())
        }
        Err(e) => {
            eprintln!();
            eprintln!("{} {}", "[ERROR]".red(), e);
            std::process::exit(1);
        }
    }
}

/// Where prompts, progress and notices go; JSON output keeps stdout for the report
#[cfg(feature = "cli")]
fn status_output(format: OutputFormat) -> Box<dyn Write> {
    if format.reserves_stdout() {
        Box::new(io::stderr())
    } else {
        Box::new(io::stdout())
    }
}

/// Defaults, then the config file, then the command line
#[cfg(feature = "cli")]
fn load_config(cli: &Cli) -> onnxbench::Result<BenchConfig> {
    let base = match &cli.config {
        Some(path) => {
            log::info!("Reading configuration from {}", path.display());
            BenchConfig::from_toml_file(path)?
        }
        None => BenchConfig::default(),
    };
    let config = base.apply_overrides(cli.overrides()).normalized()?;
    log::debug!("Effective configuration: {:?}", config);
    Ok(config)
}

#[cfg(feature = "cli")]
fn handle_list_adapters() {
    let adapters = device::enumerate_adapters();
    if adapters.is_empty() {
        println!("{} No GPU adapters found", "[-]".yellow());
        return;
    }
    println!("{} {} GPU adapter(s):\n", "[*]".cyan(), adapters.len());
    for adapter in &adapters {
        println!(
            "  {} {}",
            format!("Adapter {}:", adapter.index).white().bold(),
            adapter.description
        );
        println!(
            "    Vendor: {} (0x{:04X})  Device: 0x{:04X}",
            adapter.vendor_name(),
            adapter.vendor_id,
            adapter.device_id
        );
        println!(
            "    Dedicated: {} MiB  Shared: {} MiB  Backend: {:?}",
            adapter.dedicated_video_memory / (1024 * 1024),
            adapter.shared_system_memory / (1024 * 1024),
            adapter.backend
        );
    }
}

#[cfg(feature = "cli")]
fn run(config: &BenchConfig) -> onnxbench::Result<()> {
    let text = !config.format.reserves_stdout();

    session::ensure_model_exists(&config.model_path)?;

    let adapters = if config.device == Some(DeviceKind::Cpu) {
        Vec::new()
    } else {
        device::enumerate_adapters()
    };

    let execution_device = device::select_device(
        config,
        &mut Prompter::new(io::stdin().lock(), status_output(config.format)),
        &adapters,
    )?;
    let mut progress = status_output(config.format);

    report::write_header(
        &mut progress,
        config.input_width,
        config.input_height,
        config.iterations,
    )?;

    writeln!(progress, "Loading modelfile '{}'", config.model_path.display())?;
    let mut model = ModelSession::load(config, &execution_device)?;
    writeln!(progress, "Load Model {}", "[SUCCEEDED]".green())?;

    let input_shape =
        shape::resolve_input_shape(model.input(), &ShapeRequest::from_config(config))?;
    log::info!(
        "Binding input '{}' with shape {:?}",
        model.input().name,
        input_shape
    );
    model.bind(&input_shape)?;

    writeln!(progress, "\nRunning the model...")?;
    progress.flush()?;

    let samples = bench::run_benchmark(&mut model, config.warmup, config.iterations, |_, elapsed| {
        if text {
            if let Err(e) = report::write_sample(&mut io::stdout(), elapsed) {
                log::debug!("Failed to print sample: {}", e);
            }
        }
    })?;

    let stats = LatencyStats::from_samples(&samples)
        .ok_or_else(|| BenchError::InvalidArgument("no inference samples collected".into()))?;

    let bench_report = BenchReport {
        model_path: model.model_path().display().to_string(),
        device: execution_device.label(),
        input_name: model.input().name.clone(),
        input_shape,
        outputs: model.output_names().to_vec(),
        warmup: config.warmup,
        iterations: config.iterations,
        stats,
    };

    let mut stdout = io::stdout();
    match config.format {
        OutputFormat::Text => report::write_text_summary(&mut stdout, &bench_report)?,
        OutputFormat::Json => report::write_json_summary(&mut stdout, &bench_report)?,
    }
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI features not enabled. Please compile with --features cli");
    std::process::exit(1);
}
