use anyhow::{Context, Result};
use clap::Parser;
use klog_convert::cli::Cli;
use klog_convert::config::ConverterConfig;
use klog_convert::converter::{buffer_input, ConversionSummary, Converter};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Seek};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

trait RewindableInput: BufRead + Seek {}

impl<T: BufRead + Seek> RewindableInput for T {}

/// Load settings from `--config`, then apply flag overrides
fn load_config(args: &Cli) -> Result<ConverterConfig> {
    let mut config = match &args.config {
        Some(path) => ConverterConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ConverterConfig::default(),
    };
    if let Some(secs) = args.tz_offset {
        config = config.with_tz_correction(secs);
    }
    Ok(config)
}

/// Open the input; stdin is read into memory so it can be scanned twice
fn open_input(args: &Cli) -> Result<Box<dyn RewindableInput>> {
    if args.reads_stdin() {
        let buffered = buffer_input(io::stdin().lock()).context("Failed to read stdin")?;
        return Ok(Box::new(buffered));
    }
    let file = File::open(&args.input)
        .with_context(|| format!("Failed to open input {}", args.input.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

fn run(args: &Cli, converter: &Converter) -> Result<ConversionSummary> {
    let input = open_input(args)?;

    if args.writes_stdout() {
        let summary =
            converter.convert_with(input, || Ok(BufWriter::new(io::stdout().lock())))?;
        return Ok(summary);
    }

    let output_path = args.output_path()?;
    let summary = converter
        .convert_with(input, || File::create(&output_path).map(BufWriter::new))
        .with_context(|| format!("Failed to convert {}", args.input.display()))?;
    Ok(summary)
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    let converter =
        Converter::new(load_config(&args)?).context("Invalid converter configuration")?;
    let summary = run(&args, &converter)?;

    if args.summary {
        eprintln!("{}", serde_json::to_string(&summary)?);
    }

    Ok(())
}
