pub mod cli;
mod tui_app;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use cli::{
    errors::CrxCliError,
    helpers::{exit_with_error, print_summary},
};
use crx_fetch::{
    output::{convert_file, download_and_save, extract_to_directory, SaveOptions},
    store::{
        percent_decode, Arch, ExtensionId, FetchConfig, Os, Product, ReqwestClient,
        UpdateRequest, DEFAULT_PROD_VERSION,
    },
};
use std::{env, path::PathBuf, time::Duration};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "crx-fetch")]
#[command(version)]
#[command(about = "Download Chrome extensions and convert CRX packages to zip files", long_about = None)]
#[command(next_line_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show debug output
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Only report errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,
}

#[derive(Subcommand)]
enum Commands {
    /// Download an extension from the Chrome Web Store and save it as a zip
    Download(DownloadArgs),
    /// Convert a local CRX file to a zip
    Convert(ConvertArgs),
    /// Print the update-service download URL for an extension
    Url(UrlArgs),
}

#[derive(Args)]
struct DownloadArgs {
    /// Extension ID (32 characters, a-p) or Web Store URL
    target: String,
    /// Output zip file name (default: <id>.zip)
    #[arg(short, long)]
    output: Option<String>,
    #[arg(short = 'd', long, default_value = "downloads")]
    output_dir: PathBuf,
    /// Keep the CRX file after conversion
    #[arg(long)]
    keep_crx: bool,
    /// Also unpack the zip into this directory
    #[arg(long)]
    extract: Option<PathBuf>,
    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,
    #[arg(long, default_value_t = 100)]
    max_size_mb: u64,
    #[arg(long)]
    no_progress: bool,
    #[command(flatten)]
    request: RequestArgs,
}

#[derive(Args)]
struct ConvertArgs {
    /// CRX file to convert
    filename: String,
    /// Output zip path (default: next to the CRX file)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Also unpack the zip into this directory
    #[arg(long)]
    extract: Option<PathBuf>,
}

#[derive(Args)]
struct UrlArgs {
    /// Extension ID (32 characters, a-p) or Web Store URL
    target: String,
    /// Also print the URL with percent escapes decoded
    #[arg(long)]
    decode: bool,
    #[command(flatten)]
    request: RequestArgs,
}

#[derive(Args)]
struct RequestArgs {
    /// Operating system (detected if not specified)
    #[arg(long, value_enum)]
    os: Option<Os>,
    /// Architecture (detected if not specified)
    #[arg(long, value_enum)]
    arch: Option<Arch>,
    /// Native Client architecture (defaults to --arch)
    #[arg(long, value_enum)]
    nacl_arch: Option<Arch>,
    #[arg(long, default_value = DEFAULT_PROD_VERSION)]
    prodversion: String,
    #[arg(long, value_enum, default_value_t = Product::Chromium)]
    product: Product,
}

impl RequestArgs {
    fn to_request(&self) -> UpdateRequest {
        let detected = UpdateRequest::default();
        let arch = self.arch.unwrap_or(detected.arch);

        UpdateRequest {
            os: self.os.unwrap_or(detected.os),
            arch,
            nacl_arch: self.nacl_arch.unwrap_or(arch),
            prod_version: self.prodversion.clone(),
            product: self.product,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        cli.log_level.as_str()
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("crx_fetch={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn megabytes(mb: u64) -> u64 {
    mb.saturating_mul(1024 * 1024)
}

fn resolve_extension(target: &str) -> ExtensionId {
    match ExtensionId::resolve(target) {
        Ok(id) => id,
        Err(err) => exit_with_error(CrxCliError::InvalidExtension(err.to_string())),
    }
}

fn download(args: DownloadArgs) -> anyhow::Result<()> {
    let id = resolve_extension(&args.target);
    let request = args.request.to_request();

    let fetch = FetchConfig {
        timeout: Duration::from_secs(args.timeout),
        max_package_bytes: megabytes(args.max_size_mb),
        show_progress: !args.no_progress,
        ..FetchConfig::default()
    };
    let client = ReqwestClient::new(&fetch)?;

    let options = SaveOptions {
        output_dir: args.output_dir,
        file_name: args.output,
        keep_crx: args.keep_crx,
    };

    let saved = download_and_save(&client, &id, &request, &fetch, &options)?;
    print_summary(&saved.package, &saved.zip_path);

    if let Some(crx_path) = &saved.crx_path {
        println!("CRX file kept at {}", crx_path.display());
    }

    if let Some(extract_dir) = args.extract {
        extract_to_directory(&saved.package.zip, &extract_dir)?;
        println!("Extracted to {}", extract_dir.display());
    }

    println!(
        "Success! Extension downloaded to: {}",
        saved.zip_path.display()
    );
    Ok(())
}

fn convert(args: ConvertArgs) -> anyhow::Result<()> {
    let filename = args.filename;

    match filename.ends_with(".crx") {
        true => {}
        false => {
            exit_with_error(CrxCliError::UnsupportedFileType);
        }
    }

    let current_dir = env::current_dir().context("Failed to get current directory")?;
    let crx_file_path = current_dir.join(&filename);

    if !crx_file_path.exists() {
        exit_with_error(CrxCliError::NotFound(crx_file_path.display().to_string()));
    }

    println!("Converting CRX file: {}", filename);
    let (zip_path, package) = convert_file(&crx_file_path, args.output.as_deref())?;
    print_summary(&package, &zip_path);

    if let Some(extract_dir) = args.extract {
        extract_to_directory(&package.zip, &extract_dir)?;
        println!("Extracted to {}", extract_dir.display());
    }

    println!("Success! Converted to: {}", zip_path.display());
    Ok(())
}

fn print_url(args: UrlArgs) {
    let id = resolve_extension(&args.target);
    let url = args.request.to_request().download_url(&id);

    if args.decode {
        println!("Decoded URL:");
        println!("{}", percent_decode(&url));
        println!("\nEncoded URL:");
    }
    println!("{}", url);
}

pub fn main() {
    // If no arguments provided, launch TUI mode
    if env::args().len() == 1 {
        if let Err(err) = tui_app::run_tui() {
            eprintln!("TUI Error: {}", err);
            std::process::exit(1);
        }
        return;
    }

    let cli = Cli::parse();
    init_logging(&cli);

    let result = match cli.command {
        Commands::Download(args) => download(args),
        Commands::Convert(args) => convert(args),
        Commands::Url(args) => {
            print_url(args);
            Ok(())
        }
    };

    if let Err(err) = result {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
