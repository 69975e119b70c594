//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use pdblink_core::{GitCli, Linker, ManifestSymbolOpener, PdbstrEmbedder};
use pdblink_providers::ProviderRegistry;
use pdblink_shared::{
    AppConfig, DownloadMethod, LinkOptions, Reporter, init_config, load_config, load_config_from,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// pdblink: link debug symbols to their hosted source files.
#[derive(Parser)]
#[command(
    name = "pdblink",
    version,
    about = "Embed source-server indexes into PDB files so debuggers fetch sources from git hosting.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.pdblink/pdblink.toml.
    #[arg(long = "config", global = true, env = "PDBLINK_CONFIG")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Index one or more symbol files and embed the index.
    Link(LinkArgs),

    /// Show which hosting provider matches each remote URL.
    Detect {
        /// Remote URLs to check.
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args, Debug)]
pub(crate) struct LinkArgs {
    /// Symbol files to link.
    #[arg(required = true)]
    pub pdbs: Vec<PathBuf>,

    /// Checksum manifest (defaults to <PDB>.checksums.json). Single symbol file only.
    #[arg(long)]
    pub checksums: Option<PathBuf>,

    /// Remote URL to match instead of the repository's remotes.
    #[arg(short = 'u', long = "url")]
    pub url: Option<String>,

    /// Commit to link against instead of HEAD.
    #[arg(long)]
    pub commit: Option<String>,

    /// Checkout root, when it cannot be found from the source paths.
    #[arg(long)]
    pub base_dir: Option<PathBuf>,

    /// Skip the source checksum verification pass.
    #[arg(short, long)]
    pub skip_verify: bool,

    /// How the debugger downloads sources: http or powershell.
    #[arg(short = 'm', long)]
    pub method: Option<DownloadMethod>,

    /// Write <PDB>.srcsrv but do not embed it.
    #[arg(long)]
    pub index_only: bool,

    /// pdbstr executable (overrides [tools] pdbstr).
    #[arg(long, env = "PDBLINK_PDBSTR")]
    pub pdbstr: Option<String>,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "pdblink=info",
        1 => "pdblink=debug",
        _ => "pdblink=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config_file.as_deref();
    match cli.command {
        Command::Link(args) => cmd_link(&args, config_path),
        Command::Detect { urls } => cmd_detect(&urls, config_path),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

/// Per-file options: CLI flags over config defaults.
fn link_options(config: &AppConfig, args: &LinkArgs, pdb: &Path) -> LinkOptions {
    let mut options = LinkOptions::from_config(config, pdb);
    options.working_dir = args.base_dir.clone();
    options.revision = args.commit.clone();
    options.remote_url = args.url.clone();
    options.skip_verify |= args.skip_verify;
    options.index_only = args.index_only;
    if let Some(method) = args.method {
        options.download_method = method;
    }
    options
}

fn cmd_link(args: &LinkArgs, config_path: Option<&Path>) -> Result<()> {
    if args.checksums.is_some() && args.pdbs.len() > 1 {
        return Err(eyre!("--checksums can only be used with a single symbol file"));
    }

    let config = resolve_config(config_path)?;
    let registry = ProviderRegistry::with_custom(&config.providers)?;
    let symbols = match &args.checksums {
        Some(path) => ManifestSymbolOpener::with_manifest(path),
        None => ManifestSymbolOpener::new(),
    };
    let repositories = GitCli::new();
    let embedder = PdbstrEmbedder::new(
        args.pdbstr
            .clone()
            .unwrap_or_else(|| config.tools.pdbstr.clone()),
    );

    info!(files = args.pdbs.len(), providers = ?registry.names(), "linking symbol files");

    let reporter = CliReporter::new();
    let linker = Linker::new(&registry, &symbols, &repositories, &embedder, &reporter);

    let mut failed = 0usize;
    for pdb in &args.pdbs {
        if !linker.run(&link_options(&config, args, pdb)) {
            failed += 1;
        }
    }
    reporter.finish();

    if failed > 0 {
        return Err(eyre!(
            "{failed} of {} symbol files failed to link",
            args.pdbs.len()
        ));
    }
    Ok(())
}

fn cmd_detect(urls: &[String], config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let registry = ProviderRegistry::with_custom(&config.providers)?;

    for url in urls {
        match registry.detect(url) {
            Some(found) => println!("{url}\n  provider: {}\n  raw url:  {}", found.provider, found.raw_url),
            None => println!(
                "{url}\n  no provider matched (tried: {})",
                registry.names().join(", ")
            ),
        }
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI reporter
// ---------------------------------------------------------------------------

/// Reporter that shows progress on an indicatif spinner.
///
/// Everything but debug is printed above the spinner; debug goes to tracing.
struct CliReporter {
    spinner: ProgressBar,
}

impl CliReporter {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl Reporter for CliReporter {
    fn debug(&self, message: &str) {
        tracing::debug!("{message}");
    }

    fn info(&self, message: &str) {
        self.spinner.suspend(|| println!("  {message}"));
        self.spinner.set_message(message.to_string());
    }

    fn warning(&self, message: &str) {
        self.spinner.suspend(|| tracing::warn!("{message}"));
    }

    fn error(&self, message: &str) {
        self.spinner.suspend(|| tracing::error!("{message}"));
    }
}
