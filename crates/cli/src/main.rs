//! realmgen command-line tool.
//!
//! Reads employee directory records, maps each one to an identity-provider
//! user, and writes the resulting realm import document as JSON to stdout.
//! All diagnostics go to stderr so the JSON can be piped straight into an
//! import.

mod preview;
mod style;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn, Subscriber};
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{reload, EnvFilter, Registry};

use realmgen_core::config::{AppConfig, FailurePolicy, MAX_HASH_LENGTH};
use realmgen_core::identity::hash::id_digest_hex;
use realmgen_core::identity::{derive_username, generate_stable_hash};
use realmgen_core::loader::{RecordLoader, YamlDirectoryLoader, YamlStreamLoader};
use realmgen_core::realm::RealmAssembler;
use realmgen_core::IdentityMapper;

/// Config file picked up from the working directory when `--config` is not given.
const LOCAL_CONFIG: &str = "realmgen.toml";

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// realmgen command-line tool.
#[derive(Parser, Debug)]
#[command(
    name = "realmgen",
    version,
    about = "Generate an identity-provider realm from employee directory records"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate the realm JSON document.
    Generate(GenerateArgs),

    /// Show the users that would be generated, without writing the realm.
    Preview {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Show the stable hash and username derived from an employee id.
    Hash {
        /// Employee id.
        id: String,

        /// Number of hash digits.
        #[arg(short, long)]
        length: Option<usize>,
    },

    /// Generate a default configuration file.
    Init {
        /// Output path for the generated config file.
        #[arg(short, long, default_value = LOCAL_CONFIG)]
        output: PathBuf,
    },

    /// Validate a configuration file.
    Validate,
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Directory holding employee YAML files (overrides `source.directory`).
    #[arg(short = 'd', long)]
    employees_dir: Option<PathBuf>,

    /// File-name glob selecting employee files (overrides `source.pattern`).
    #[arg(short, long)]
    pattern: Option<String>,

    /// Read a YAML stream from stdin instead of a directory.
    #[arg(long, conflicts_with_all = ["employees_dir", "pattern"])]
    stdin: bool,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Write the realm to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Leave out records with missing required fields instead of failing.
    #[arg(long)]
    skip_invalid: bool,

    /// Fail if two employees derive the same username.
    #[arg(long)]
    require_unique_usernames: bool,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    // Tracing goes up before the config is read so that config loading and
    // env var warnings are not lost. Stdout is reserved for the realm JSON.
    let log_filter = init_tracing(cli.log_level.as_deref());

    let config_path = locate_config(cli.config.as_deref());
    let config = load_config(config_path.as_deref())?;
    if cli.log_level.is_none() && std::env::var_os("RUST_LOG").is_none() {
        log_filter
            .reload(level_filter(&config.logging.level))
            .context("failed to apply configured log level")?;
    }

    match cli.command {
        Commands::Generate(args) => cmd_generate(&config, args),
        Commands::Preview { source } => cmd_preview(&config, &source),
        Commands::Hash { id, length } => cmd_hash(&config, &id, length),
        Commands::Init { output } => cmd_init(&output),
        Commands::Validate => cmd_validate(&config, config_path.as_deref()),
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

type LogFilterHandle = reload::Handle<EnvFilter, Registry>;

fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Build the log subscriber with a filter that can be swapped once the
/// config's level is known.
fn log_subscriber<W>(
    filter: EnvFilter,
    writer: W,
) -> (impl Subscriber + Send + Sync + 'static, LogFilterHandle)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let (filter, handle) = reload::Layer::new(filter);
    let subscriber = tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .with_writer(writer)
            .with_target(false)
            .without_time(),
    );
    (subscriber, handle)
}

/// Install the stderr subscriber. `--log-level` wins over `RUST_LOG`; with
/// neither, `info` applies until the config has been read.
fn init_tracing(explicit: Option<&str>) -> LogFilterHandle {
    let filter = match explicit {
        Some(level) => level_filter(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    let (subscriber, handle) = log_subscriber(filter, std::io::stderr);
    subscriber.init();
    handle
}

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

/// Resolve which config file to use: the explicit path, `./realmgen.toml`,
/// then `<config dir>/realmgen/config.toml`.
fn locate_config(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let local = PathBuf::from(LOCAL_CONFIG);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("realmgen").join("config.toml"))
        .filter(|path| path.is_file())
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load_and_resolve(path)
            .with_context(|| format!("failed to load configuration from {}", path.display())),
        None => {
            let mut config = AppConfig::default();
            config
                .resolve_env_vars()
                .context("failed to resolve environment variables")?;
            Ok(config)
        }
    }
}

fn record_loader(config: &AppConfig, source: &SourceArgs) -> Box<dyn RecordLoader> {
    if source.stdin {
        Box::new(YamlStreamLoader::new("<stdin>", std::io::stdin()))
    } else {
        let directory = source
            .employees_dir
            .clone()
            .unwrap_or_else(|| config.source.directory.clone());
        let pattern = source
            .pattern
            .clone()
            .unwrap_or_else(|| config.source.pattern.clone());
        Box::new(YamlDirectoryLoader::new(directory, pattern))
    }
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

fn cmd_generate(config: &AppConfig, args: GenerateArgs) -> Result<()> {
    let loader = record_loader(config, &args.source);

    let mut assembler = RealmAssembler::new(config);
    if args.skip_invalid {
        assembler = assembler.with_policy(FailurePolicy::Skip);
    }
    if args.require_unique_usernames {
        assembler = assembler.with_unique_usernames(true);
    }

    let report = assembler
        .run(loader.as_ref())
        .context("failed to generate realm")?;
    if !report.skipped.is_empty() {
        warn!(
            skipped = report.skipped.len(),
            "some employee records were left out of the realm"
        );
    }

    let json = report
        .realm
        .to_json_pretty()
        .context("failed to serialize realm")?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, format!("{}\n", json))
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), users = report.users_emitted(), "realm written");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", json).context("failed to write realm to stdout")?;
            stdout.flush().context("failed to flush stdout")?;
        }
    }

    Ok(())
}

fn cmd_preview(config: &AppConfig, source: &SourceArgs) -> Result<()> {
    let records = record_loader(config, source)
        .load()
        .context("failed to load employee records")?;
    info!(count = records.len(), "loaded employee records");
    let mapper = IdentityMapper::new(&config.users);
    preview::run_preview(&mapper, &records);
    Ok(())
}

fn cmd_hash(config: &AppConfig, id: &str, length: Option<usize>) -> Result<()> {
    let length = length.unwrap_or(config.users.hash_length);
    if length == 0 || length > MAX_HASH_LENGTH {
        anyhow::bail!("hash length must be between 1 and {}", MAX_HASH_LENGTH);
    }
    let digest = id_digest_hex(id);

    println!("Employee id : {}", id);
    println!("Username    : {}", derive_username(id));
    println!("MD5 digest  : {}", digest);
    println!("Hash ({:>2})   : {}", length, generate_stable_hash(id, length));
    Ok(())
}

fn cmd_init(output: &Path) -> Result<()> {
    let default_config = r#"# realmgen configuration
# Every value below is the built-in default; delete what you don't change.

[realm]
name = "technova"
display_name = "TechNova Global"
enabled = true

[client]
client_id = "conceptor-oidc"
protocol = "openid-connect"
public_client = false
redirect_uris = ["*"]
secret = "oidc-client-secret"
# secret_env = "REALMGEN_CLIENT_SECRET"
standard_flow_enabled = true

[users]
email_domain = "example.net"
default_password = "password"
# default_password_env = "REALMGEN_DEFAULT_PASSWORD"
hash_length = 4
on_invalid_record = "abort"   # or "skip"
require_unique_usernames = false

[source]
directory = "employees"
pattern = "*.yaml"

[logging]
level = "info"
"#;

    if output.exists() {
        anyhow::bail!(
            "file already exists: {}. Use a different path or remove the existing file.",
            output.display()
        );
    }

    std::fs::write(output, default_config).context("failed to write config file")?;

    println!("Default configuration written to {}", output.display());
    println!();
    println!("Next steps:");
    println!("  1. Edit the realm, client and email settings");
    println!(
        "  2. Validate with: realmgen validate --config {}",
        output.display()
    );
    println!(
        "  3. Generate with: realmgen generate --config {} > realm.json",
        output.display()
    );

    Ok(())
}

fn cmd_validate(config: &AppConfig, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => println!("Validating configuration: {}", path.display()),
        None => println!(
            "{}",
            style::dim("No configuration file found; validating built-in defaults")
        ),
    }
    println!();

    // load_and_resolve already validated a file; defaults are checked here.
    if let Err(e) = config.validate() {
        println!("  {}", style::error(&format!("Validation error: {}", e)));
        anyhow::bail!("configuration validation failed");
    }
    println!("  {}", style::success("All fields are valid"));

    println!();
    println!("{}", style::header("Configuration summary:"));
    println!("  Realm          : {} ({})", config.realm.name, config.realm.display_name);
    println!("  Client         : {}", config.client.client_id);
    println!("  Redirect URIs  : {}", config.client.redirect_uris.join(", "));
    println!("  Email domain   : {}", config.users.email_domain);
    println!("  Hash length    : {}", config.users.hash_length);
    println!("  Invalid records: {}", config.users.on_invalid_record);
    println!(
        "  Unique names   : {}",
        if config.users.require_unique_usernames {
            "required"
        } else {
            "not checked"
        }
    );
    println!(
        "  Source         : {}/{}",
        config.source.directory.display(),
        config.source.pattern
    );
    if !config.source.directory.is_dir() {
        println!(
            "  {}",
            style::warn("Source directory does not exist (yet)")
        );
    }
    println!();
    println!("Configuration is valid.");

    Ok(())
}
