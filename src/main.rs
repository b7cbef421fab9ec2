//! CLI entry point for `mailprint`.

use clap::{CommandFactory, Parser, Subcommand};

use mailprint::config::{self, Overrides, RunConfig};
use mailprint::mailbox::ImapMailbox;
use mailprint::pipeline;
use mailprint::print::LpQueue;
use mailprint::scratch::ScratchDir;

#[derive(Parser)]
#[command(
    name = "mailprint",
    version,
    about = "Query a mailbox and print attachments from allowed senders"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// IMAP server address HOST:PORT
    #[arg(short, long, env = "IMAP_ADDR")]
    addr: Option<String>,

    /// IMAP account user
    #[arg(short, long, env = "IMAP_USER")]
    user: Option<String>,

    /// IMAP account password
    #[arg(short, long, env = "IMAP_PASS", hide_env_values = true)]
    pass: Option<String>,

    /// Mailbox name
    #[arg(short, long, env = "IMAP_MBOX")]
    mailbox: Option<String>,

    /// CUPS printer name
    #[arg(long, env = "CUPS_PRINTER")]
    printer: Option<String>,

    /// Allowed sender addresses, separated by ":"
    #[arg(long, env = "ALLOWED")]
    allowed: Option<String>,

    /// Allowed attachment extensions (without dot), separated by ":".
    /// Empty means no extension restriction.
    #[arg(long, env = "EXTENSIONS")]
    extensions: Option<String>,

    /// Evaluate and log only; delete nothing, print nothing
    #[arg(short, long)]
    dry_run: bool,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    // Local .env files feed the per-flag environment fallbacks below.
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    if let Some(command) = cli.command {
        return match command {
            Commands::Completions { shell } => cmd_completions(shell),
            Commands::Manpage => cmd_manpage(),
        };
    }

    let settings = config::load_settings();

    let log_level = match cli.verbose {
        0 => settings.general.log_level.clone(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    setup_logging(&log_level, &settings);

    let config = RunConfig::resolve(
        Overrides {
            addr: cli.addr,
            user: cli.user,
            pass: cli.pass,
            mailbox: cli.mailbox,
            printer: cli.printer,
            allowed: cli.allowed,
            extensions: cli.extensions,
            dry_run: cli.dry_run,
        },
        &settings,
    )?;

    tracing::info!(
        addr = %config.addr,
        user = %config.user,
        pass = "*****",
        mailbox = %config.mailbox,
        printer = %config.printer,
        allowed = ?config.allowed_senders,
        extensions = ?config.extensions,
        dry_run = config.dry_run,
        "resolved configuration"
    );

    // Setup failures abort the run with a non-zero exit; everything past a
    // successful fetch is isolated per item inside the pipeline.
    let mut mailbox = ImapMailbox::connect(&config)?;
    let scratch = ScratchDir::create()?;

    pipeline::run_batch(&mut mailbox, &LpQueue, &config, &scratch)?;

    Ok(())
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, settings: &config::Settings) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_dir = config::cache_dir(settings);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "mailprint.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        // Fall back to stderr only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "mailprint", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}
