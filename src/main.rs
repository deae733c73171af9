use clap::{Parser, Subcommand, ValueEnum};
use siteops::report::{Report, ReportSink};
use siteops::{config, optimize, output, serve, smoke, validate};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "siteops")]
#[command(about = "Build, audit and serve tooling for a static website")]
#[command(long_about = "\
Build, audit and serve tooling for a static website

Expected site layout:

  site/
  ├── siteops.toml                 # Optional tool config (see gen-config)
  ├── index.html                   # Pages live at the root
  ├── about.html
  ├── header.html                  # Partials, included into pages
  ├── footer.html
  ├── 404.html / 500.html          # Served by `siteops serve` on errors
  ├── sitemap.xml, robots.txt, manifest.json, .htaccess, sw.js
  └── assets/
      ├── css/main.css             # → main.min.css
      ├── js/main.js               # → main.min.js
      └── images/logo/logo.png

Checks report pass / fail / warn / error. A site is ready for production
when nothing failed or errored. Exit status is 0 unless --strict is given.

Set RUST_LOG=debug for diagnostics.
Run 'siteops gen-config' to generate a documented siteops.toml.")]
#[command(version)]
struct Cli {
    /// Site root directory
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Config file [default: <root>/siteops.toml]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Report format for optimize, validate and test
    #[arg(long, value_enum, default_value_t = Format::Text, global = true)]
    format: Format,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Minify HTML, CSS and JS into .min files next to the sources
    Optimize,
    /// Check page structure, critical assets, SEO, security and accessibility
    Validate {
        /// Exit with status 1 when the site is not ready for production
        #[arg(long)]
        strict: bool,
    },
    /// Run pre-deploy smoke tests: files, HTML validity, links, images, headers
    Test {
        /// Exit with status 1 when the site is not ready for production
        #[arg(long)]
        strict: bool,
    },
    /// Serve the site locally
    Serve {
        /// Port to listen on [default: $PORT, then serve.port from config]
        #[arg(long)]
        port: Option<u16>,
        /// Address to bind [default: serve.host from config]
        #[arg(long)]
        host: Option<String>,
    },
    /// Print a stock siteops.toml with all options documented
    GenConfig,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Command::Optimize => {
            let site_config = load_config(&cli.root, cli.config.as_deref())?;
            run_optimize(&cli.root, &site_config, cli.format)?;
        }
        Command::Validate { strict } => {
            let site_config = load_config(&cli.root, cli.config.as_deref())?;
            let ready = run_checks("validate", cli.format, |sink| {
                validate::validate(&cli.root, &site_config, sink)
            })?;
            return Ok(exit_code(strict, ready));
        }
        Command::Test { strict } => {
            let site_config = load_config(&cli.root, cli.config.as_deref())?;
            let ready = run_checks("test", cli.format, |sink| {
                smoke::run_tests(&cli.root, &site_config, sink)
            })?;
            return Ok(exit_code(strict, ready));
        }
        Command::Serve { port, host } => {
            let site_config = load_config(&cli.root, cli.config.as_deref())?;
            let env_port = std::env::var("PORT").ok();
            let port = resolve_port(port, env_port.as_deref(), site_config.serve.port)?;
            let host = host.unwrap_or(site_config.serve.host);
            let server = serve::Server::bind(&cli.root, &host, port)?;
            let addr = server.local_addr()?;
            output::print_serve_banner(&format!("http://{addr}"), &cli.root);
            server.run()?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// `--config` if given, else `siteops.toml` in the site root.
fn load_config(
    root: &Path,
    explicit: Option<&Path>,
) -> Result<config::SiteConfig, config::ConfigError> {
    let path = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.join(config::CONFIG_FILENAME));
    tracing::debug!("loading config from {}", path.display());
    config::load_config(&path)
}

/// Diagnostics go to stderr so stdout stays a clean report.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// `--port`, then the `PORT` environment variable, then `serve.port`.
fn resolve_port(cli: Option<u16>, env: Option<&str>, configured: u16) -> Result<u16, String> {
    if let Some(port) = cli {
        return Ok(port);
    }
    match env {
        Some(value) => value
            .trim()
            .parse::<u16>()
            .map_err(|e| format!("invalid PORT {value:?}: {e}")),
        None => Ok(configured),
    }
}

fn exit_code(strict: bool, ready: bool) -> ExitCode {
    if strict && !ready {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Run one checker and print its report. Returns the production verdict.
fn run_checks(
    tool: &'static str,
    format: Format,
    run: impl FnOnce(&mut ReportSink),
) -> Result<bool, Box<dyn std::error::Error>> {
    match format {
        Format::Text => {
            let mut sink = ReportSink::new();
            run(&mut sink);
            Ok(sink.summarize().is_ready())
        }
        Format::Json => {
            let mut sink = ReportSink::silent();
            run(&mut sink);
            let report: Report = sink.into_report(tool);
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(report.ready)
        }
    }
}

fn run_optimize(
    root: &Path,
    site_config: &config::SiteConfig,
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    if format == Format::Json {
        let report = optimize::optimize(root, site_config, None)?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_optimize_event(&event) {
                println!("{}", line);
            }
        }
    });
    let result = optimize::optimize(root, site_config, Some(tx));
    printer
        .join()
        .map_err(|_| "progress printer thread panicked")?;
    output::print_optimize_report(&result?.stats);
    Ok(())
}
