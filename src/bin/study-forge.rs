//! CLI binary for study-forge.
//!
//! A thin shim over the library crate: `serve` runs the JSON-RPC server,
//! `process` and `workflow` drive one document locally, `status` prints what
//! the server would report. Every flag maps onto `ServerConfig` or
//! `WorkflowOptions` and has an environment-variable fallback; a `.env`
//! file in the working directory is loaded first.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use study_forge::pipeline::publish::render_readme;
use study_forge::rpc::methods::ServerStatus;
use study_forge::rpc::{serve, AppState};
use study_forge::{
    ServerConfig, StudyMaterial, Workflow, WorkflowObserver, WorkflowOptions, WorkflowStage,
};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── Stage spinner using indicatif ────────────────────────────────────────────

/// Terminal observer: one spinner line for the running stage and a
/// permanent log line per finished stage.
struct CliObserver {
    bar: ProgressBar,
    stage_start: Mutex<Option<Instant>>,
}

impl CliObserver {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            stage_start: Mutex::new(None),
        })
    }

    fn elapsed(&self) -> String {
        let secs = self
            .stage_start
            .lock()
            .ok()
            .and_then(|mut s| s.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        dim(&format!("{secs:.1}s"))
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl WorkflowObserver for CliObserver {
    fn on_stage_start(&self, stage: WorkflowStage) {
        if let Ok(mut s) = self.stage_start.lock() {
            *s = Some(Instant::now());
        }
        let msg = match stage {
            WorkflowStage::Reading => "Extracting text…",
            WorkflowStage::Generating => "Asking the model for summary, flashcards and notes…",
            WorkflowStage::Publishing => "Creating repository and committing files…",
        };
        self.bar.set_prefix(capitalise(&stage.to_string()));
        self.bar.set_message(msg);
    }

    fn on_stage_complete(&self, stage: WorkflowStage) {
        self.bar.println(format!(
            "  {} {:<11} {}",
            green("✓"),
            stage.to_string(),
            self.elapsed()
        ));
    }

    fn on_stage_error(&self, stage: WorkflowStage, error: &str) {
        let msg = if error.chars().count() > 100 {
            format!("{}\u{2026}", error.chars().take(99).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} {:<11} {}  {}",
            red("✗"),
            stage.to_string(),
            red(&msg),
            self.elapsed()
        ));
    }
}

fn capitalise(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the JSON-RPC server on :5000
  study-forge serve

  # Generate study material for one file and print it
  study-forge process chapter3.pdf

  # Same, as JSON, with eight flashcards and no notes
  study-forge process notes.md --num-flashcards 8 --no-notes --json

  # Generate and publish as a new GitHub repository
  study-forge workflow chapter3.pdf chapter3-study --private

  # What would get_server_status report?
  study-forge status

JSON-RPC EXAMPLE:
  curl -s localhost:5000 -H 'content-type: application/json' -d '{
    "jsonrpc": "2.0", "id": 1, "method": "complete_workflow",
    "params": {"file_path": "/tmp/doc.md", "repo_name": "repo-test-1", "options": {}}
  }'

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY            Completion-service key (provider auto-detected otherwise)
  ANTHROPIC_API_KEY         Alternative provider keys are honoured by auto-detection
  GITHUB_TOKEN              Hosting-service token; publishing fails without it
  STUDY_FORGE_MODEL         Override model ID (default gpt-3.5-turbo)
  STUDY_FORGE_PROVIDER      Force a provider (openai, anthropic, gemini, ollama)
  STUDY_FORGE_HOST          Interface for `serve` (default 0.0.0.0)
  STUDY_FORGE_PORT          Port for `serve` (default 5000)
  PDFIUM_LIB_PATH           Path to libpdfium (file or directory) for PDF input
  RUST_LOG                  Override log filter (e.g. study_forge=debug)
"#;

/// Turn documents into study material and publish it to GitHub.
#[derive(Parser, Debug)]
#[command(
    name = "study-forge",
    version,
    about = "Turn documents into study material with an LLM and publish it to GitHub",
    long_about = "Reads PDF, Markdown or text documents, generates a summary, flashcards and \
study notes with a chat model, and publishes them as a new GitHub repository. Runs as a \
JSON-RPC 2.0 server or as a one-shot command.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Completion model ID.
    #[arg(long, env = "STUDY_FORGE_MODEL", default_value = "gpt-3.5-turbo", global = true)]
    model: String,

    /// Completion provider: openai, anthropic, gemini, ollama. Auto-detected if unset.
    #[arg(long, env = "STUDY_FORGE_PROVIDER", global = true)]
    provider: Option<String>,

    /// Completion-service API key.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    openai_api_key: Option<String>,

    /// GitHub token used for publishing.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, global = true)]
    github_token: Option<String>,

    /// GitHub REST API base URL.
    #[arg(
        long,
        env = "GITHUB_API_URL",
        default_value = "https://api.github.com",
        global = true
    )]
    github_api_url: String,

    /// Per-completion-call timeout in seconds.
    #[arg(long, env = "STUDY_FORGE_API_TIMEOUT", default_value_t = 60, global = true)]
    api_timeout: u64,

    /// Per-GitHub-call timeout in seconds.
    #[arg(long, env = "STUDY_FORGE_HOSTING_TIMEOUT", default_value_t = 30, global = true)]
    hosting_timeout: u64,

    /// Characters of the document sent to the model.
    #[arg(long, env = "STUDY_FORGE_MAX_INPUT_CHARS", default_value_t = 4000, global = true)]
    max_input_chars: usize,

    /// Append logs to this file.
    #[arg(long, env = "STUDY_FORGE_LOG_FILE", default_value = "study_forge.log", global = true)]
    log_file: PathBuf,

    /// Do not write a log file.
    #[arg(long, global = true)]
    no_log_file: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "STUDY_FORGE_VERBOSE", global = true)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "STUDY_FORGE_QUIET", global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the JSON-RPC server.
    Serve {
        /// Interface to bind.
        #[arg(long, env = "STUDY_FORGE_HOST", default_value = "0.0.0.0")]
        host: String,

        /// Port to bind.
        #[arg(short, long, env = "STUDY_FORGE_PORT", default_value_t = 5000)]
        port: u16,
    },

    /// Generate study material for one document.
    Process {
        /// PDF, Markdown or text file.
        file: PathBuf,

        #[command(flatten)]
        generation: GenerationArgs,

        /// Write the rendered README to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate study material and publish it as a new repository.
    Workflow {
        /// PDF, Markdown or text file.
        file: PathBuf,

        /// Name of the repository to create.
        repo_name: String,

        #[command(flatten)]
        generation: GenerationArgs,

        /// Repository description.
        #[arg(long)]
        description: Option<String>,

        /// Create a private repository.
        #[arg(long)]
        private: bool,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the server status report.
    Status {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Clone)]
struct GenerationArgs {
    /// Target summary length in words (1–2000).
    #[arg(long, default_value_t = 200,
          value_parser = clap::value_parser!(u32).range(1..=2000))]
    summary_length: u32,

    /// Number of flashcards (1–50).
    #[arg(long, default_value_t = 5,
          value_parser = clap::value_parser!(u32).range(1..=50))]
    num_flashcards: u32,

    /// Skip study notes.
    #[arg(long)]
    no_notes: bool,
}

impl GenerationArgs {
    fn options(&self) -> WorkflowOptions {
        WorkflowOptions {
            summary_length: self.summary_length,
            num_flashcards: self.num_flashcards,
            include_notes: !self.no_notes,
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env must be loaded before clap reads the environment fallbacks.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // One-shot commands draw a spinner, so stderr only gets errors unless
    // -v is given; the log file always records INFO and above.
    let interactive = matches!(cli.command, Command::Process { .. } | Command::Workflow { .. });
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || interactive {
        "error"
    } else {
        "info"
    };
    init_logging(&cli, filter)?;

    let config = build_config(&cli)?;

    match &cli.command {
        Command::Serve { .. } => {
            let workflow = Workflow::from_config(&config).context("Failed to initialise workflow")?;
            serve(AppState::new(config, workflow))
                .await
                .context("Server failed")?;
        }

        Command::Process {
            file,
            generation,
            output,
            json,
        } => {
            let observer = (!cli.quiet && !json).then(CliObserver::new);
            let workflow = workflow_with_observer(&config, observer.clone())?;

            let result = workflow.process_document(file, &generation.options()).await;
            if let Some(ref obs) = observer {
                obs.finish();
            }
            let processed = result.context("Processing failed")?;

            if *json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&processed).context("Failed to serialise output")?
                );
            } else if let Some(path) = output {
                let title = file
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("Study Material");
                tokio::fs::write(path, render_readme(title, &processed.material))
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                if !cli.quiet {
                    eprintln!("{} wrote {}", green("✔"), bold(&path.display().to_string()));
                }
            } else {
                print_material(&processed.material)?;
            }
        }

        Command::Workflow {
            file,
            repo_name,
            generation,
            description,
            private,
            json,
        } => {
            let observer = (!cli.quiet && !json).then(CliObserver::new);
            let workflow = workflow_with_observer(&config, observer.clone())?;
            let options = WorkflowOptions {
                description: description.clone(),
                private: *private,
                ..generation.options()
            };

            let result = workflow.complete_workflow(file, repo_name, &options).await;
            if let Some(ref obs) = observer {
                obs.finish();
            }
            let report = result.context("Workflow failed")?;

            if *json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&report).context("Failed to serialise output")?
                );
            } else if !cli.quiet {
                eprintln!(
                    "{} published {}",
                    green("✔"),
                    bold(&report.repository.repo_url)
                );
                eprintln!("   clone: {}", dim(&report.repository.clone_url));
            }
        }

        Command::Status { json } => {
            let workflow = Workflow::from_config(&config).context("Failed to initialise workflow")?;
            let status = ServerStatus::collect(&AppState::new(config, workflow));

            if *json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&status).context("Failed to serialise status")?
                );
            } else {
                println!("Server:       {} v{}", status.server_name, status.version);
                println!("Formats:      {}", status.supported_formats.join(", "));
                println!("Capabilities: {}", status.capabilities.join(", "));
                println!("OpenAI:       {}", yes_no(status.integrations.openai));
                println!("GitHub:       {}", yes_no(status.integrations.github));
            }
        }
    }

    Ok(())
}

fn init_logging(cli: &Cli, filter: &str) -> Result<()> {
    let stderr_layer = fmt::layer().with_writer(io::stderr).with_filter(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
    );

    let file_layer = if cli.no_log_file {
        None
    } else {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&cli.log_file)
            .with_context(|| format!("Failed to open log file {}", cli.log_file.display()))?;
        let level = if cli.verbose {
            LevelFilter::DEBUG
        } else {
            LevelFilter::INFO
        };
        Some(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .with_filter(level),
        )
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Ok(())
}

/// Map CLI args to `ServerConfig`.
fn build_config(cli: &Cli) -> Result<ServerConfig> {
    let mut builder = ServerConfig::builder()
        .model(&cli.model)
        .openai_api_key(cli.openai_api_key.clone())
        .github_token(cli.github_token.clone())
        .github_api_base(&cli.github_api_url)
        .api_timeout_secs(cli.api_timeout)
        .hosting_timeout_secs(cli.hosting_timeout)
        .max_input_chars(cli.max_input_chars);

    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Command::Serve { host, port } = &cli.command {
        builder = builder.host(host).port(*port);
    }

    builder.build().context("Invalid configuration")
}

fn workflow_with_observer(
    config: &ServerConfig,
    observer: Option<Arc<CliObserver>>,
) -> Result<Workflow> {
    let workflow = Workflow::from_config(config).context("Failed to initialise workflow")?;
    Ok(match observer {
        Some(obs) => workflow.with_observer(obs),
        None => workflow,
    })
}

fn print_material(material: &StudyMaterial) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{}", bold("Summary"))?;
    writeln!(handle, "{}\n", material.summary)?;
    writeln!(handle, "{}", bold("Flashcards"))?;
    writeln!(handle, "{}\n", material.flashcards)?;
    if let Some(ref notes) = material.study_notes {
        writeln!(handle, "{}", bold("Study Notes"))?;
        writeln!(handle, "{notes}")?;
    }
    Ok(())
}

fn yes_no(configured: bool) -> String {
    if configured {
        green("configured")
    } else {
        red("not configured")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn serve_env(id: &str) -> Option<String> {
        let cli = Cli::command();
        let serve = cli.find_subcommand("serve")?;
        let arg = serve.get_arguments().find(|a| a.get_id() == id)?;
        arg.get_env().and_then(|e| e.to_str()).map(String::from)
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_binds_from_documented_variables() {
        assert_eq!(serve_env("host").as_deref(), Some("STUDY_FORGE_HOST"));
        assert_eq!(serve_env("port").as_deref(), Some("STUDY_FORGE_PORT"));
        assert!(AFTER_HELP.contains("STUDY_FORGE_PORT"));
    }

    #[test]
    fn serve_flags_reach_config() {
        let cli = Cli::try_parse_from(["study-forge", "serve", "--host", "127.0.0.1", "--port", "8123"])
            .unwrap();
        let config = build_config(&cli).unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:8123");
    }
}
