//! CLI binary for ats-analyzer.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `AnalyzerConfig`, runs the requested analyses and prints results.

use anyhow::{Context, Result};
use ats_analyzer::{
    export_result, AnalysisMode, AnalysisProgressCallback, AnalysisResult, Analyzer,
    AnalyzerConfig, AnalyzerConfigBuilder, AnalyzerError, ErrorKind, MatchBand, ProgressCallback,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
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
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one spinner per analysis request.
struct CliProgressCallback {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            bar: Mutex::new(None),
        })
    }

    fn spinner() -> ProgressBar {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Some(ref bar) = *self.bar.lock().unwrap_or_else(|e| e.into_inner()) {
            f(bar);
        }
    }

    fn finish(&self) {
        if let Some(bar) = self.bar.lock().unwrap_or_else(|e| e.into_inner()).take() {
            bar.finish_and_clear();
        }
    }
}

impl AnalysisProgressCallback for CliProgressCallback {
    fn on_render_start(&self) {
        let bar = Self::spinner();
        bar.set_prefix("Rendering");
        bar.set_message("page 1…");
        *self.bar.lock().unwrap_or_else(|e| e.into_inner()) = Some(bar);
    }

    fn on_render_complete(&self, encoded_len: usize, elapsed_ms: u64) {
        self.with_bar(|bar| {
            bar.println(format!(
                "  {} Page 1 rendered  {}  {}",
                green("✓"),
                dim(&format!("{:>7} bytes", encoded_len)),
                dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
            ));
        });
    }

    fn on_request_start(&self, mode: AnalysisMode) {
        self.with_bar(|bar| {
            bar.set_prefix("Analyzing");
            bar.set_message(mode.title().to_string());
        });
    }

    fn on_analysis_complete(&self, mode: AnalysisMode, text_len: usize, _score: Option<u8>) {
        self.finish();
        eprintln!(
            "{} {}  {}",
            green("✔"),
            bold(mode.title()),
            dim(&format!("{text_len} chars")),
        );
    }

    // The error itself is printed once, by `report`.
    fn on_analysis_error(&self, _mode: AnalysisMode, _error: &str) {
        self.finish();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Match percentage against a job posting saved to a file
  ats-analyzer resume.pdf --job-file job.txt --mode match-percentage

  # Paste the job description from the clipboard via stdin
  pbpaste | ats-analyzer resume.pdf --job-file -

  # Improvement suggestions, exported into ./reports
  ats-analyzer resume.pdf --job-file job.txt --mode improvement --export reports/

  # Resume hosted online, JSON output
  ats-analyzer https://example.com/cv.pdf --job "Senior Rust engineer…" --json

  # Another vision provider through edgequake-llm
  ats-analyzer resume.pdf --job-file job.txt --provider openai --model gpt-4.1-mini

ANALYSIS MODES:
  comprehensive       Strengths, weaknesses and overall alignment
  missing-keywords    Keywords from the job description absent from the resume
  match-percentage    Overall match score (0–100%) with a qualitative band
  improvement         Concrete rewrite suggestions

ENVIRONMENT VARIABLES:
  GOOGLE_API_KEY          Google Gemini API key (required for the default provider)
  GEMINI_API_KEY          Fallback when GOOGLE_API_KEY is unset
  ATS_ANALYZER_PROVIDER   Override provider (gemini, openai, anthropic, ollama, …)
  ATS_ANALYZER_MODEL      Override model ID
  PDFIUM_LIB_PATH         Path to libpdfium (file or containing directory)
  RUST_LOG                Tracing filter (overrides -v / -q)

  A .env file in the working directory is loaded on startup.

EXIT CODES:
  0  success
  2  configuration error (API key, PDFium library)
  3  input error (no resume, empty job description, unreadable PDF)
  4  timeout
  5  service error
"#;

/// Analyse a PDF resume against a job description.
#[derive(Parser, Debug)]
#[command(
    name = "ats-analyzer",
    version,
    about = "Analyse a PDF resume against a job description using a multimodal LLM",
    long_about = "Render the first page of a PDF resume, send it to a hosted multimodal model \
together with a job description, and print the model's assessment. Four analyses are \
available; match-percentage also extracts a 0–100 score and classifies it.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: Option<String>,

    /// Job description text.
    #[arg(short, long, env = "ATS_ANALYZER_JOB", conflicts_with = "job_file")]
    job: Option<String>,

    /// Read the job description from a file (`-` for stdin).
    #[arg(long, env = "ATS_ANALYZER_JOB_FILE")]
    job_file: Option<PathBuf>,

    /// Analysis to run.
    #[arg(short, long, env = "ATS_ANALYZER_MODE", value_enum, default_value = "comprehensive")]
    mode: ModeArg,

    /// Export the result as text. A directory gets `<mode>_results.txt`.
    #[arg(
        short = 'o',
        long,
        env = "ATS_ANALYZER_EXPORT",
        num_args = 0..=1,
        default_missing_value = "."
    )]
    export: Option<PathBuf>,

    /// Output structured JSON (AnalysisResult) instead of text.
    #[arg(long, env = "ATS_ANALYZER_JSON")]
    json: bool,

    /// Google API key for the default Gemini backend.
    #[arg(long)]
    api_key: Option<String>,

    /// LLM provider: gemini (default), openai, anthropic, ollama, …
    #[arg(long, env = "ATS_ANALYZER_PROVIDER")]
    provider: Option<String>,

    /// Model ID (default: gemini-2.0-flash).
    #[arg(long, env = "ATS_ANALYZER_MODEL")]
    model: Option<String>,

    /// Path to libpdfium, or a directory containing it.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Rendering DPI (72–400).
    #[arg(long, env = "ATS_ANALYZER_DPI",
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: Option<u32>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "ATS_ANALYZER_TEMPERATURE")]
    temperature: Option<f32>,

    /// Max LLM output tokens.
    #[arg(long, env = "ATS_ANALYZER_MAX_TOKENS")]
    max_tokens: Option<usize>,

    /// Page rendering timeout in seconds.
    #[arg(long, env = "ATS_ANALYZER_RENDER_TIMEOUT")]
    render_timeout: Option<u64>,

    /// LLM call timeout in seconds.
    #[arg(long, env = "ATS_ANALYZER_API_TIMEOUT")]
    api_timeout: Option<u64>,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "ATS_ANALYZER_DOWNLOAD_TIMEOUT")]
    download_timeout: Option<u64>,

    /// Disable progress spinner.
    #[arg(long, env = "ATS_ANALYZER_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "ATS_ANALYZER_VERBOSE")]
    verbose: bool,

    /// Suppress all output except results and errors.
    #[arg(short, long, env = "ATS_ANALYZER_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ModeArg {
    Comprehensive,
    MissingKeywords,
    MatchPercentage,
    Improvement,
}

impl From<ModeArg> for AnalysisMode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::Comprehensive => AnalysisMode::Comprehensive,
            ModeArg::MissingKeywords => AnalysisMode::MissingKeywords,
            ModeArg::MatchPercentage => AnalysisMode::MatchPercentage,
            ModeArg::Improvement => AnalysisMode::Improvement,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner provides the feedback that matters, so library INFO logs
    // are suppressed while it is active.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match run(&cli, show_progress).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(&err),
    }
}

async fn run(cli: &Cli, show_progress: bool) -> Result<()> {
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn AnalysisProgressCallback>)
    } else {
        None
    };

    let config = build_config(cli, progress_cb)?;

    // ── Startup: credentials and PDFium ─────────────────────────────────
    let analyzer = Analyzer::new(config)?;
    if !cli.quiet && !cli.json {
        eprintln!(
            "{} {} {}",
            cyan("◆"),
            bold("Using"),
            dim(&format!(
                "{} / {}",
                analyzer.client_name(),
                analyzer.config().effective_model()
            )),
        );
    }

    let job_description = read_job_description(cli)?;

    // ── Load resume ──────────────────────────────────────────────────────
    // The job description is checked first so a bad invocation never
    // downloads anything.
    if job_description.trim().is_empty() {
        return Err(AnalyzerError::EmptyJobDescription.into());
    }
    let document = match cli.input {
        Some(ref input) => Some(
            ats_analyzer::pipeline::input::resolve_input(
                input,
                analyzer.config().download_timeout_secs,
            )
            .await?,
        ),
        None => None,
    };

    // ── Run analysis ─────────────────────────────────────────────────────
    let mode: AnalysisMode = cli.mode.into();
    let result = analyzer
        .analyze(mode, document.as_ref(), &job_description)
        .await?;

    if let Some(ref target) = cli.export {
        let path = export_result(&result, target)?;
        if !cli.quiet {
            eprintln!("   {} {}", dim("→"), bold(&path.display().to_string()));
        }
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&result).context("Failed to serialise output")?;
        println!("{json}");
    } else {
        print_result(&result).context("Failed to write to stdout")?;
    }

    Ok(())
}

/// Map CLI args on top of the environment defaults.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<AnalyzerConfig> {
    let mut builder = AnalyzerConfigBuilder::from_config(AnalyzerConfig::from_env());

    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref path) = cli.pdfium_lib {
        builder = builder.pdfium_lib_path(path.clone());
    }
    if let Some(dpi) = cli.dpi {
        builder = builder.dpi(dpi);
    }
    if let Some(t) = cli.temperature {
        builder = builder.temperature(t);
    }
    if let Some(n) = cli.max_tokens {
        builder = builder.max_tokens(n);
    }
    if let Some(secs) = cli.render_timeout {
        builder = builder.render_timeout_secs(secs);
    }
    if let Some(secs) = cli.api_timeout {
        builder = builder.api_timeout_secs(secs);
    }
    if let Some(secs) = cli.download_timeout {
        builder = builder.download_timeout_secs(secs);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    Ok(builder.build()?)
}

fn read_job_description(cli: &Cli) -> Result<String> {
    if let Some(ref text) = cli.job {
        return Ok(text.clone());
    }
    match cli.job_file {
        Some(ref path) if path.as_os_str() == "-" => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read job description from stdin")?;
            Ok(buf)
        }
        Some(ref path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read job description from {:?}", path)),
        None => Ok(String::new()),
    }
}

fn print_result(result: &AnalysisResult) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    writeln!(out, "{}", bold(&format!("── {} ──", result.mode.title())))?;
    if result.mode.extracts_score() {
        match (result.score, result.band) {
            (Some(score), Some(band)) => {
                let headline = format!("Match score: {score}%  {}", band.message());
                let coloured = match band {
                    MatchBand::Strong => green(&headline),
                    MatchBand::Good => yellow(&headline),
                    MatchBand::SignificantGaps => red(&headline),
                };
                writeln!(out, "{coloured}")?;
            }
            _ => writeln!(
                out,
                "{}",
                yellow("Could not extract a specific percentage score from the analysis.")
            )?,
        }
        writeln!(out)?;
    }
    out.write_all(result.text.as_bytes())?;
    if !result.text.ends_with('\n') {
        out.write_all(b"\n")?;
    }
    writeln!(out)
}

/// Print an error with its guidance line and pick an exit code by kind.
fn report(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<AnalyzerError>() {
        Some(e) => {
            eprintln!("{} {}", red("Error:"), e);
            eprintln!("{}", dim(e.guidance()));
            ExitCode::from(match e.kind() {
                ErrorKind::Configuration => 2,
                ErrorKind::Input => 3,
                ErrorKind::Timeout => 4,
                ErrorKind::Service => 5,
            })
        }
        None => {
            eprintln!("{} {:#}", red("Error:"), err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_one_mode_per_invocation() {
        let cli = Cli::try_parse_from([
            "ats-analyzer",
            "resume.pdf",
            "--job",
            "Rust",
            "--mode",
            "missing-keywords",
        ])
        .unwrap();
        assert_eq!(AnalysisMode::from(cli.mode), AnalysisMode::MissingKeywords);

        assert!(Cli::try_parse_from(["ats-analyzer", "resume.pdf", "--all"]).is_err());
    }

    #[test]
    fn job_and_job_file_conflict() {
        let parsed = Cli::try_parse_from([
            "ats-analyzer",
            "resume.pdf",
            "--job",
            "Rust",
            "--job-file",
            "job.txt",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn poisoned_spinner_lock_does_not_panic() {
        let cb = CliProgressCallback::new();
        let poisoner = Arc::clone(&cb);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.bar.lock().unwrap();
            panic!("poison the spinner lock");
        })
        .join();
        assert!(cb.bar.is_poisoned());

        cb.on_render_start();
        cb.on_request_start(AnalysisMode::Improvement);
        cb.on_analysis_error(AnalysisMode::Improvement, "boom");
        assert!(cb.bar.lock().unwrap_or_else(|e| e.into_inner()).is_none());
    }
}
