use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use blog_archiver::config::{
    DEFAULT_BASE_URL, DEFAULT_BLOG_URL, DEFAULT_HTML_DIR, DEFAULT_LEDGER, DEFAULT_PDF_DIR,
    DEFAULT_RENDERER,
};
use blog_archiver::{
    Config, DiscoveredEntry, HttpFetcher, Ledger, PdfRenderer, PdfSource, RunOutcome, ScanOptions,
    Session, Wkhtmltopdf,
};
use clap::{Args, Parser, Subcommand};
use log::error;

/// Archive new blog posts as PDF files and offline HTML snapshots
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    options: Options,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan for new entries and download them after confirmation (default)
    Sync,
    /// Scan for new entries and print them without downloading
    Scan {
        /// Print the entries as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the entries recorded as archived
    Ledger,
}

#[derive(Args, Debug)]
struct Options {
    /// Site root used to resolve root-relative links
    #[arg(long, env = "BLOG_ARCHIVER_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    base_url: String,

    /// Blog root; the archive index lives at <BLOG_URL>/arcv/
    #[arg(long, env = "BLOG_ARCHIVER_BLOG_URL", default_value = DEFAULT_BLOG_URL, global = true)]
    blog_url: String,

    /// File listing previously archived entries
    #[arg(long, default_value = DEFAULT_LEDGER, global = true)]
    ledger: PathBuf,

    /// Directory for PDF files
    #[arg(long, default_value = DEFAULT_PDF_DIR, global = true)]
    pdf_dir: PathBuf,

    /// Directory for HTML snapshots
    #[arg(long, default_value = DEFAULT_HTML_DIR, global = true)]
    html_dir: PathBuf,

    /// PDF renderer executable or path, tried in order (repeatable)
    #[arg(long = "renderer", env = "BLOG_ARCHIVER_RENDERER", default_value = DEFAULT_RENDERER, global = true)]
    renderers: Vec<String>,

    /// What the PDF renderer is given
    #[arg(long, value_enum, default_value_t = PdfSource::Url, global = true)]
    pdf_source: PdfSource,

    /// HTTP request timeout in seconds (no timeout by default)
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Stop scanning at the first already archived entry instead of reading every archive page
    #[arg(long, global = true)]
    stop_at_archived: bool,

    /// Stop scanning after this many archive pages (0 means no limit)
    #[arg(long, global = true)]
    max_pages: Option<usize>,

    /// Don't save HTML snapshots
    #[arg(long, global = true)]
    no_html: bool,

    /// Don't render PDFs (entries are then not recorded as archived)
    #[arg(long, global = true)]
    no_pdf: bool,
}

impl Options {
    fn to_config(&self) -> Result<Config> {
        let mut config = Config::new(&self.base_url, &self.blog_url)?;
        config.ledger_path = self.ledger.clone();
        config.pdf_dir = self.pdf_dir.clone();
        config.html_dir = self.html_dir.clone();
        config.renderer_candidates = self.renderers.clone();
        config.pdf_source = self.pdf_source;
        config.timeout = self.timeout_secs.map(Duration::from_secs);
        config.scan = ScanOptions {
            to_exhaustion: !self.stop_at_archived,
            max_pages: self.max_pages,
        };
        config.skip_html = self.no_html;
        config.skip_pdf = self.no_pdf;
        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.options.to_config()?;

    let ledger = Ledger::load(&config.ledger_path)
        .with_context(|| format!("Failed to load ledger {}", config.ledger_path.display()))?;

    match cli.command.unwrap_or(Command::Sync) {
        Command::Ledger => print_ledger(&ledger),
        Command::Scan { json } => {
            let fetcher = HttpFetcher::new(config.timeout)?;
            let session = Session::new(&config, &fetcher, None, ledger);
            let entries = session.scan().context("Scan failed")?;
            print_entries(&entries, json)
        }
        Command::Sync => sync(&config, ledger),
    }
}

fn sync(config: &Config, ledger: Ledger) -> Result<()> {
    let fetcher = HttpFetcher::new(config.timeout)?;

    let renderer = if config.skip_pdf {
        None
    } else {
        match Wkhtmltopdf::locate(config.renderer_candidates.as_slice()) {
            Ok(renderer) => Some(renderer),
            Err(e) => {
                error!("{}; PDF downloads will fail", e);
                None
            }
        }
    };

    let mut session = Session::new(
        config,
        &fetcher,
        renderer.as_ref().map(|r| r as &dyn PdfRenderer),
        ledger,
    );

    match session.run(confirm_download).context("Scan failed")? {
        RunOutcome::NoUpdates => println!("No new updates"),
        RunOutcome::Declined { .. } => {}
        RunOutcome::Finished(report) => {
            println!(
                "HTML: {} saved, {} failed. PDF: {} saved, {} failed.",
                report.html_saved, report.html_failed, report.pdf_saved, report.pdf_failed
            );
            println!("Finished!");
        }
    }

    Ok(())
}

fn confirm_download(entries: &[DiscoveredEntry]) -> bool {
    print!("Found {} new entries. Download? (Y/N) ", entries.len());
    if let Err(e) = io::stdout().flush() {
        error!("Failed to flush prompt: {}", e);
    }

    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => answer.trim().eq_ignore_ascii_case("y"),
        Err(e) => {
            error!("Failed to read answer: {}", e);
            false
        }
    }
}

fn print_entries(entries: &[DiscoveredEntry], json: bool) -> Result<()> {
    if json {
        let json =
            serde_json::to_string_pretty(entries).context("Failed to serialize entries")?;
        println!("{}", json);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No new updates");
    }
    for entry in entries {
        println!("{}", entry.to_record());
    }
    Ok(())
}

fn print_ledger(ledger: &Ledger) -> Result<()> {
    let records = ledger.parsed_records();
    println!(
        "{} archived entries in {}",
        records.len(),
        ledger.path().display()
    );
    for (index, record) in records.iter().enumerate() {
        println!("{}. {} {}", index + 1, record.date, record.title);
        println!("   URL: {}", record.url);
    }
    Ok(())
}
