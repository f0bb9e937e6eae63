use anyhow::{Context, Result};
use blog_archiver::config::{DEFAULT_BASE_URL, DEFAULT_BLOG_URL};
use blog_archiver::scanner::archive_page_url;
use blog_archiver::{Config, Fetch, HttpFetcher, ListingPage};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};

/// Save an archive index page that the listing parser fails on, for regression testing
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Name of the fixture file (without .html)
    test_name: String,

    /// Archive page number to fetch
    #[arg(long, default_value_t = 1)]
    page: usize,

    /// Blog root; the archive index lives at <BLOG_URL>/arcv/
    #[arg(long, default_value = DEFAULT_BLOG_URL)]
    blog_url: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = Config::new(DEFAULT_BASE_URL, &cli.blog_url)?;
    let fetcher = HttpFetcher::new(config.timeout)?;
    let url = archive_page_url(&config.archive_url(), cli.page);

    println!("Fetching HTML from {}...", url);
    let html = fetcher.get_text(&url).context("Failed to fetch archive page")?;

    let failures_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("src/tests/fixtures/failures");
    fs::create_dir_all(&failures_dir).context("Failed to create failures directory")?;

    let file_path: PathBuf = failures_dir.join(format!("{}.html", cli.test_name));
    fs::write(&file_path, &html).context("Failed to write HTML file")?;
    println!(
        "Saved HTML to {} for regression testing",
        file_path.display()
    );

    println!("\nAttempting to parse the listing to confirm failure:");
    let page = ListingPage::parse(&html);
    println!("  - Candidate rows: {}", page.candidate_count());
    println!("  - Parsed rows: {}", page.parsed_count());
    for row_error in page.errors() {
        println!("  - {}", row_error);
    }

    if page.candidate_count() == 0 {
        println!("No listing rows at all - either the end of the archive or a structural change");
    } else if page.parsed_count() < page.candidate_count() {
        println!("Some rows failed to parse - likely a content parsing issue");
    } else {
        println!("⚠️ Every row parsed! This may not be a failure case.");
    }

    Ok(())
}
