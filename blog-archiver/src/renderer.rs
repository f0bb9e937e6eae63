use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::{debug, info};

use crate::error::{ArchiveError, Result};

/// Page layout used when HTML is piped to the renderer.
pub const PAGE_SIZE: &str = "A4";
pub const MARGIN_MM: &str = "25";

/// External engine that turns a page into a PDF file.
pub trait PdfRenderer {
    fn render_url(&self, url: &str, output: &Path) -> Result<()>;

    fn render_html(&self, html: &str, output: &Path) -> Result<()>;
}

/// `wkhtmltopdf`, resolved once from an ordered list of candidates.
#[derive(Debug, Clone)]
pub struct Wkhtmltopdf {
    program: PathBuf,
}

#[derive(Debug)]
pub struct WkhtmltopdfCommand {
    cmd: Command,
}

impl WkhtmltopdfCommand {
    pub fn cmd(self) -> Command {
        self.cmd
    }

    pub fn arg<S: AsRef<OsStr>>(&mut self, arg: S) -> &mut WkhtmltopdfCommand {
        self.cmd.arg(arg);
        self
    }

    pub fn args<Iter, Str>(&mut self, args: Iter) -> &mut WkhtmltopdfCommand
    where
        Iter: IntoIterator<Item = Str>,
        Str: AsRef<OsStr>,
    {
        self.cmd.args(args);
        self
    }

    pub fn page_layout(&mut self) -> &mut WkhtmltopdfCommand {
        self.args([
            "--page-size",
            PAGE_SIZE,
            "--margin-top",
            MARGIN_MM,
            "--margin-bottom",
            MARGIN_MM,
            "--encoding",
            "utf-8",
        ])
    }

    pub fn input_output<S: AsRef<OsStr>>(&mut self, input: S, output: &Path) -> &mut WkhtmltopdfCommand {
        self.arg(input);
        self.arg(output)
    }
}

impl Wkhtmltopdf {
    pub fn new<P: Into<PathBuf>>(program: P) -> Self {
        Wkhtmltopdf {
            program: program.into(),
        }
    }

    /// First candidate that exists. Bare names are looked up on `PATH`.
    pub fn locate<S: AsRef<OsStr>>(candidates: &[S]) -> Result<Self> {
        for candidate in candidates {
            let candidate = candidate.as_ref();
            let path = Path::new(candidate);
            if path.components().count() > 1 || path.is_absolute() {
                if path.is_file() {
                    info!("Using PDF renderer {}", path.display());
                    return Ok(Self::new(path));
                }
                debug!("PDF renderer candidate {} does not exist", path.display());
            } else if let Ok(found) = which::which(candidate) {
                info!("Using PDF renderer {}", found.display());
                return Ok(Self::new(found));
            } else {
                debug!("PDF renderer candidate {} not found on PATH", path.display());
            }
        }

        Err(ArchiveError::render(format!(
            "renderer not found (tried {})",
            candidates
                .iter()
                .map(|c| c.as_ref().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join(", ")
        )))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn command(&self) -> WkhtmltopdfCommand {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--quiet");
        cmd.stdout(Stdio::null());
        WkhtmltopdfCommand { cmd }
    }
}

impl PdfRenderer for Wkhtmltopdf {
    fn render_url(&self, url: &str, output: &Path) -> Result<()> {
        let mut wk = self.command();
        wk.input_output(url, output);

        let status = wk
            .cmd()
            .status()
            .map_err(|e| ArchiveError::render(format!("failed to run {}: {}", self.program.display(), e)))?;

        if !status.success() {
            return Err(ArchiveError::render(format!(
                "{} exited with {} rendering {}",
                self.program.display(),
                status,
                url
            )));
        }
        Ok(())
    }

    fn render_html(&self, html: &str, output: &Path) -> Result<()> {
        let mut wk = self.command();
        wk.page_layout().input_output("-", output);

        let mut child = wk
            .cmd()
            .stdin(Stdio::piped())
            .spawn()
            .map_err(|e| ArchiveError::render(format!("failed to run {}: {}", self.program.display(), e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            let written = stdin
                .write_all(html.as_bytes())
                .and_then(|_| stdin.write_all(b"\n"));
            if let Err(e) = written {
                // Reap the engine before reporting, it may already have exited
                drop(stdin);
                let _ = child.wait();
                return Err(ArchiveError::render(format!(
                    "failed to write HTML to renderer: {}",
                    e
                )));
            }
        }

        let status = child
            .wait()
            .map_err(|e| ArchiveError::render(format!("failed to wait for renderer: {}", e)))?;

        if !status.success() {
            return Err(ArchiveError::render(format!(
                "{} exited with {}",
                self.program.display(),
                status
            )));
        }
        Ok(())
    }
}
