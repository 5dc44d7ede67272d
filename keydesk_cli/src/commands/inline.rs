//! Inline command: produce the single-file bundle

use crate::inline::{self, InlinePaths};
use anyhow::Result;
use console::style;
use std::path::PathBuf;

/// Inline command options
pub struct InlineOptions {
    pub output: Option<PathBuf>,
    pub dist: PathBuf,
    pub html: Option<PathBuf>,
    pub js: Option<PathBuf>,
    pub css: Option<PathBuf>,
}

impl InlineOptions {
    /// Resolve file locations, falling back to the build directory layout
    pub fn paths(&self) -> InlinePaths {
        let defaults = InlinePaths::from_dist(&self.dist);
        InlinePaths {
            html: self.html.clone().unwrap_or(defaults.html),
            js: self.js.clone().unwrap_or(defaults.js),
            css: self.css.clone().unwrap_or(defaults.css),
            output: self.output.clone().unwrap_or(defaults.output),
        }
    }
}

/// Run the inline command
pub fn run(opts: InlineOptions) -> Result<()> {
    let paths = opts.paths();

    inline::inline(&paths, true)?;

    println!(
        "{} {}",
        style("Bundle written to").green(),
        style(paths.output.display()).cyan()
    );
    Ok(())
}
