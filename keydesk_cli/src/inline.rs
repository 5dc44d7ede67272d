//! Asset inliner: splice compiled JS and CSS into the HTML shell
//!
//! The transform is textual. It finds the first occurrence of a marker file
//! name and replaces the surrounding tag by scanning for `<` and `>`. The
//! script tag spans two `>` (`<script ...>` and `</script>`), the stylesheet
//! `<link>` tag spans one.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name that marks the script tag
pub const SCRIPT_MARKER: &str = "main.js";

/// File name that marks the stylesheet tag
pub const STYLE_MARKER: &str = "styles.css";

/// Inliner errors
#[derive(Debug, Error)]
pub enum InlineError {
    #[error("Marker \"{marker}\" not found in HTML")]
    MarkerNotFound { marker: &'static str },

    #[error("No opening '<' before marker \"{marker}\"")]
    TagStartNotFound { marker: &'static str },

    #[error("Tag around marker \"{marker}\" is not closed")]
    TagEndNotFound { marker: &'static str },

    #[error("Output file already exists: {}", path.display())]
    AlreadyExists { path: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("Failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("Failed to remove {}: {source}", path.display())]
    Remove { path: PathBuf, source: io::Error },
}

/// Input and output locations of one inlining run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlinePaths {
    pub html: PathBuf,
    pub js: PathBuf,
    pub css: PathBuf,
    pub output: PathBuf,
}

impl InlinePaths {
    /// Standard build layout: `index.html`, `main.js`, `styles.css` and `bundle.html` in `dir`
    pub fn from_dist(dir: &Path) -> Self {
        Self {
            html: dir.join("index.html"),
            js: dir.join(SCRIPT_MARKER),
            css: dir.join(STYLE_MARKER),
            output: dir.join("bundle.html"),
        }
    }
}

/// Byte range of the tag around the first `marker`, ending at the `closing`-th `>`
fn locate_tag(html: &str, marker: &'static str, closing: usize) -> Result<Range<usize>, InlineError> {
    let pos = html
        .find(marker)
        .ok_or(InlineError::MarkerNotFound { marker })?;

    let start = html[..pos]
        .rfind('<')
        .ok_or(InlineError::TagStartNotFound { marker })?;

    let end = html[pos..]
        .match_indices('>')
        .nth(closing - 1)
        .map(|(i, _)| pos + i + 1)
        .ok_or(InlineError::TagEndNotFound { marker })?;

    Ok(start..end)
}

fn splice(html: &str, span: Range<usize>, open: &str, content: &str, close: &str) -> String {
    let mut out = String::with_capacity(html.len() + content.len() + open.len() + close.len());
    out.push_str(&html[..span.start]);
    out.push_str(open);
    out.push_str(content);
    out.push_str(close);
    out.push_str(&html[span.end..]);
    out
}

/// Replace the `main.js` script tag with an inline `<script>` block
pub fn inline_script(html: &str, js: &str) -> Result<String, InlineError> {
    let span = locate_tag(html, SCRIPT_MARKER, 2)?;
    Ok(splice(html, span, "<script>", js, "</script>"))
}

/// Replace the `styles.css` link tag with an inline `<style>` block
pub fn inline_style(html: &str, css: &str) -> Result<String, InlineError> {
    let span = locate_tag(html, STYLE_MARKER, 1)?;
    Ok(splice(html, span, "<style>", css, "</style>"))
}

/// Inline the script, then the stylesheet
pub fn bundle(html: &str, js: &str, css: &str) -> Result<String, InlineError> {
    let html = inline_script(html, js)?;
    inline_style(&html, css)
}

/// Write `contents` to a file that must not exist yet
pub fn write_new(path: &Path, contents: &str) -> Result<(), InlineError> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|source| match source.kind() {
            io::ErrorKind::AlreadyExists => InlineError::AlreadyExists {
                path: path.to_path_buf(),
            },
            _ => InlineError::Write {
                path: path.to_path_buf(),
                source,
            },
        })?;

    file.write_all(contents.as_bytes())
        .map_err(|source| InlineError::Write {
            path: path.to_path_buf(),
            source,
        })
}

fn read(path: &Path) -> Result<String, InlineError> {
    fs::read_to_string(path).map_err(|source| InlineError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Read the inputs of `paths` and build the bundle in memory
fn prepare(paths: &InlinePaths) -> Result<String, InlineError> {
    let html = read(&paths.html)?;
    let js = read(&paths.js)?;
    let css = read(&paths.css)?;

    bundle(&html, &js, &css)
}

/// Delete an existing output. A missing file is not an error.
fn remove_existing(path: &Path) -> Result<(), InlineError> {
    match fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "removed previous bundle");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(InlineError::Remove {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Build the single-file bundle described by `paths`.
///
/// The bundle is built in memory first, so a failed transform leaves any
/// existing output untouched. With `replace` an existing output is removed
/// before the exclusive-create write, otherwise it fails with
/// [`InlineError::AlreadyExists`].
pub fn inline(paths: &InlinePaths, replace: bool) -> Result<(), InlineError> {
    let bundled = prepare(paths)?;

    if replace {
        remove_existing(&paths.output)?;
    }
    write_new(&paths.output, &bundled)?;

    tracing::info!(
        output = %paths.output.display(),
        bytes = bundled.len(),
        "bundle written"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "<!DOCTYPE html><html><head><title>Keys</title>\
<link rel=\"stylesheet\" href=\"styles.css\"></head>\
<body><table id=\"clientList\"></table>\
<script defer src=\"main.js\"></script></body></html>";

    #[test]
    fn test_bundle_replaces_both_tags() {
        let out = bundle(PAGE, "let a = 1;", "td { color: red; }").unwrap();

        assert_eq!(
            out,
            "<!DOCTYPE html><html><head><title>Keys</title>\
<style>td { color: red; }</style></head>\
<body><table id=\"clientList\"></table>\
<script>let a = 1;</script></body></html>"
        );
        assert!(!out.contains("main.js"));
        assert!(!out.contains("styles.css"));
    }

    #[test]
    fn test_end_to_end_example() {
        let html = "<html><head><link href=\"styles.css\"></head><body><p>hi</p>\
<script src=\"main.js\"></script></body></html>";
        let out = bundle(html, "console.log(1)", "body{color:red}").unwrap();
        assert_eq!(
            out,
            "<html><head><style>body{color:red}</style></head><body><p>hi</p>\
<script>console.log(1)</script></body></html>"
        );
    }

    #[test]
    fn test_only_first_marker_is_replaced() {
        let html = "<script src=\"main.js\"></script><script src=\"main.js\"></script>";
        let out = inline_script(html, "x").unwrap();
        assert_eq!(out, "<script>x</script><script src=\"main.js\"></script>");
    }

    #[test]
    fn test_tag_at_start_of_document() {
        let out = inline_style("<link href=\"styles.css\">rest", "a{}").unwrap();
        assert_eq!(out, "<style>a{}</style>rest");
    }

    #[test]
    fn test_multibyte_content_is_preserved() {
        let html = "<p>Schlüssel ✓</p><script src=\"main.js\"></script><p>naïve</p>";
        let out = inline_script(html, "const s = \"é\";").unwrap();
        assert_eq!(out, "<p>Schlüssel ✓</p><script>const s = \"é\";</script><p>naïve</p>");
    }

    #[test]
    fn test_missing_markers_are_reported() {
        let no_script = "<html><link href=\"styles.css\"></html>";
        match bundle(no_script, "", "") {
            Err(InlineError::MarkerNotFound { marker }) => assert_eq!(marker, SCRIPT_MARKER),
            other => panic!("expected missing script marker, got {:?}", other),
        }

        let no_style = "<html><script src=\"main.js\"></script></html>";
        match bundle(no_style, "", "") {
            Err(InlineError::MarkerNotFound { marker }) => assert_eq!(marker, STYLE_MARKER),
            other => panic!("expected missing style marker, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_tags_are_reported() {
        assert!(matches!(
            inline_script("main.js\"></script>", ""),
            Err(InlineError::TagStartNotFound { .. })
        ));
        assert!(matches!(
            inline_script("<script src=\"main.js\">", ""),
            Err(InlineError::TagEndNotFound { .. })
        ));
    }

    #[test]
    fn test_inline_writes_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let paths = InlinePaths::from_dist(dir.path());
        fs::write(&paths.html, PAGE).unwrap();
        fs::write(&paths.js, "run();").unwrap();
        fs::write(&paths.css, "p{}").unwrap();

        inline(&paths, false).unwrap();

        let out = fs::read_to_string(&paths.output).unwrap();
        assert!(out.contains("<script>run();</script>"));
        assert!(out.contains("<style>p{}</style>"));
    }

    #[test]
    fn test_existing_output_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let paths = InlinePaths::from_dist(dir.path());
        fs::write(&paths.html, PAGE).unwrap();
        fs::write(&paths.js, "run();").unwrap();
        fs::write(&paths.css, "p{}").unwrap();
        fs::write(&paths.output, "previous build").unwrap();

        match inline(&paths, false) {
            Err(InlineError::AlreadyExists { path }) => assert_eq!(path, paths.output),
            other => panic!("expected AlreadyExists, got {:?}", other),
        }
        assert_eq!(fs::read_to_string(&paths.output).unwrap(), "previous build");
    }

    #[test]
    fn test_replace_overwrites_previous_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let paths = InlinePaths::from_dist(dir.path());
        fs::write(&paths.html, PAGE).unwrap();
        fs::write(&paths.js, "run();").unwrap();
        fs::write(&paths.css, "p{}").unwrap();
        fs::write(&paths.output, "previous build").unwrap();

        inline(&paths, true).unwrap();
        assert!(fs::read_to_string(&paths.output)
            .unwrap()
            .contains("<script>run();</script>"));
    }

    #[test]
    fn test_failed_replace_keeps_previous_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let paths = InlinePaths::from_dist(dir.path());
        fs::write(&paths.html, "<html><body></body></html>").unwrap();
        fs::write(&paths.js, "run();").unwrap();
        fs::write(&paths.css, "p{}").unwrap();
        fs::write(&paths.output, "previous build").unwrap();

        match inline(&paths, true) {
            Err(InlineError::MarkerNotFound { marker }) => assert_eq!(marker, SCRIPT_MARKER),
            other => panic!("expected missing script marker, got {:?}", other),
        }
        assert_eq!(fs::read_to_string(&paths.output).unwrap(), "previous build");
    }

    #[test]
    fn test_failed_transform_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let paths = InlinePaths::from_dist(dir.path());
        fs::write(&paths.html, "<html></html>").unwrap();
        fs::write(&paths.js, "").unwrap();
        fs::write(&paths.css, "").unwrap();

        assert!(inline(&paths, false).is_err());
        assert!(!paths.output.exists());
    }
}
