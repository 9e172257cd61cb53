use anyhow::{bail, Result};
use fs_err as fs;
use std::path::{Path, PathBuf};

pub const DOWNLOAD_FILE: &str = "generated-website.html";
pub const DOWNLOAD_MIME: &str = "text/html";
pub const PREVIEW_FILE: &str = "preview.html";

#[derive(Debug)]
pub struct Exported {
    pub path: PathBuf,
    pub bytes: usize,
    pub mime: &'static str,
}

/// Writes the current artifact as `generated-website.html` in `dir`.
pub fn download(artifact: Option<&str>, dir: &Path) -> Result<Exported> {
    let Some(html) = artifact else {
        bail!("Generate a website first before downloading.");
    };
    fs::create_dir_all(dir)?;
    let path = dir.join(DOWNLOAD_FILE);
    fs::write(&path, html)?;
    Ok(Exported { path, bytes: html.len(), mime: DOWNLOAD_MIME })
}

/// Writes a wrapper page that renders the artifact in a sandboxed iframe.
/// Scripts run; same-origin access, forms, popups and top navigation do not.
pub fn write_preview(artifact: Option<&str>, dir: &Path) -> Result<Exported> {
    let Some(html) = artifact else {
        bail!("Enter a prompt to generate a website first.");
    };
    fs::create_dir_all(dir)?;
    let page = preview_page(html);
    let path = dir.join(PREVIEW_FILE);
    fs::write(&path, &page)?;
    Ok(Exported { path, bytes: page.len(), mime: DOWNLOAD_MIME })
}

pub fn preview_page(html: &str) -> String {
    format!(
r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Website Preview</title>
<style>html,body{{margin:0;height:100%;background:#fff}}iframe{{border:none;width:100%;height:100%}}</style>
</head>
<body>
<iframe title="Website Preview" sandbox="allow-scripts" srcdoc="{}"></iframe>
</body>
</html>
"#,
        escape_attr(html)
    )
}

fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + s.len() / 8);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
