//! Check that every post file loads

use anyhow::Result;
use std::io::Write;

use crate::Blog;

/// Print every file that failed to load.
///
/// Returns `false` when at least one file failed.
pub fn run(blog: &Blog) -> Result<bool> {
    let stdout = std::io::stdout();
    write_report(blog, &mut stdout.lock())
}

fn write_report<W: Write>(blog: &Blog, out: &mut W) -> Result<bool> {
    let health = blog.health_status();

    writeln!(
        out,
        "{} posts loaded, {} failed",
        health.post_count,
        health.failed_files.len()
    )?;
    for failure in &health.failed_files {
        writeln!(out, "  {}: {}", failure.path.display(), failure.reason)?;
    }

    Ok(health.failed_files.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use std::fs;
    use tempfile::TempDir;

    fn blog(dir: &TempDir, files: &[(&str, &str)]) -> Blog {
        let posts = dir.path().join("posts");
        let assets = dir.path().join("assets");
        fs::create_dir_all(&posts).unwrap();
        fs::create_dir_all(&assets).unwrap();
        for (name, content) in files {
            fs::write(posts.join(name), content).unwrap();
        }
        Blog::from_config(SiteConfig {
            posts_dir: posts,
            assets_dir: assets,
            ..SiteConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_clean_tree_passes() {
        let dir = TempDir::new().unwrap();
        let blog = blog(&dir, &[("ok.md", "---\ntitle: Ok\n---\nBody")]);
        let mut out = Vec::new();
        assert!(write_report(&blog, &mut out).unwrap());
        assert_eq!(String::from_utf8(out).unwrap(), "1 posts loaded, 0 failed\n");
    }

    #[test]
    fn test_failures_are_reported() {
        let dir = TempDir::new().unwrap();
        let blog = blog(
            &dir,
            &[("ok.md", "Body"), ("broken.md", "---\ntitle: [\n---\nBody")],
        );
        let mut out = Vec::new();
        assert!(!write_report(&blog, &mut out).unwrap());
        let report = String::from_utf8(out).unwrap();
        assert!(report.starts_with("1 posts loaded, 1 failed\n"));
        assert!(report.contains("broken.md: malformed front matter"));
    }
}
