//! List site content

use anyhow::Result;
use std::collections::HashMap;
use std::io::Write;

use crate::Blog;

/// List site content by type
pub fn run(blog: &Blog, content_type: &str) -> Result<()> {
    let stdout = std::io::stdout();
    write_listing(blog, content_type, &mut stdout.lock())
}

fn write_listing<W: Write>(blog: &Blog, content_type: &str, out: &mut W) -> Result<()> {
    let snapshot = blog.repository().list_all();

    match content_type {
        "post" | "posts" => {
            writeln!(out, "Posts ({}):", snapshot.len())?;
            for post in snapshot.posts() {
                let date = post
                    .date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "----------".to_string());
                writeln!(out, "  {} - {} [{}]", date, post.title, post.slug)?;
            }
        }
        "tag" | "tags" => {
            let mut tags: HashMap<&str, usize> = HashMap::new();
            for post in snapshot.posts() {
                for tag in &post.tags {
                    *tags.entry(tag.as_str()).or_insert(0) += 1;
                }
            }
            writeln!(out, "Tags ({}):", tags.len())?;
            let mut tags: Vec<_> = tags.into_iter().collect();
            tags.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
            for (tag, count) in tags {
                writeln!(out, "  {} ({})", tag, count)?;
            }
        }
        _ => {
            anyhow::bail!("Unknown type: {}. Available: post, tag", content_type);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use std::fs;
    use tempfile::TempDir;

    fn blog(dir: &TempDir) -> Blog {
        let posts = dir.path().join("posts");
        let assets = dir.path().join("assets");
        fs::create_dir_all(&posts).unwrap();
        fs::create_dir_all(&assets).unwrap();
        fs::write(
            posts.join("a.md"),
            "---\ntitle: Alpha\ndate: 2024-05-01\ntags: [rust, web]\n---\nA",
        )
        .unwrap();
        fs::write(posts.join("b.md"), "---\ntitle: Beta\ntags: rust\n---\nB").unwrap();
        Blog::from_config(SiteConfig {
            posts_dir: posts,
            assets_dir: assets,
            ..SiteConfig::default()
        })
        .unwrap()
    }

    fn listing(blog: &Blog, content_type: &str) -> String {
        let mut out = Vec::new();
        write_listing(blog, content_type, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_list_posts() {
        let dir = TempDir::new().unwrap();
        let output = listing(&blog(&dir), "post");
        assert_eq!(
            output,
            "Posts (2):\n  2024-05-01 - Alpha [a]\n  ---------- - Beta [b]\n"
        );
    }

    #[test]
    fn test_list_tags() {
        let dir = TempDir::new().unwrap();
        let output = listing(&blog(&dir), "tags");
        assert_eq!(output, "Tags (2):\n  rust (2)\n  web (1)\n");
    }

    #[test]
    fn test_unknown_type() {
        let dir = TempDir::new().unwrap();
        let mut out = Vec::new();
        assert!(write_listing(&blog(&dir), "category", &mut out).is_err());
    }
}
