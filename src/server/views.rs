//! HTML pages served by the blog
//!
//! Titles, slugs and other plain fields are escaped here. `rendered_html` and
//! `excerpt` are already sanitized and are inserted as-is.

use axum::http::StatusCode;
use std::fmt::Write;

use crate::content::{Page, Post, PostSummary};
use crate::helpers::{
    decode_entities, html_escape, page_url, post_url, strip_html, time_tag, truncate,
};

const STYLE: &str = r#"
body { font-family: Georgia, serif; max-width: 64rem; margin: 0 auto; padding: 1rem; color: #222; }
header a { color: inherit; text-decoration: none; }
.layout { display: flex; gap: 2rem; }
main { flex: 3; min-width: 0; }
aside { flex: 1; }
.featured img, article img { max-width: 100%; }
pre { overflow-x: auto; background: #f6f8fa; padding: .75rem; }
.pagination { display: flex; justify-content: space-between; margin-top: 2rem; }
.meta { color: #666; font-size: .9rem; }
"#;

/// Sidebar excerpt length, in characters
const SIDEBAR_EXCERPT: usize = 80;

/// Wrap page content in the site layout
fn layout(site_title: &str, page_title: Option<&str>, body: &str) -> String {
    let title = match page_title {
        Some(t) => format!("{} | {}", html_escape(t), html_escape(site_title)),
        None => html_escape(site_title),
    };
    format!(
        r#"<!DOCTYPE html>
<html lang="is">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>{STYLE}</style>
</head>
<body>
<header><h1><a href="/">{site}</a></h1></header>
{body}
</body>
</html>
"#,
        title = title,
        site = html_escape(site_title),
        body = body,
    )
}

fn post_meta(date: Option<&chrono::DateTime<chrono::FixedOffset>>, tags: &[String]) -> String {
    let mut meta = String::new();
    if let Some(date) = date {
        meta.push_str(&time_tag(date));
    }
    if !tags.is_empty() {
        let tags: Vec<_> = tags.iter().map(|t| html_escape(t)).collect();
        let _ = write!(meta, r#" <span class="tags">{}</span>"#, tags.join(", "));
    }
    format!(r#"<p class="meta">{}</p>"#, meta.trim())
}

fn summary_card(summary: &PostSummary, class: &str) -> String {
    let image = summary
        .image
        .as_deref()
        .map(|src| {
            format!(
                r#"<img src="{}" alt="" loading="lazy">"#,
                html_escape(src)
            )
        })
        .unwrap_or_default();
    format!(
        r#"<section class="{class}">{image}<h2><a href="{url}">{title}</a></h2>{meta}{excerpt}</section>
"#,
        class = class,
        image = image,
        url = post_url(&summary.slug),
        title = html_escape(&summary.title),
        meta = post_meta(summary.date.as_ref(), &summary.tags),
        excerpt = summary.excerpt,
    )
}

fn sidebar(posts: &[PostSummary]) -> String {
    let mut html = String::from("<aside><h2>Nýjustu pistlar</h2><ul>\n");
    for post in posts {
        let text = decode_entities(&strip_html(&post.excerpt));
        let teaser = truncate(text.trim(), SIDEBAR_EXCERPT, None);
        let _ = writeln!(
            html,
            r#"<li><a href="{}">{}</a><br><small>{}</small></li>"#,
            post_url(&post.slug),
            html_escape(&post.title),
            html_escape(&teaser),
        );
    }
    html.push_str("</ul></aside>");
    html
}

fn pagination(page: &Page) -> String {
    let prev = if page.has_prev {
        format!(r#"<a rel="prev" href="{}">&larr; Nýrri</a>"#, page_url(page.number - 1))
    } else {
        "<span></span>".to_string()
    };
    let next = if page.has_next {
        format!(r#"<a rel="next" href="{}">Eldri &rarr;</a>"#, page_url(page.number + 1))
    } else {
        "<span></span>".to_string()
    };
    format!(
        r#"<nav class="pagination">{prev}<span>{} / {}</span>{next}</nav>"#,
        page.number, page.total_pages
    )
}

/// Index page: on page 1 the newest post is featured above the rest
pub fn index(site_title: &str, page: &Page, recent: &[PostSummary]) -> String {
    let mut main = String::from("<main>\n");

    let rest = match page.items.split_first() {
        Some((featured, rest)) if page.number == 1 => {
            main.push_str(&summary_card(featured, "featured"));
            rest
        }
        _ => &page.items[..],
    };
    for summary in rest {
        main.push_str(&summary_card(summary, "post"));
    }
    if page.items.is_empty() {
        main.push_str("<p>Engir pistlar hér.</p>\n");
    }
    main.push_str(&pagination(page));
    main.push_str("\n</main>");

    let body = format!(r#"<div class="layout">{}{}</div>"#, main, sidebar(recent));
    let title = (page.number > 1).then(|| format!("Síða {}", page.number));
    layout(site_title, title.as_deref(), &body)
}

/// Article page for a single post
pub fn article(site_title: &str, post: &Post) -> String {
    let mut body = String::from("<main><article>\n");
    let _ = writeln!(body, "<h1>{}</h1>", html_escape(&post.title));
    body.push_str(&post_meta(post.date.as_ref(), &post.tags));
    if let Some(updated) = post.updated() {
        let _ = write!(body, r#"<p class="meta">Uppfært {}</p>"#, time_tag(&updated));
    }
    if let Some(image) = &post.image {
        let _ = write!(
            body,
            r#"<figure><img src="{}" alt="{}"></figure>"#,
            html_escape(image),
            html_escape(&post.title)
        );
    }
    body.push('\n');
    body.push_str(&post.rendered_html);
    body.push_str("</article>\n<p><a href=\"/\">&larr; Allir pistlar</a></p></main>");
    layout(site_title, Some(&post.title), &body)
}

/// Minimal page for error responses
pub fn error(site_title: &str, status: StatusCode) -> String {
    let reason = status.canonical_reason().unwrap_or("Error");
    let body = format!(
        r#"<main><h2>{} {}</h2><p><a href="/">&larr; Forsíða</a></p></main>"#,
        status.as_u16(),
        html_escape(reason)
    );
    layout(site_title, Some(reason), &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::FrontMatter;
    use chrono::DateTime;
    use std::path::PathBuf;

    fn summary(slug: &str, title: &str) -> PostSummary {
        PostSummary {
            slug: slug.to_string(),
            title: title.to_string(),
            date: DateTime::parse_from_rfc3339("2024-03-01T12:00:00+00:00").ok(),
            excerpt: format!("<p>About {slug}</p>"),
            tags: vec!["rust".to_string()],
            image: None,
        }
    }

    fn page(items: Vec<PostSummary>, number: usize, total_pages: usize) -> Page {
        Page {
            total_posts: items.len(),
            has_next: number < total_pages,
            has_prev: number > 1,
            items,
            number,
            total_pages,
        }
    }

    #[test]
    fn test_index_features_newest_on_first_page() {
        let items = vec![summary("newest", "Newest"), summary("older", "Older")];
        let html = index("Pistlar", &page(items.clone(), 1, 2), &items);
        assert!(html.contains(r#"<section class="featured">"#));
        assert!(html.contains(r#"<a href="/pistlar/newest/">Newest</a>"#));
        assert!(html.contains(r#"<a rel="next" href="/?page=2">"#));
        assert!(!html.contains(r#"rel="prev""#));
        assert!(html.contains("<aside>"));
    }

    #[test]
    fn test_later_pages_have_no_featured_post() {
        let items = vec![summary("a", "A")];
        let html = index("Pistlar", &page(items, 2, 2), &[]);
        assert!(!html.contains("featured"));
        assert!(html.contains(r#"<a rel="prev" href="/">"#));
        assert!(html.contains("<title>Síða 2 | Pistlar</title>"));
    }

    #[test]
    fn test_titles_are_escaped() {
        let items = vec![summary("x", "<script>alert(1)</script>")];
        let html = index("A & B", &page(items.clone(), 1, 1), &items);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("<title>A &amp; B</title>"));
    }

    #[test]
    fn test_article_page() {
        let post = Post {
            slug: "hello".into(),
            title: "Hello".into(),
            date: DateTime::parse_from_rfc3339("2024-03-01T12:00:00+00:00").ok(),
            tags: Vec::new(),
            image: Some("/assets/img/posts/a.png".into()),
            metadata: FrontMatter::default(),
            raw_body: String::new(),
            rendered_html: "<p>Body <strong>text</strong></p>".into(),
            excerpt: String::new(),
            source_path: PathBuf::from("hello.md"),
        };
        let html = article("Pistlar", &post);
        assert!(html.contains("<h1>Hello</h1>"));
        assert!(html.contains("<p>Body <strong>text</strong></p>"));
        assert!(html.contains(r#"<img src="/assets/img/posts/a.png""#));
        assert!(html.contains("<time"));
    }

    #[test]
    fn test_sidebar_teaser_is_escaped_once() {
        let mut post = summary("tom", "Tom");
        post.excerpt = "<p>Tom &amp; Jerry &lt;3</p>".to_string();
        let html = sidebar(&[post]);
        assert!(html.contains("<small>Tom &amp; Jerry &lt;3</small>"));
        assert!(!html.contains("&amp;amp;"));
    }

    #[test]
    fn test_sidebar_teaser_never_splits_an_entity() {
        let mut post = summary("long", "Long");
        post.excerpt = format!("<p>{}{}</p>", "x".repeat(SIDEBAR_EXCERPT - 5), "&amp;".repeat(6));
        let html = sidebar(&[post]);
        let teaser = html.split("<small>").nth(1).unwrap().split("</small>").next().unwrap();
        assert!(teaser.ends_with("&amp;..."), "{teaser}");
    }

    #[test]
    fn test_error_page() {
        let html = error("Pistlar", StatusCode::NOT_FOUND);
        assert!(html.contains("404 Not Found"));
    }
}
