//! URL helper functions

/// Path of the article page for `slug`
pub fn post_url(slug: &str) -> String {
    format!("/pistlar/{}/", slug)
}

/// Path of index page `number`; page 1 is the site root
pub fn page_url(number: usize) -> String {
    if number <= 1 {
        "/".to_string()
    } else {
        format!("/?page={}", number)
    }
}

/// Turn a front-matter image reference into a URL under the assets prefix.
///
/// # Examples
/// ```ignore
/// normalize_image_url("cover.jpg", "/assets")       // -> "/assets/img/posts/cover.jpg"
/// normalize_image_url("images/a.png", "/assets")    // -> "/assets/images/a.png"
/// normalize_image_url("/assets/b.png", "/assets")   // -> "/assets/b.png"
/// normalize_image_url("https://x.io/c.png", "/assets") // unchanged
/// ```
pub fn normalize_image_url(image: &str, assets_prefix: &str) -> String {
    let image = image.trim();
    let image = image.strip_prefix(':').unwrap_or(image);

    if image.starts_with("http://") || image.starts_with("https://") || image.starts_with("data:")
    {
        return image.to_string();
    }

    let image = image.trim_start_matches('/');
    let prefix = assets_prefix.trim_end_matches('/');

    if image.starts_with("assets/") {
        format!("/{}", image)
    } else if image.starts_with("img/") || image.starts_with("images/") {
        format!("{}/{}", prefix, image)
    } else {
        format!("{}/img/posts/{}", prefix, image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_and_page_urls() {
        assert_eq!(post_url("hello-world"), "/pistlar/hello-world/");
        assert_eq!(page_url(1), "/");
        assert_eq!(page_url(3), "/?page=3");
    }

    #[test]
    fn test_normalize_image_url() {
        assert_eq!(normalize_image_url("cover.jpg", "/assets"), "/assets/img/posts/cover.jpg");
        assert_eq!(normalize_image_url(":cover.jpg", "/assets/"), "/assets/img/posts/cover.jpg");
        assert_eq!(normalize_image_url("img/a.png", "/assets"), "/assets/img/a.png");
        assert_eq!(normalize_image_url("/images/a.png", "/static"), "/static/images/a.png");
        assert_eq!(normalize_image_url("/assets/b.png", "/static"), "/assets/b.png");
        assert_eq!(
            normalize_image_url("https://example.com/c.png", "/assets"),
            "https://example.com/c.png"
        );
        assert_eq!(normalize_image_url("data:image/png;base64,AA", "/assets"), "data:image/png;base64,AA");
    }
}
