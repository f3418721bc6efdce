//! Pagination over the ordered post list

use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::Arc;

use super::{Post, PostSummary};
use crate::error::{BlogError, Result};

/// One page of post summaries
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub items: Vec<PostSummary>,
    /// 1-based page number
    pub number: usize,
    pub total_pages: usize,
    pub total_posts: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

/// Slice `posts` into page `page_number` of `page_size` items.
///
/// Pages past the end are empty rather than an error. There is always at least one
/// page, even with no posts.
pub fn paginate(posts: &[Arc<Post>], page_number: i64, page_size: NonZeroUsize) -> Result<Page> {
    let number = usize::try_from(page_number)
        .ok()
        .filter(|&n| n >= 1)
        .ok_or(BlogError::InvalidPageNumber(page_number))?;

    let size = page_size.get();
    let total_posts = posts.len();
    let total_pages = total_posts.div_ceil(size).max(1);

    let items = (number - 1)
        .checked_mul(size)
        .and_then(|offset| posts.get(offset..))
        .unwrap_or_default()
        .iter()
        .take(size)
        .map(|post| post.summary())
        .collect();

    Ok(Page {
        items,
        number,
        total_pages,
        total_posts,
        has_next: number < total_pages,
        has_prev: number > 1,
    })
}

/// Summaries of the first `n` posts
pub fn recent(posts: &[Arc<Post>], n: usize) -> Vec<PostSummary> {
    posts.iter().take(n).map(|post| post.summary()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::FrontMatter;
    use std::path::PathBuf;

    fn posts(count: usize) -> Vec<Arc<Post>> {
        (0..count)
            .map(|i| {
                Arc::new(Post {
                    slug: format!("post-{i:02}"),
                    title: format!("Post {i}"),
                    date: None,
                    tags: Vec::new(),
                    image: None,
                    metadata: FrontMatter::default(),
                    raw_body: String::new(),
                    rendered_html: String::new(),
                    excerpt: String::new(),
                    source_path: PathBuf::from(format!("post-{i:02}.md")),
                })
            })
            .collect()
    }

    fn size(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_twenty_five_posts_in_pages_of_ten() {
        let posts = posts(25);

        let first = paginate(&posts, 1, size(10)).unwrap();
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.items[0].slug, "post-00");
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.total_posts, 25);
        assert!(first.has_next);
        assert!(!first.has_prev);

        let last = paginate(&posts, 3, size(10)).unwrap();
        assert_eq!(last.items.len(), 5);
        assert_eq!(last.items[0].slug, "post-20");
        assert!(!last.has_next);
        assert!(last.has_prev);
    }

    #[test]
    fn test_page_past_the_end_is_empty() {
        let page = paginate(&posts(25), 4, size(10)).unwrap();
        assert!(page.items.is_empty());
        assert!(!page.has_next);
        assert!(page.has_prev);
        assert_eq!(page.total_pages, 3);

        let page = paginate(&posts(3), i64::MAX, size(10)).unwrap();
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_invalid_page_numbers() {
        let posts = posts(5);
        for n in [0, -1, i64::MIN] {
            assert!(matches!(
                paginate(&posts, n, size(10)),
                Err(BlogError::InvalidPageNumber(m)) if m == n
            ));
        }
    }

    #[test]
    fn test_no_posts_still_has_one_page() {
        let page = paginate(&[], 1, size(10)).unwrap();
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.total_posts, 0);
        assert!(!page.has_next);
    }

    #[test]
    fn test_pages_cover_every_post_once() {
        let posts = posts(23);
        let mut seen = Vec::new();
        for n in 1..=3 {
            let page = paginate(&posts, n, size(7)).unwrap();
            seen.extend(page.items.into_iter().map(|s| s.slug));
        }
        seen.extend(
            paginate(&posts, 4, size(7))
                .unwrap()
                .items
                .into_iter()
                .map(|s| s.slug),
        );
        let expected: Vec<_> = posts.iter().map(|p| p.slug.clone()).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_recent() {
        let posts = posts(12);
        let sidebar = recent(&posts, 10);
        assert_eq!(sidebar.len(), 10);
        assert_eq!(sidebar[9].slug, "post-09");
        assert_eq!(recent(&posts[..3], 10).len(), 3);
    }
}
