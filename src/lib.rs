//! pistlar: a self-hosted markdown blog server
//!
//! Posts are markdown files with YAML front matter. They are rendered with
//! pulldown-cmark, sanitized against a fixed allow-list, and served newest first
//! over HTTP together with a static assets directory.

pub mod assets;
pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod helpers;
pub mod server;

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use assets::AssetResolver;
use config::SiteConfig;
use content::{paginate, HealthStatus, Page, Post, PostLoader, PostRepository};

/// The blog: configuration, post repository and assets
pub struct Blog {
    /// Site configuration
    pub config: SiteConfig,
    repository: PostRepository,
    assets: AssetResolver,
}

impl Blog {
    /// Open the posts and assets directories named by `config` and run the first scan
    pub fn from_config(config: SiteConfig) -> Result<Self> {
        let assets = AssetResolver::new(&config.assets_dir)
            .with_context(|| format!("Cannot open assets directory {:?}", config.assets_dir))?;

        let loader = PostLoader::new(config.highlight, config.assets_url_prefix.clone());
        let repository = PostRepository::open(&config.posts_dir, loader)?;

        Ok(Self {
            config,
            repository,
            assets,
        })
    }

    /// Page `page_number` (1-based) of the post listing
    pub fn list_posts(&self, page_number: i64) -> error::Result<Page> {
        let snapshot = self.repository.list_all();
        paginate(snapshot.posts(), page_number, self.config.page_size)
    }

    pub fn get_post(&self, slug: &str) -> error::Result<Arc<Post>> {
        self.repository.get(slug)
    }

    /// Map an asset request path to a file inside the assets directory
    pub fn resolve_asset(&self, path: &str) -> error::Result<PathBuf> {
        self.assets.resolve(path)
    }

    /// Rescan the posts directory
    pub fn refresh(&self) -> error::Result<HealthStatus> {
        self.repository.refresh()
    }

    pub fn health_status(&self) -> HealthStatus {
        self.repository.health()
    }

    pub fn repository(&self) -> &PostRepository {
        &self.repository
    }
}
