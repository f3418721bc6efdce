//! Post repository - the current snapshot of all posts and how it is refreshed
//!
//! Readers load the snapshot lock-free and keep the `Arc` for as long as they need it.
//! A refresh builds a complete new snapshot off to the side and swaps it in, so a reader
//! sees either the old post set or the new one, never a mix.

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use super::loader::{discover, fingerprint, PostLoader, ScanBatch};
use super::post::listing_order;
use super::Post;
use crate::error::{BlogError, Result};

/// A file left out of the current snapshot, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Immutable set of posts produced by one scan
#[derive(Debug)]
pub struct Snapshot {
    posts: Vec<Arc<Post>>,
    by_slug: HashMap<String, usize>,
    failures: Vec<FileFailure>,
    fingerprint: u64,
    generation: u64,
    built_at: DateTime<Utc>,
}

impl Snapshot {
    /// Build a snapshot from scan results.
    ///
    /// Results must be in path order: when two files claim the same slug the first one
    /// keeps it and the later one is recorded as a [`BlogError::DuplicateSlug`] failure.
    pub fn build(batch: ScanBatch, generation: u64) -> Self {
        let mut posts: Vec<Post> = Vec::with_capacity(batch.results.len());
        let mut failures = Vec::new();
        let mut taken: HashMap<String, PathBuf> = HashMap::new();

        for (path, result) in batch.results {
            let outcome = result.and_then(|post| match taken.get(&post.slug) {
                Some(winner) => {
                    tracing::debug!("{:?} loses slug {} to {:?}", path, post.slug, winner);
                    Err(BlogError::DuplicateSlug {
                        slug: post.slug,
                        path: path.clone(),
                    })
                }
                None => Ok(post),
            });

            match outcome {
                Ok(post) => {
                    taken.insert(post.slug.clone(), path);
                    posts.push(post);
                }
                Err(err) => {
                    let reason = err.chain();
                    tracing::warn!("Skipping {:?}: {}", path, reason);
                    failures.push(FileFailure { path, reason });
                }
            }
        }

        posts.sort_by(listing_order);
        let posts: Vec<Arc<Post>> = posts.into_iter().map(Arc::new).collect();
        let by_slug = posts
            .iter()
            .enumerate()
            .map(|(i, post)| (post.slug.clone(), i))
            .collect();

        Self {
            posts,
            by_slug,
            failures,
            fingerprint: batch.fingerprint,
            generation,
            built_at: Utc::now(),
        }
    }

    /// Posts in listing order
    pub fn posts(&self) -> &[Arc<Post>] {
        &self.posts
    }

    pub fn get(&self, slug: &str) -> Option<&Arc<Post>> {
        self.by_slug.get(slug).map(|&i| &self.posts[i])
    }

    pub fn failures(&self) -> &[FileFailure] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }
}

/// Repository state reported by `/health`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthStatus {
    pub ready: bool,
    pub post_count: usize,
    pub failed_files: Vec<FileFailure>,
    pub generation: u64,
    pub built_at: DateTime<Utc>,
    /// The last refresh failed and an older snapshot is being served
    pub degraded: bool,
}

/// Outcome of the most recent refresh, kept for callers that waited on it
#[derive(Debug, Default)]
struct LastRefresh {
    forced: bool,
    failure: Option<(io::ErrorKind, String)>,
}

/// Owns the posts root and the current snapshot
pub struct PostRepository {
    root: PathBuf,
    loader: PostLoader,
    snapshot: ArcSwap<Snapshot>,
    refresh_lock: Mutex<LastRefresh>,
    // Bumped under `refresh_lock` when a refresh starts scanning
    started: AtomicU64,
    degraded: AtomicBool,
}

impl PostRepository {
    /// Scan `root` and build the first snapshot.
    ///
    /// An unreadable root is fatal here; later refreshes fall back to the last snapshot.
    pub fn open(root: impl Into<PathBuf>, loader: PostLoader) -> Result<Self> {
        let root = root.into();
        let batch = loader.scan(&root)?;
        let snapshot = Snapshot::build(batch, 1);

        tracing::info!(
            "Loaded {} posts from {:?} ({} failed)",
            snapshot.len(),
            root,
            snapshot.failures().len()
        );

        Ok(Self {
            root,
            loader,
            snapshot: ArcSwap::from_pointee(snapshot),
            refresh_lock: Mutex::new(LastRefresh::default()),
            started: AtomicU64::new(0),
            degraded: AtomicBool::new(false),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The current snapshot
    pub fn list_all(&self) -> Arc<Snapshot> {
        self.snapshot.load_full()
    }

    /// Look up a post by slug in the current snapshot
    pub fn get(&self, slug: &str) -> Result<Arc<Post>> {
        self.snapshot
            .load()
            .get(slug)
            .cloned()
            .ok_or_else(|| BlogError::PostNotFound(slug.to_string()))
    }

    /// Rescan the posts root unconditionally
    pub fn refresh(&self) -> Result<HealthStatus> {
        self.refresh_with(true)
    }

    /// Rescan only when files were added, removed or modified since the last snapshot
    pub fn refresh_if_changed(&self) -> Result<HealthStatus> {
        self.refresh_with(false)
    }

    /// Run a refresh, or share one that started after this call was made.
    ///
    /// A refresh that was already scanning when the call arrived may have missed
    /// recent writes, so the caller waits for it and then scans again.
    fn refresh_with(&self, force: bool) -> Result<HealthStatus> {
        let requested = self.started.load(Ordering::Acquire);
        let mut last = self.refresh_lock.lock();

        if self.started.load(Ordering::Acquire) > requested && (last.forced || !force) {
            tracing::debug!("Refresh finished while waiting, reusing its result");
            return match &last.failure {
                Some((kind, message)) => Err(BlogError::RepositoryUnavailable {
                    path: self.root.clone(),
                    source: io::Error::new(*kind, message.clone()),
                }),
                None => Ok(self.health()),
            };
        }

        self.started.fetch_add(1, Ordering::AcqRel);
        let outcome = self.rebuild(force);

        last.forced = force;
        last.failure = match &outcome {
            Ok(()) => None,
            Err(BlogError::RepositoryUnavailable { source, .. }) => {
                Some((source.kind(), source.to_string()))
            }
            Err(err) => Some((io::ErrorKind::Other, err.chain())),
        };

        outcome.map(|_| self.health())
    }

    fn rebuild(&self, force: bool) -> Result<()> {
        let files = match discover(&self.root) {
            Ok(files) => files,
            Err(err) => {
                self.degraded.store(true, Ordering::Release);
                tracing::warn!("Refresh failed, keeping last snapshot: {}", err.chain());
                return Err(err);
            }
        };

        let current = self.snapshot.load();
        let fingerprint = fingerprint(&self.root, &files);
        if !force && fingerprint == current.fingerprint() {
            tracing::debug!("Posts root unchanged, skipping rescan");
            self.degraded.store(false, Ordering::Release);
            return Ok(());
        }

        let generation = current.generation() + 1;
        let snapshot = Snapshot::build(self.loader.load_batch(files, fingerprint), generation);
        tracing::info!(
            "Refreshed posts: {} loaded, {} failed (generation {})",
            snapshot.len(),
            snapshot.failures().len(),
            generation
        );

        self.snapshot.store(Arc::new(snapshot));
        self.degraded.store(false, Ordering::Release);
        Ok(())
    }

    pub fn health(&self) -> HealthStatus {
        let snapshot = self.snapshot.load();
        HealthStatus {
            ready: true,
            post_count: snapshot.len(),
            failed_files: snapshot.failures().to_vec(),
            generation: snapshot.generation(),
            built_at: snapshot.built_at(),
            degraded: self.degraded.load(Ordering::Acquire),
        }
    }
}
