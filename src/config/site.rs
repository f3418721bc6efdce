//! Site configuration (pistlar.yml + environment)

use serde::{Deserialize, Serialize};
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use super::ConfigError;

/// Main site configuration
///
/// Built from defaults, then an optional YAML file, then environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Directory
    pub posts_dir: PathBuf,
    pub assets_dir: PathBuf,

    // Site
    pub site_title: String,
    pub assets_url_prefix: String,

    // Pagination
    pub page_size: NonZeroUsize,

    // Rendering
    pub highlight: bool,

    /// Seconds between background checks for changed posts; off when unset
    pub refresh_ttl_secs: Option<u64>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            posts_dir: PathBuf::from("content/posts"),
            assets_dir: PathBuf::from("content/assets"),

            site_title: "Pistlar".to_string(),
            assets_url_prefix: "/assets".to_string(),

            page_size: NonZeroUsize::new(10).unwrap_or(NonZeroUsize::MIN),

            highlight: true,
            refresh_ttl_secs: None,
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file.
    ///
    /// Relative directories are taken relative to the file's own directory.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let mut config: SiteConfig = serde_yaml::from_str(&content)?;

        if let Some(base) = path.parent() {
            config.posts_dir = base.join(&config.posts_dir);
            config.assets_dir = base.join(&config.assets_dir);
        }

        tracing::debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Defaults or `path`, overridden by the process environment, then validated
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_env(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from `POSTS_DIR`, `ASSETS_DIR`, `PAGE_SIZE`, `SITE_TITLE` and
    /// `REFRESH_TTL_SECS`, looked up through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("POSTS_DIR") {
            self.posts_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("ASSETS_DIR") {
            self.assets_dir = PathBuf::from(dir);
        }
        if let Some(title) = lookup("SITE_TITLE") {
            self.site_title = title;
        }
        if let Some(size) = lookup("PAGE_SIZE") {
            self.page_size = size
                .trim()
                .parse::<NonZeroUsize>()
                .map_err(|_| ConfigError::Env {
                    var: "PAGE_SIZE",
                    reason: format!("expected a positive integer, got {:?}", size),
                })?;
        }
        if let Some(ttl) = lookup("REFRESH_TTL_SECS") {
            let secs = ttl.trim().parse::<u64>().map_err(|_| ConfigError::Env {
                var: "REFRESH_TTL_SECS",
                reason: format!("expected a number of seconds, got {:?}", ttl),
            })?;
            self.refresh_ttl_secs = (secs > 0).then_some(secs);
        }
        Ok(())
    }

    /// Check that the configuration can be served
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, dir) in [("posts_dir", &self.posts_dir), ("assets_dir", &self.assets_dir)] {
            if !dir.is_dir() {
                return Err(ConfigError::Validation(format!(
                    "{} {:?} is not a directory",
                    name, dir
                )));
            }
        }
        if self.site_title.trim().is_empty() {
            return Err(ConfigError::Validation("site_title is empty".to_string()));
        }
        if !self.assets_url_prefix.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "assets_url_prefix {:?} must start with '/'",
                self.assets_url_prefix
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.site_title, "Pistlar");
        assert_eq!(config.posts_dir, PathBuf::from("content/posts"));
        assert_eq!(config.page_size.get(), 10);
        assert!(config.highlight);
        assert_eq!(config.refresh_ttl_secs, None);
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
site_title: My Blog
page_size: 5
highlight: false
refresh_ttl_secs: 30
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.site_title, "My Blog");
        assert_eq!(config.page_size.get(), 5);
        assert!(!config.highlight);
        assert_eq!(config.refresh_ttl_secs, Some(30));
        assert_eq!(config.assets_url_prefix, "/assets");
    }

    #[test]
    fn test_zero_page_size_in_file_is_rejected() {
        assert!(serde_yaml::from_str::<SiteConfig>("page_size: 0").is_err());
    }

    #[test]
    fn test_load_resolves_dirs_against_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pistlar.yml");
        fs::write(&path, "posts_dir: blog/posts\n").unwrap();

        let config = SiteConfig::load(&path).unwrap();
        assert_eq!(config.posts_dir, dir.path().join("blog/posts"));
        assert_eq!(config.assets_dir, dir.path().join("content/assets"));
    }

    #[test]
    fn test_load_errors() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            SiteConfig::load(dir.path().join("missing.yml")),
            Err(ConfigError::Io(..))
        ));

        let path = dir.path().join("bad.yml");
        fs::write(&path, "page_size: [1, 2").unwrap();
        assert!(matches!(SiteConfig::load(&path), Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = SiteConfig::default();
        config
            .apply_env(env(&[
                ("POSTS_DIR", "/srv/posts"),
                ("PAGE_SIZE", " 25 "),
                ("SITE_TITLE", "Other"),
                ("REFRESH_TTL_SECS", "60"),
            ]))
            .unwrap();
        assert_eq!(config.posts_dir, PathBuf::from("/srv/posts"));
        assert_eq!(config.assets_dir, PathBuf::from("content/assets"));
        assert_eq!(config.page_size.get(), 25);
        assert_eq!(config.site_title, "Other");
        assert_eq!(config.refresh_ttl_secs, Some(60));
    }

    #[test]
    fn test_invalid_env_values() {
        for (var, value) in [
            ("PAGE_SIZE", "abc"),
            ("PAGE_SIZE", "0"),
            ("PAGE_SIZE", "-3"),
            ("REFRESH_TTL_SECS", "soon"),
        ] {
            let mut config = SiteConfig::default();
            let err = config.apply_env(env(&[(var, value)])).unwrap_err();
            assert!(
                matches!(err, ConfigError::Env { var: v, .. } if v == var),
                "{var}={value}"
            );
        }
    }

    #[test]
    fn test_validate() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("posts")).unwrap();
        fs::create_dir_all(dir.path().join("assets")).unwrap();

        let mut config = SiteConfig {
            posts_dir: dir.path().join("posts"),
            assets_dir: dir.path().join("assets"),
            ..SiteConfig::default()
        };
        assert!(config.validate().is_ok());

        config.site_title = "  ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        config.site_title = "Pistlar".to_string();
        config.assets_dir = dir.path().join("missing");
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }
}
