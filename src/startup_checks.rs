use crate::Config;
use crate::repository::Repository;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum StartupCheckError {
    #[error("Failed to create content directory: {0}")]
    ContentDirectoryCreationFailed(std::io::Error),

    #[error("Content directory is not writable: {0}")]
    ContentDirectoryNotWritable(std::io::Error),

    #[error("Database is unreachable: {0}")]
    DatabaseUnavailable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl StartupCheckError {
    /// Critical failures abort startup; the rest are logged and tolerated.
    pub fn is_critical(&self) -> bool {
        !matches!(self, StartupCheckError::InvalidConfig(_))
    }
}

pub async fn perform_startup_checks(config: &Config) -> Result<(), Vec<StartupCheckError>> {
    let mut errors = Vec::new();

    info!("Performing startup checks...");

    let content_dir = Path::new(&config.storage.content_directory);
    if !content_dir.exists() {
        info!("Content directory does not exist, creating: {:?}", content_dir);
        if let Err(e) = tokio::fs::create_dir_all(content_dir).await {
            error!("Failed to create content directory: {}", e);
            errors.push(StartupCheckError::ContentDirectoryCreationFailed(e));
        }
    } else {
        info!("Content directory exists: {:?}", content_dir);
    }

    if content_dir.is_dir() {
        // Probe with a throwaway temp file, the same way uploads are staged.
        match tempfile::Builder::new()
            .prefix(".startup_")
            .tempfile_in(content_dir)
        {
            Ok(_) => info!("Content directory is writable"),
            Err(e) => {
                error!("Content directory is not writable: {}", e);
                errors.push(StartupCheckError::ContentDirectoryNotWritable(e));
            }
        }
    }

    match Repository::connect(&config.database).await {
        Ok(repository) => match repository.health_check().await {
            Ok(()) => info!("Database reachable at {}", config.database.url),
            Err(e) => errors.push(StartupCheckError::DatabaseUnavailable(e.to_string())),
        },
        Err(e) => {
            error!("Failed to open database {}: {}", config.database.url, e);
            errors.push(StartupCheckError::DatabaseUnavailable(e.to_string()));
        }
    }

    if config.feed.default_page_size > config.feed.max_page_size {
        warn!(
            "feed.default_page_size ({}) exceeds feed.max_page_size ({}), pages will be clamped",
            config.feed.default_page_size, config.feed.max_page_size
        );
        errors.push(StartupCheckError::InvalidConfig(
            "default_page_size exceeds max_page_size".to_string(),
        ));
    }
    if config.images.thumbnail_width == 0 {
        errors.push(StartupCheckError::InvalidConfig(
            "images.thumbnail_width must be positive".to_string(),
        ));
    }

    if errors.is_empty() {
        info!("All startup checks passed");
        Ok(())
    } else {
        error!("Startup checks failed with {} errors", errors.len());
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(temp_dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.storage.content_directory = temp_dir.path().join("out");
        config.database.url = format!("sqlite://{}", temp_dir.path().join("t.db").display());
        config
    }

    #[tokio::test]
    async fn test_checks_create_content_directory() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(&temp_dir);

        assert!(perform_startup_checks(&config).await.is_ok());
        assert!(config.storage.content_directory.is_dir());
    }

    #[tokio::test]
    async fn test_bad_page_sizes_are_not_critical() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = config_in(&temp_dir);
        config.feed.default_page_size = 500;

        let errors = perform_startup_checks(&config).await.unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(!errors[0].is_critical());
    }

    #[tokio::test]
    async fn test_content_path_that_is_a_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = config_in(&temp_dir);
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();
        config.storage.content_directory = blocker.join("out");

        let errors = perform_startup_checks(&config).await.unwrap_err();
        assert!(errors.iter().any(|e| e.is_critical()));
    }
}
