use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the home directory and an initial `config.json`.
///
/// # Arguments
/// - `home` - The directory that will be the home directory, e.g. `$HOME/moneymanager`
/// - `completion_url` - Base URL of the completion server, defaults to `http://localhost:11434/`
/// - `model` - The model name, defaults to `qwen2.5:1.5b`
///
/// # Errors
/// - Returns an error if the home is already initialized or if any file operation fails.
pub async fn init(
    home: &Path,
    completion_url: Option<&str>,
    model: Option<&str>,
) -> Result<Out<()>> {
    let config = Config::create(home, completion_url, model)
        .await
        .context("Unable to create the home directory and config")
        .pub_result(ErrorType::Config)?;
    Ok(format!(
        "Successfully created {} using model '{}' at {}",
        config.root().display(),
        config.model(),
        config.completion_url()
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("mm");
        let out = init(&home, None, Some("llama3.2")).await.unwrap();
        assert!(out.message().contains("llama3.2"));
        assert!(home.join("config.json").is_file());

        let again = init(&home, None, None).await.unwrap_err();
        assert_eq!(again.error_type(), ErrorType::Config);
    }
}
