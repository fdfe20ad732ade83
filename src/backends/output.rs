use super::OutputBackend;
use crate::config::OutputConfig;
use crate::error::{BoothError, Result};
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

/// Sends the composite to a print spooler command (e.g. `lp`).
///
/// The composite path is appended as the final argument.
pub struct CommandPrinter {
    command: Vec<String>,
}

impl CommandPrinter {
    pub fn new(config: &OutputConfig) -> Self {
        Self {
            command: config.print_command.clone(),
        }
    }
}

#[async_trait]
impl OutputBackend for CommandPrinter {
    async fn deliver(&mut self, composite: &Path) -> Result<()> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| BoothError::output("print command is empty"))?;

        let status = Command::new(program)
            .args(args)
            .arg(composite)
            .status()
            .await
            .map_err(|e| BoothError::output(format!("failed to run '{}': {}", program, e)))?;

        if !status.success() {
            return Err(BoothError::output(format!(
                "print command exited with {}",
                status
            )));
        }

        info!("Sent {} to the printer", composite.display());
        Ok(())
    }
}

/// Copies the composite into an export directory instead of printing.
pub struct DirectorySaver {
    save_dir: PathBuf,
}

impl DirectorySaver {
    pub fn new(config: &OutputConfig) -> Self {
        Self {
            save_dir: PathBuf::from(&config.save_dir),
        }
    }
}

#[async_trait]
impl OutputBackend for DirectorySaver {
    async fn deliver(&mut self, composite: &Path) -> Result<()> {
        let file_name = composite
            .file_name()
            .ok_or_else(|| BoothError::output("composite path has no file name"))?;

        fs::create_dir_all(&self.save_dir)
            .map_err(|e| BoothError::output(format!("cannot create export directory: {}", e)))?;

        let destination = self.save_dir.join(file_name);
        fs::copy(composite, &destination).map_err(|e| {
            BoothError::output(format!(
                "failed to export to {}: {}",
                destination.display(),
                e
            ))
        })?;

        info!("Exported composite to {}", destination.display());
        Ok(())
    }
}

/// Records deliveries without side effects, for development and tests.
pub struct MockOutput {
    delivered: Vec<PathBuf>,
}

impl MockOutput {
    pub fn new() -> Self {
        Self {
            delivered: Vec::new(),
        }
    }

    pub fn delivered(&self) -> &[PathBuf] {
        &self.delivered
    }
}

impl Default for MockOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OutputBackend for MockOutput {
    async fn deliver(&mut self, composite: &Path) -> Result<()> {
        debug!("Mock delivery of {}", composite.display());
        self.delivered.push(composite.to_path_buf());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoothConfig;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_directory_saver_copies_composite() {
        let tmp = TempDir::new().unwrap();
        let composite = tmp.path().join("1700000000.jpg");
        fs::write(&composite, b"jpeg bytes").unwrap();

        let mut config = BoothConfig::default().output;
        config.save_dir = tmp.path().join("prints").display().to_string();

        let mut saver = DirectorySaver::new(&config);
        saver.deliver(&composite).await.unwrap();

        let exported = tmp.path().join("prints").join("1700000000.jpg");
        assert_eq!(fs::read(exported).unwrap(), b"jpeg bytes");
    }

    #[tokio::test]
    async fn test_printer_failure_is_an_output_error() {
        let tmp = TempDir::new().unwrap();
        let composite = tmp.path().join("1700000000.jpg");
        fs::write(&composite, b"jpeg bytes").unwrap();

        let mut config = BoothConfig::default().output;
        config.print_command = vec!["false".to_string()];

        let mut printer = CommandPrinter::new(&config);
        let result = printer.deliver(&composite).await;
        assert!(matches!(result, Err(BoothError::Output { .. })));
    }

    #[tokio::test]
    async fn test_mock_output_records_deliveries() {
        let mut output = MockOutput::new();
        output.deliver(Path::new("/tmp/a.jpg")).await.unwrap();
        output.deliver(Path::new("/tmp/b.jpg")).await.unwrap();

        assert_eq!(output.delivered().len(), 2);
        assert_eq!(output.delivered()[0], PathBuf::from("/tmp/a.jpg"));
    }
}
