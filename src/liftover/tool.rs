use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::bed::{read_intervals, write_intervals, BedInterval};
use crate::error::{HarmonizeError, Result};

/// Default name of the interval lifting executable
pub const DEFAULT_TOOL: &str = "liftOver";

/// Default limit on a single tool invocation
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60 * 60);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Result of lifting a batch of intervals
#[derive(Debug, Clone, Default)]
pub struct LiftOutput {
    pub mapped: Vec<BedInterval>,
    pub unmapped: Vec<BedInterval>,
}

/// Maps intervals from one genome build to another
pub trait CoordinateMapper {
    /// Lift a batch of intervals.
    ///
    /// # Errors
    ///
    /// Returns an error if the mapping could not be carried out at all.
    /// Individual intervals that fail to map belong in `LiftOutput::unmapped`.
    fn lift(&self, intervals: &[BedInterval]) -> Result<LiftOutput>;
}

/// Settings for the external lifting tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiftOverConfig {
    /// Executable path, or a bare name looked up on `PATH`
    pub tool: PathBuf,
    /// Chain file between the two builds
    pub chain: Option<PathBuf>,
    /// Directory for temporary interval files
    pub work_dir: PathBuf,
    /// Prefix for temporary file names, unique per run
    pub run_name: String,
    pub timeout: Duration,
}

impl Default for LiftOverConfig {
    fn default() -> Self {
        Self {
            tool: PathBuf::from(DEFAULT_TOOL),
            chain: None,
            work_dir: std::env::temp_dir(),
            run_name: "gwas-harmonize".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// `liftOver`-compatible subprocess: `tool input chain mapped unmapped`
#[derive(Debug, Clone)]
pub struct LiftOverTool {
    tool: PathBuf,
    chain: PathBuf,
    work_dir: PathBuf,
    run_name: String,
    timeout: Duration,
}

impl LiftOverTool {
    /// Validate the configured resources.
    ///
    /// # Errors
    ///
    /// Returns `HarmonizeError::Config` when no chain file is configured, and
    /// `HarmonizeError::Resource` when the tool, chain file or working
    /// directory does not exist.
    pub fn from_config(config: &LiftOverConfig) -> Result<Self> {
        let chain = config.chain.clone().ok_or_else(|| {
            HarmonizeError::Config("a chain file is required to change genome build".to_string())
        })?;

        let tool = find_executable(&config.tool).ok_or_else(|| HarmonizeError::Resource {
            kind: "liftover tool",
            path: config.tool.clone(),
        })?;
        if !chain.is_file() {
            return Err(HarmonizeError::Resource {
                kind: "chain file",
                path: chain,
            });
        }
        if !config.work_dir.is_dir() {
            return Err(HarmonizeError::Resource {
                kind: "working directory",
                path: config.work_dir.clone(),
            });
        }

        Ok(Self {
            tool,
            chain,
            work_dir: config.work_dir.clone(),
            run_name: config.run_name.clone(),
            timeout: config.timeout,
        })
    }

    #[must_use]
    pub fn tool(&self) -> &Path {
        &self.tool
    }

    fn temp_file(&self, suffix: &str) -> Result<NamedTempFile> {
        Ok(tempfile::Builder::new()
            .prefix(&format!("{}.", self.run_name))
            .suffix(suffix)
            .tempfile_in(&self.work_dir)?)
    }
}

impl CoordinateMapper for LiftOverTool {
    fn lift(&self, intervals: &[BedInterval]) -> Result<LiftOutput> {
        // Removed when dropped, on every return path
        let input = self.temp_file(".input.bed")?;
        let mapped = self.temp_file(".mapped.bed")?;
        let unmapped = self.temp_file(".unmapped.bed")?;
        let stderr = self.temp_file(".stderr.log")?;

        write_intervals(input.path(), intervals)?;

        debug!(
            "Running {} on {} intervals with {}",
            self.tool.display(),
            intervals.len(),
            self.chain.display()
        );
        let mut child = Command::new(&self.tool)
            .arg(input.path())
            .arg(&self.chain)
            .arg(mapped.path())
            .arg(unmapped.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(stderr.reopen()?))
            .spawn()?;

        let Some(status) = wait_with_timeout(&mut child, self.timeout)? else {
            return Err(HarmonizeError::Timeout {
                tool: self.tool.display().to_string(),
                timeout: self.timeout,
            });
        };

        // Exit status is advisory; a failed run shows up as missing output
        if !status.success() {
            let message = std::fs::read_to_string(stderr.path()).unwrap_or_default();
            warn!(
                "{} exited with {status}: {}",
                self.tool.display(),
                message.trim()
            );
        }

        Ok(LiftOutput {
            mapped: read_intervals(mapped.path())?,
            unmapped: read_intervals(unmapped.path())?,
        })
    }
}

/// Wait for a child; `Ok(None)` means it was killed after `timeout`
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> std::io::Result<Option<ExitStatus>> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let elapsed = start.elapsed();
        if elapsed >= timeout {
            // Already-exited races surface as an error from kill; reap regardless
            let _ = child.kill();
            child.wait()?;
            return Ok(None);
        }
        std::thread::sleep(POLL_INTERVAL.min(timeout - elapsed));
    }
}

/// Resolve a tool path; bare names are searched on `PATH`
fn find_executable(tool: &Path) -> Option<PathBuf> {
    if tool.components().count() > 1 || tool.is_absolute() {
        return tool.is_file().then(|| tool.to_path_buf());
    }
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(tool))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_chain_is_a_config_error() {
        let config = LiftOverConfig::default();
        assert!(matches!(
            LiftOverTool::from_config(&config),
            Err(HarmonizeError::Config(_))
        ));
    }

    #[test]
    fn test_missing_resources() {
        let dir = tempfile::tempdir().unwrap();
        let chain = dir.path().join("hg19ToHg38.over.chain.gz");
        std::fs::write(&chain, "").unwrap();

        let config = LiftOverConfig {
            tool: dir.path().join("no-such-liftOver"),
            chain: Some(chain.clone()),
            work_dir: dir.path().to_path_buf(),
            ..LiftOverConfig::default()
        };
        assert!(matches!(
            LiftOverTool::from_config(&config),
            Err(HarmonizeError::Resource {
                kind: "liftover tool",
                ..
            })
        ));

        let tool = dir.path().join("liftOver");
        std::fs::write(&tool, "").unwrap();
        let config = LiftOverConfig {
            tool,
            chain: Some(dir.path().join("missing.chain")),
            work_dir: dir.path().to_path_buf(),
            ..LiftOverConfig::default()
        };
        assert!(matches!(
            LiftOverTool::from_config(&config),
            Err(HarmonizeError::Resource {
                kind: "chain file",
                ..
            })
        ));
    }

    #[test]
    fn test_find_executable_requires_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("tool");
        assert!(find_executable(&tool).is_none());
        std::fs::write(&tool, "").unwrap();
        assert_eq!(find_executable(&tool), Some(tool));
        assert!(find_executable(Path::new("surely-not-an-installed-binary-4242")).is_none());
    }
}
