use std::path::{Path, PathBuf};
use std::time::Duration;

/// Host serving branch archives.
pub const DEFAULT_ARCHIVE_HOST: &str = "github.com";

/// Repository used when the caller does not select one.
pub const DEFAULT_REPOSITORY: &str = "Fairyvmos/BlankTMing";

/// Output directory used when the caller does not choose one.
pub const DEFAULT_OUTPUT_DIR: &str = "Updated Files";

/// Temp root used when the environment does not provide one.
pub const FALLBACK_TEMP_ROOT: &str = "/tmp";

/// Extension of the downloaded and produced archives.
pub const ARCHIVE_EXTENSION: &str = "zip";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// HTTP settings for downloading branch archives.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Maximum wait for the response and for each body read.
    pub timeout: Duration,
    /// Whether TLS certificates are validated.
    pub verify_tls: bool,
    /// `User-Agent` header sent with each request.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            verify_tls: false,
            user_agent: format!("manifest-sync/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl FetchConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_verify_tls(mut self, verify_tls: bool) -> Self {
        self.verify_tls = verify_tls;
        self
    }
}

/// Settings shared by every run of a [`crate::Pipeline`].
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Host part of the archive URL.
    pub archive_host: String,
    /// Directory under which per-run workspaces are created.
    pub temp_root: PathBuf,
    /// Archive entries ending with this suffix are treated as payloads.
    pub payload_suffix: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            archive_host: DEFAULT_ARCHIVE_HOST.to_string(),
            temp_root: default_temp_root(),
            payload_suffix: manifest_format::PAYLOAD_SUFFIX.to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn with_archive_host(mut self, host: impl Into<String>) -> Self {
        self.archive_host = host.into();
        self
    }

    pub fn with_temp_root(mut self, temp_root: impl Into<PathBuf>) -> Self {
        self.temp_root = temp_root.into();
        self
    }

    /// URL of the branch archive named after `app_id` in `repository`.
    pub fn archive_url(&self, repository: &str, app_id: &str) -> String {
        let host = self.archive_host.trim_end_matches('/');
        let base = if host.contains("://") {
            host.to_string()
        } else {
            format!("https://{}", host)
        };
        format!(
            "{}/{}/archive/refs/heads/{}.{}",
            base,
            repository.trim_matches('/'),
            app_id,
            ARCHIVE_EXTENSION
        )
    }
}

/// Inputs for a single pipeline run.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Script to synchronize.
    pub script_path: PathBuf,
    /// Directory receiving `<identifier>.zip`.
    pub output_dir: PathBuf,
    /// `owner/repo` reference whose branches hold the archives.
    pub repository: String,
}

impl RunContext {
    pub fn new(script_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            script_path: script_path.into(),
            output_dir: output_dir.into(),
            repository: DEFAULT_REPOSITORY.to_string(),
        }
    }

    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = repository.into();
        self
    }

    /// Path of the output archive for `app_id`.
    pub fn output_path(&self, app_id: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", app_id, ARCHIVE_EXTENSION))
    }
}

/// The host's temp directory, or [`FALLBACK_TEMP_ROOT`] if it is unset.
pub fn default_temp_root() -> PathBuf {
    let dir = std::env::temp_dir();
    if dir.as_os_str().is_empty() {
        Path::new(FALLBACK_TEMP_ROOT).to_path_buf()
    } else {
        dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_url_default_host() {
        let config = PipelineConfig::default();
        assert_eq!(
            config.archive_url("Fairyvmos/BlankTMing", "1234"),
            "https://github.com/Fairyvmos/BlankTMing/archive/refs/heads/1234.zip"
        );
    }

    #[test]
    fn test_archive_url_custom_host_with_scheme() {
        let config = PipelineConfig::default().with_archive_host("http://127.0.0.1:8080/");
        assert_eq!(
            config.archive_url("/owner/repo/", "9"),
            "http://127.0.0.1:8080/owner/repo/archive/refs/heads/9.zip"
        );
    }

    #[test]
    fn test_output_path() {
        let ctx = RunContext::new("in.lua", "/out");
        assert_eq!(ctx.output_path("42"), PathBuf::from("/out/42.zip"));
        assert_eq!(ctx.repository, DEFAULT_REPOSITORY);
    }

    #[test]
    fn test_fetch_defaults() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(!config.verify_tls);
    }
}
