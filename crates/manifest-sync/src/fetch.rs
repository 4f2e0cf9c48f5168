use crate::config::FetchConfig;
use crate::error::FetchError;
use std::error::Error as _;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Something that can place the archive behind a URL at a local path.
///
/// [`HttpFetcher`] is the production implementation; the pipeline only
/// depends on this trait.
pub trait ArchiveSource: Send + Sync {
    /// Write the resource at `url` to `dest`, returning the number of bytes
    /// written. A partially written `dest` may remain on error.
    fn fetch(&self, url: &str, dest: &Path) -> Result<u64, FetchError>;
}

/// Streams archives over HTTP(S) with a blocking `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    config: FetchConfig,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        if !config.verify_tls {
            log::debug!("TLS certificate validation is disabled for archive downloads");
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .danger_accept_invalid_certs(!config.verify_tls)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

impl ArchiveSource for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        log::debug!("GET {}", url);
        let mut response = self.client.get(url).send().map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let mut writer = BufWriter::new(File::create(dest)?);
        let written = copy_body(&mut response, &mut writer)?;
        writer.flush()?;

        log::debug!("Wrote {} bytes to {}", written, dest.display());
        Ok(written)
    }
}

fn copy_body<R: io::Read, W: Write>(body: &mut R, out: &mut W) -> Result<u64, FetchError> {
    let mut buffer = [0u8; 8192];
    let mut total = 0u64;
    loop {
        let read = match body.read(&mut buffer) {
            Ok(0) => return Ok(total),
            Ok(read) => read,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(classify_read(e)),
        };
        out.write_all(&buffer[..read])?;
        total += read as u64;
    }
}

fn classify(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::Timeout;
    }
    if let Some(status) = err.status() {
        return FetchError::Http {
            status: status.as_u16(),
            url: err.url().map(|u| u.to_string()).unwrap_or_default(),
        };
    }

    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    FetchError::Network(message)
}

fn classify_read(err: io::Error) -> FetchError {
    if err.kind() == io::ErrorKind::TimedOut {
        return FetchError::Timeout;
    }
    let is_timeout = err
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<reqwest::Error>())
        .is_some_and(reqwest::Error::is_timeout);
    if is_timeout {
        FetchError::Timeout
    } else {
        FetchError::Network(err.to_string())
    }
}
