//! Image retrieval and decoding.
//!
//! [`ImageFetcher`] is the seam between the producer and the network: the pipeline only ever
//! sees a decoded RGB buffer or a classified [`FetchError`]. Every failure is per-URL; none of
//! them stop the run.

use image::{ImageFormat, ImageReader, Limits};
use log::debug;
use std::io::{Cursor, Read};
use std::thread;
use std::time::Duration;
use thiserror::Error;

use crate::Opts;
use crate::types::DecodedImage;
use crate::utils::config::FetchDefaults;

/// Per-URL failure. Always recoverable: the URL is skipped and the run continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Transport failure or non-2xx status.
    #[error("network: {0}")]
    Network(String),
    /// No response within the configured timeout.
    #[error("timeout: {0}")]
    Timeout(String),
    /// Body could not be decoded as an image.
    #[error("decode: {0}")]
    Decode(String),
    /// Body exceeded the configured size cap.
    #[error("body larger than {limit} bytes")]
    TooLarge { limit: u64 },
}

impl FetchError {
    /// Network and timeout failures may succeed on another attempt; decode failures will not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Network(_) | FetchError::Timeout(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout(e.to_string())
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

/// Turns a URL into a decoded image. Implementations must be usable from the producer thread.
pub trait ImageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<DecodedImage, FetchError>;
}

/// Blocking HTTP GET with a bounded timeout, size cap, and bounded retries.
pub struct HttpImageFetcher {
    client: reqwest::blocking::Client,
    max_image_bytes: u64,
    max_decode_alloc: u64,
    retries: u32,
}

impl HttpImageFetcher {
    pub fn new(opts: &Opts) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(opts.fetch_timeout)
            .redirect(reqwest::redirect::Policy::limited(
                FetchDefaults::MAX_REDIRECTS,
            ))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            max_image_bytes: opts.max_image_bytes,
            max_decode_alloc: opts.max_decode_alloc,
            retries: opts.effective_retries(),
        })
    }

    /// One GET: status check, then read at most `max_image_bytes + 1` bytes of body.
    fn get_once(&self, url: &str) -> Result<(Vec<u8>, Option<String>), FetchError> {
        let resp = self.client.get(url).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Network(format!("HTTP {status}")));
        }
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        if let Some(len) = resp.content_length()
            && len > self.max_image_bytes
        {
            return Err(FetchError::TooLarge {
                limit: self.max_image_bytes,
            });
        }
        let mut body = Vec::new();
        resp.take(self.max_image_bytes + 1)
            .read_to_end(&mut body)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::TimedOut => FetchError::Timeout(e.to_string()),
                _ => FetchError::Network(e.to_string()),
            })?;
        if body.len() as u64 > self.max_image_bytes {
            return Err(FetchError::TooLarge {
                limit: self.max_image_bytes,
            });
        }
        Ok((body, content_type))
    }
}

impl ImageFetcher for HttpImageFetcher {
    fn fetch(&self, url: &str) -> Result<DecodedImage, FetchError> {
        let mut attempt = 0;
        let (body, content_type) = loop {
            match self.get_once(url) {
                Ok(got) => break got,
                Err(e) if e.is_retryable() && attempt < self.retries => {
                    attempt += 1;
                    debug!("retry {}/{} for {}: {}", attempt, self.retries, url, e);
                    thread::sleep(Duration::from_millis(
                        FetchDefaults::RETRY_BACKOFF_MS * u64::from(attempt),
                    ));
                }
                Err(e) => return Err(e),
            }
        };
        decode_image(url, &body, content_type.as_deref(), self.max_decode_alloc)
    }
}

/// Decode `bytes` into an RGB8 image.
///
/// The format comes from `content_type` when it names a known image type, otherwise it is
/// sniffed from the bytes. Alpha is dropped and 16-bit channels are reduced to 8 bits.
pub fn decode_image(
    url: &str,
    bytes: &[u8],
    content_type: Option<&str>,
    max_alloc: u64,
) -> Result<DecodedImage, FetchError> {
    let declared = content_type
        .map(|ct| ct.split(';').next().unwrap_or(ct).trim())
        .and_then(ImageFormat::from_mime_type);
    let mut reader = match declared {
        Some(format) => ImageReader::with_format(Cursor::new(bytes), format),
        None => ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| FetchError::Decode(e.to_string()))?,
    };
    let mut limits = Limits::default();
    limits.max_alloc = Some(max_alloc);
    reader.limits(limits);
    let decoded = reader
        .decode()
        .map_err(|e| FetchError::Decode(e.to_string()))?;
    Ok(DecodedImage::new(url, decoded.to_rgb8()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_garbage_is_decode_error() {
        let err = decode_image("http://x/y", b"not an image", None, 1 << 20).unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_timeout_is_retryable() {
        assert!(FetchError::Timeout("t".into()).is_retryable());
        assert!(FetchError::Network("n".into()).is_retryable());
        assert!(!FetchError::TooLarge { limit: 1 }.is_retryable());
    }
}
