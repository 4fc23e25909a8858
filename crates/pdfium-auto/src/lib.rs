//! # pdfium-auto
//!
//! Finds a usable [PDFium](https://pdfium.googlesource.com/pdfium/) shared
//! library for `pdfium-render`, downloading and caching it on first use so
//! that `pdftomarkd` works without any manual library setup.
//!
//! ## Resolution order
//!
//! 1. `PDFIUM_LIB_PATH` pointing at an existing library file.
//! 2. The per-version cache directory (see [`cache_dir`]).
//! 3. A fresh download of the platform archive from
//!    [bblanchon/pdfium-binaries](https://github.com/bblanchon/pdfium-binaries),
//!    extracted into the cache directory.
//!
//! ```rust,no_run
//! let pdfium = pdfium_auto::bind(None).expect("PDFium unavailable");
//! ```
//!
//! ## Environment variables
//!
//! - `PDFIUM_LIB_PATH` — use this library, never download.
//! - `PDFIUM_AUTO_CACHE_DIR` — base directory for the cache.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use pdfium_render::prelude::Pdfium;
use thiserror::Error;

/// The pdfium-binaries release tag used for downloads.
pub const PDFIUM_VERSION: &str = "7690";

const RELEASES_URL: &str = "https://github.com/bblanchon/pdfium-binaries/releases/download";

/// Progress callback: `(bytes_downloaded, total_bytes_if_known)`.
pub type DownloadProgress<'a> = &'a dyn Fn(u64, Option<u64>);

/// Errors raised while locating, downloading or binding PDFium.
#[derive(Error, Debug)]
pub enum PdfiumAutoError {
    #[error("Unsupported platform: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("Cache directory error: {0}")]
    CacheDir(#[source] std::io::Error),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Archive extraction failed: {0}")]
    Extract(String),

    #[error("Failed to bind PDFium from '{path}': {reason}")]
    Bind { path: PathBuf, reason: String },
}

/// Release asset and library layout for one OS/arch pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Platform {
    asset: &'static str,
    member: &'static str,
    file_name: &'static str,
}

impl Platform {
    fn current() -> Result<Self, PdfiumAutoError> {
        Self::for_target(std::env::consts::OS, std::env::consts::ARCH)
    }

    fn for_target(os: &str, arch: &str) -> Result<Self, PdfiumAutoError> {
        let (asset, member, file_name) = match (os, arch) {
            ("macos", "aarch64") => ("pdfium-mac-arm64.tgz", "lib/libpdfium.dylib", "libpdfium.dylib"),
            ("macos", "x86_64") => ("pdfium-mac-x64.tgz", "lib/libpdfium.dylib", "libpdfium.dylib"),
            ("linux", "x86_64") => ("pdfium-linux-x64.tgz", "lib/libpdfium.so", "libpdfium.so"),
            ("linux", "aarch64") => ("pdfium-linux-arm64.tgz", "lib/libpdfium.so", "libpdfium.so"),
            ("windows", "x86_64") => ("pdfium-win-x64.tgz", "bin/pdfium.dll", "pdfium.dll"),
            ("windows", "aarch64") => ("pdfium-win-arm64.tgz", "bin/pdfium.dll", "pdfium.dll"),
            ("windows", "x86") => ("pdfium-win-x86.tgz", "bin/pdfium.dll", "pdfium.dll"),
            (os, arch) => {
                return Err(PdfiumAutoError::UnsupportedPlatform {
                    os: os.to_string(),
                    arch: arch.to_string(),
                })
            }
        };
        Ok(Self {
            asset,
            member,
            file_name,
        })
    }

    fn download_url(&self) -> String {
        format!("{RELEASES_URL}/chromium%2F{PDFIUM_VERSION}/{}", self.asset)
    }
}

/// Directory holding the cached library for [`PDFIUM_VERSION`].
///
/// Defaults to `<user cache dir>/pdftomarkd/pdfium-{VERSION}`; the base is
/// replaced by `PDFIUM_AUTO_CACHE_DIR` when set.
pub fn cache_dir() -> PathBuf {
    let versioned = format!("pdfium-{PDFIUM_VERSION}");
    if let Ok(base) = std::env::var("PDFIUM_AUTO_CACHE_DIR") {
        return PathBuf::from(base).join(versioned);
    }
    dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(std::env::temp_dir)
        .join("pdftomarkd")
        .join(versioned)
}

/// Path of an already available library, without touching the network.
pub fn locate() -> Option<PathBuf> {
    if let Some(p) = env_override() {
        return Some(p);
    }
    let platform = Platform::current().ok()?;
    let cached = cache_dir().join(platform.file_name);
    cached.exists().then_some(cached)
}

/// `true` when [`ensure_library`] will not need to download anything.
pub fn is_available() -> bool {
    locate().is_some()
}

static RESOLVED: OnceLock<PathBuf> = OnceLock::new();

/// Returns the library path, downloading it into the cache when missing.
pub fn ensure_library(progress: Option<DownloadProgress<'_>>) -> Result<PathBuf, PdfiumAutoError> {
    if let Some(path) = RESOLVED.get() {
        return Ok(path.clone());
    }
    let path = match locate() {
        Some(path) => path,
        None => download_into_cache(progress)?,
    };
    Ok(RESOLVED.get_or_init(|| path).clone())
}

/// Ensures the library is present and binds to it.
pub fn bind(progress: Option<DownloadProgress<'_>>) -> Result<Pdfium, PdfiumAutoError> {
    let path = ensure_library(progress)?;
    bind_from_path(&path)
}

/// Binds to the library at `path` without consulting the cache.
pub fn bind_from_path(path: &Path) -> Result<Pdfium, PdfiumAutoError> {
    Pdfium::bind_to_library(path)
        .map(Pdfium::new)
        .map_err(|e| PdfiumAutoError::Bind {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

fn env_override() -> Option<PathBuf> {
    let path = PathBuf::from(std::env::var_os("PDFIUM_LIB_PATH")?);
    path.exists().then_some(path)
}

fn download_into_cache(progress: Option<DownloadProgress<'_>>) -> Result<PathBuf, PdfiumAutoError> {
    let platform = Platform::current()?;
    let dir = cache_dir();
    std::fs::create_dir_all(&dir).map_err(PdfiumAutoError::CacheDir)?;

    let archive = fetch(&platform.download_url(), progress)?;
    let dest = dir.join(platform.file_name);
    unpack_member(&archive, platform.member, &dest)?;
    Ok(dest)
}

fn fetch(url: &str, progress: Option<DownloadProgress<'_>>) -> Result<Vec<u8>, PdfiumAutoError> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("pdfium-auto/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| PdfiumAutoError::Download(e.to_string()))?;

    let mut response = client
        .get(url)
        .send()
        .map_err(|e| PdfiumAutoError::Download(format!("GET {url}: {e}")))?;
    if !response.status().is_success() {
        return Err(PdfiumAutoError::Download(format!(
            "HTTP {} for {url}",
            response.status()
        )));
    }

    let total = response.content_length();
    let mut bytes = Vec::with_capacity(total.unwrap_or(0) as usize);
    let mut chunk = [0u8; 64 * 1024];
    loop {
        let n = match response.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(PdfiumAutoError::Download(format!("Read error: {e}"))),
        };
        bytes.extend_from_slice(&chunk[..n]);
        if let Some(cb) = progress {
            cb(bytes.len() as u64, total);
        }
    }
    Ok(bytes)
}

/// Writes the archive entry named `member` of a `.tgz` to `dest`.
fn unpack_member(archive: &[u8], member: &str, dest: &Path) -> Result<(), PdfiumAutoError> {
    let extract_err = |e: std::io::Error| PdfiumAutoError::Extract(e.to_string());
    let mut tar = tar::Archive::new(flate2::read::GzDecoder::new(archive));
    for entry in tar.entries().map_err(extract_err)? {
        let mut entry = entry.map_err(extract_err)?;
        if entry.path().map_err(extract_err)?.to_string_lossy() == member {
            entry.unpack(dest).map_err(extract_err)?;
            return Ok(());
        }
    }
    Err(PdfiumAutoError::Extract(format!(
        "'{member}' not found in archive"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linux_x64_layout() {
        let p = Platform::for_target("linux", "x86_64").unwrap();
        assert_eq!(p.file_name, "libpdfium.so");
        assert!(p.download_url().ends_with("/chromium%2F7690/pdfium-linux-x64.tgz"));
    }

    #[test]
    fn unknown_platform_is_rejected() {
        let err = Platform::for_target("plan9", "mips").unwrap_err();
        assert!(err.to_string().contains("plan9/mips"));
    }

    #[test]
    fn cache_dir_is_versioned() {
        let d = cache_dir();
        assert!(d.to_string_lossy().contains(PDFIUM_VERSION));
        assert_eq!(d, cache_dir());
    }

    #[test]
    fn missing_member_reports_extract_error() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::fast()));
        let data = b"not a library";
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_cksum();
        builder
            .append_data(&mut header, "lib/readme.txt", &data[..])
            .unwrap();
        let archive = builder.into_inner().unwrap().finish().unwrap();

        let dir = std::env::temp_dir().join("pdfium-auto-test-missing-member");
        let err = unpack_member(&archive, "lib/libpdfium.so", &dir.join("x")).unwrap_err();
        assert!(matches!(err, PdfiumAutoError::Extract(_)));
    }
}
