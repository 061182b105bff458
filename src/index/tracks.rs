//! Embedded subtitle tracks
//!
//! Containers are probed for subtitle streams and each stream is extracted
//! to its own file in a temp directory, where it is searched like any
//! standalone subtitle. The external tool sits behind [`TrackExtractor`].

use serde::Deserialize;
use std::collections::HashMap;
use std::ffi::OsString;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::error::ExtractError;
use crate::models::{SubFormat, TrackInfo};

/// Longest title fragment kept in an output file name
const MAX_SLUG_LEN: usize = 32;

/// One subtitle stream reported by a probe
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamInfo {
    pub codec_name: Option<String>,
    pub language: Option<String>,
    pub title: Option<String>,
}

/// Something that can list and extract subtitle streams of a container
///
/// `stream_index` counts subtitle streams only (0 is the first subtitle
/// stream, not the first stream of the file).
pub trait TrackExtractor: Send + Sync + 'static {
    fn probe(
        &self,
        container: &Path,
    ) -> impl Future<Output = Result<Vec<StreamInfo>, ExtractError>> + Send;

    /// Write stream `stream_index` to `output`, copying the codec when
    /// `codec_copy` is set and converting to SubRip otherwise.
    fn extract(
        &self,
        container: &Path,
        stream_index: usize,
        codec_copy: bool,
        output: &Path,
    ) -> impl Future<Output = Result<(), ExtractError>> + Send;
}

// =============================================================================
// ffmpeg
// =============================================================================

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_name: Option<String>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

impl ProbeStream {
    /// Tag lookup; muxers disagree on the case of tag keys
    fn tag(&self, key: &str) -> Option<String> {
        self.tags
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// Parse `ffprobe -print_format json -show_streams` output
pub fn parse_probe_output(json: &[u8]) -> Result<Vec<StreamInfo>, ExtractError> {
    let probe: ProbeOutput = serde_json::from_slice(json)?;
    Ok(probe
        .streams
        .into_iter()
        .map(|s| StreamInfo {
            language: s.tag("language"),
            title: s.tag("title"),
            codec_name: s.codec_name,
        })
        .collect())
}

/// Extractor backed by the `ffprobe` and `ffmpeg` binaries
#[derive(Debug, Clone)]
pub struct FfmpegExtractor {
    ffprobe: PathBuf,
    ffmpeg: PathBuf,
    timeout: Duration,
}

impl Default for FfmpegExtractor {
    fn default() -> Self {
        Self::new("ffprobe", "ffmpeg", Duration::from_secs(120))
    }
}

impl FfmpegExtractor {
    pub fn new(ffprobe: impl Into<PathBuf>, ffmpeg: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            ffprobe: ffprobe.into(),
            ffmpeg: ffmpeg.into(),
            timeout,
        }
    }

    /// Run a tool to completion and return its stdout
    ///
    /// The child is killed if it outlives the timeout.
    async fn run(&self, program: &Path, args: Vec<OsString>) -> Result<Vec<u8>, ExtractError> {
        let name = program.display().to_string();
        tracing::trace!(program = %name, ?args, "running");

        let child = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExtractError::Spawn {
                program: name.clone(),
                source,
            })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| ExtractError::Spawn {
                program: name.clone(),
                source,
            })?,
            Err(_) => {
                return Err(ExtractError::Timeout {
                    program: name,
                    timeout: self.timeout,
                })
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr.lines().last().unwrap_or("").trim();
            return Err(ExtractError::Status {
                program: name,
                status: if detail.is_empty() {
                    output.status.to_string()
                } else {
                    format!("{}: {}", output.status, detail)
                },
            });
        }
        Ok(output.stdout)
    }
}

impl TrackExtractor for FfmpegExtractor {
    async fn probe(&self, container: &Path) -> Result<Vec<StreamInfo>, ExtractError> {
        let args: Vec<OsString> = vec![
            "-v".into(),
            "quiet".into(),
            "-print_format".into(),
            "json".into(),
            "-show_streams".into(),
            "-select_streams".into(),
            "s".into(),
            container.into(),
        ];
        let stdout = self.run(&self.ffprobe, args).await?;
        parse_probe_output(&stdout)
    }

    async fn extract(
        &self,
        container: &Path,
        stream_index: usize,
        codec_copy: bool,
        output: &Path,
    ) -> Result<(), ExtractError> {
        let args: Vec<OsString> = vec![
            "-y".into(),
            "-v".into(),
            "error".into(),
            "-i".into(),
            container.into(),
            "-map".into(),
            format!("0:s:{}", stream_index).into(),
            "-c:s".into(),
            if codec_copy { "copy" } else { "srt" }.into(),
            output.into(),
        ];
        self.run(&self.ffmpeg, args).await.map(|_| ())
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// Turns containers into extracted subtitle files with track attribution
#[derive(Debug)]
pub struct TrackResolver<E> {
    extractor: E,
    temp_dir: PathBuf,
}

impl<E: TrackExtractor> TrackResolver<E> {
    pub fn new(extractor: E, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            extractor,
            temp_dir: temp_dir.into(),
        }
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Extract every subtitle stream of `container`
    ///
    /// Streams that fail to extract are left out; a failed probe yields
    /// nothing at all.
    pub async fn resolve_tracks(&self, container: &Path) -> Vec<(PathBuf, TrackInfo)> {
        let streams = match self.extractor.probe(container).await {
            Ok(streams) => streams,
            Err(e) => {
                tracing::warn!(container = %container.display(), error = %e, "probe failed");
                return Vec::new();
            }
        };
        if streams.is_empty() {
            return Vec::new();
        }
        if let Err(e) = tokio::fs::create_dir_all(&self.temp_dir).await {
            tracing::warn!(dir = %self.temp_dir.display(), error = %e, "cannot create track directory");
            return Vec::new();
        }

        let mut tracks = Vec::with_capacity(streams.len());
        for (index, stream) in streams.into_iter().enumerate() {
            let format = stream.codec_name.as_deref().and_then(SubFormat::from_codec);
            let extension = format.unwrap_or(SubFormat::Srt).extension();
            let language = stream
                .language
                .clone()
                .unwrap_or_else(|| format!("track{}", index));
            let output = self.output_path(container, index, &language, stream.title.as_deref(), extension);

            // A leftover from an earlier run must not pass for fresh output
            let _ = tokio::fs::remove_file(&output).await;

            let result = match self
                .extractor
                .extract(container, index, format.is_some(), &output)
                .await
            {
                Ok(()) if output.is_file() => Ok(()),
                Ok(()) => Err(ExtractError::MissingOutput(output.clone())),
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                tracing::warn!(
                    container = %container.display(),
                    stream = index,
                    error = %e,
                    "skipping subtitle stream"
                );
                continue;
            }

            tracing::debug!(
                container = %container.display(),
                stream = index,
                output = %output.display(),
                "extracted subtitle stream"
            );
            tracks.push((
                output,
                TrackInfo {
                    source_video_path: container.to_path_buf(),
                    is_extracted: true,
                    track_index: index as i32,
                    language: Some(language),
                    title: stream.title,
                    codec: stream.codec_name,
                },
            ));
        }
        tracks
    }

    /// `<temp>/<stem>-<hash8>_<lang>[_<title>]_track<i>.<ext>`
    fn output_path(
        &self,
        container: &Path,
        index: usize,
        language: &str,
        title: Option<&str>,
        extension: &str,
    ) -> PathBuf {
        let stem = container
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());

        let mut name = format!("{}-{}_{}", stem, path_hash(container), slugify(language));
        if let Some(title) = title.map(slugify).filter(|t| !t.is_empty()) {
            name.push('_');
            name.push_str(&title);
        }
        name.push_str(&format!("_track{}.{}", index, extension));
        self.temp_dir.join(name)
    }
}

/// Eight hex digits identifying a container path
///
/// 32-bit FNV-1a over the path bytes, identical across runs and toolchains
/// so a later run overwrites the tracks of an earlier one.
fn path_hash(path: &Path) -> String {
    let hash = path
        .as_os_str()
        .as_encoded_bytes()
        .iter()
        .fold(0x811c_9dc5_u32, |hash, &byte| {
            (hash ^ u32::from(byte)).wrapping_mul(0x0100_0193)
        });
    format!("{:08x}", hash)
}

/// Lowercase ASCII slug for use in a file name
fn slugify(s: &str) -> String {
    let mut slug = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
    }
    slug.trim_end_matches('-').to_string()
}
