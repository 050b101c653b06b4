use std::fs;
use std::io::{self, ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

use image::{DynamicImage, GrayImage};
use tracing::{debug, info, warn};
use vectorize::{FrameSource, Result, VectorizeError};

use crate::{CliError, SourceConfig};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "bmp", "pgm"];

fn find_ffmpeg_executable() -> std::result::Result<String, CliError> {
    if let Ok(output) = Command::new("which").arg("ffmpeg").output() {
        if output.status.success() {
            let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !path.is_empty() {
                return Ok(path);
            }
        }
    }

    let common_paths = [
        "/usr/bin/ffmpeg",
        "/usr/local/bin/ffmpeg",
        "/opt/homebrew/bin/ffmpeg",
    ];

    common_paths
        .iter()
        .find(|path| Path::new(path).exists())
        .map(|path| path.to_string())
        .ok_or_else(|| {
            CliError::Capture(
                "FFmpeg executable not found. Please install FFmpeg or set ffmpeg_path.".to_string(),
            )
        })
}

/// Frames decoded by an ffmpeg child process, scaled to a fixed size and
/// piped out as raw 8-bit gray.
pub struct FfmpegFrameSource {
    child: Child,
    stdout: ChildStdout,
    input: String,
    width: u32,
    height: u32,
}

impl FfmpegFrameSource {
    pub fn spawn(
        input: &str,
        format: Option<&str>,
        width: u32,
        height: u32,
        ffmpeg_path: Option<&str>,
    ) -> std::result::Result<Self, CliError> {
        let executable = match ffmpeg_path {
            Some(path) => path.to_string(),
            None => find_ffmpeg_executable()?,
        };

        let args = Self::build_args(input, format, width, height);
        debug!("Running: {} {}", executable, args.join(" "));

        let mut child = Command::new(&executable)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CliError::Capture("ffmpeg stdout was not captured".to_string()))?;

        info!("Opened {} at {}x{} through {}", input, width, height, executable);

        Ok(Self {
            child,
            stdout,
            input: input.to_string(),
            width,
            height,
        })
    }

    fn build_args(input: &str, format: Option<&str>, width: u32, height: u32) -> Vec<String> {
        let mut args: Vec<String> = vec!["-hide_banner".into(), "-loglevel".into(), "error".into()];
        if let Some(format) = format {
            args.extend(["-f".to_string(), format.to_string()]);
        }
        args.extend([
            "-i".to_string(),
            input.to_string(),
            "-vf".to_string(),
            format!("scale={}:{}", width, height),
            "-f".to_string(),
            "rawvideo".to_string(),
            "-pix_fmt".to_string(),
            "gray".to_string(),
            "-".to_string(),
        ]);
        args
    }

    fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl FrameSource for FfmpegFrameSource {
    fn next_frame(&mut self) -> Result<Option<DynamicImage>> {
        let mut buffer = vec![0u8; self.frame_len()];
        match self.stdout.read_exact(&mut buffer) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                // stdout closed: a clean exit ends the stream, anything else is an error
                let status = self.child.wait()?;
                if status.success() {
                    return Ok(None);
                }
                return Err(VectorizeError::Io(io::Error::other(format!(
                    "ffmpeg exited with {} while reading {}",
                    status, self.input
                ))));
            }
            Err(e) => return Err(e.into()),
        }

        let frame = GrayImage::from_raw(self.width, self.height, buffer).ok_or(
            VectorizeError::FrameSize {
                expected: self.frame_len(),
                actual: 0,
            },
        )?;
        Ok(Some(DynamicImage::ImageLuma8(frame)))
    }

    fn description(&self) -> String {
        format!("FFmpeg: {} ({}x{})", self.input, self.width, self.height)
    }
}

impl Drop for FfmpegFrameSource {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            if let Err(e) = self.child.kill() {
                warn!("Failed to stop ffmpeg: {}", e);
            }
        }
        let _ = self.child.wait();
    }
}

/// Still images from a directory, read in file name order and converted to
/// gray.
pub struct ImageDirSource {
    dir: PathBuf,
    files: Vec<PathBuf>,
    next: usize,
}

impl ImageDirSource {
    pub fn open<P: AsRef<Path>>(dir: P) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let mut files = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_file() && has_image_extension(&path) {
                files.push(path);
            }
        }
        files.sort();
        info!("Found {} images in {}", files.len(), dir.display());
        Ok(Self { dir, files, next: 0 })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

impl FrameSource for ImageDirSource {
    /// Files that fail to decode are logged and skipped.
    fn next_frame(&mut self) -> Result<Option<DynamicImage>> {
        while let Some(path) = self.files.get(self.next) {
            self.next += 1;
            debug!("Loading {}", path.display());
            match image::open(path) {
                Ok(image) => return Ok(Some(DynamicImage::ImageLuma8(image.to_luma8()))),
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }
        Ok(None)
    }

    fn description(&self) -> String {
        format!("Images: {} ({} files)", self.dir.display(), self.files.len())
    }
}

/// Open the source a configuration names
pub fn open_source(config: &SourceConfig) -> std::result::Result<Box<dyn FrameSource + Send>, CliError> {
    match config {
        SourceConfig::Ffmpeg {
            input,
            format,
            width,
            height,
            ffmpeg_path,
        } => Ok(Box::new(FfmpegFrameSource::spawn(
            input,
            format.as_deref(),
            *width,
            *height,
            ffmpeg_path.as_deref(),
        )?)),
        SourceConfig::ImageDir { path } => Ok(Box::new(ImageDirSource::open(path)?)),
    }
}
