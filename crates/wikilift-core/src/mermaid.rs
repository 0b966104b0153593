//! Mermaid diagram conversion via the mermaid-cli renderer.
//!
//! The external renderer is modeled as the [`DiagramRenderer`]
//! capability so tests can substitute a fake implementation without a
//! real binary. [`MmdcRenderer`] is the production implementation: it
//! shells out to `mmdc` with a bounded timeout. [`MermaidConverter`]
//! owns the output-directory lifecycle and per-block input files.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::document::DiagramBlock;

/// Default bound on a single renderer invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Renderer binary looked up on `PATH`.
pub const RENDERER_PROGRAM: &str = "mmdc";

const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Output format for rendered diagrams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiagramFormat {
    /// Raster output (default).
    #[default]
    Png,
    /// Vector output.
    Svg,
}

impl DiagramFormat {
    /// Parse a format name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "png" => Some(Self::Png),
            "svg" => Some(Self::Svg),
            _ => None,
        }
    }

    /// File extension for this format.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }

    /// MIME type for attachment upload.
    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Svg => "image/svg+xml",
        }
    }
}

/// Options passed through to the renderer unmodified. Unsupported
/// combinations are the renderer's failure to report, not validated
/// here.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Output format.
    pub format: DiagramFormat,
    /// Renderer theme (`default`, `dark`, `forest`, `neutral`).
    pub theme: String,
    /// Background color (`white`, `transparent`, ...).
    pub background: String,
    /// Bound on one renderer invocation.
    pub timeout: Duration,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            format: DiagramFormat::default(),
            theme: "default".to_owned(),
            background: "white".to_owned(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Fatal converter-construction error.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// Renderer binary not found on the host. Checked once at
    /// construction so batches fail fast.
    #[error(
        "mermaid renderer ({RENDERER_PROGRAM}) not found; \
         install with: npm install -g @mermaid-js/mermaid-cli"
    )]
    RendererMissing,

    /// IO error while probing the renderer.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of a single block conversion. Recoverable: recorded per
/// block so a batch can report N successes and M failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RenderFailure {
    /// Renderer exited non-zero.
    #[error("renderer exited with {status}: {stderr}")]
    ExitStatus { status: ExitStatus, stderr: String },

    /// Renderer exceeded the configured timeout and was killed.
    #[error("renderer timed out after {0:?}")]
    Timeout(Duration),

    /// Renderer reported success but produced no output file.
    #[error("renderer produced no output file")]
    MissingOutput,

    /// IO error around the invocation (input file, output directory).
    #[error("IO error: {0}")]
    Io(String),
}

/// Capability interface over the external renderer.
pub trait DiagramRenderer {
    /// Render `input` to `output`. Success means the renderer ran and
    /// exited cleanly; output-file existence is verified by the caller.
    fn render(
        &self,
        input: &Path,
        output: &Path,
        options: &RenderOptions,
    ) -> Result<(), RenderFailure>;
}

/// Production renderer shelling out to `mmdc`.
#[derive(Debug)]
pub struct MmdcRenderer {
    program: PathBuf,
}

impl MmdcRenderer {
    /// Probe for `mmdc` on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::RendererMissing`] when the binary is not
    /// available on the host.
    pub fn new() -> Result<Self, ConvertError> {
        Self::with_program(RENDERER_PROGRAM)
    }

    /// Probe for a specific renderer binary.
    pub fn with_program(program: impl Into<PathBuf>) -> Result<Self, ConvertError> {
        let program = program.into();
        let probe = Command::new(&program)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match probe {
            Ok(_) => Ok(Self { program }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(ConvertError::RendererMissing)
            }
            Err(err) => Err(ConvertError::Io(err)),
        }
    }
}

impl DiagramRenderer for MmdcRenderer {
    fn render(
        &self,
        input: &Path,
        output: &Path,
        options: &RenderOptions,
    ) -> Result<(), RenderFailure> {
        debug!("rendering {} -> {}", input.display(), output.display());

        let mut child = Command::new(&self.program)
            .arg("-i")
            .arg(input)
            .arg("-o")
            .arg(output)
            .arg("-t")
            .arg(&options.theme)
            .arg("-b")
            .arg(&options.background)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| RenderFailure::Io(err.to_string()))?;

        // Drain stderr on a separate thread so a chatty renderer cannot
        // fill the pipe and stall while we poll for exit.
        let stderr_reader = child.stderr.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut buf = String::new();
                let _ = pipe.read_to_string(&mut buf);
                buf
            })
        });

        match wait_with_timeout(&mut child, options.timeout)? {
            Some(status) if status.success() => Ok(()),
            Some(status) => {
                let stderr = stderr_reader
                    .and_then(|t| t.join().ok())
                    .unwrap_or_default();
                Err(RenderFailure::ExitStatus {
                    status,
                    stderr: stderr.trim().to_owned(),
                })
            }
            None => {
                let _ = child.kill();
                let _ = child.wait();
                Err(RenderFailure::Timeout(options.timeout))
            }
        }
    }
}

/// Wait for the child, returning `None` when the deadline passes first.
fn wait_with_timeout(
    child: &mut Child,
    timeout: Duration,
) -> Result<Option<ExitStatus>, RenderFailure> {
    let deadline = Instant::now() + timeout;
    loop {
        match child
            .try_wait()
            .map_err(|err| RenderFailure::Io(err.to_string()))?
        {
            Some(status) => return Ok(Some(status)),
            None if Instant::now() >= deadline => return Ok(None),
            None => std::thread::sleep(WAIT_POLL_INTERVAL),
        }
    }
}

/// Converts mermaid blocks into image files through a renderer.
///
/// Output lands in a caller-supplied directory or a converter-owned
/// temp directory. The temp directory is exclusively owned by this
/// instance and removed by [`MermaidConverter::cleanup`].
pub struct MermaidConverter<R> {
    renderer: R,
    options: RenderOptions,
    output_dir: Option<PathBuf>,
    temp_dir: Option<TempDir>,
}

impl<R: DiagramRenderer> MermaidConverter<R> {
    /// Converter writing into a private temp directory.
    pub fn new(renderer: R, options: RenderOptions) -> Self {
        Self {
            renderer,
            options,
            output_dir: None,
            temp_dir: None,
        }
    }

    /// Converter writing into a caller-supplied directory (created if
    /// absent, never removed by cleanup).
    pub fn with_output_dir(renderer: R, options: RenderOptions, dir: PathBuf) -> Self {
        Self {
            renderer,
            options,
            output_dir: Some(dir),
            temp_dir: None,
        }
    }

    /// Render options in effect.
    #[must_use]
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Convert one block. The transient `.mmd` input file is removed on
    /// every exit path.
    pub fn convert(&mut self, block: &DiagramBlock) -> Result<PathBuf, RenderFailure> {
        let dir = self
            .ensure_output_dir()
            .map_err(|err| RenderFailure::Io(err.to_string()))?;

        let input = dir.join(format!("{}.mmd", block.id));
        let output = dir.join(format!("{}.{}", block.id, self.options.format.extension()));

        std::fs::write(&input, &block.source)
            .map_err(|err| RenderFailure::Io(err.to_string()))?;

        let result = self
            .renderer
            .render(&input, &output, &self.options)
            .and_then(|()| {
                if output.exists() {
                    Ok(output)
                } else {
                    Err(RenderFailure::MissingOutput)
                }
            });

        if let Err(err) = std::fs::remove_file(&input) {
            debug!("failed to remove {}: {err}", input.display());
        }

        match &result {
            Ok(path) => info!("rendered {} -> {}", block.id, path.display()),
            Err(failure) => warn!("rendering {} failed: {failure}", block.id),
        }
        result
    }

    /// Convert blocks sequentially in document order, one outcome per
    /// block, order preserved so results zip back against block ids.
    pub fn convert_all(&mut self, blocks: &[DiagramBlock]) -> Vec<Result<PathBuf, RenderFailure>> {
        blocks.iter().map(|block| self.convert(block)).collect()
    }

    /// Remove the converter-owned temp directory.
    ///
    /// Idempotent: safe to call zero, one, or many times, and a no-op
    /// when no temp directory was ever created or an explicit output
    /// directory is in use.
    pub fn cleanup(&mut self) -> std::io::Result<()> {
        match self.temp_dir.take() {
            Some(dir) => dir.close(),
            None => Ok(()),
        }
    }

    fn ensure_output_dir(&mut self) -> std::io::Result<PathBuf> {
        if let Some(dir) = &self.output_dir {
            std::fs::create_dir_all(dir)?;
            return Ok(dir.clone());
        }
        if self.temp_dir.is_none() {
            self.temp_dir = Some(TempDir::new()?);
        }
        Ok(self
            .temp_dir
            .as_ref()
            .map(|d| d.path().to_path_buf())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ParsedDocument;

    /// Renderer that writes a marker file, or fails per its mode.
    struct FakeRenderer {
        mode: FakeMode,
    }

    enum FakeMode {
        Succeed,
        ExitNonZero,
        TimeoutOn(&'static str),
        NoOutput,
    }

    impl DiagramRenderer for FakeRenderer {
        fn render(
            &self,
            input: &Path,
            output: &Path,
            options: &RenderOptions,
        ) -> Result<(), RenderFailure> {
            let source = std::fs::read_to_string(input).unwrap();
            match &self.mode {
                FakeMode::Succeed => {
                    std::fs::write(output, b"image").unwrap();
                    Ok(())
                }
                FakeMode::ExitNonZero => Err(RenderFailure::ExitStatus {
                    status: failing_status(),
                    stderr: "syntax error".to_owned(),
                }),
                FakeMode::TimeoutOn(needle) => {
                    if source.contains(needle) {
                        Err(RenderFailure::Timeout(options.timeout))
                    } else {
                        std::fs::write(output, b"image").unwrap();
                        Ok(())
                    }
                }
                FakeMode::NoOutput => Ok(()),
            }
        }
    }

    fn failing_status() -> ExitStatus {
        Command::new("sh")
            .args(["-c", "exit 1"])
            .status()
            .unwrap()
    }

    fn blocks(markdown: &str) -> Vec<DiagramBlock> {
        ParsedDocument::parse(markdown, Path::new("doc.md")).diagrams
    }

    #[test]
    fn test_convert_success_removes_input_file() {
        let blocks = blocks("```mermaid\ngraph TD\n```\n");
        let mut converter = MermaidConverter::new(
            FakeRenderer {
                mode: FakeMode::Succeed,
            },
            RenderOptions::default(),
        );

        let output = converter.convert(&blocks[0]).unwrap();
        assert!(output.exists());
        assert_eq!(output.extension().unwrap(), "png");
        assert!(!output.with_extension("mmd").exists());

        converter.cleanup().unwrap();
        assert!(!output.exists());
    }

    #[test]
    fn test_convert_missing_output_classified() {
        let blocks = blocks("```mermaid\ngraph TD\n```\n");
        let mut converter = MermaidConverter::new(
            FakeRenderer {
                mode: FakeMode::NoOutput,
            },
            RenderOptions::default(),
        );

        let err = converter.convert(&blocks[0]).unwrap_err();
        assert!(matches!(err, RenderFailure::MissingOutput));
        converter.cleanup().unwrap();
    }

    #[test]
    fn test_convert_all_partial_failure_preserves_order() {
        let blocks = blocks(
            "```mermaid\ngraph A\n```\n\n```mermaid\nSLOW graph\n```\n\n```mermaid\ngraph C\n```\n",
        );
        let mut converter = MermaidConverter::new(
            FakeRenderer {
                mode: FakeMode::TimeoutOn("SLOW"),
            },
            RenderOptions::default(),
        );

        let results = converter.convert_all(&blocks);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(RenderFailure::Timeout(_))));
        assert!(results[2].is_ok());
        converter.cleanup().unwrap();
    }

    #[test]
    fn test_failed_render_still_removes_input() {
        let blocks = blocks("```mermaid\ngraph TD\n```\n");
        let mut converter = MermaidConverter::new(
            FakeRenderer {
                mode: FakeMode::ExitNonZero,
            },
            RenderOptions::default(),
        );

        let err = converter.convert(&blocks[0]).unwrap_err();
        assert!(matches!(err, RenderFailure::ExitStatus { .. }));
        converter.cleanup().unwrap();
    }

    #[test]
    fn test_cleanup_idempotent() {
        let mut converter = MermaidConverter::new(
            FakeRenderer {
                mode: FakeMode::Succeed,
            },
            RenderOptions::default(),
        );

        // Never ran a conversion; nothing to remove.
        converter.cleanup().unwrap();
        converter.cleanup().unwrap();

        let blocks = blocks("```mermaid\ngraph TD\n```\n");
        converter.convert(&blocks[0]).unwrap();
        converter.cleanup().unwrap();
        converter.cleanup().unwrap();
    }

    #[test]
    fn test_explicit_output_dir_survives_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("rendered");
        let blocks = blocks("```mermaid\ngraph TD\n```\n");
        let mut converter = MermaidConverter::with_output_dir(
            FakeRenderer {
                mode: FakeMode::Succeed,
            },
            RenderOptions::default(),
            out_dir.clone(),
        );

        let output = converter.convert(&blocks[0]).unwrap();
        assert!(output.starts_with(&out_dir));

        converter.cleanup().unwrap();
        assert!(output.exists());
    }

    #[test]
    fn test_missing_renderer_is_fatal_at_construction() {
        let err = MmdcRenderer::with_program("wikilift-no-such-renderer").unwrap_err();
        assert!(matches!(err, ConvertError::RendererMissing));
    }

    #[cfg(unix)]
    #[test]
    fn test_wait_with_timeout_expires() {
        let mut child = Command::new("sh")
            .args(["-c", "sleep 5"])
            .stdout(Stdio::null())
            .spawn()
            .unwrap();

        let waited = wait_with_timeout(&mut child, Duration::from_millis(100)).unwrap();
        assert!(waited.is_none());
        let _ = child.kill();
        let _ = child.wait();
    }

    #[cfg(unix)]
    #[test]
    fn test_wait_with_timeout_reports_exit() {
        let mut child = Command::new("sh")
            .args(["-c", "exit 3"])
            .spawn()
            .unwrap();

        let status = wait_with_timeout(&mut child, Duration::from_secs(5))
            .unwrap()
            .expect("process should exit");
        assert_eq!(status.code(), Some(3));
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(DiagramFormat::parse("png"), Some(DiagramFormat::Png));
        assert_eq!(DiagramFormat::parse("svg"), Some(DiagramFormat::Svg));
        assert_eq!(DiagramFormat::parse("webp"), None);
        assert_eq!(DiagramFormat::Svg.extension(), "svg");
        assert_eq!(DiagramFormat::Png.content_type(), "image/png");
    }
}
