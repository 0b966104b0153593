//! Markdown document analysis.
//!
//! Extracts image references, mermaid diagram blocks, and the document
//! title from raw Markdown, and rewrites content by verbatim substring
//! replacement. Pure text processing; the only filesystem access is the
//! existence check behind image path resolution.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Image reference pattern: `![alt text](path)`.
static IMAGE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)]+)\)").unwrap());

/// Fenced mermaid block. Unterminated fences never match and are left
/// as literal text.
static MERMAID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```mermaid[ \t]*\n(.*?)\n```").unwrap());

/// First level-1 heading line: `# Title`.
static H1_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^#[ \t]+(.+)$").unwrap());

/// Maximum characters of diagram source shown in [`DocumentSummary`].
const PREVIEW_LEN: usize = 100;

/// Classification of an image reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    /// Path relative to the document (or absolute on disk).
    Local,
    /// URL with a scheme prefix; never uploaded or rewritten.
    External,
}

/// One occurrence of image syntax in a document.
///
/// Duplicate identical references are distinct entries, each mapping
/// independently to a content-replacement operation.
#[derive(Debug, Clone)]
pub struct ImageReference {
    /// Verbatim matched text, e.g. `![alt](img/a.png)`.
    pub original_text: String,
    /// Alt text (may be empty).
    pub alt_text: String,
    /// Path or URL exactly as written.
    pub path: String,
    /// Local or external.
    pub kind: ImageKind,
    /// Absolute path on disk; `Some` only for local references that
    /// exist. Missing local files stay `None` and are reported as
    /// warnings, never as errors.
    pub resolved: Option<PathBuf>,
    /// Byte offset of the occurrence start.
    pub start: usize,
    /// Byte offset one past the occurrence end.
    pub end: usize,
}

impl ImageReference {
    /// Whether this reference can be uploaded as an attachment.
    #[must_use]
    pub fn is_uploadable(&self) -> bool {
        self.resolved.is_some()
    }
}

/// One fenced mermaid block.
#[derive(Debug, Clone)]
pub struct DiagramBlock {
    /// Verbatim fenced block including the fence markers.
    pub original_text: String,
    /// Inner diagram source, trimmed.
    pub source: String,
    /// Stable identifier naming the rendered output file. The
    /// `diagram_` prefix, per-document index, and content hash keep ids
    /// unique within a document and out of the way of local image
    /// filenames.
    pub id: String,
    /// Byte offset of the block start.
    pub start: usize,
    /// Byte offset one past the block end.
    pub end: usize,
}

/// Analyzed Markdown document.
///
/// Both element sequences preserve first-occurrence order in the source
/// text; rewriting relies on that for positional replacement.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// Source file path.
    pub path: PathBuf,
    /// Directory local image paths resolve against.
    pub base_dir: PathBuf,
    /// Raw document text.
    pub text: String,
    /// Image occurrences in source order.
    pub images: Vec<ImageReference>,
    /// Mermaid blocks in source order.
    pub diagrams: Vec<DiagramBlock>,
    /// First H1 text, marker and surrounding whitespace stripped.
    /// `/` in the heading is preserved verbatim; hierarchy handling is
    /// the orchestrator's concern.
    pub title: Option<String>,
}

impl ParsedDocument {
    /// Analyze document text. Local image paths resolve against the
    /// source file's own directory, not the working directory.
    ///
    /// An empty document yields empty sequences and no title.
    #[must_use]
    pub fn parse(text: &str, source_path: &Path) -> Self {
        let base_dir = source_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf();

        Self {
            path: source_path.to_path_buf(),
            images: extract_images(text, &base_dir),
            diagrams: extract_diagrams(text),
            title: extract_title(text),
            text: text.to_owned(),
            base_dir,
        }
    }

    /// Read and analyze a file. Undecodable (non-UTF-8) input is
    /// rejected here, before analysis.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text, path))
    }

    /// Local image references whose resolved path exists on disk.
    pub fn uploadable_images(&self) -> impl Iterator<Item = &ImageReference> {
        self.images.iter().filter(|img| img.is_uploadable())
    }

    /// Local image references that do not exist on disk.
    pub fn missing_images(&self) -> impl Iterator<Item = &ImageReference> {
        self.images
            .iter()
            .filter(|img| img.kind == ImageKind::Local && !img.is_uploadable())
    }

    /// Rewrite content by replacing recorded occurrences whose verbatim
    /// text has an entry in `replacements`.
    ///
    /// Replacement is positional: each occurrence is spliced at its
    /// recorded span, left to right, so repeated identical snippets are
    /// each replaced exactly once and unmapped occurrences stay
    /// untouched. An empty map yields the input text unchanged.
    #[must_use]
    pub fn rewrite(&self, replacements: &HashMap<String, String>) -> String {
        if replacements.is_empty() {
            return self.text.clone();
        }

        let mut spans: Vec<(usize, usize, &str)> = self
            .images
            .iter()
            .map(|img| (img.start, img.end, img.original_text.as_str()))
            .chain(
                self.diagrams
                    .iter()
                    .map(|block| (block.start, block.end, block.original_text.as_str())),
            )
            .collect();
        spans.sort_unstable_by_key(|&(start, _, _)| start);

        let mut out = String::with_capacity(self.text.len());
        let mut cursor = 0;
        for (start, end, original) in spans {
            // Image syntax inside a diagram block is covered by the
            // enclosing block's span.
            if start < cursor {
                continue;
            }
            if let Some(replacement) = replacements.get(original) {
                out.push_str(&self.text[cursor..start]);
                out.push_str(replacement);
                cursor = end;
            }
        }
        out.push_str(&self.text[cursor..]);
        out
    }

    /// Structural report for the `analyze` command.
    #[must_use]
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            file: self.path.display().to_string(),
            total_images: self.images.len(),
            local_images: self
                .images
                .iter()
                .filter(|img| img.kind == ImageKind::Local)
                .count(),
            external_images: self
                .images
                .iter()
                .filter(|img| img.kind == ImageKind::External)
                .count(),
            missing_images: self.missing_images().count(),
            mermaid_blocks: self.diagrams.len(),
            title: self.title.clone(),
            images: self
                .images
                .iter()
                .map(|img| ImageSummary {
                    alt: img.alt_text.clone(),
                    path: img.path.clone(),
                    external: img.kind == ImageKind::External,
                    exists: img.is_uploadable(),
                })
                .collect(),
            mermaid_previews: self.diagrams.iter().map(|b| preview(&b.source)).collect(),
        }
    }
}

/// Per-image line of a [`DocumentSummary`].
#[derive(Debug, Clone, Serialize)]
pub struct ImageSummary {
    pub alt: String,
    pub path: String,
    pub external: bool,
    pub exists: bool,
}

/// JSON-serializable analysis report.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub file: String,
    pub title: Option<String>,
    pub total_images: usize,
    pub local_images: usize,
    pub external_images: usize,
    pub missing_images: usize,
    pub mermaid_blocks: usize,
    pub images: Vec<ImageSummary>,
    pub mermaid_previews: Vec<String>,
}

fn extract_images(text: &str, base_dir: &Path) -> Vec<ImageReference> {
    IMAGE_PATTERN
        .captures_iter(text)
        .map(|caps| {
            let whole = caps.get(0).unwrap();
            let path = caps[2].to_owned();
            let (kind, resolved) = classify_path(&path, base_dir);
            ImageReference {
                original_text: whole.as_str().to_owned(),
                alt_text: caps[1].to_owned(),
                path,
                kind,
                resolved,
                start: whole.start(),
                end: whole.end(),
            }
        })
        .collect()
}

/// Classify a reference and resolve local paths against `base_dir`.
///
/// Anything without a scheme prefix is local; canonicalization doubles
/// as the existence check.
fn classify_path(path: &str, base_dir: &Path) -> (ImageKind, Option<PathBuf>) {
    if path.starts_with("http://") || path.starts_with("https://") || path.starts_with("//") {
        return (ImageKind::External, None);
    }
    let resolved = base_dir.join(path).canonicalize().ok();
    (ImageKind::Local, resolved)
}

fn extract_diagrams(text: &str) -> Vec<DiagramBlock> {
    MERMAID_PATTERN
        .captures_iter(text)
        .enumerate()
        .map(|(index, caps)| {
            let whole = caps.get(0).unwrap();
            let source = caps[1].trim().to_owned();
            DiagramBlock {
                id: diagram_id(index, &source),
                original_text: whole.as_str().to_owned(),
                source,
                start: whole.start(),
                end: whole.end(),
            }
        })
        .collect()
}

fn extract_title(text: &str) -> Option<String> {
    H1_PATTERN
        .captures(text)
        .map(|caps| caps[1].trim().to_owned())
}

/// Identifier for a diagram block: `diagram_{index}_{hash}`.
///
/// Repeated conversions of the same content produce the same id; the
/// index keeps repeated identical blocks within one document distinct.
fn diagram_id(index: usize, source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    let digest = hasher.finalize();
    format!("diagram_{index}_{}", hex::encode(&digest[..6]))
}

fn preview(source: &str) -> String {
    if source.chars().count() <= PREVIEW_LEN {
        return source.to_owned();
    }
    let cut: String = source.chars().take(PREVIEW_LEN).collect();
    format!("{cut}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(text: &str) -> ParsedDocument {
        ParsedDocument::parse(text, Path::new("/docs/page.md"))
    }

    #[test]
    fn test_extracts_images_in_source_order() {
        let doc = parse("![a](one.png) text ![b](two.png)\n![c](https://example.com/x.png)");

        assert_eq!(doc.images.len(), 3);
        assert_eq!(doc.images[0].path, "one.png");
        assert_eq!(doc.images[1].path, "two.png");
        assert_eq!(doc.images[2].kind, ImageKind::External);
    }

    #[test]
    fn test_duplicate_references_are_distinct_entries() {
        let doc = parse("![x](same.png)\n\n![x](same.png)\n");

        assert_eq!(doc.images.len(), 2);
        assert_eq!(doc.images[0].original_text, doc.images[1].original_text);
        assert!(doc.images[0].start < doc.images[1].start);
    }

    #[test]
    fn test_external_detection() {
        let doc = parse("![](http://a/x.png) ![](https://a/y.png) ![](//cdn/z.png) ![](img/w.png)");

        let kinds: Vec<_> = doc.images.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ImageKind::External,
                ImageKind::External,
                ImageKind::External,
                ImageKind::Local
            ]
        );
    }

    #[test]
    fn test_local_image_resolution() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("shot.png"), b"png").unwrap();
        let md_path = dir.path().join("page.md");

        let doc = ParsedDocument::parse("![a](shot.png) ![b](missing.png)", &md_path);

        assert!(doc.images[0].resolved.is_some());
        assert_eq!(doc.images[1].resolved, None);
        assert_eq!(doc.images[1].kind, ImageKind::Local);
        assert_eq!(doc.missing_images().count(), 1);
    }

    #[test]
    fn test_extracts_mermaid_blocks() {
        let doc = parse("```mermaid\ngraph TD\n  A --> B\n```\n\n```mermaid\nflowchart LR\n```\n");

        assert_eq!(doc.diagrams.len(), 2);
        assert_eq!(doc.diagrams[0].source, "graph TD\n  A --> B");
        assert!(doc.diagrams[0].original_text.starts_with("```mermaid"));
        assert!(doc.diagrams[0].original_text.ends_with("```"));
    }

    #[test]
    fn test_unterminated_fence_is_not_a_block() {
        let doc = parse("```mermaid\ngraph TD\n  A --> B\n");
        assert!(doc.diagrams.is_empty());
    }

    #[test]
    fn test_other_code_fences_ignored() {
        let doc = parse("```rust\nfn main() {}\n```\n");
        assert!(doc.diagrams.is_empty());
    }

    #[test]
    fn test_diagram_ids_stable_and_unique() {
        let doc = parse("```mermaid\ngraph TD\n```\n\n```mermaid\ngraph TD\n```\n");
        let again = parse("```mermaid\ngraph TD\n```\n\n```mermaid\ngraph TD\n```\n");

        assert_eq!(doc.diagrams[0].id, again.diagrams[0].id);
        assert_ne!(doc.diagrams[0].id, doc.diagrams[1].id);
        assert!(doc.diagrams[0].id.starts_with("diagram_0_"));
    }

    #[test]
    fn test_title_extraction() {
        assert_eq!(parse("# My Title\n\nbody").title.as_deref(), Some("My Title"));
        assert_eq!(parse("body only").title, None);
        assert_eq!(parse("## Not H1\n").title, None);
        assert_eq!(
            parse("#   Spaced Out   \n").title.as_deref(),
            Some("Spaced Out")
        );
    }

    #[test]
    fn test_hierarchical_title_preserved_verbatim() {
        let doc = parse("# Guides/Setup/Install\n");
        assert_eq!(doc.title.as_deref(), Some("Guides/Setup/Install"));
    }

    #[test]
    fn test_empty_document() {
        let doc = parse("");
        assert!(doc.images.is_empty());
        assert!(doc.diagrams.is_empty());
        assert_eq!(doc.title, None);
    }

    #[test]
    fn test_rewrite_empty_map_is_identity() {
        let text = "# T\n\n![a](one.png)\n\n```mermaid\ngraph TD\n```\n";
        let doc = parse(text);
        assert_eq!(doc.rewrite(&HashMap::new()), text);
    }

    #[test]
    fn test_rewrite_replaces_each_occurrence() {
        let doc = parse("![x](same.png) middle ![x](same.png) end");
        let replacements = HashMap::from([(
            "![x](same.png)".to_owned(),
            "![image][same.png]".to_owned(),
        )]);

        assert_eq!(
            doc.rewrite(&replacements),
            "![image][same.png] middle ![image][same.png] end"
        );
    }

    #[test]
    fn test_rewrite_leaves_unmapped_occurrences() {
        let doc = parse("![a](one.png) and ![b](two.png)");
        let replacements =
            HashMap::from([("![a](one.png)".to_owned(), "![image][one.png]".to_owned())]);

        assert_eq!(
            doc.rewrite(&replacements),
            "![image][one.png] and ![b](two.png)"
        );
    }

    #[test]
    fn test_rewrite_diagram_block_whole() {
        let text = "before\n```mermaid\ngraph TD\n  A --> B\n```\nafter";
        let doc = parse(text);
        let replacements = HashMap::from([(
            doc.diagrams[0].original_text.clone(),
            "![image][diagram.png]".to_owned(),
        )]);

        assert_eq!(
            doc.rewrite(&replacements),
            "before\n![image][diagram.png]\nafter"
        );
    }

    #[test]
    fn test_rewrite_image_syntax_inside_diagram_block() {
        // The block span wins; the nested image occurrence is not
        // replaced separately.
        let text = "```mermaid\ngraph TD\n  A[\"![x](a.png)\"]\n```\n![x](a.png)";
        let doc = parse(text);
        let mut replacements = HashMap::new();
        replacements.insert(
            doc.diagrams[0].original_text.clone(),
            "DIAGRAM".to_owned(),
        );
        replacements.insert("![x](a.png)".to_owned(), "IMAGE".to_owned());

        assert_eq!(doc.rewrite(&replacements), "DIAGRAM\nIMAGE");
    }

    #[test]
    fn test_summary_counts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ok.png"), b"png").unwrap();
        let doc = ParsedDocument::parse(
            "# T\n![a](ok.png) ![b](gone.png) ![c](https://x/y.png)\n```mermaid\ngraph TD\n```\n",
            &dir.path().join("page.md"),
        );

        let summary = doc.summary();
        assert_eq!(summary.total_images, 3);
        assert_eq!(summary.local_images, 2);
        assert_eq!(summary.external_images, 1);
        assert_eq!(summary.missing_images, 1);
        assert_eq!(summary.mermaid_blocks, 1);
        assert_eq!(summary.title.as_deref(), Some("T"));
        assert!(summary.images[0].exists);
        assert!(!summary.images[1].exists);
    }

    #[test]
    fn test_preview_truncation() {
        let long = "x".repeat(150);
        let short = preview(&long);
        assert_eq!(short.chars().count(), PREVIEW_LEN + 3);
        assert!(short.ends_with("..."));
        assert_eq!(preview("short"), "short");
    }
}
