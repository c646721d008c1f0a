use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;

use crate::{
    error::{PlakatError, PlakatResult},
    model::TemplateDescriptor,
    text,
};

pub mod decode;

/// Provider of raw asset bytes for normalized relative paths.
///
/// Descriptors reference assets by slash-separated relative paths; a source
/// decides what those paths resolve against (a directory on disk, an
/// in-memory map, an archive).
pub trait AssetSource: Send + Sync {
    fn fetch(&self, norm_path: &str) -> PlakatResult<Vec<u8>>;
}

/// Asset source rooted at a filesystem directory.
#[derive(Clone, Debug)]
pub struct DirAssets {
    root: PathBuf,
}

impl DirAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetSource for DirAssets {
    fn fetch(&self, norm_path: &str) -> PlakatResult<Vec<u8>> {
        let path = self.root.join(Path::new(norm_path));
        std::fs::read(&path)
            .with_context(|| format!("read asset bytes from '{}'", path.display()))
            .map_err(PlakatError::from)
    }
}

/// In-memory asset source for tests and embedded deployments.
#[derive(Clone, Debug, Default)]
pub struct MemoryAssets {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, norm_path: impl Into<String>, bytes: Vec<u8>) -> &mut Self {
        self.files.insert(norm_path.into(), bytes);
        self
    }
}

impl AssetSource for MemoryAssets {
    fn fetch(&self, norm_path: &str) -> PlakatResult<Vec<u8>> {
        self.files
            .get(norm_path)
            .cloned()
            .ok_or_else(|| PlakatError::asset(format!("no asset stored at '{norm_path}'")))
    }
}

/// Stable content-derived identifier for a prepared asset.
///
/// Ids key the rasterizer's paint caches, so identical bytes reuse the same
/// uploaded paint across renders.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AssetId(u64);

impl AssetId {
    pub fn from_u64(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }

    /// FNV-1a over a kind tag plus the raw encoded bytes.
    pub fn from_content(kind_tag: u8, bytes: &[u8]) -> Self {
        const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
        const PRIME: u64 = 0x0000_0100_0000_01B3;

        let mut h = OFFSET_BASIS ^ u64::from(kind_tag);
        h = h.wrapping_mul(PRIME);
        for &b in bytes {
            h ^= u64::from(b);
            h = h.wrapping_mul(PRIME);
        }
        Self(h)
    }
}

/// Prepared raster image in premultiplied RGBA8 form.
#[derive(Clone, Debug)]
pub struct PreparedImage {
    pub id: AssetId,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

/// Prepared font: raw bytes plus the resolved primary family name.
#[derive(Clone)]
pub struct PreparedFont {
    pub id: AssetId,
    pub bytes: Arc<Vec<u8>>,
    pub family: String,
}

impl std::fmt::Debug for PreparedFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedFont")
            .field("id", &self.id)
            .field("bytes_len", &self.bytes.len())
            .field("family", &self.family)
            .finish()
    }
}

/// User-supplied photo input for the mask layer.
#[derive(Clone, Debug)]
pub enum PhotoSource {
    /// Encoded image bytes (PNG/JPEG), e.g. an uploaded file's contents.
    Bytes(Vec<u8>),
    /// Image file on the local filesystem; not resolved through an
    /// [`AssetSource`], since the photo is picked by the user rather than
    /// referenced by the template.
    Path(PathBuf),
}

/// Decode a photo into a prepared image.
pub fn prepare_photo(photo: &PhotoSource) -> PlakatResult<PreparedImage> {
    match photo {
        PhotoSource::Bytes(bytes) => decode::decode_image(bytes),
        PhotoSource::Path(path) => {
            let bytes = std::fs::read(path).map_err(|e| {
                PlakatError::asset(format!("read photo bytes from '{}': {e}", path.display()))
            })?;
            decode::decode_image(&bytes)
        }
    }
}

/// The fixed descriptor-referenced assets a prepare pass loads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FixedAsset {
    DesignPattern,
    StrokeOverlay,
    Font,
}

impl std::fmt::Display for FixedAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            FixedAsset::DesignPattern => "design pattern",
            FixedAsset::StrokeOverlay => "stroke overlay",
            FixedAsset::Font => "font",
        })
    }
}

/// Outcome of loading one fixed asset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadState {
    Ready,
    Failed(String),
    /// The descriptor does not reference this asset (optional font slot).
    Unconfigured,
}

impl LoadState {
    pub fn is_ready(&self) -> bool {
        matches!(self, LoadState::Ready)
    }
}

#[derive(Clone, Debug)]
pub struct LoadStatus {
    pub asset: FixedAsset,
    pub path: String,
    pub state: LoadState,
}

/// Immutable store of the fixed assets one renderer instance draws from.
///
/// `prepare` front-loads every fetch and decode so later compile/execute
/// stages stay IO-free. A failed load is recorded and logged, never fatal:
/// the corresponding layers are skipped at compile time. The descriptor's
/// `urls.mask` slot is deliberately not loaded; no layer draws it.
#[derive(Clone, Debug)]
pub struct PreparedAssetStore {
    design_pattern: Option<PreparedImage>,
    stroke: Option<PreparedImage>,
    font: Option<PreparedFont>,
    statuses: Vec<LoadStatus>,
}

impl PreparedAssetStore {
    /// Load and decode the fixed assets referenced by `desc`, in parallel,
    /// joining all results before returning.
    #[tracing::instrument(skip_all)]
    pub fn prepare(desc: &TemplateDescriptor, source: &dyn AssetSource) -> Self {
        let (pattern, (stroke, font)) = rayon::join(
            || load_image(source, &desc.urls.design_pattern),
            || {
                rayon::join(
                    || load_image(source, &desc.urls.stroke),
                    || desc.urls.font.as_deref().map(|p| load_font(source, p)),
                )
            },
        );

        let mut statuses = Vec::new();
        let design_pattern = record(
            &mut statuses,
            FixedAsset::DesignPattern,
            &desc.urls.design_pattern,
            pattern,
        );
        let stroke = record(
            &mut statuses,
            FixedAsset::StrokeOverlay,
            &desc.urls.stroke,
            stroke,
        );
        let font = match font {
            Some(result) => record(
                &mut statuses,
                FixedAsset::Font,
                desc.urls.font.as_deref().unwrap_or(""),
                result,
            ),
            None => {
                statuses.push(LoadStatus {
                    asset: FixedAsset::Font,
                    path: String::new(),
                    state: LoadState::Unconfigured,
                });
                None
            }
        };

        Self {
            design_pattern,
            stroke,
            font,
            statuses,
        }
    }

    pub fn design_pattern(&self) -> Option<&PreparedImage> {
        self.design_pattern.as_ref()
    }

    pub fn stroke_overlay(&self) -> Option<&PreparedImage> {
        self.stroke.as_ref()
    }

    pub fn font(&self) -> Option<&PreparedFont> {
        self.font.as_ref()
    }

    /// One record per fixed asset, in load order.
    pub fn statuses(&self) -> &[LoadStatus] {
        &self.statuses
    }

    pub fn status_of(&self, asset: FixedAsset) -> Option<&LoadStatus> {
        self.statuses.iter().find(|s| s.asset == asset)
    }
}

fn record<T>(
    statuses: &mut Vec<LoadStatus>,
    asset: FixedAsset,
    path: &str,
    result: PlakatResult<T>,
) -> Option<T> {
    match result {
        Ok(v) => {
            statuses.push(LoadStatus {
                asset,
                path: path.to_string(),
                state: LoadState::Ready,
            });
            Some(v)
        }
        Err(err) => {
            tracing::warn!(%asset, path, error = %err, "fixed asset failed to load");
            statuses.push(LoadStatus {
                asset,
                path: path.to_string(),
                state: LoadState::Failed(err.to_string()),
            });
            None
        }
    }
}

fn load_image(source: &dyn AssetSource, path: &str) -> PlakatResult<PreparedImage> {
    let norm = normalize_rel_path(path)?;
    let bytes = source.fetch(&norm)?;
    decode::decode_image(&bytes)
}

fn load_font(source: &dyn AssetSource, path: &str) -> PlakatResult<PreparedFont> {
    let norm = normalize_rel_path(path)?;
    let bytes = source.fetch(&norm)?;
    let family = text::resolve_family_name(&bytes)?;
    Ok(PreparedFont {
        id: AssetId::from_content(b'F', &bytes),
        bytes: Arc::new(bytes),
        family,
    })
}

/// Normalize and validate descriptor-relative asset paths.
///
/// The normalized result uses `/` separators, removes `.` segments, and
/// rejects absolute paths or parent traversals (`..`).
pub fn normalize_rel_path(source: &str) -> PlakatResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(PlakatError::validation("asset paths must be relative"));
    }
    if s.is_empty() {
        return Err(PlakatError::validation("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(PlakatError::validation("asset paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(PlakatError::validation(
            "asset path must contain a file name",
        ));
    }

    Ok(out.join("/"))
}
