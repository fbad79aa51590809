use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use super::SpriteImage;

/// Why a string cannot name a sprite.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetKeyError {
    #[error("segment {index} of the asset key is empty")]
    EmptySegment { index: usize },
    #[error("asset key segment {segment:?} contains {character:?}; use a-z, 0-9, '_' or '-'")]
    BadCharacter { segment: String, character: char },
}

/// Slash-separated sprite name such as `creatures/wolf`. Segments are
/// lowercase ASCII words, so a key always resolves inside the asset root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetKey {
    segments: Vec<String>,
}

impl AssetKey {
    pub fn parse(raw: &str) -> Result<Self, AssetKeyError> {
        let segments = raw
            .split('/')
            .enumerate()
            .map(|(index, segment)| {
                if segment.is_empty() {
                    return Err(AssetKeyError::EmptySegment { index });
                }
                if let Some(character) = segment.chars().find(|ch| !is_key_char(*ch)) {
                    return Err(AssetKeyError::BadCharacter {
                        segment: segment.to_string(),
                        character,
                    });
                }
                Ok(segment.to_string())
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { segments })
    }

    /// PNG location under `root`, one directory per leading segment.
    pub fn png_path(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        path.extend(&self.segments);
        path.set_extension("png");
        path
    }
}

fn is_key_char(ch: char) -> bool {
    ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' || ch == '-'
}

#[derive(Debug, Error)]
enum SpriteLoadError {
    #[error("no sprite file at this path")]
    Missing,
    #[error("sprite could not be decoded: {0}")]
    Decode(#[from] image::ImageError),
    #[error("sprite has zero width or height")]
    Empty,
}

/// A sprite handle is never partially valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetHandle<'a> {
    Ready(&'a SpriteImage),
    Pending,
    Failed,
}

impl<'a> AssetHandle<'a> {
    pub fn ready(self) -> Option<&'a SpriteImage> {
        match self {
            AssetHandle::Ready(image) => Some(image),
            AssetHandle::Pending | AssetHandle::Failed => None,
        }
    }
}

#[derive(Debug)]
enum AssetSlot {
    Pending,
    Ready(SpriteImage),
    Failed,
}

/// Sprite cache keyed by asset key. Requests during a frame only enqueue;
/// decoding happens in `pump`, which the loop calls between frames.
#[derive(Debug)]
pub struct AssetStore {
    root: PathBuf,
    slots: HashMap<String, AssetSlot>,
    queue: VecDeque<(String, AssetKey)>,
    warned_keys: HashSet<String>,
}

impl AssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            slots: HashMap::new(),
            queue: VecDeque::new(),
            warned_keys: HashSet::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the current handle, queueing a load the first time a key is seen.
    pub fn request(&mut self, key: &str) -> AssetHandle<'_> {
        if !self.slots.contains_key(key) {
            let slot = match AssetKey::parse(key) {
                Ok(parsed) => {
                    self.queue.push_back((key.to_string(), parsed));
                    AssetSlot::Pending
                }
                Err(error) => {
                    warn_asset_load_once(&mut self.warned_keys, key, None, &error.to_string());
                    AssetSlot::Failed
                }
            };
            self.slots.insert(key.to_string(), slot);
        }
        self.get(key)
    }

    /// Current handle without queueing anything. Unknown keys read as pending.
    pub fn get(&self, key: &str) -> AssetHandle<'_> {
        match self.slots.get(key) {
            Some(AssetSlot::Ready(image)) => AssetHandle::Ready(image),
            Some(AssetSlot::Failed) => AssetHandle::Failed,
            Some(AssetSlot::Pending) | None => AssetHandle::Pending,
        }
    }

    pub fn insert_ready(&mut self, key: &str, image: SpriteImage) {
        self.queue.retain(|(queued, _)| queued != key);
        self.slots.insert(key.to_string(), AssetSlot::Ready(image));
    }

    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    /// Decodes up to `budget` queued assets. Returns how many were resolved.
    pub fn pump(&mut self, budget: usize) -> usize {
        let mut resolved = 0;
        while resolved < budget {
            let Some((key, parsed)) = self.queue.pop_front() else {
                break;
            };
            let path = parsed.png_path(&self.root);
            let slot = match decode_sprite(&path) {
                Ok(image) => {
                    debug!(asset_key = %key, width = image.width, height = image.height, "asset_loaded");
                    AssetSlot::Ready(image)
                }
                Err(reason) => {
                    warn_asset_load_once(&mut self.warned_keys, &key, Some(&path), &reason.to_string());
                    AssetSlot::Failed
                }
            };
            self.slots.insert(key, slot);
            resolved += 1;
        }
        resolved
    }
}

fn decode_sprite(path: &Path) -> Result<SpriteImage, SpriteLoadError> {
    if !path.is_file() {
        return Err(SpriteLoadError::Missing);
    }
    let rgba = image::open(path)?.into_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(SpriteLoadError::Empty);
    }
    Ok(SpriteImage {
        width,
        height,
        rgba: rgba.into_raw(),
    })
}

fn warn_asset_load_once(warned_keys: &mut HashSet<String>, key: &str, path: Option<&Path>, reason: &str) {
    if !warned_keys.insert(key.to_string()) {
        return;
    }
    let path_display = path
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<unresolved>".to_string());
    warn!(
        asset_key = key,
        path = %path_display,
        reason = reason,
        "asset_load_failed_using_placeholder"
    );
}
