use std::path::{Path, PathBuf};

use crate::assets::decode::load_file;
use crate::assets::emoji::emoji_file_candidates;
use crate::foundation::core::Surface;
use crate::foundation::error::{TachieError, TachieResult};

/// Raster extensions probed for every image category, in priority order.
pub const IMAGE_EXTENSIONS: &[&str] = &[".webp", ".png", ".jpg", ".jpeg", ".bmp"];
/// Extra extensions accepted for overlay and background art.
pub const VECTOR_EXTENSIONS: &[&str] = &[".svg"];
/// Font file extensions probed under `fonts/`.
pub const FONT_EXTENSIONS: &[&str] = &[".ttf", ".otf", ".ttc"];

/// Reject names that would escape the assets root.
pub(crate) fn check_asset_name(name: &str) -> TachieResult<&str> {
    if name.is_empty() {
        return Err(TachieError::asset("asset name must be non-empty"));
    }
    let s = name.replace('\\', "/");
    if s.starts_with('/') {
        return Err(TachieError::asset("asset names must be relative"));
    }
    if s.split('/').any(|part| part == "..") {
        return Err(TachieError::asset("asset names must not contain '..'"));
    }
    Ok(name)
}

/// Strip a trailing `.ext` from an overlay reference, leaving directories alone.
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(i) if !name[i..].contains(['/', '\\']) && i > 0 => &name[..i],
        _ => name,
    }
}

/// Maps logical asset names onto files below the assets root.
#[derive(Clone, Debug)]
pub struct AssetResolver {
    root: PathBuf,
}

impl AssetResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// First existing `base + ext` for `ext` in `exts`.
    pub fn find_with_extensions(base: &Path, exts: &[&str]) -> Option<PathBuf> {
        exts.iter().find_map(|ext| {
            let mut candidate = base.as_os_str().to_owned();
            candidate.push(ext);
            let candidate = PathBuf::from(candidate);
            candidate.is_file().then_some(candidate)
        })
    }

    /// `chara/<name>/<name> (<emotion>)<ext>`
    pub fn character_path(&self, name: &str, emotion: i64) -> TachieResult<PathBuf> {
        let name = check_asset_name(name)?;
        let base = self
            .root
            .join("chara")
            .join(name)
            .join(format!("{name} ({emotion})"));
        Self::find_with_extensions(&base, IMAGE_EXTENSIONS).ok_or_else(|| {
            TachieError::asset(format!("character image not found: {}", base.display()))
        })
    }

    /// `background/<name><ext>`, then `shader/<name><ext>`.
    pub fn background_path(&self, name: &str) -> TachieResult<PathBuf> {
        let name = check_asset_name(name)?;
        ["background", "shader"]
            .iter()
            .find_map(|dir| {
                let base = self.root.join(dir).join(name);
                Self::find_with_extensions(&base, IMAGE_EXTENSIONS)
                    .or_else(|| Self::find_with_extensions(&base, VECTOR_EXTENSIONS))
            })
            .ok_or_else(|| TachieError::asset(format!("background image not found: {name}")))
    }

    /// `shader/<overlay without extension><ext>`
    pub fn overlay_path(&self, overlay: &str) -> TachieResult<PathBuf> {
        let stem = check_asset_name(strip_extension(overlay))?;
        let base = self.root.join("shader").join(stem);
        Self::find_with_extensions(&base, IMAGE_EXTENSIONS)
            .or_else(|| Self::find_with_extensions(&base, VECTOR_EXTENSIONS))
            .ok_or_else(|| TachieError::asset(format!("overlay image not found: {overlay}")))
    }

    /// `fonts/<family><ext>`
    pub fn font_path(&self, family: &str) -> TachieResult<PathBuf> {
        let family = check_asset_name(family)?;
        let base = self.root.join("fonts").join(family);
        Self::find_with_extensions(&base, FONT_EXTENSIONS)
            .ok_or_else(|| TachieError::font(format!("font not found: {family}")))
    }

    pub fn load_character(&self, name: &str, emotion: i64) -> TachieResult<Surface> {
        load_file(&self.character_path(name, emotion)?)
    }

    pub fn load_background(&self, name: &str) -> TachieResult<Surface> {
        load_file(&self.background_path(name)?)
    }

    pub fn load_overlay(&self, overlay: &str) -> TachieResult<Surface> {
        load_file(&self.overlay_path(overlay)?)
    }

    /// Load the image for an emoji cluster, trying modifier-stripped names on a miss.
    pub fn load_emoji(&self, emoji: &str) -> TachieResult<Surface> {
        let dir = self.root.join("emoji");
        let mut last_err = None;
        for file_name in emoji_file_candidates(emoji) {
            let path = dir.join(&file_name);
            if !path.is_file() {
                continue;
            }
            match load_file(&path) {
                Ok(surface) => return Ok(surface),
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err
            .unwrap_or_else(|| TachieError::asset(format!("emoji image not found: {emoji:?}"))))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
