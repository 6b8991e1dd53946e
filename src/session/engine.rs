use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::assets::store::AssetResolver;
use crate::foundation::core::{PixelBuffer, Surface};
use crate::foundation::error::{TachieError, TachieResult};
use crate::render::layer_cache::{LayerCacheStats, StaticLayerCache};
use crate::render::scaler::RendererScaler;
use crate::scene::compositor::{Compositor, FrameRequest};
use crate::scene::config::{EngineConfig, GuiSettings, StyleConfig, apply_partial};
use crate::scene::overlay::{OverlayPainter, OverlayRequest};
use crate::text::font_cache::FontCache;

/// Which caches [`Engine::clear_cache`] drops.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheScope {
    /// Fonts, static layers and the preview.
    All,
    /// Static layers only.
    Layers,
}

impl CacheScope {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "all" => Some(Self::All),
            "layers" => Some(Self::Layers),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct EngineCaches {
    fonts: FontCache,
    layers: StaticLayerCache,
    preview: Option<Surface>,
    scaler: RendererScaler,
}

/// Rendering context shared by every caller of one host.
///
/// Configuration and caches sit behind separate locks. A render snapshots the configuration
/// first, then holds the cache lock for its whole duration, so renders are serialized while
/// setters stay cheap.
#[derive(Debug, Default)]
pub struct Engine {
    config: RwLock<EngineConfig>,
    caches: Mutex<EngineCaches>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_assets_root(root: impl Into<PathBuf>) -> Self {
        let engine = Self::new();
        engine.write_config().assets_root = root.into();
        engine
    }

    fn read_config(&self) -> RwLockReadGuard<'_, EngineConfig> {
        self.config.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_config(&self) -> RwLockWriteGuard<'_, EngineConfig> {
        self.config.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_caches(&self) -> MutexGuard<'_, EngineCaches> {
        self.caches.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current configuration.
    pub fn config(&self) -> EngineConfig {
        self.read_config().clone()
    }

    /// Point the engine at a new assets root.
    ///
    /// Fonts are loaded from the root, so a changed root drops the font cache.
    pub fn set_global_config(&self, assets_root: impl Into<PathBuf>, min_image_ratio: f32) {
        let root = assets_root.into();
        let changed = {
            let mut cfg = self.write_config();
            let changed = cfg.assets_root != root;
            cfg.assets_root = root;
            cfg.min_image_ratio = min_image_ratio;
            changed
        };
        if changed {
            self.lock_caches().fonts.clear();
        }
        tracing::debug!(changed, min_image_ratio, "global config set");
    }

    /// Merge a partial GUI settings document. On error the old settings stay in place.
    pub fn update_gui_settings(&self, json: &str) -> TachieResult<()> {
        let mut cfg = self.write_config();
        let gui: GuiSettings = apply_partial(&cfg.gui, json)?;
        cfg.gui = gui;
        Ok(())
    }

    /// Merge a partial style document. On error the old style stays in place.
    pub fn update_style_config(&self, json: &str) -> TachieResult<()> {
        let mut cfg = self.write_config();
        let style: StyleConfig = apply_partial(&cfg.style, json)?;
        cfg.style = style;
        Ok(())
    }

    pub fn clear_cache(&self, scope: CacheScope) {
        let mut caches = self.lock_caches();
        caches.layers.clear();
        if scope == CacheScope::All {
            caches.fonts.clear();
            caches.preview = None;
        }
        tracing::debug!(?scope, "cache cleared");
    }

    fn snapshot(&self) -> (AssetResolver, EngineConfig) {
        let cfg = self.config();
        (AssetResolver::new(cfg.assets_root.clone()), cfg)
    }

    /// Composite a full scene and remember it as the preview for overlay draws.
    #[tracing::instrument(skip_all, fields(width = req.width, height = req.height))]
    pub fn generate_complete_image(&self, req: &FrameRequest<'_>) -> TachieResult<PixelBuffer> {
        let (resolver, cfg) = self.snapshot();
        let mut guard = self.lock_caches();
        let caches = &mut *guard;

        let canvas = Compositor {
            resolver: &resolver,
            style: &cfg.style,
            fonts: &mut caches.fonts,
            scaler: &mut caches.scaler,
        }
        .compose(req, &mut caches.layers)?;

        caches.preview = Some(canvas.clone());
        Ok(canvas.into_pixel_buffer())
    }

    /// Draw overlay text and an optional pasted image over the last full render.
    #[tracing::instrument(skip_all, fields(text_len = req.text.len()))]
    pub fn draw_content(&self, req: &OverlayRequest<'_>) -> TachieResult<PixelBuffer> {
        let (resolver, cfg) = self.snapshot();
        let mut guard = self.lock_caches();
        let caches = &mut *guard;

        let preview = caches
            .preview
            .as_ref()
            .ok_or_else(|| TachieError::no_preview("no full render has been generated yet"))?;
        let out = OverlayPainter {
            resolver: &resolver,
            style: &cfg.style,
            gui: &cfg.gui,
            fonts: &mut caches.fonts,
            scaler: &mut caches.scaler,
        }
        .draw(preview, req)?;
        Ok(out.into_pixel_buffer())
    }

    /// Drop every cache and release the scaler.
    pub fn cleanup_all(&self) {
        let mut caches = self.lock_caches();
        caches.layers.clear();
        caches.fonts.clear();
        caches.preview = None;
        caches.scaler.cleanup();
        tracing::debug!("engine resources released");
    }

    /// Release only the scaler's render context.
    pub fn cleanup_renderer(&self) {
        self.lock_caches().scaler.cleanup();
    }

    pub fn has_preview(&self) -> bool {
        self.lock_caches().preview.is_some()
    }

    pub fn layer_stats(&self) -> LayerCacheStats {
        self.lock_caches().layers.stats()
    }

    pub fn font_count(&self) -> usize {
        self.lock_caches().fonts.len()
    }

    pub fn renderer_initialized(&self) -> bool {
        self.lock_caches().scaler.is_initialized()
    }
}
