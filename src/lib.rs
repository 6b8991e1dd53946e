#![deny(unsafe_code)]

pub mod assets;
pub mod foundation;
pub mod layout;
pub mod render;
pub mod scene;
pub mod session;
pub mod text;

#[cfg(feature = "ffi")]
pub mod ffi;

pub use assets::color::Rgba8;
pub use assets::store::AssetResolver;
pub use foundation::core::{PixelBuffer, PxRect, Surface};
pub use foundation::error::{Status, TachieError, TachieResult};
pub use layout::geometry::{FillMode, HAlign, PasteMode, VAlign, aligned_position, scaled_rect};
pub use render::layer_cache::{LayerCacheStats, RenderMode, StaticLayerCache};
pub use render::scaler::RendererScaler;
pub use scene::compositor::FrameRequest;
pub use scene::config::{EngineConfig, GuiSettings, ImageCompression, PasteImageSettings, StyleConfig};
pub use scene::overlay::{EmojiDescriptor, ImageInput, OverlayRequest};
pub use session::engine::{CacheScope, Engine};
pub use text::segment::{TextSegment, segment_text};
