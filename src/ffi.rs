//! C ABI over [`Engine`].
//!
//! Every entry point returns a [`Status`] code and never unwinds into the caller. Buffers
//! written into a [`TachieImage`] belong to the caller until passed to
//! [`tachie_free_image_data`].
#![allow(unsafe_code)]

use std::ffi::{CStr, c_char};
use std::ptr;

use crate::foundation::core::PixelBuffer;
use crate::foundation::error::{Status, TachieError, TachieResult};
use crate::scene::compositor::FrameRequest;
use crate::scene::overlay::{ImageInput, OverlayRequest};
use crate::session::engine::{CacheScope, Engine};

macro_rules! catch_panic {
    ($default:expr, $body:expr) => {
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| $body)) {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(panic = ?e, "caught panic at the C boundary");
                $default
            }
        }
    };
}

/// Pixel buffer handed to the host: straight-alpha RGBA8 rows of `pitch` bytes.
#[repr(C)]
#[derive(Debug)]
pub struct TachieImage {
    pub data: *mut u8,
    pub width: i32,
    pub height: i32,
    pub pitch: i32,
    /// Allocation length in bytes, needed to release the buffer.
    pub len: usize,
}

impl TachieImage {
    fn empty() -> Self {
        Self {
            data: ptr::null_mut(),
            width: 0,
            height: 0,
            pitch: 0,
            len: 0,
        }
    }
}

/// Borrow a C string. Null maps to `None`; invalid UTF-8 is a failure.
///
/// # Safety
/// `p` must be null or point to a NUL-terminated string that outlives the returned borrow.
unsafe fn opt_str<'a>(p: *const c_char) -> Result<Option<&'a str>, Status> {
    if p.is_null() {
        return Ok(None);
    }
    // SAFETY: non-null and NUL-terminated per the caller contract.
    let s = unsafe { CStr::from_ptr(p) };
    s.to_str().map(Some).map_err(|_| Status::Failed)
}

fn failure(err: &TachieError) -> i32 {
    tracing::warn!(error = %err, "call failed");
    Status::from(err).code()
}

fn status_of(res: TachieResult<()>) -> i32 {
    match res {
        Ok(()) => Status::Success.code(),
        Err(e) => failure(&e),
    }
}

/// Move a finished buffer into `out`.
///
/// # Safety
/// `out` must be valid for writes.
unsafe fn write_image(out: *mut TachieImage, buf: PixelBuffer) -> i32 {
    let (Ok(width), Ok(height), Ok(pitch)) = (
        i32::try_from(buf.width),
        i32::try_from(buf.height),
        i32::try_from(buf.pitch),
    ) else {
        return Status::Failed.code();
    };
    let data = Box::into_raw(buf.data.into_boxed_slice());
    let len = data.len();
    // SAFETY: `out` is valid for writes per the caller contract.
    unsafe {
        out.write(TachieImage {
            data: data.cast::<u8>(),
            width,
            height,
            pitch,
            len,
        });
    }
    Status::Success.code()
}

/// Create an engine rooted at `assets_path` (`"assets"` when null).
///
/// # Safety
/// `assets_path` must be null or a valid NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tachie_engine_new(assets_path: *const c_char) -> *mut Engine {
    catch_panic!(ptr::null_mut(), {
        // SAFETY: forwarded caller contract.
        let engine = match unsafe { opt_str(assets_path) } {
            Ok(Some(root)) => Engine::with_assets_root(root),
            Ok(None) => Engine::new(),
            Err(_) => return ptr::null_mut(),
        };
        Box::into_raw(Box::new(engine))
    })
}

/// # Safety
/// `engine` must be null or a pointer from [`tachie_engine_new`] not yet freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tachie_engine_free(engine: *mut Engine) {
    if engine.is_null() {
        return;
    }
    catch_panic!((), {
        // SAFETY: allocated by `tachie_engine_new` and released exactly once.
        drop(unsafe { Box::from_raw(engine) });
    })
}

/// # Safety
/// `engine` must be null or a live engine; `assets_path` null or NUL-terminated.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tachie_set_global_config(
    engine: *const Engine,
    assets_path: *const c_char,
    min_image_ratio: f32,
) -> i32 {
    catch_panic!(Status::Failed.code(), {
        // SAFETY: forwarded caller contract.
        let Some(engine) = (unsafe { engine.as_ref() }) else {
            return Status::InitFailed.code();
        };
        match unsafe { opt_str(assets_path) } {
            Ok(Some(root)) => {
                engine.set_global_config(root, min_image_ratio);
                Status::Success.code()
            }
            Ok(None) => Status::Failed.code(),
            Err(status) => status.code(),
        }
    })
}

/// # Safety
/// `engine` must be null or a live engine; `json` null or NUL-terminated.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tachie_update_gui_settings(
    engine: *const Engine,
    json: *const c_char,
) -> i32 {
    catch_panic!(Status::Failed.code(), {
        // SAFETY: forwarded caller contract.
        let Some(engine) = (unsafe { engine.as_ref() }) else {
            return Status::InitFailed.code();
        };
        match unsafe { opt_str(json) } {
            Ok(Some(json)) => status_of(engine.update_gui_settings(json)),
            Ok(None) => Status::JsonParseError.code(),
            Err(status) => status.code(),
        }
    })
}

/// # Safety
/// `engine` must be null or a live engine; `json` null or NUL-terminated.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tachie_update_style_config(
    engine: *const Engine,
    json: *const c_char,
) -> i32 {
    catch_panic!(Status::Failed.code(), {
        // SAFETY: forwarded caller contract.
        let Some(engine) = (unsafe { engine.as_ref() }) else {
            return Status::InitFailed.code();
        };
        match unsafe { opt_str(json) } {
            Ok(Some(json)) => status_of(engine.update_style_config(json)),
            Ok(None) => Status::JsonParseError.code(),
            Err(status) => status.code(),
        }
    })
}

/// Clear `"all"` caches or only `"layers"`. Other names fail.
///
/// # Safety
/// `engine` must be null or a live engine; `scope` null or NUL-terminated.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tachie_clear_cache(engine: *const Engine, scope: *const c_char) -> i32 {
    catch_panic!(Status::Failed.code(), {
        // SAFETY: forwarded caller contract.
        let Some(engine) = (unsafe { engine.as_ref() }) else {
            return Status::InitFailed.code();
        };
        match unsafe { opt_str(scope) } {
            Ok(Some(name)) => match CacheScope::parse(name) {
                Some(scope) => {
                    engine.clear_cache(scope);
                    Status::Success.code()
                }
                None => {
                    tracing::warn!(scope = name, "unknown cache scope");
                    Status::Failed.code()
                }
            },
            Ok(None) => Status::Failed.code(),
            Err(status) => status.code(),
        }
    })
}

/// Composite a component list into `out`.
///
/// # Safety
/// `engine` must be null or a live engine; string arguments null or NUL-terminated; `out`
/// null or valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tachie_generate_complete_image(
    engine: *const Engine,
    canvas_width: i32,
    canvas_height: i32,
    components_json: *const c_char,
    character_name: *const c_char,
    emotion_index: i32,
    background_index: i32,
    out: *mut TachieImage,
) -> i32 {
    catch_panic!(Status::Failed.code(), {
        if out.is_null() {
            return Status::Failed.code();
        }
        // SAFETY: `out` is non-null and writable per the caller contract.
        unsafe { out.write(TachieImage::empty()) };
        // SAFETY: forwarded caller contract.
        let Some(engine) = (unsafe { engine.as_ref() }) else {
            return Status::InitFailed.code();
        };
        let components = match unsafe { opt_str(components_json) } {
            Ok(Some(s)) => s,
            Ok(None) => return Status::JsonParseError.code(),
            Err(status) => return status.code(),
        };
        let character = match unsafe { opt_str(character_name) } {
            Ok(s) => s.unwrap_or_default(),
            Err(status) => return status.code(),
        };
        let (Ok(width), Ok(height)) = (u32::try_from(canvas_width), u32::try_from(canvas_height))
        else {
            return Status::Failed.code();
        };

        let res = engine.generate_complete_image(&FrameRequest {
            width,
            height,
            components_json: components,
            character_name: character,
            emotion_index: i64::from(emotion_index),
            background_index: i64::from(background_index),
        });
        match res {
            // SAFETY: checked above.
            Ok(buf) => unsafe { write_image(out, buf) },
            Err(e) => failure(&e),
        }
    })
}

/// Draw text and an optional pasted image over the last full render into `out`.
///
/// # Safety
/// `engine` must be null or a live engine; string arguments null or NUL-terminated;
/// `image_data` null or readable for `image_pitch * image_height` bytes; `out` null or valid
/// for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tachie_draw_content_simple(
    engine: *const Engine,
    text: *const c_char,
    emoji_json: *const c_char,
    image_data: *const u8,
    image_width: i32,
    image_height: i32,
    image_pitch: i32,
    out: *mut TachieImage,
) -> i32 {
    catch_panic!(Status::Failed.code(), {
        if out.is_null() {
            return Status::Failed.code();
        }
        // SAFETY: `out` is non-null and writable per the caller contract.
        unsafe { out.write(TachieImage::empty()) };
        // SAFETY: forwarded caller contract.
        let Some(engine) = (unsafe { engine.as_ref() }) else {
            return Status::InitFailed.code();
        };
        let text = match unsafe { opt_str(text) } {
            Ok(s) => s.unwrap_or_default(),
            Err(status) => return status.code(),
        };
        let emoji_json = match unsafe { opt_str(emoji_json) } {
            Ok(s) => s,
            Err(status) => return status.code(),
        };

        let image = match (
            u32::try_from(image_width),
            u32::try_from(image_height),
            usize::try_from(image_pitch),
        ) {
            (Ok(width), Ok(height), Ok(pitch))
                if !image_data.is_null() && width > 0 && height > 0 =>
            {
                let len = pitch.saturating_mul(height as usize);
                // SAFETY: readable for `pitch * height` bytes per the caller contract.
                let data = unsafe { std::slice::from_raw_parts(image_data, len) };
                Some(ImageInput {
                    data,
                    width,
                    height,
                    pitch,
                })
            }
            _ => None,
        };

        let res = engine.draw_content(&OverlayRequest {
            text,
            emoji_json,
            image,
        });
        match res {
            // SAFETY: checked above.
            Ok(buf) => unsafe { write_image(out, buf) },
            Err(e) => failure(&e),
        }
    })
}

/// Release a buffer written by a render call and reset `image` to empty.
///
/// # Safety
/// `image` must be null or point to a [`TachieImage`] filled by this library.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tachie_free_image_data(image: *mut TachieImage) {
    catch_panic!((), {
        // SAFETY: forwarded caller contract.
        let Some(image) = (unsafe { image.as_mut() }) else {
            return;
        };
        if !image.data.is_null() {
            let slice = ptr::slice_from_raw_parts_mut(image.data, image.len);
            // SAFETY: `data`/`len` came from `Box::into_raw` of a boxed slice in `write_image`.
            drop(unsafe { Box::from_raw(slice) });
        }
        *image = TachieImage::empty();
    })
}

/// # Safety
/// `engine` must be null or a live engine.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tachie_cleanup_all(engine: *const Engine) {
    catch_panic!((), {
        // SAFETY: forwarded caller contract.
        if let Some(engine) = unsafe { engine.as_ref() } {
            engine.cleanup_all();
        }
    })
}

/// # Safety
/// `engine` must be null or a live engine.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tachie_cleanup_renderer(engine: *const Engine) {
    catch_panic!((), {
        // SAFETY: forwarded caller contract.
        if let Some(engine) = unsafe { engine.as_ref() } {
            engine.cleanup_renderer();
        }
    })
}
