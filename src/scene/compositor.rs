use crate::assets::store::{AssetResolver, strip_extension};
use crate::foundation::core::Surface;
use crate::foundation::error::{TachieError, TachieResult};
use crate::layout::geometry::aligned_position;
use crate::render::layer_cache::{RenderMode, StaticLayerCache};
use crate::render::scaler::RendererScaler;
use crate::scene::config::StyleConfig;
use crate::scene::model::{ComponentDef, ComponentKind, parse_components};
use crate::text::draw::{Shadow, draw_name_runs, render_text_component};
use crate::text::font_cache::FontCache;

/// Inputs of one full scene render.
#[derive(Clone, Debug)]
pub struct FrameRequest<'a> {
    pub width: u32,
    pub height: u32,
    pub components_json: &'a str,
    /// Character drawn by character components that aren't pinned to their own.
    pub character_name: &'a str,
    pub emotion_index: i64,
    /// Background `c<index>` used by background components without an overlay.
    pub background_index: i64,
}

/// A drawn component and where its top-left corner lands on the canvas.
struct Placed {
    surface: Surface,
    x: i32,
    y: i32,
}

/// Walks a component list and composites it, recording or replaying static segments.
pub struct Compositor<'a> {
    pub resolver: &'a AssetResolver,
    pub style: &'a StyleConfig,
    pub fonts: &'a mut FontCache,
    pub scaler: &'a mut RendererScaler,
}

impl Compositor<'_> {
    #[tracing::instrument(skip_all, fields(width = req.width, height = req.height))]
    pub fn compose(
        &mut self,
        req: &FrameRequest<'_>,
        layers: &mut StaticLayerCache,
    ) -> TachieResult<Surface> {
        if req.width == 0 || req.height == 0 {
            return Err(TachieError::render(format!(
                "canvas size {}x{} must be non-zero",
                req.width, req.height
            )));
        }
        let components = parse_components(req.components_json)?;
        let mut canvas = Surface::new(req.width, req.height)?;

        let mode = layers.begin_render();
        let building = mode == RenderMode::Building;
        tracing::debug!(?mode, components = components.len(), "scene render started");

        let mut open: Option<Surface> = None;
        for (index, comp) in components.iter().enumerate() {
            let Some(comp) = comp else {
                continue;
            };

            if comp.use_cache {
                match layers.next_segment() {
                    Some(segment) => canvas.blit_over(segment, 0, 0),
                    None => tracing::warn!(index, "replay marker found no cached segment"),
                }
                continue;
            }
            if !comp.enabled {
                continue;
            }

            if building {
                if comp.is_static() {
                    if open.is_none() {
                        open = Some(Surface::new(req.width, req.height)?);
                    }
                } else if let Some(segment) = open.take() {
                    close_segment(&mut canvas, layers, segment)?;
                }
            }

            match self.draw_component(comp, req) {
                // While a segment is open the canvas only sees the flattened segment, exactly as
                // a later replay will.
                Ok(Some(placed)) => match open.as_mut() {
                    Some(segment) => segment.blit_over(&placed.surface, placed.x, placed.y),
                    None => canvas.blit_over(&placed.surface, placed.x, placed.y),
                },
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(index, kind = %comp.type_name, error = %e, "component skipped");
                }
            }
        }

        if let Some(segment) = open.take() {
            close_segment(&mut canvas, layers, segment)?;
        }
        layers.finish_render();

        if mode == RenderMode::Replaying && layers.remaining() > 0 {
            tracing::warn!(
                unused = layers.remaining(),
                "cached segments were not replayed; component list differs from the cached scene"
            );
        }
        tracing::debug!(segments = layers.len(), "scene render finished");
        Ok(canvas)
    }

    fn draw_component(
        &mut self,
        comp: &ComponentDef,
        req: &FrameRequest<'_>,
    ) -> TachieResult<Option<Placed>> {
        match comp.kind {
            ComponentKind::Background => self.draw_background(comp, req).map(Some),
            ComponentKind::Character => self.draw_character(comp, req).map(Some),
            ComponentKind::Namebox => self.draw_namebox(comp, req).map(Some),
            ComponentKind::Text => self.draw_text(comp, req),
            ComponentKind::Textbox | ComponentKind::Extra | ComponentKind::Other => {
                self.draw_overlay(comp, req)
            }
        }
    }

    fn place(
        &mut self,
        surface: Surface,
        scale: f32,
        align: &str,
        offset_x: i32,
        offset_y: i32,
        req: &FrameRequest<'_>,
    ) -> Placed {
        let surface = self.scaler.apply_scale(surface, scale);
        let (x, y) = aligned_position(
            align,
            offset_x,
            offset_y,
            req.width,
            req.height,
            surface.width(),
            surface.height(),
        );
        Placed { surface, x, y }
    }

    fn draw_background(
        &mut self,
        comp: &ComponentDef,
        req: &FrameRequest<'_>,
    ) -> TachieResult<Placed> {
        let name = if comp.overlay.is_empty() {
            format!("c{}", req.background_index)
        } else {
            strip_extension(&comp.overlay).to_owned()
        };
        let img = self.resolver.load_background(&name)?;
        Ok(self.place(img, comp.scale, &comp.align, comp.offset_x, comp.offset_y, req))
    }

    fn draw_character(
        &mut self,
        comp: &ComponentDef,
        req: &FrameRequest<'_>,
    ) -> TachieResult<Placed> {
        let (name, emotion) = if comp.use_fixed_character {
            (comp.character_name.as_str(), comp.emotion_index)
        } else {
            (req.character_name, req.emotion_index)
        };
        if name.is_empty() || emotion <= 0 {
            return Err(TachieError::asset(format!(
                "no character selected (name {name:?}, emotion {emotion})"
            )));
        }
        let img = self.resolver.load_character(name, emotion)?;
        Ok(self.place(
            img,
            comp.scale * comp.scale1,
            &comp.align,
            comp.offset_x.saturating_add(comp.offset_x1),
            comp.offset_y.saturating_add(comp.offset_y1),
            req,
        ))
    }

    fn draw_namebox(
        &mut self,
        comp: &ComponentDef,
        req: &FrameRequest<'_>,
    ) -> TachieResult<Placed> {
        if comp.overlay.is_empty() {
            return Err(TachieError::asset("name box has no overlay image"));
        }
        let mut plate = self.resolver.load_overlay(&comp.overlay)?;
        draw_name_runs(
            &mut plate,
            self.fonts,
            self.resolver,
            &comp.font_name,
            &comp.textcfg,
        )?;
        Ok(self.place(plate, comp.scale, &comp.align, comp.offset_x, comp.offset_y, req))
    }

    fn draw_text(
        &mut self,
        comp: &ComponentDef,
        req: &FrameRequest<'_>,
    ) -> TachieResult<Option<Placed>> {
        let style = self.style;
        let family = comp.font_family.as_deref().unwrap_or(&style.font_family);
        let size = comp.font_size.unwrap_or(style.font_size);
        let shadow = Shadow::visible(
            comp.shadow_color.unwrap_or(style.shadow_color),
            comp.shadow_offset_x.unwrap_or(style.shadow_offset_x),
            comp.shadow_offset_y.unwrap_or(style.shadow_offset_y),
        );
        let Some(surface) = render_text_component(
            self.fonts,
            self.resolver,
            &comp.text,
            family,
            size,
            comp.text_color.unwrap_or(style.text_color),
            shadow,
            comp.max_width,
        )?
        else {
            return Ok(None);
        };
        let (x, y) = aligned_position(
            &comp.align,
            comp.offset_x,
            comp.offset_y,
            req.width,
            req.height,
            surface.width(),
            surface.height(),
        );
        Ok(Some(Placed { surface, x, y }))
    }

    /// Plain image layers. A component without an overlay draws nothing and still succeeds.
    fn draw_overlay(
        &mut self,
        comp: &ComponentDef,
        req: &FrameRequest<'_>,
    ) -> TachieResult<Option<Placed>> {
        if comp.overlay.is_empty() {
            return Ok(None);
        }
        let img = self.resolver.load_overlay(&comp.overlay)?;
        Ok(Some(self.place(
            img,
            comp.scale,
            &comp.align,
            comp.offset_x,
            comp.offset_y,
            req,
        )))
    }
}

/// Composite a finished static segment and hand it to the cache.
fn close_segment(
    canvas: &mut Surface,
    layers: &mut StaticLayerCache,
    segment: Surface,
) -> TachieResult<()> {
    canvas.blit_over(&segment, 0, 0);
    layers.append_segment(segment)
}

#[cfg(test)]
#[path = "../../tests/unit/scene/compositor.rs"]
mod tests;
