use crate::foundation::core::Surface;
use crate::foundation::error::{TachieError, TachieResult};

/// What a full render does with the static layer cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderMode {
    /// Composite everything and record runs of static components as new segments.
    Building,
    /// Replay markers in the component list pull recorded segments in order.
    Replaying,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LayerCacheStats {
    pub segments: usize,
    pub retained_bytes: usize,
    pub replayed: usize,
}

/// Ordered canvas-sized snapshots of consecutive static components.
///
/// A render that carries replay markers reads segments back in the order they were recorded; a
/// render without markers rebuilds the list from scratch. The cache owns its surfaces.
#[derive(Debug, Default)]
pub struct StaticLayerCache {
    segments: Vec<Surface>,
    cursor: usize,
    building: bool,
}

impl StaticLayerCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segments not yet consumed in the current replay pass.
    pub fn remaining(&self) -> usize {
        self.segments.len().saturating_sub(self.cursor)
    }

    pub fn is_building(&self) -> bool {
        self.building
    }

    pub fn stats(&self) -> LayerCacheStats {
        LayerCacheStats {
            segments: self.segments.len(),
            retained_bytes: self.segments.iter().map(|s| s.as_raw().len()).sum(),
            replayed: self.cursor,
        }
    }

    pub fn clear(&mut self) {
        self.segments.clear();
        self.cursor = 0;
        self.building = false;
    }

    /// Start a full render.
    ///
    /// With recorded segments the render replays them; an empty cache starts a fresh build. The
    /// read cursor is reset either way.
    pub fn begin_render(&mut self) -> RenderMode {
        self.begin_replay_pass();
        if self.segments.is_empty() {
            self.building = true;
            RenderMode::Building
        } else {
            self.building = false;
            RenderMode::Replaying
        }
    }

    /// Rewind the read cursor to the first segment.
    pub fn begin_replay_pass(&mut self) {
        self.cursor = 0;
    }

    /// Record one finished static segment. Only valid while building.
    pub fn append_segment(&mut self, segment: Surface) -> TachieResult<()> {
        if !self.building {
            return Err(TachieError::render(
                "static layer cache is not recording segments",
            ));
        }
        self.segments.push(segment);
        Ok(())
    }

    /// Next recorded segment in replay order, or `None` once all are consumed.
    pub fn next_segment(&mut self) -> Option<&Surface> {
        let seg = self.segments.get(self.cursor)?;
        self.cursor += 1;
        Some(seg)
    }

    /// Stop recording at the end of a render.
    pub fn finish_render(&mut self) {
        self.building = false;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/layer_cache.rs"]
mod tests;
