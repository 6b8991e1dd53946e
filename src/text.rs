pub mod draw;
pub mod fit;
pub mod font_cache;
pub mod segment;
