pub mod compositor;
pub mod config;
pub mod model;
pub mod overlay;
