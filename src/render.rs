pub mod layer_cache;
pub mod raster;
pub mod scaler;
