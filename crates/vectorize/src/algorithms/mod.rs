pub mod histogram;
pub mod median;
pub mod raster;

pub use histogram::*;
pub use median::*;
pub use raster::*;
