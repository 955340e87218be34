//! Load specifications and load regions

mod load;
mod region;

pub use load::{Load, LoadType};
pub use region::{Region, MIN_REGION_VOLUME};
