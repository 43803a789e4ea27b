mod cache;
mod params;

pub use cache::MemCache;
pub use params::ParameterSet;
