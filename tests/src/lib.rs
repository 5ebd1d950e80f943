//! Lithodesign integration tests.

#[cfg(test)]
pub mod cache;
#[cfg(test)]
pub mod gds;
#[cfg(test)]
pub mod params;
pub mod paths;
#[cfg(test)]
pub mod pdk;
pub mod shared;
