pub mod cache;
pub mod chart;
pub mod config;
pub mod digest;
pub mod dimension;
pub mod features;
pub mod gap;
pub mod intent;
pub mod recommend;
pub mod streak;
pub mod window;
