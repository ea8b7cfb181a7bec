pub mod config;
pub mod filter;
pub mod rejection;

pub use config::FilterConfig;
pub use filter::AcceptanceFilter;
pub use rejection::Rejection;
