#![deny(clippy::all)]

mod buffer;
pub mod catalog;
pub mod category;
pub mod config;
mod conversion;
pub mod error;
pub mod loader;
pub mod mapper;
#[cfg(feature = "node")]
mod node;
pub mod prelude;
pub mod printer;
pub mod source;
pub mod store;

pub use buffer::documents_to_frame;
pub use conversion::Wrap;
