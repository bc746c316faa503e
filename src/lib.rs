pub mod crx;
pub mod output;
pub mod store;
