//! Chrome Web Store plumbing: extension IDs, update-service URLs, and the
//! HTTP fetch that supplies raw bytes to [`crate::crx::decode`].

pub mod errors;
pub mod fetch;
pub mod id;
pub mod url;

pub use errors::{FetchError, StoreError};
pub use fetch::{fetch_package, FetchConfig, HttpClient, HttpResponse, ReqwestClient};
pub use id::{parse_store_url, ExtensionId};
pub use url::{percent_decode, Arch, Os, Product, UpdateRequest, DEFAULT_PROD_VERSION};
