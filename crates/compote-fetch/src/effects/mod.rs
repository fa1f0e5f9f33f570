//! Network and filesystem effects behind trait seams.

mod http;
mod pipeline;

pub use http::{BoxStream, DownloadResponse, HttpTransport};
pub use pipeline::FetchPipeline;

#[cfg(feature = "reqwest")]
pub use http::{ReqwestResponse, ReqwestTransport};
