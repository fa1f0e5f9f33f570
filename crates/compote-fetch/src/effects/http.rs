use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;

/// A boxed stream type for HTTP response bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// An HTTP response whose body has not been read yet.
///
/// Status and headers are available up front; the body is consumed at most
/// once through [`DownloadResponse::into_stream`]. Dropping the response
/// closes the connection.
pub trait DownloadResponse: Send {
    type Error: std::error::Error + Send + Sync + 'static;

    fn status(&self) -> u16;

    /// Value of the header `name` (case-insensitive), if present and valid UTF-8.
    fn header(&self, name: &str) -> Option<String>;

    /// `Content-Length`, when the server sent one.
    fn content_length(&self) -> Option<u64>;

    fn into_stream(self) -> BoxStream<'static, Result<Bytes, Self::Error>>;
}

/// Asynchronous HTTP transport used for artifact downloads.
///
/// Implementations follow redirects and report non-2xx statuses through
/// [`DownloadResponse::status`] instead of as errors.
///
/// # Implementations
///
/// - [`ReqwestTransport`]: Production implementation using `reqwest`
/// - Mock implementations for testing
pub trait HttpTransport: Send + Sync {
    type Response: DownloadResponse;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Issue a GET request and return once the response headers arrived.
    fn get(&self, url: &str) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use super::*;

    /// Production HTTP transport using reqwest.
    #[derive(Clone, Debug, Default)]
    pub struct ReqwestTransport {
        client: reqwest::Client,
    }

    impl ReqwestTransport {
        pub fn new(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    pub struct ReqwestResponse(reqwest::Response);

    impl DownloadResponse for ReqwestResponse {
        type Error = reqwest::Error;

        fn status(&self) -> u16 {
            self.0.status().as_u16()
        }

        fn header(&self, name: &str) -> Option<String> {
            self.0
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        }

        fn content_length(&self) -> Option<u64> {
            self.0.content_length()
        }

        fn into_stream(self) -> BoxStream<'static, Result<Bytes, Self::Error>> {
            Box::pin(self.0.bytes_stream())
        }
    }

    impl HttpTransport for ReqwestTransport {
        type Response = ReqwestResponse;
        type Error = reqwest::Error;

        async fn get(&self, url: &str) -> Result<Self::Response, Self::Error> {
            let response = self.client.get(url).send().await?;
            Ok(ReqwestResponse(response))
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::{ReqwestResponse, ReqwestTransport};
