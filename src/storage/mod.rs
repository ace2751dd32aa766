//! Storage layer
//!
//! Handles:
//! - S3-compatible object store backend (capability trait + S3 impl)
//! - Local daily-file directory
//! - Date-keyed remote store with retry
//! - Pull/push sync engine

pub mod local;
pub mod object_store;
pub mod remote;
pub mod retry;
pub mod sync;

pub(crate) fn build_http_client() -> aws_sdk_s3::config::SharedHttpClient {
    use aws_smithy_runtime::client::http::hyper_014::HyperClientBuilder;

    let https_connector = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_only()
        .enable_http1()
        .enable_http2()
        .build();

    HyperClientBuilder::new().build(https_connector)
}
