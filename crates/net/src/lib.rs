#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Network operations for migsweep
//!
//! This crate owns the HTTP plumbing: a pooled client with bearer-token
//! auth and retry logic, plus helpers for decoding JSON answers.

mod client;

pub use client::{NetClient, NetConfig};

use migsweep_errors::{Error, HostingError};
use reqwest::Response;
use serde::de::DeserializeOwned;
use url::Url;

/// Read a successful response body as JSON
///
/// # Errors
///
/// Returns `HostingError::InvalidResponse` if the body cannot be read or does
/// not decode into `T`.
pub async fn read_json<T: DeserializeOwned>(
    response: Response,
    endpoint: &str,
) -> Result<T, Error> {
    let body = response
        .bytes()
        .await
        .map_err(|e| invalid_response(endpoint, &e.to_string()))?;
    serde_json::from_slice(&body).map_err(|e| invalid_response(endpoint, &e.to_string()))
}

/// Read a response body as text, lossy on bad bytes
pub async fn read_text(response: Response) -> String {
    response.text().await.unwrap_or_default()
}

/// Parse and validate a URL
///
/// # Errors
///
/// Returns an error if the URL string is malformed.
pub fn parse_url(url: &str) -> Result<Url, Error> {
    Url::parse(url).map_err(|e| {
        HostingError::InvalidResponse {
            endpoint: url.to_string(),
            message: format!("invalid URL: {e}"),
        }
        .into()
    })
}

/// Join path segments onto a base URL, percent-encoding each segment
///
/// Segments may contain `/`; each slash-separated part is encoded on its own.
///
/// # Errors
///
/// Returns an error if the base URL cannot carry a path.
pub fn join_segments(base: &Url, segments: &[&str]) -> Result<Url, Error> {
    let mut url = base.clone();
    {
        let mut path = url.path_segments_mut().map_err(|()| HostingError::InvalidResponse {
            endpoint: base.to_string(),
            message: "base URL cannot be a base".to_string(),
        })?;
        path.pop_if_empty();
        for segment in segments {
            path.extend(segment.split('/').filter(|part| !part.is_empty()));
        }
    }
    Ok(url)
}

fn invalid_response(endpoint: &str, message: &str) -> Error {
    HostingError::InvalidResponse {
        endpoint: endpoint.to_string(),
        message: message.to_string(),
    }
    .into()
}
