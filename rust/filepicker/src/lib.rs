#![warn(missing_docs)]

//! Client for the Filepicker REST API.
//!
//! A [`Client`] stores new files (from a URL or a local path) and opens
//! existing ones. Every stored file is represented by a [`RemoteFile`],
//! which can fetch its metadata, be downloaded, overwritten, converted or
//! deleted.
//!
//! Calls can be authorized with signed security policies. A policy is
//! registered under a name with [`Client::add_policy`] or
//! [`RemoteFile::add_policy`] (both need the app secret) and referenced by
//! that name when making a call; the request then carries the `signature`
//! and `policy` parameters produced by [`filepicker_policy`].
//!
//! ```no_run
//! use filepicker::{
//!     Call, Client, ClientConfig, ConvertOptions, Conversion, Credentials, Policy, Secret,
//! };
//!
//! # async fn example() -> Result<(), filepicker::FilepickerError> {
//! let credentials = Credentials::new()
//!     .with_api_key("MY_API_KEY")
//!     .with_secret(Secret::new("MY_APP_SECRET")?);
//! let client = Client::new(ClientConfig::default())?.with_credentials(credentials);
//!
//! let mut file = client.file("WRoKBuvKRUuCRFqAz3eZ")?;
//! file.add_scoped_policy("convert", Policy::new().expires_in(std::time::Duration::from_secs(600)).call(Call::Convert))?;
//!
//! if let Conversion::Preview(preview) = file
//!     .convert(ConvertOptions::new().width(200), Some("convert"))
//!     .await?
//! {
//!     println!("{}", preview.url());
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod file;
mod metadata;
mod options;
mod outcome;
mod session;
mod transport;

#[cfg(any(test, feature = "helpers"))]
mod helpers;
#[cfg(any(test, feature = "helpers"))]
pub use helpers::*;

pub use client::Client;
pub use config::{API_KEY_VAR, APP_SECRET_VAR, ClientConfig, Credentials, DEFAULT_API_URL, DEFAULT_STORAGE};
pub use error::FilepickerError;
pub use file::{DOWNLOAD_CHUNK_SIZE, FileSource, RemoteFile, RemoteFileBuilder, extract_handle};
pub use metadata::{Metadata, MetadataAttribute};
pub use options::{ConvertOptions, Fit, STORE_OPTIONS, StoreOptions};
pub use outcome::{Conversion, Download, OverwriteSource, Stored};
pub use session::Session;
pub use transport::{
    BodyStream, FileUpload, HttpRequest, HttpResponse, Method, RawResponse, RequestBody,
    ReqwestTransport, StatusCode, Transport, TransportError, guess_mime_type,
};

pub use filepicker_policy::{Call, Policy, PolicyError, PolicyRegistry, Secret, SignedPolicy};
