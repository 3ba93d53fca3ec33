//! Handle to a single remote file.

use std::path::Path;

use filepicker_policy::{Policy, PolicyRegistry, Secret};
use futures_util::TryStreamExt;
use serde_json::{Map, Value};
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::session::{join, parse_object, parse_url};
use crate::{
    Conversion, ConvertOptions, Credentials, Download, FileUpload, FilepickerError, HttpRequest,
    Metadata, MetadataAttribute, OverwriteSource, RawResponse, RequestBody, Session, Stored,
};

/// Size of the writes performed by [`RemoteFile::download`].
pub const DOWNLOAD_CHUNK_SIZE: usize = 1024;

/// Form field carrying uploaded content.
pub(crate) const UPLOAD_FIELD: &str = "fileUpload";

/// What a [`RemoteFile`] is built from.
#[derive(Debug, Clone, PartialEq)]
pub enum FileSource {
    /// An opaque file handle; the URL is `<api_url>/file/<handle>`.
    Handle(String),
    /// A file URL containing `file/<handle>`.
    Url(String),
    /// A store or convert response carrying `url` and metadata.
    Response(Map<String, Value>),
}

/// Extract the file handle from a URL.
///
/// The handle is the run of ASCII alphanumerics and `_` after the first
/// `file/` that is followed by at least one such character.
pub fn extract_handle(url: &str) -> Option<&str> {
    url.match_indices("file/").find_map(|(index, marker)| {
        let rest = &url[index + marker.len()..];
        let end = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        (end > 0).then(|| &rest[..end])
    })
}

/// Builds a [`RemoteFile`] from exactly one [`FileSource`].
#[derive(Debug, Clone)]
pub struct RemoteFileBuilder {
    session: Session,
    sources: Vec<FileSource>,
    credentials: Credentials,
    policies: PolicyRegistry,
    temporary: bool,
}

impl RemoteFileBuilder {
    /// Start a builder for files reached through `session`.
    pub fn new(session: Session) -> Self {
        Self {
            session,
            sources: Vec::new(),
            credentials: Credentials::default(),
            policies: PolicyRegistry::default(),
            temporary: false,
        }
    }

    /// Build from a file handle.
    pub fn handle(mut self, handle: impl Into<String>) -> Self {
        self.sources.push(FileSource::Handle(handle.into()));
        self
    }

    /// Build from a file URL.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.sources.push(FileSource::Url(url.into()));
        self
    }

    /// Build from a store or convert response.
    pub fn response(mut self, response: Map<String, Value>) -> Self {
        self.sources.push(FileSource::Response(response));
        self
    }

    /// Build from a source.
    pub fn source(mut self, source: FileSource) -> Self {
        self.sources.push(source);
        self
    }

    /// Credentials of the file.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Policies available to the file.
    pub fn policies(mut self, policies: PolicyRegistry) -> Self {
        self.policies = policies;
        self
    }

    /// Mark the file as a conversion preview.
    pub fn temporary(mut self, temporary: bool) -> Self {
        self.temporary = temporary;
        self
    }

    /// Build the file.
    ///
    /// # Errors
    ///
    /// [`FilepickerError::Usage`] unless exactly one source was given;
    /// [`FilepickerError::InvalidUrl`] or [`FilepickerError::InvalidResponse`]
    /// when the source does not identify a file.
    pub fn build(mut self) -> Result<RemoteFile, FilepickerError> {
        let source = match self.sources.len() {
            0 => {
                return Err(FilepickerError::Usage(
                    "Please provide file handle or url".into(),
                ));
            }
            1 => self.sources.remove(0),
            _ => {
                return Err(FilepickerError::Usage(
                    "Please provide only one of file handle, url or response".into(),
                ));
            }
        };

        let (url, handle, metadata) = match source {
            FileSource::Handle(handle) => {
                if handle.is_empty() {
                    return Err(FilepickerError::Usage("File handle is empty".into()));
                }
                (self.session.file_url(&handle)?, handle, None)
            }
            FileSource::Url(url) => {
                let handle = handle_of(&url)?;
                (parse_url(&url)?, handle, None)
            }
            FileSource::Response(response) => {
                let url = response
                    .get("url")
                    .and_then(Value::as_str)
                    .ok_or_else(|| FilepickerError::InvalidResponse("missing url".into()))?
                    .to_string();
                let handle = handle_of(&url)?;
                (
                    parse_url(&url)?,
                    handle,
                    Some(Metadata::from_response(response)),
                )
            }
        };

        Ok(RemoteFile {
            url,
            handle,
            metadata,
            credentials: self.credentials,
            policies: self.policies,
            temporary: self.temporary,
            session: self.session,
        })
    }
}

fn handle_of(url: &str) -> Result<String, FilepickerError> {
    extract_handle(url)
        .map(str::to_string)
        .ok_or_else(|| FilepickerError::InvalidUrl(url.to_string()))
}

/// A file stored by the Filepicker service.
///
/// Files produced by an operation (store, overwrite, convert) receive a copy
/// of the credentials and policies of whatever produced them. Later changes
/// on either side are not shared.
#[derive(Debug, Clone)]
pub struct RemoteFile {
    url: Url,
    handle: String,
    metadata: Option<Metadata>,
    credentials: Credentials,
    policies: PolicyRegistry,
    temporary: bool,
    session: Session,
}

impl RemoteFile {
    /// Build a file from a single source, without credentials.
    pub fn new(session: Session, source: FileSource) -> Result<Self, FilepickerError> {
        Self::builder(session).source(source).build()
    }

    /// Start building a file.
    pub fn builder(session: Session) -> RemoteFileBuilder {
        RemoteFileBuilder::new(session)
    }

    /// URL of the file.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Handle of the file.
    pub fn handle(&self) -> &str {
        &self.handle
    }

    /// Whether this file is a conversion preview.
    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    /// Cached metadata, `None` until fetched.
    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    /// Drop the cached metadata.
    pub fn invalidate_metadata(&mut self) {
        self.metadata = None;
    }

    /// Credentials of the file.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// The API key, if set.
    pub fn api_key(&self) -> Option<&str> {
        self.credentials.api_key()
    }

    /// The app secret, if set.
    pub fn secret(&self) -> Option<&Secret> {
        self.credentials.secret()
    }

    /// Set the API key.
    pub fn set_api_key(&mut self, api_key: impl Into<String>) {
        self.credentials.set_api_key(api_key);
    }

    /// Set the app secret used to register policies.
    pub fn set_secret(&mut self, secret: Secret) {
        self.credentials.set_secret(secret);
    }

    /// Policies registered on this file.
    pub fn policies(&self) -> &PolicyRegistry {
        &self.policies
    }

    /// Session the file sends requests through.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Look up an attribute by name.
    ///
    /// Metadata attribute names read the cached metadata (`None` while
    /// uncached or absent). `url`, `handle`, `api_key` and `temporary` read
    /// the file's own fields.
    pub fn attribute(&self, name: &str) -> Result<Option<Value>, FilepickerError> {
        if let Ok(attribute) = name.parse::<MetadataAttribute>() {
            return Ok(self
                .metadata
                .as_ref()
                .and_then(|metadata| metadata.get(attribute))
                .cloned());
        }

        match name {
            "url" => Ok(Some(Value::String(self.url.to_string()))),
            "handle" => Ok(Some(Value::String(self.handle.clone()))),
            "api_key" => Ok(self.api_key().map(|key| Value::String(key.to_string()))),
            "temporary" => Ok(Some(Value::Bool(self.temporary))),
            _ => Err(FilepickerError::UnknownAttribute(name.to_string())),
        }
    }

    /// Register a policy under `name`.
    ///
    /// The policy is used exactly as given; see [`Self::add_scoped_policy`]
    /// to restrict it to this file.
    pub fn add_policy(&mut self, name: impl Into<String>, policy: Policy) -> Result<(), FilepickerError> {
        self.policies.add(name, policy, self.credentials.secret())?;
        Ok(())
    }

    /// Register a policy under `name`, restricted to this file's handle.
    pub fn add_scoped_policy(
        &mut self,
        name: impl Into<String>,
        policy: Policy,
    ) -> Result<(), FilepickerError> {
        let policy = policy.handle(self.handle.clone());
        self.add_policy(name, policy)
    }

    /// The file URL with the signature of the named policy attached.
    pub fn signed_url(&self, policy_name: &str) -> Result<Url, FilepickerError> {
        let signed = self.policies.signature_params(policy_name)?;
        let mut url = self.url.clone();
        url.query_pairs_mut().extend_pairs(signed.params());
        Ok(url)
    }

    fn signature_params(
        &self,
        policy_name: Option<&str>,
    ) -> Result<Vec<(&'static str, String)>, FilepickerError> {
        match policy_name {
            Some(name) => Ok(self.policies.signature_params(name)?.params().to_vec()),
            None => Ok(Vec::new()),
        }
    }

    /// Cached metadata, fetched without a policy first if uncached.
    pub async fn load_metadata(&mut self) -> Result<&Metadata, FilepickerError> {
        if self.metadata.is_none() {
            self.fetch_metadata(None).await?;
        }
        Ok(&*self.metadata.get_or_insert_with(Metadata::new))
    }

    /// Fetch every metadata attribute and replace the cache.
    ///
    /// A response that is not a JSON object leaves the cache empty.
    pub async fn fetch_metadata(
        &mut self,
        policy_name: Option<&str>,
    ) -> Result<&Metadata, FilepickerError> {
        let request = HttpRequest::get(join(&self.url, &["metadata"])?)
            .with_params(
                MetadataAttribute::ALL
                    .iter()
                    .map(|attribute| (attribute.as_str(), "true")),
            )
            .with_params(self.signature_params(policy_name)?);

        let raw = self.session.send(request).await?.into_raw().await?;
        let metadata = match parse_object(&raw.text) {
            Some(entries) => Metadata::from(entries),
            None => {
                tracing::warn!(status = %raw.status, handle = %self.handle, "Metadata response is not a JSON object");
                Metadata::new()
            }
        };

        Ok(&*self.metadata.insert(metadata))
    }

    /// Delete the file.
    pub async fn delete(&self, policy_name: Option<&str>) -> Result<RawResponse, FilepickerError> {
        let api_key = self.credentials.require_api_key()?;
        let request = HttpRequest::delete(self.url.clone())
            .with_query("key", api_key)
            .with_params(self.signature_params(policy_name)?);

        Ok(self.session.send(request).await?.into_raw().await?)
    }

    /// Download the file content into `destination`.
    ///
    /// The destination is created (or truncated) even when the server
    /// refuses the download; content is only written for a successful
    /// status. The body is streamed, stopping at the first empty chunk.
    pub async fn download(
        &self,
        destination: impl AsRef<Path>,
        policy_name: Option<&str>,
    ) -> Result<Download, FilepickerError> {
        let url = match policy_name {
            Some(name) => self.signed_url(name)?,
            None => self.url.clone(),
        };

        let mut file = tokio::fs::File::create(destination).await?;
        let response = self.session.send(HttpRequest::get(url)).await?;
        let status = response.status();

        let mut bytes_written = 0;
        if status.is_success() {
            let mut body = response.into_stream();
            while let Some(chunk) = body.try_next().await? {
                if chunk.is_empty() {
                    break;
                }
                for piece in chunk.chunks(DOWNLOAD_CHUNK_SIZE) {
                    file.write_all(piece).await?;
                    bytes_written += piece.len() as u64;
                }
            }
        }
        file.flush().await?;

        Ok(Download {
            status,
            bytes_written,
        })
    }

    /// Replace the file content.
    pub async fn overwrite(
        &self,
        source: OverwriteSource,
        policy_name: Option<&str>,
    ) -> Result<Stored, FilepickerError> {
        let body = match source {
            OverwriteSource::Url(url) => RequestBody::Form(vec![("url".into(), url)]),
            OverwriteSource::Path(path) => {
                RequestBody::Upload(FileUpload::from_path(UPLOAD_FIELD, path).await?)
            }
        };
        let request = HttpRequest::post(self.url.clone())
            .with_params(self.signature_params(policy_name)?)
            .with_body(body);

        self.post_for_file(request).await
    }

    /// Convert the file.
    ///
    /// Without storing options the result is a temporary preview built
    /// locally from the convert URL. With any storing option the converted
    /// file is stored, which needs an API key.
    pub async fn convert(
        &self,
        options: ConvertOptions,
        policy_name: Option<&str>,
    ) -> Result<Conversion, FilepickerError> {
        if self.temporary {
            return Ok(Conversion::AlreadyConverted);
        }

        let options = self
            .signature_params(policy_name)?
            .into_iter()
            .fold(options, |options, (key, value)| options.set(key, value));
        let mut url = join(&self.url, &["convert"])?;

        if options.is_storing() {
            let api_key = self.credentials.require_api_key()?;
            let request = HttpRequest::post(url)
                .with_params(options)
                .with_query("key", api_key);

            return Ok(match self.post_for_file(request).await? {
                Stored::File(file) => Conversion::Stored(file),
                Stored::Unparsed(raw) => Conversion::Unparsed(raw),
            });
        }

        if !options.is_empty() {
            url.query_pairs_mut().extend_pairs(options.iter());
        }
        let preview = RemoteFile::builder(self.session.clone())
            .url(url.to_string())
            .credentials(self.credentials.clone())
            .policies(self.policies.clone())
            .temporary(true)
            .build()?;

        Ok(Conversion::Preview(preview))
    }

    async fn post_for_file(&self, request: HttpRequest) -> Result<Stored, FilepickerError> {
        let raw = self.session.send(request).await?.into_raw().await?;
        stored_from_response(&self.session, raw, &self.credentials, &self.policies)
    }
}

/// Interpret the response of a call that stores a file.
pub(crate) fn stored_from_response(
    session: &Session,
    raw: RawResponse,
    credentials: &Credentials,
    policies: &PolicyRegistry,
) -> Result<Stored, FilepickerError> {
    match parse_object(&raw.text) {
        Some(response) if response.get("url").is_some_and(Value::is_string) => {
            RemoteFile::builder(session.clone())
                .response(response)
                .credentials(credentials.clone())
                .policies(policies.clone())
                .build()
                .map(Stored::File)
        }
        _ => {
            tracing::warn!(status = %raw.status, "Store response does not describe a file");
            Ok(Stored::Unparsed(raw))
        }
    }
}
