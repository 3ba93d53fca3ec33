use std::path::Path;
use std::sync::Arc;

use filepicker_policy::{Policy, PolicyRegistry, Secret};

use crate::file::{UPLOAD_FIELD, stored_from_response};
use crate::{
    ClientConfig, Credentials, FileUpload, FilepickerError, HttpRequest, RemoteFile, RequestBody,
    ReqwestTransport, Session, StoreOptions, Stored, Transport,
};

/// Entry point for storing files and opening existing ones.
///
/// ```no_run
/// use filepicker::{Client, ClientConfig, Credentials, StoreOptions, Stored};
///
/// # async fn example() -> Result<(), filepicker::FilepickerError> {
/// let client = Client::new(ClientConfig::default())?
///     .with_credentials(Credentials::new().with_api_key("MY_API_KEY"));
///
/// match client
///     .store_from_url("https://example.com/logo.png", StoreOptions::new())
///     .await?
/// {
///     Stored::File(file) => println!("stored as {}", file.handle()),
///     Stored::Unparsed(response) => println!("{}: {}", response.status, response.text),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    session: Session,
    credentials: Credentials,
    policies: PolicyRegistry,
    storage: String,
}

impl Client {
    /// Create a client sending requests over HTTP with `reqwest`.
    pub fn new(config: ClientConfig) -> Result<Self, FilepickerError> {
        let transport = ReqwestTransport::new(&config)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client sending requests through `transport`.
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, FilepickerError> {
        let storage = config.storage.clone();
        Ok(Self {
            session: Session::new(config, transport)?,
            credentials: Credentials::default(),
            policies: PolicyRegistry::default(),
            storage,
        })
    }

    /// Use the given credentials.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Set the API key.
    pub fn set_api_key(&mut self, api_key: impl Into<String>) {
        self.credentials.set_api_key(api_key);
    }

    /// Set the app secret used to register policies.
    pub fn set_secret(&mut self, secret: Secret) {
        self.credentials.set_secret(secret);
    }

    /// Set the default storage backend.
    pub fn set_storage(&mut self, storage: impl Into<String>) {
        self.storage = storage.into();
    }

    /// Default storage backend.
    pub fn storage(&self) -> &str {
        &self.storage
    }

    /// Credentials of the client.
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

    /// Policies registered on the client.
    pub fn policies(&self) -> &PolicyRegistry {
        &self.policies
    }

    /// Session shared with the files of this client.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Register a policy under `name`.
    pub fn add_policy(&mut self, name: impl Into<String>, policy: Policy) -> Result<(), FilepickerError> {
        self.policies.add(name, policy, self.credentials.secret())?;
        Ok(())
    }

    /// Open an existing file by handle.
    pub fn file(&self, handle: impl Into<String>) -> Result<RemoteFile, FilepickerError> {
        RemoteFile::builder(self.session.clone())
            .handle(handle)
            .credentials(self.credentials.clone())
            .policies(self.policies.clone())
            .build()
    }

    /// Open an existing file by URL.
    pub fn file_from_url(&self, url: impl Into<String>) -> Result<RemoteFile, FilepickerError> {
        RemoteFile::builder(self.session.clone())
            .url(url)
            .credentials(self.credentials.clone())
            .policies(self.policies.clone())
            .build()
    }

    /// Store the content found at `url`.
    ///
    /// Fails with [`FilepickerError::MissingApiKey`] before any request is
    /// made when the client has no API key.
    pub async fn store_from_url(
        &self,
        url: impl Into<String>,
        options: StoreOptions,
    ) -> Result<Stored, FilepickerError> {
        let body = RequestBody::Form(vec![("url".into(), url.into())]);
        self.store(body, options).await
    }

    /// Upload a local file.
    ///
    /// Like [`Client::store_from_url`], this needs an API key.
    pub async fn store_local_file(
        &self,
        path: impl AsRef<Path>,
        options: StoreOptions,
    ) -> Result<Stored, FilepickerError> {
        let upload = FileUpload::from_path(UPLOAD_FIELD, path).await?;
        self.store(RequestBody::Upload(upload), options).await
    }

    async fn store(&self, body: RequestBody, options: StoreOptions) -> Result<Stored, FilepickerError> {
        let api_key = self.credentials.require_api_key()?;
        let storage = options.storage.as_deref().unwrap_or(&self.storage);

        let mut request = HttpRequest::post(self.session.endpoint(&["store", storage])?);
        if let Some(name) = &options.policy {
            request = request.with_params(self.policies.signature_params(name)?.params());
        }
        let request = request
            .with_params(options.params)
            .with_query("key", api_key)
            .with_body(body);

        let raw = self.session.send(request).await?.into_raw().await?;
        stored_from_response(&self.session, raw, &self.credentials, &self.policies)
    }
}

#[cfg(test)]
mod tests {
    use filepicker_policy::{Call, PolicyError};
    use serde_json::json;

    use super::*;
    use crate::helpers::{MockResponse, MockTransport};
    use crate::{Method, StatusCode};

    const STORED: &str = "https://www.filepicker.io/api/file/hx6uhrXXXXXPIiWvl";

    fn stored_response() -> MockTransport {
        MockTransport::respond(MockResponse::json(json!({
            "url": STORED,
            "size": 8811,
            "type": "image/jpg",
            "filename": "awesome.jpg",
            "key": "MY_KEY"
        })))
    }

    fn client(transport: &Arc<MockTransport>) -> Client {
        Client::with_transport(ClientConfig::default(), transport.clone())
            .unwrap()
            .with_credentials(
                Credentials::new()
                    .with_api_key("APIKEY")
                    .with_secret(Secret::new("FooBarBaz").unwrap()),
            )
    }

    #[tokio::test]
    async fn it_stores_from_url() -> anyhow::Result<()> {
        let transport = Arc::new(stored_response());
        let client = client(&transport);

        let file = client
            .store_from_url("https://example.com/awesome.jpg", StoreOptions::new())
            .await?
            .file()
            .unwrap();

        assert_eq!(file.handle(), "hx6uhrXXXXXPIiWvl");
        assert_eq!(file.metadata().and_then(|m| m.mimetype()), Some("image/jpg"));
        assert_eq!(file.api_key(), Some("APIKEY"));
        assert_eq!(file.secret(), client.secret());

        let request = transport.last_request().unwrap();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.url.as_str(), "https://www.filepicker.io/api/store/S3");
        assert_eq!(request.query_value("key"), Some("APIKEY"));
        assert_eq!(request.form_value("url"), Some("https://example.com/awesome.jpg"));
        Ok(())
    }

    #[tokio::test]
    async fn it_stores_local_files() -> anyhow::Result<()> {
        let transport = Arc::new(stored_response());
        let client = client(&transport);
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("awesome.jpg");
        tokio::fs::write(&path, b"jpeg").await?;

        let stored = client
            .store_local_file(&path, StoreOptions::new().storage("azure"))
            .await?;

        assert!(matches!(stored, Stored::File(_)));
        let request = transport.last_request().unwrap();
        assert_eq!(request.url.as_str(), "https://www.filepicker.io/api/store/azure");
        match request.body {
            RequestBody::Upload(upload) => {
                assert_eq!(upload.field, "fileUpload");
                assert_eq!(upload.file_name, "awesome.jpg");
                assert_eq!(upload.mime, "image/jpeg");
                assert_eq!(&upload.content[..], b"jpeg");
            }
            body => panic!("unexpected body {body:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn it_signs_and_orders_store_parameters() -> anyhow::Result<()> {
        let transport = Arc::new(stored_response());
        let mut client = client(&transport);
        let policy = Policy::new().expiry(1508141504).call(Call::Store);
        client.add_policy("store", policy.clone())?;

        client
            .store_from_url(
                "https://example.com/a.png",
                StoreOptions::new().policy("store").path("/avatars/"),
            )
            .await?;

        let signed = policy.sign(client.secret().unwrap())?;
        let request = transport.last_request().unwrap();
        assert_eq!(
            request.query,
            vec![
                ("signature".to_string(), signed.signature),
                ("policy".to_string(), signed.policy),
                ("path".to_string(), "/avatars/".to_string()),
                ("key".to_string(), "APIKEY".to_string()),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn it_returns_unparsed_responses() -> anyhow::Result<()> {
        let transport = Arc::new(MockTransport::respond(MockResponse::status(
            StatusCode::BAD_REQUEST,
            "<html>Invalid application</html>",
        )));
        let client = client(&transport);

        let stored = client
            .store_from_url("https://example.com/a.png", StoreOptions::new())
            .await?;

        let Stored::Unparsed(raw) = stored else {
            panic!("expected raw response");
        };
        assert_eq!(raw.status, StatusCode::BAD_REQUEST);
        assert_eq!(raw.text, "<html>Invalid application</html>");
        Ok(())
    }

    #[tokio::test]
    async fn it_requires_an_api_key_to_store() {
        let transport = Arc::new(stored_response());
        let client = Client::with_transport(ClientConfig::default(), transport.clone()).unwrap();

        let result = client
            .store_from_url("https://example.com/a.png", StoreOptions::new())
            .await;

        assert!(matches!(result, Err(FilepickerError::MissingApiKey)));
        assert_eq!(transport.request_count(), 0);
    }

    #[test]
    fn it_requires_a_secret_for_policies() {
        let transport = Arc::new(stored_response());
        let mut client = Client::with_transport(ClientConfig::default(), transport).unwrap();

        assert!(matches!(
            client.add_policy("read", Policy::new().call(Call::Read)),
            Err(FilepickerError::Policy(PolicyError::SecretNotSet))
        ));
    }

    #[test]
    fn it_opens_files_with_its_credentials() -> anyhow::Result<()> {
        let transport = Arc::new(stored_response());
        let mut client = client(&transport);
        client.add_policy("read", Policy::new().call(Call::Read))?;

        let file = client.file("hx6uhrXXXXXPIiWvl")?;
        assert_eq!(file.url().as_str(), STORED);
        assert_eq!(file.api_key(), Some("APIKEY"));
        assert!(file.policies().contains("read"));

        let file = client.file_from_url(STORED)?;
        assert_eq!(file.handle(), "hx6uhrXXXXXPIiWvl");
        Ok(())
    }

    #[test]
    fn it_uses_configured_storage() {
        let transport = Arc::new(stored_response());
        let mut client =
            Client::with_transport(ClientConfig::default().with_storage("azure"), transport).unwrap();
        assert_eq!(client.storage(), "azure");

        client.set_storage("dropbox");
        assert_eq!(client.storage(), "dropbox");
    }
}
