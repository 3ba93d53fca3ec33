//! End-to-end flows against a scripted Filepicker API.

use std::sync::Arc;

use anyhow::Result;
use filepicker::{
    Call, Client, ClientConfig, Conversion, ConvertOptions, Credentials, MockResponse,
    MockTransport, Policy, Secret, StatusCode, StoreOptions, Stored,
};
use serde_json::json;

const API_URL: &str = "http://localhost:8080/api";

/// Answers like the service: store and convert describe a file, metadata
/// describes the stored file, downloads return content.
fn service() -> MockTransport {
    MockTransport::new(|request| {
        let path = request.url.path();
        Ok(match (request.method.as_str(), path) {
            ("POST", "/api/store/S3") => MockResponse::json(json!({
                "url": format!("{API_URL}/file/STORED1"),
                "size": 5,
                "type": "text/plain",
                "filename": "hello.txt"
            })),
            ("POST", "/api/file/STORED1/convert") => MockResponse::json(json!({
                "url": format!("{API_URL}/file/CONVERTED1"),
                "size": 3,
                "type": "image/png"
            })),
            ("GET", "/api/file/STORED1/metadata") => MockResponse::json(json!({
                "size": 5,
                "mimetype": "text/plain",
                "filename": "hello.txt",
                "uploaded": 1431950945704.0
            })),
            ("GET", "/api/file/STORED1") => MockResponse::ok("hello"),
            ("DELETE", "/api/file/STORED1") => MockResponse::ok("success"),
            _ => MockResponse::status(StatusCode::NOT_FOUND, "Not found"),
        })
    })
}

fn client(transport: &Arc<MockTransport>) -> Result<Client> {
    let credentials = Credentials::new()
        .with_api_key("APIKEY")
        .with_secret(Secret::new("FooBarBaz")?);
    Ok(Client::with_transport(ClientConfig::new(API_URL), transport.clone())?
        .with_credentials(credentials))
}

#[tokio::test]
async fn it_stores_inspects_downloads_and_deletes() -> Result<()> {
    let transport = Arc::new(service());
    let client = client(&transport)?;
    let dir = tempfile::tempdir()?;
    let source = dir.path().join("hello.txt");
    tokio::fs::write(&source, "hello").await?;

    let Stored::File(mut file) = client.store_local_file(&source, StoreOptions::new()).await? else {
        panic!("expected a stored file");
    };
    assert_eq!(file.handle(), "STORED1");
    assert_eq!(file.attribute("mimetype")?, Some(json!("text/plain")));

    file.invalidate_metadata();
    let metadata = file.load_metadata().await?;
    assert_eq!(metadata.filename(), Some("hello.txt"));
    assert_eq!(metadata.uploaded(), Some(1431950945704.0));

    let destination = dir.path().join("copy.txt");
    let download = file.download(&destination, None).await?;
    assert_eq!(download.bytes_written, 5);
    assert_eq!(tokio::fs::read_to_string(&destination).await?, "hello");

    let deleted = file.delete(None).await?;
    assert!(deleted.is_success());
    assert_eq!(deleted.text, "success");

    assert_eq!(transport.request_count(), 4);
    Ok(())
}

#[tokio::test]
async fn it_converts_with_scoped_policies() -> Result<()> {
    let transport = Arc::new(service());
    let client = client(&transport)?;

    let mut file = client
        .store_from_url("https://example.com/hello.txt", StoreOptions::new())
        .await?
        .file()
        .expect("stored file");
    file.add_scoped_policy("convert", Policy::new().expiry(1508141504).call(Call::Convert))?;

    let signed = file.policies().signature_params("convert")?;
    let policy = signed.decode()?;
    assert_eq!(policy.bound_handle(), Some("STORED1"));
    assert!(signed.verify(file.secret().expect("secret")));

    let preview = file
        .convert(ConvertOptions::new().width(100), Some("convert"))
        .await?;
    let Conversion::Preview(preview) = preview else {
        panic!("expected a preview");
    };
    assert!(preview.url().as_str().starts_with(&format!("{API_URL}/file/STORED1/convert?w=100&signature=")));
    assert!(matches!(
        preview.convert(ConvertOptions::new().width(50), None).await?,
        Conversion::AlreadyConverted
    ));

    let stored = file
        .convert(
            ConvertOptions::new().format("png").store_location("S3"),
            Some("convert"),
        )
        .await?;
    let Conversion::Stored(converted) = stored else {
        panic!("expected a stored conversion");
    };
    assert_eq!(converted.handle(), "CONVERTED1");
    assert!(!converted.is_temporary());
    assert!(converted.policies().contains("convert"));

    let request = transport.last_request().expect("convert request");
    assert_eq!(request.query_value("signature"), Some(signed.signature.as_str()));
    assert_eq!(request.query_value("key"), Some("APIKEY"));
    Ok(())
}

#[tokio::test]
async fn it_reports_missing_files() -> Result<()> {
    let transport = Arc::new(service());
    let client = client(&transport)?;
    let file = client.file("MISSING")?;
    let dir = tempfile::tempdir()?;

    let download = file.download(dir.path().join("missing"), None).await?;
    assert_eq!(download.status, StatusCode::NOT_FOUND);
    assert!(!download.is_success());
    assert_eq!(download.bytes_written, 0);

    let mut file = file;
    assert!(file.fetch_metadata(None).await?.is_empty());
    Ok(())
}
