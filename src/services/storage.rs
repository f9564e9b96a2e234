use super::ExternalError;
use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, instrument};

#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Stores `data` at `path` and returns the public URL.
    async fn upload(&self, path: &str, data: Bytes, content_type: &str) -> Result<String, ExternalError>;
}

/// Supabase Storage REST client bound to one bucket
#[derive(Clone)]
pub struct SupabaseStorage {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
    bucket: String,
}

impl SupabaseStorage {
    pub fn new(client: reqwest::Client, base_url: String, service_key: String, bucket: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
            bucket,
        }
    }

    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            self.bucket,
            path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl BlobStorage for SupabaseStorage {
    #[instrument(skip(self, data), fields(bucket = %self.bucket, size = data.len()))]
    async fn upload(&self, path: &str, data: Bytes, content_type: &str) -> Result<String, ExternalError> {
        let path = path.trim_start_matches('/');
        let response = self
            .client
            .post(format!(
                "{}/storage/v1/object/{}/{}",
                self.base_url, self.bucket, path
            ))
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(data)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ExternalError::from_response("supabase-storage", response).await);
        }

        debug!(path, "Uploaded object");
        Ok(self.public_url(path))
    }
}

/// Stand-in when storage credentials are missing; every upload fails.
#[derive(Debug, Clone, Default)]
pub struct UnconfiguredStorage;

#[async_trait]
impl BlobStorage for UnconfiguredStorage {
    async fn upload(&self, _path: &str, _data: Bytes, _content_type: &str) -> Result<String, ExternalError> {
        Err(ExternalError::NotConfigured("storage"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn upload_returns_public_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/guest-documents/signature_1.png"))
            .and(header("authorization", "Bearer service-key"))
            .and(header("content-type", "image/png"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let storage = SupabaseStorage::new(
            reqwest::Client::new(),
            format!("{}/", server.uri()),
            "service-key".into(),
            "guest-documents".into(),
        );
        let url = storage
            .upload("signature_1.png", Bytes::from_static(b"\x89PNG"), "image/png")
            .await
            .unwrap();

        assert_eq!(
            url,
            format!("{}/storage/v1/object/public/guest-documents/signature_1.png", server.uri())
        );
    }

    #[tokio::test]
    async fn rejected_upload_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(413).set_body_string("Payload too large"))
            .mount(&server)
            .await;

        let storage = SupabaseStorage::new(
            reqwest::Client::new(),
            server.uri(),
            "service-key".into(),
            "guest-documents".into(),
        );
        let err = storage
            .upload("passport_1.jpg", Bytes::from_static(b"jpeg"), "image/jpeg")
            .await
            .unwrap_err();
        assert_matches!(err, ExternalError::Status { status: 413, .. });
    }
}
