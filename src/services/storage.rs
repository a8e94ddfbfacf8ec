use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

use crate::core::config::Settings;
use crate::store::{BlobStore, StoreError};

/// Support files in an S3-compatible bucket, one folder per exam.
#[derive(Debug, Clone)]
pub(crate) struct S3BlobStore {
    client: Client,
    bucket: String,
    endpoint: String,
}

impl S3BlobStore {
    pub(crate) async fn from_settings(settings: &Settings) -> anyhow::Result<Option<Self>> {
        if settings.s3().access_key.is_empty() || settings.s3().secret_key.is_empty() {
            return Ok(None);
        }

        let creds = Credentials::new(
            settings.s3().access_key.clone(),
            settings.s3().secret_key.clone(),
            None,
            None,
            "examdesk-static",
        );

        let config = aws_config::defaults(BehaviorVersion::latest())
            .endpoint_url(settings.s3().endpoint.clone())
            .region(aws_config::Region::new(settings.s3().region.clone()))
            .credentials_provider(creds)
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&config).force_path_style(true).build();
        let client = Client::from_conf(s3_config);

        Ok(Some(Self {
            client,
            bucket: settings.s3().bucket.clone(),
            endpoint: settings.s3().endpoint.trim_end_matches('/').to_string(),
        }))
    }

    fn link(&self, key: &str) -> String {
        object_link(&self.endpoint, &self.bucket, key)
    }
}

pub(crate) fn object_key(folder_key: &str, name: &str) -> String {
    format!("supports/{folder_key}/{name}")
}

/// Path-style object URL.
pub(crate) fn object_link(endpoint: &str, bucket: &str, key: &str) -> String {
    format!("{endpoint}/{bucket}/{key}")
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put_file(
        &self,
        folder_key: &str,
        name: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StoreError> {
        let key = object_key(folder_key, name);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type_for(name))
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|err| StoreError::Unavailable(format!("s3 put_object failed: {err}")))?;

        Ok(self.link(&key))
    }
}

fn content_type_for(name: &str) -> &'static str {
    let extension = name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("txt") => "text/plain",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}
