//! AWS S3 storage backend

use crate::error::{Error, Result};
use crate::storage::{ListPage, ObjectBody};
use crate::types::ObjectRecord;
use aws_config::BehaviorVersion;
use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream as AwsByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;

/// AWS S3 storage backend bound to one bucket
#[derive(Clone)]
pub struct S3Backend {
    /// S3 client
    client: Client,
    /// Bucket name
    bucket: String,
}

impl S3Backend {
    /// Create a new S3 backend.
    ///
    /// Credentials for `profile` are resolved up front so a missing or broken
    /// profile fails here rather than on the first listing request.
    pub async fn new(
        bucket: String,
        profile: Option<String>,
        endpoint: Option<String>,
    ) -> Result<Self> {
        let profile = profile.filter(|p| !p.is_empty());
        let profile_label = profile.clone().unwrap_or_else(|| "default".to_string());

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(ref name) = profile {
            loader = loader.profile_name(name);
        }
        if let Some(ref url) = endpoint {
            loader = loader.endpoint_url(url);
        }
        let sdk_config = loader.load().await;

        let provider = sdk_config
            .credentials_provider()
            .ok_or_else(|| Error::Credentials {
                profile: profile_label.clone(),
                message: "no credentials provider configured".to_string(),
            })?;
        provider
            .provide_credentials()
            .await
            .map_err(|e| Error::Credentials {
                profile: profile_label.clone(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        let mut s3_config = aws_sdk_s3::config::Builder::from(&sdk_config);
        if endpoint.is_some() {
            // custom endpoints are addressed path-style
            s3_config = s3_config.force_path_style(true);
        }
        let client = Client::from_conf(s3_config.build());

        tracing::debug!(bucket = %bucket, profile = %profile_label, "S3 client ready");

        Ok(Self { client, bucket })
    }

    /// Bucket name
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Fetch one ListObjectsV2 page
    pub async fn list_page(&self, prefix: &str, token: Option<&str>) -> Result<ListPage> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .set_continuation_token(token.map(str::to_string))
            .send()
            .await
            .map_err(|e| Error::listing(&self.bucket, DisplayErrorContext(&e).to_string()))?;

        let mut objects = Vec::with_capacity(output.contents().len());
        for obj in output.contents() {
            let Some(key) = obj.key() else {
                tracing::debug!(bucket = %self.bucket, "Skipping listing entry without key");
                continue;
            };
            objects.push(ObjectRecord {
                key: key.to_string(),
                checksum_tag: obj
                    .e_tag()
                    .map(|s| s.trim_matches('"').to_string())
                    .unwrap_or_default(),
                size: obj.size().unwrap_or(0).max(0) as u64,
            });
        }

        Ok(ListPage {
            objects,
            next_token: output.next_continuation_token().map(str::to_string),
        })
    }

    /// Open an object for streaming read
    pub async fn get(&self, key: &str) -> Result<ObjectBody> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| Error::storage(DisplayErrorContext(&e).to_string()))?;

        let content_type = output.content_type().map(str::to_string);
        let body = futures::stream::unfold(output.body, |mut body| async move {
            body.next()
                .await
                .map(|chunk| (chunk.map_err(|e| Error::storage(e.to_string())), body))
        });

        Ok(ObjectBody {
            content_type,
            body: Box::pin(body),
        })
    }

    /// Write an object's contents
    pub async fn put(&self, key: &str, data: Bytes, content_type: Option<String>) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .set_content_type(content_type)
            .body(AwsByteStream::from(data))
            .send()
            .await
            .map_err(|e| Error::storage(DisplayErrorContext(&e).to_string()))?;

        Ok(())
    }
}
