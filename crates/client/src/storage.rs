use std::sync::Arc;

use reqwest::Url;

use crate::{
    ClientError, Session,
    auth::{join, parse_base_url},
};

/// Object storage of the hosted provider, used for trip cover images.
#[derive(Debug, Clone)]
pub struct StorageClient {
    base_url: Url,
    api_key: String,
    bucket: String,
    http: reqwest::Client,
    session: Arc<Session>,
}

impl StorageClient {
    pub fn new(
        base_url: &str,
        api_key: &str,
        bucket: &str,
        session: Arc<Session>,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            api_key: api_key.to_string(),
            bucket: bucket.to_string(),
            http: reqwest::Client::new(),
            session,
        })
    }

    /// Uploads an image under `{trip_id}/{file_name}`, replacing any object
    /// already there, and returns its public URL.
    pub async fn upload_cover_image(
        &self,
        trip_id: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<String, ClientError> {
        let object = format!("{trip_id}/{file_name}");
        let endpoint = join(
            &self.base_url,
            &format!("storage/v1/object/{}/{object}", self.bucket),
        )?;
        let token = self.session.access_token().await?;
        tracing::debug!(%object, size = bytes.len(), "uploading cover image");

        let res = self
            .http
            .post(endpoint)
            .header("apikey", &self.api_key)
            .header("content-type", content_type(file_name))
            .header("x-upsert", "true")
            .bearer_auth(token)
            .body(bytes)
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(ClientError::from_response(res).await);
        }
        let public = join(
            &self.base_url,
            &format!("storage/v1/object/public/{}/{object}", self.bucket),
        )?;
        Ok(public.to_string())
    }
}

fn content_type(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}
