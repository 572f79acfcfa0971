use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode};
use serde::Deserialize;
use tokio::sync::RwLock;

use super::{blob_key, Blob, BlobStore, BlobStoreError};

const STORAGE_API: &str = "https://storage.googleapis.com";

/// Access tokens live for an hour; renew well before that.
const TOKEN_TTL: Duration = Duration::from_secs(50 * 60);

/// Google Cloud Storage blob store backend.
pub struct GcsStore {
    bucket: String,
    client: Client,
    access_token: RwLock<CachedToken>,
    credentials_file: Option<String>,
}

struct CachedToken {
    value: String,
    fetched_at: Instant,
}

#[derive(Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    token_uri: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl GcsStore {
    pub async fn new(bucket: &str, credentials_file: Option<&str>) -> Result<Self, anyhow::Error> {
        let client = Client::builder().build()?;
        let credentials_file = credentials_file.map(|s| s.to_string());
        let token = fetch_token(&client, credentials_file.as_deref()).await?;

        Ok(Self {
            bucket: bucket.to_string(),
            client,
            access_token: RwLock::new(CachedToken {
                value: token,
                fetched_at: Instant::now(),
            }),
            credentials_file,
        })
    }

    /// Current bearer token, renewed first if it is about to expire.
    async fn token(&self) -> Result<String, BlobStoreError> {
        {
            let cached = self.access_token.read().await;
            if cached.fetched_at.elapsed() < TOKEN_TTL {
                return Ok(cached.value.clone());
            }
        }

        let mut cached = self.access_token.write().await;
        if cached.fetched_at.elapsed() >= TOKEN_TTL {
            let value = fetch_token(&self.client, self.credentials_file.as_deref())
                .await
                .map_err(|e| BlobStoreError::Backend(format!("GCS token refresh failed: {e}")))?;
            tracing::debug!(bucket = %self.bucket, "Refreshed GCS access token");
            *cached = CachedToken {
                value,
                fetched_at: Instant::now(),
            };
        }
        Ok(cached.value.clone())
    }

    fn object_name(owner_id: &str, file_name: &str) -> String {
        percent_encode(&blob_key(owner_id, file_name))
    }

    fn upload_url(&self, object: &str) -> String {
        format!(
            "{STORAGE_API}/upload/storage/v1/b/{}/o?uploadType=media&name={object}",
            self.bucket
        )
    }

    fn object_url(&self, object: &str) -> String {
        format!("{STORAGE_API}/storage/v1/b/{}/o/{object}", self.bucket)
    }
}

#[async_trait]
impl BlobStore for GcsStore {
    async fn put(&self, owner_id: &str, file_name: &str, blob: Blob) -> Result<(), BlobStoreError> {
        let token = self.token().await?;
        let object = Self::object_name(owner_id, file_name);

        let resp = self
            .client
            .post(self.upload_url(&object))
            .bearer_auth(&token)
            .header(header::CONTENT_TYPE, blob.content_type)
            .body(blob.data)
            .send()
            .await
            .map_err(|e| BlobStoreError::Backend(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(backend_failure("upload", resp).await);
        }

        Ok(())
    }

    async fn get(&self, owner_id: &str, file_name: &str) -> Result<Blob, BlobStoreError> {
        let token = self.token().await?;
        let object = Self::object_name(owner_id, file_name);

        let resp = self
            .client
            .get(format!("{}?alt=media", self.object_url(&object)))
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| BlobStoreError::Backend(e.to_string()))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(BlobStoreError::NotFound(blob_key(owner_id, file_name)));
        }

        if !resp.status().is_success() {
            return Err(backend_failure("download", resp).await);
        }

        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();

        let data = resp
            .bytes()
            .await
            .map_err(|e| BlobStoreError::Backend(e.to_string()))?;

        Ok(Blob { data, content_type })
    }

    async fn delete(&self, owner_id: &str, file_name: &str) -> Result<(), BlobStoreError> {
        let token = self.token().await?;
        let object = Self::object_name(owner_id, file_name);

        let resp = self
            .client
            .delete(self.object_url(&object))
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| BlobStoreError::Backend(e.to_string()))?;

        // 404 is fine -- blob already gone
        if !resp.status().is_success() && resp.status() != StatusCode::NOT_FOUND {
            return Err(backend_failure("delete", resp).await);
        }

        Ok(())
    }
}

async fn backend_failure(action: &str, resp: Response) -> BlobStoreError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    BlobStoreError::Backend(format!("GCS {action} failed ({status}): {body}"))
}

async fn fetch_token(client: &Client, credentials_file: Option<&str>) -> Result<String, anyhow::Error> {
    match credentials_file {
        Some(path) => token_from_service_account(client, path).await,
        None => token_from_metadata_server(client).await,
    }
}

async fn token_from_service_account(client: &Client, path: &str) -> Result<String, anyhow::Error> {
    let key_json = tokio::fs::read_to_string(path).await?;
    let key: ServiceAccountKey = serde_json::from_str(&key_json)?;

    let now = chrono::Utc::now().timestamp();
    let claims = serde_json::json!({
        "iss": key.client_email,
        "scope": "https://www.googleapis.com/auth/devstorage.read_write",
        "aud": key.token_uri,
        "iat": now,
        "exp": now + 3600,
    });

    let header = base64_url_encode(&serde_json::to_vec(&serde_json::json!({
        "alg": "RS256",
        "typ": "JWT"
    }))?);
    let payload = base64_url_encode(&serde_json::to_vec(&claims)?);
    let unsigned = format!("{header}.{payload}");
    let signature = sign_rs256(unsigned.as_bytes(), &key.private_key)?;
    let jwt = format!("{unsigned}.{}", base64_url_encode(&signature));

    let resp: TokenResponse = client
        .post(&key.token_uri)
        .form(&[
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", &jwt),
        ])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    Ok(resp.access_token)
}

async fn token_from_metadata_server(client: &Client) -> Result<String, anyhow::Error> {
    let resp: TokenResponse = client
        .get("http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token")
        .header("Metadata-Flavor", "Google")
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    Ok(resp.access_token)
}

/// Percent-encode an object name for use as a single URL path segment or
/// query value. Slashes are encoded too.
fn percent_encode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

fn base64_url_encode(data: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(data)
}

fn sign_rs256(data: &[u8], private_key_pem: &str) -> Result<Vec<u8>, anyhow::Error> {
    let der_b64: String = private_key_pem
        .lines()
        .filter(|line| !line.starts_with("-----"))
        .collect();
    let der = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, &der_b64)?;

    let key_pair = ring::signature::RsaKeyPair::from_pkcs8(&der)
        .map_err(|e| anyhow::anyhow!("Failed to parse RSA key: {e}"))?;

    let mut signature = vec![0u8; key_pair.public().modulus_len()];
    key_pair
        .sign(
            &ring::signature::RSA_PKCS1_SHA256,
            &ring::rand::SystemRandom::new(),
            data,
            &mut signature,
        )
        .map_err(|e| anyhow::anyhow!("Failed to sign: {e}"))?;

    Ok(signature)
}
