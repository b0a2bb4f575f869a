//! Cloud parameter store backed by the AWS SSM SDK client.
//!
//! Credentials, request signing and endpoint resolution belong to the SDK
//! client. [`SsmStore::from_config`] builds one from the default credential
//! chain; tests and emulators hand in their own via [`SsmStore::new`].
//! SDK retries are disabled so every attempt is one the limiter admitted.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_ssm::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_ssm::types::ParameterType;
use aws_sdk_ssm::Client;

use super::{check_batch, PageToken, ParameterPage, ParameterRecord, ParameterStore, StoreBackend};
use crate::error::{Error, Result};
use crate::path::ParameterPath;

const MAX_PAGE_SIZE: u32 = 10;

/// Remote parameter store client.
#[derive(Debug, Clone)]
pub struct SsmStore {
    client: Client,
    kms_key_id: Option<String>,
    page_size: u32,
}

impl SsmStore {
    /// Wrap a preconfigured SDK client (credentials, region, endpoint).
    pub fn new(client: Client) -> Self {
        Self {
            client,
            kms_key_id: None,
            page_size: MAX_PAGE_SIZE,
        }
    }

    /// Build from config: region, endpoint override, KMS key, page size and
    /// operation timeout. Credentials come from the default provider chain.
    pub async fn from_config(config: &paramconf::SsmConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .retry_config(RetryConfig::disabled())
            .timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(Duration::from_millis(config.timeout_ms))
                    .build(),
            );
        if let Some(endpoint) = config.endpoint_override() {
            loader = loader.endpoint_url(endpoint);
        }
        let shared = loader.load().await;

        let mut store = Self::new(Client::new(&shared)).with_page_size(config.page_size);
        if !config.kms_key_id.is_empty() {
            store = store.with_kms_key_id(config.kms_key_id.clone());
        }
        store
    }

    pub fn with_kms_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.kms_key_id = Some(key_id.into());
        self
    }

    /// MaxResults per listing, clamped to the service maximum.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Render an SDK failure as the service's `Code: message` text.
fn describe<E, R>(err: &SdkError<E, R>) -> String
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match (err.code(), err.message()) {
        (Some(code), Some(message)) => format!("{}: {}", code, message),
        (Some(code), None) => code.to_string(),
        _ => DisplayErrorContext(err).to_string(),
    }
}

#[async_trait]
impl ParameterStore for SsmStore {
    #[tracing::instrument(skip_all, fields(name = %name, secure))]
    async fn put_parameter(
        &self,
        name: &ParameterPath,
        value: &str,
        overwrite: bool,
        secure: bool,
    ) -> Result<()> {
        let key = name.to_name();
        let kind = if secure {
            ParameterType::SecureString
        } else {
            ParameterType::String
        };
        let key_id = if secure { self.kms_key_id.clone() } else { None };

        self.client
            .put_parameter()
            .name(&key)
            .value(value)
            .r#type(kind)
            .overwrite(overwrite)
            .set_key_id(key_id)
            .send()
            .await
            .map_err(|err| Error::write(key, describe(&err)))?;
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(count = names.len()))]
    async fn delete_parameters(&self, names: &[ParameterPath]) -> Result<()> {
        check_batch(names)?;
        if names.is_empty() {
            return Ok(());
        }

        let keys: Vec<String> = names.iter().map(ParameterPath::to_name).collect();
        let first = keys[0].clone();
        let output = self
            .client
            .delete_parameters()
            .set_names(Some(keys))
            .send()
            .await
            .map_err(|err| Error::write(first, describe(&err)))?;

        if !output.invalid_parameters().is_empty() {
            tracing::debug!(
                missing = ?output.invalid_parameters(),
                "delete skipped parameters that do not exist"
            );
        }
        tracing::debug!(deleted = output.deleted_parameters().len(), "deleted parameters");
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(path = %path, recursive))]
    async fn get_parameters_by_path(
        &self,
        path: &ParameterPath,
        recursive: bool,
        with_decryption: bool,
        next_token: Option<PageToken>,
    ) -> Result<ParameterPage> {
        let root = path.to_name();
        let output = self
            .client
            .get_parameters_by_path()
            .path(&root)
            .recursive(recursive)
            .with_decryption(with_decryption)
            .max_results(self.page_size as i32)
            .set_next_token(next_token.map(|token| token.as_str().to_string()))
            .send()
            .await
            .map_err(|err| Error::read(root.clone(), describe(&err)))?;

        let records: Vec<ParameterRecord> = output
            .parameters()
            .iter()
            .filter_map(|p| match (p.name(), p.value()) {
                (Some(name), Some(value)) => Some(ParameterRecord::new(name, value)),
                _ => None,
            })
            .collect();
        let next_token = output
            .next_token()
            .filter(|token| !token.is_empty())
            .map(PageToken::new);

        tracing::debug!(
            records = records.len(),
            more = next_token.is_some(),
            "listed parameters"
        );
        Ok(ParameterPage {
            records,
            next_token,
        })
    }

    fn backend(&self) -> StoreBackend {
        StoreBackend::Ssm
    }

    fn secure_by_default(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_client() -> Client {
        let config = aws_sdk_ssm::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .build();
        Client::from_conf(config)
    }

    #[test]
    fn test_page_size_is_clamped() {
        let store = SsmStore::new(offline_client()).with_page_size(50);
        assert_eq!(store.page_size, MAX_PAGE_SIZE);
        let store = SsmStore::new(offline_client()).with_page_size(0);
        assert_eq!(store.page_size, 1);
    }

    #[test]
    fn test_kms_key_is_optional() {
        let store = SsmStore::new(offline_client());
        assert_eq!(store.kms_key_id, None);
        let store = store.with_kms_key_id("alias/config");
        assert_eq!(store.kms_key_id.as_deref(), Some("alias/config"));
        assert!(store.secure_by_default());
    }

    #[tokio::test]
    async fn test_from_config_applies_settings() {
        let config = paramconf::SsmConfig {
            region: "eu-west-2".to_string(),
            endpoint: "http://localhost:4566/".to_string(),
            kms_key_id: "alias/config".to_string(),
            page_size: 4,
            ..paramconf::SsmConfig::default()
        };
        let store = SsmStore::from_config(&config).await;
        assert_eq!(store.page_size, 4);
        assert_eq!(store.kms_key_id.as_deref(), Some("alias/config"));
        assert_eq!(
            store.client().config().region().map(|r| r.as_ref()),
            Some("eu-west-2")
        );
    }
}
