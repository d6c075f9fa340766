use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};

use super::dto::{ProductResponse, CARBS_FIELD, FAT_FIELD, KCAL_FIELD, PROTEIN_FIELD};
use super::{LookupError, NutritionClient, NutritionFacts};
use crate::config::NutritionApiConfig;

const MAX_BACKOFF_MS: u64 = 5_000;

#[derive(Debug, Clone)]
pub struct OpenFoodFactsClient {
    client: Client,
    config: NutritionApiConfig,
}

impl OpenFoodFactsClient {
    pub fn new(config: NutritionApiConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client, config })
    }

    fn product_url(&self, ean: &str) -> String {
        format!(
            "{}/api/v2/product/{}?fields=product_name,product_name_{},{},{},{},{}",
            self.config.base_url,
            ean,
            self.config.language,
            CARBS_FIELD,
            KCAL_FIELD,
            FAT_FIELD,
            PROTEIN_FIELD,
        )
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2_u64.saturating_pow(attempt.saturating_sub(1));
        let ms = self.config.initial_backoff_ms.saturating_mul(factor);
        Duration::from_millis(ms.min(MAX_BACKOFF_MS))
    }
}

fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[async_trait]
impl NutritionClient for OpenFoodFactsClient {
    async fn fetch(&self, ean: &str) -> Result<Option<NutritionFacts>, LookupError> {
        let url = self.product_url(ean);
        let max_attempts = self.config.max_retries.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(%ean, attempt, "requesting product from catalog");

            let response = match self.client.get(&url).send().await {
                Ok(r) => r,
                Err(e) if attempt < max_attempts && (e.is_timeout() || e.is_connect()) => {
                    let backoff = self.backoff(attempt);
                    warn!(%ean, error = %e, attempt, ?backoff, "catalog unreachable, retrying");
                    tokio::time::sleep(backoff).await;
                    continue;
                }
                Err(e) => return Err(LookupError::Transport(e)),
            };

            let status = response.status();
            if is_transient(status) {
                if attempt >= max_attempts {
                    warn!(%ean, %status, attempt, "catalog retries exhausted");
                    return Err(LookupError::Exhausted {
                        attempts: attempt,
                        status: status.as_u16(),
                    });
                }
                let backoff = self.backoff(attempt);
                warn!(%ean, %status, attempt, ?backoff, "catalog busy, retrying");
                tokio::time::sleep(backoff).await;
                continue;
            }

            if status == StatusCode::NOT_FOUND {
                info!(%ean, "barcode unknown to catalog");
                return Ok(None);
            }
            if !status.is_success() {
                return Err(LookupError::Status {
                    status: status.as_u16(),
                });
            }

            let body: ProductResponse = response.json().await?;
            let facts = body.into_facts(ean, &self.config.language);
            match &facts {
                Some(f) => info!(%ean, name = %f.name, "product found in catalog"),
                None => info!(%ean, "catalog response carries no product"),
            }
            return Ok(facts);
        }
    }
}
