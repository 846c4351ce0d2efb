//! HTTP client for the invoicing store.

use serde::de::DeserializeOwned;

use super::{Estimate, Invoice, InvoiceCustomer, InvoicingError};
use crate::config::InvoicingConfig;

/// Thin GET client. Pagination is not needed — the store's collections are
/// small (tens to low thousands) and the list endpoints return everything.
#[derive(Debug)]
pub struct InvoicingClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl InvoicingClient {
    /// Build a client from the optional config section. Absent or incomplete
    /// settings fail fast with `NotConfigured`.
    pub fn from_config(config: Option<&InvoicingConfig>) -> Result<Self, InvoicingError> {
        let config = config.ok_or(InvoicingError::NotConfigured)?;
        if config.base_url.trim().is_empty() || config.api_key.trim().is_empty() {
            return Err(InvoicingError::NotConfigured);
        }
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, InvoicingError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(InvoicingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| InvoicingError::Parse(format!("{}: {}: {}", path, e, body)))
    }

    /// List customers, optionally filtered by a free-text search term.
    pub async fn list_customers(
        &self,
        search: Option<&str>,
    ) -> Result<Vec<InvoiceCustomer>, InvoicingError> {
        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(term) = search {
            query.push(("q", term));
        }
        self.get_json("/customers", &query).await
    }

    /// Fetch one customer. 404 is a legitimate None, not an error.
    pub async fn get_customer(&self, id: &str) -> Result<Option<InvoiceCustomer>, InvoicingError> {
        let result: Result<InvoiceCustomer, InvoicingError> =
            self.get_json(&format!("/customers/{}", id), &[]).await;
        match result {
            Ok(customer) => Ok(Some(customer)),
            Err(InvoicingError::Api { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn list_estimates_for_customer(
        &self,
        customer_id: &str,
    ) -> Result<Vec<Estimate>, InvoicingError> {
        self.get_json(&format!("/customers/{}/estimates", customer_id), &[])
            .await
    }

    pub async fn list_invoices_for_customer(
        &self,
        customer_id: &str,
    ) -> Result<Vec<Invoice>, InvoicingError> {
        self.get_json(&format!("/customers/{}/invoices", customer_id), &[])
            .await
    }
}
