//! The seam between the services and the invoicing store.
//!
//! Services depend on `dyn InvoicingProvider` so tests can substitute a
//! fixture without network access.

use async_trait::async_trait;

use super::{Estimate, Invoice, InvoiceCustomer, InvoicingClient, InvoicingError};

#[async_trait]
pub trait InvoicingProvider: Send + Sync {
    async fn list_customers(
        &self,
        search: Option<&str>,
    ) -> Result<Vec<InvoiceCustomer>, InvoicingError>;

    async fn get_customer(&self, id: &str) -> Result<Option<InvoiceCustomer>, InvoicingError>;

    async fn list_estimates(&self, customer_id: &str) -> Result<Vec<Estimate>, InvoicingError>;

    async fn list_invoices(&self, customer_id: &str) -> Result<Vec<Invoice>, InvoicingError>;
}

#[async_trait]
impl InvoicingProvider for InvoicingClient {
    async fn list_customers(
        &self,
        search: Option<&str>,
    ) -> Result<Vec<InvoiceCustomer>, InvoicingError> {
        InvoicingClient::list_customers(self, search).await
    }

    async fn get_customer(&self, id: &str) -> Result<Option<InvoiceCustomer>, InvoicingError> {
        InvoicingClient::get_customer(self, id).await
    }

    async fn list_estimates(&self, customer_id: &str) -> Result<Vec<Estimate>, InvoicingError> {
        self.list_estimates_for_customer(customer_id).await
    }

    async fn list_invoices(&self, customer_id: &str) -> Result<Vec<Invoice>, InvoicingError> {
        self.list_invoices_for_customer(customer_id).await
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::collections::HashMap;

    use super::*;

    /// In-memory provider for service tests.
    #[derive(Default)]
    pub struct FixtureProvider {
        pub customers: Vec<InvoiceCustomer>,
        pub estimates: HashMap<String, Vec<Estimate>>,
        pub invoices: HashMap<String, Vec<Invoice>>,
        /// Simulate the estimate/invoice endpoints failing while the
        /// customer endpoint still works.
        pub fail_documents: bool,
    }

    #[async_trait]
    impl InvoicingProvider for FixtureProvider {
        async fn list_customers(
            &self,
            _search: Option<&str>,
        ) -> Result<Vec<InvoiceCustomer>, InvoicingError> {
            Ok(self.customers.clone())
        }

        async fn get_customer(&self, id: &str) -> Result<Option<InvoiceCustomer>, InvoicingError> {
            Ok(self.customers.iter().find(|c| c.id == id).cloned())
        }

        async fn list_estimates(
            &self,
            customer_id: &str,
        ) -> Result<Vec<Estimate>, InvoicingError> {
            if self.fail_documents {
                return Err(InvoicingError::Api {
                    status: 503,
                    message: "temporarily unavailable".to_string(),
                });
            }
            Ok(self.estimates.get(customer_id).cloned().unwrap_or_default())
        }

        async fn list_invoices(&self, customer_id: &str) -> Result<Vec<Invoice>, InvoicingError> {
            if self.fail_documents {
                return Err(InvoicingError::Api {
                    status: 503,
                    message: "temporarily unavailable".to_string(),
                });
            }
            Ok(self.invoices.get(customer_id).cloned().unwrap_or_default())
        }
    }
}
