//! Commerce Service Port
//!
//! Abstract interface for the in-app purchase API.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// A purchasable product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub display_name: String,
    pub display_price: String,
}

/// How a purchase attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOutcome {
    /// Verified and finished
    Purchased,
    /// Awaiting approval (e.g. parental consent)
    Pending,
    Cancelled,
}

#[async_trait]
pub trait CommerceService: Send + Sync {
    async fn products(&self, ids: &[String]) -> Result<Vec<Product>, DomainError>;

    /// Purchase and verify a product
    async fn purchase(&self, product_id: &str) -> Result<PurchaseOutcome, DomainError>;

    /// Product ids the account currently holds verified transactions for
    async fn entitlements(&self) -> Result<HashSet<String>, DomainError>;
}
