//! Support purchases
//!
//! Tracks the "support the developer" tip product and whether the account
//! has bought it.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::RwLock;

use playground::{CommerceService, DomainError, Product, PurchaseOutcome};

pub const SUPPORT_PRODUCT_ID: &str = "support_developer_tip";

pub struct SupportStore<C: CommerceService> {
    commerce: Arc<C>,
    product_ids: Vec<String>,
    products: RwLock<Vec<Product>>,
    purchased: RwLock<HashSet<String>>,
}

impl<C: CommerceService> SupportStore<C> {
    pub fn new(commerce: Arc<C>) -> Self {
        Self {
            commerce,
            product_ids: vec![SUPPORT_PRODUCT_ID.to_string()],
            products: RwLock::new(Vec::new()),
            purchased: RwLock::new(HashSet::new()),
        }
    }

    pub async fn load_products(&self) -> Result<Vec<Product>, DomainError> {
        let products = self.commerce.products(&self.product_ids).await?;
        tracing::info!("Loaded {} products", products.len());
        *self.products.write().await = products.clone();
        Ok(products)
    }

    pub async fn products(&self) -> Vec<Product> {
        self.products.read().await.clone()
    }

    pub async fn support_product(&self) -> Option<Product> {
        self.products
            .read()
            .await
            .iter()
            .find(|p| p.id == SUPPORT_PRODUCT_ID)
            .cloned()
    }

    pub async fn purchase(&self, product_id: &str) -> Result<PurchaseOutcome, DomainError> {
        if !self.product_ids.iter().any(|id| id == product_id) {
            return Err(DomainError::Commerce(format!(
                "unknown product {}",
                product_id
            )));
        }

        let outcome = self.commerce.purchase(product_id).await?;
        tracing::info!("Purchase of {} ended as {:?}", product_id, outcome);
        if outcome == PurchaseOutcome::Purchased {
            self.restore_purchases().await?;
        }
        Ok(outcome)
    }

    /// Re-read verified entitlements from the commerce API
    pub async fn restore_purchases(&self) -> Result<(), DomainError> {
        let entitlements = self.commerce.entitlements().await?;
        *self.purchased.write().await = entitlements;
        Ok(())
    }

    pub async fn is_supporter(&self) -> bool {
        self.purchased.read().await.contains(SUPPORT_PRODUCT_ID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeCommerce {
        outcome: PurchaseOutcome,
        owned: Mutex<HashSet<String>>,
    }

    impl FakeCommerce {
        fn new(outcome: PurchaseOutcome) -> Self {
            Self {
                outcome,
                owned: Mutex::new(HashSet::new()),
            }
        }
    }

    #[async_trait]
    impl CommerceService for FakeCommerce {
        async fn products(&self, ids: &[String]) -> Result<Vec<Product>, DomainError> {
            Ok(ids
                .iter()
                .map(|id| Product {
                    id: id.clone(),
                    display_name: "Tip".to_string(),
                    display_price: "$0.99".to_string(),
                })
                .collect())
        }

        async fn purchase(&self, product_id: &str) -> Result<PurchaseOutcome, DomainError> {
            if self.outcome == PurchaseOutcome::Purchased {
                self.owned.lock().unwrap().insert(product_id.to_string());
            }
            Ok(self.outcome)
        }

        async fn entitlements(&self) -> Result<HashSet<String>, DomainError> {
            Ok(self.owned.lock().unwrap().clone())
        }
    }

    #[tokio::test]
    async fn test_purchase_marks_supporter() {
        let store = SupportStore::new(Arc::new(FakeCommerce::new(PurchaseOutcome::Purchased)));
        store.load_products().await.unwrap();
        assert!(store.support_product().await.is_some());
        assert!(!store.is_supporter().await);

        let outcome = store.purchase(SUPPORT_PRODUCT_ID).await.unwrap();
        assert_eq!(outcome, PurchaseOutcome::Purchased);
        assert!(store.is_supporter().await);
    }

    #[tokio::test]
    async fn test_cancelled_purchase_changes_nothing() {
        let store = SupportStore::new(Arc::new(FakeCommerce::new(PurchaseOutcome::Cancelled)));
        store.purchase(SUPPORT_PRODUCT_ID).await.unwrap();
        assert!(!store.is_supporter().await);
    }

    #[tokio::test]
    async fn test_unknown_product_is_rejected() {
        let store = SupportStore::new(Arc::new(FakeCommerce::new(PurchaseOutcome::Purchased)));
        let err = store.purchase("gold_plan").await.unwrap_err();
        assert!(matches!(err, DomainError::Commerce(_)));
    }
}
