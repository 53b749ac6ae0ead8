//! Order history.

use tracing::instrument;
use zone7_core::order::Order;

use super::checkout::CheckoutError;
use crate::cms::OrderRepository;
use crate::models::AuthSession;

/// Read access to the user's placed orders.
#[derive(Debug, Clone)]
pub struct OrderService<R> {
    repo: R,
}

impl<R: OrderRepository> OrderService<R> {
    #[must_use]
    pub const fn new(repo: R) -> Self {
        Self { repo }
    }

    /// The user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` without a session, or a CMS error.
    #[instrument(skip_all)]
    pub async fn list(&self, auth: Option<&AuthSession>) -> Result<Vec<Order>, CheckoutError> {
        let auth = auth.ok_or(CheckoutError::Unauthorized)?;
        let mut orders = self.repo.list_orders(auth).await?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }
}
