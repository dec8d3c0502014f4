use crate::domain::order::OrderView;

/// Issues the URL a shopper is sent to after checkout.
pub trait PaymentProvider: Send + Sync + 'static {
    fn checkout_url(&self, order: &OrderView) -> String;
}

/// Redirect-only stand-in for a real payment gateway. Nothing is captured.
#[derive(Debug, Clone)]
pub struct StubPaymentProvider {
    base_url: String,
}

impl StubPaymentProvider {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl PaymentProvider for StubPaymentProvider {
    fn checkout_url(&self, order: &OrderView) -> String {
        format!("{}/{}?order_id={}", self.base_url, order.number, order.id)
    }
}
