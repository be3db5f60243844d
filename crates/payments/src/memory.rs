//! In-memory payment provider for tests.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use domain::Money;

use crate::error::PaymentError;
use crate::provider::{CheckoutSession, PaymentProvider, Refund, SessionRequest};

#[derive(Debug, Default)]
struct State {
    sessions: Vec<SessionRequest>,
    refunds: Vec<(String, Option<Money>)>,
    next_id: u32,
    fail_on_session: bool,
    fail_on_refund: bool,
}

/// Records every call and hands out sequential ids.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    state: Arc<RwLock<State>>,
}

impl InMemoryProvider {
    /// Creates a new in-memory provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures session creation to fail.
    pub fn set_fail_on_session(&self, fail: bool) {
        self.state.write().unwrap().fail_on_session = fail;
    }

    /// Configures refunds to fail.
    pub fn set_fail_on_refund(&self, fail: bool) {
        self.state.write().unwrap().fail_on_refund = fail;
    }

    /// Returns the number of sessions created.
    pub fn session_count(&self) -> usize {
        self.state.read().unwrap().sessions.len()
    }

    /// Returns the most recently created session request.
    pub fn last_session(&self) -> Option<SessionRequest> {
        self.state.read().unwrap().sessions.last().cloned()
    }

    /// Returns the refunds issued so far as (payment intent, amount).
    pub fn refunds(&self) -> Vec<(String, Option<Money>)> {
        self.state.read().unwrap().refunds.clone()
    }
}

#[async_trait]
impl PaymentProvider for InMemoryProvider {
    async fn create_checkout_session(
        &self,
        request: SessionRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_session {
            return Err(PaymentError::Provider("session declined".to_string()));
        }

        state.next_id += 1;
        let id = format!("cs_test_{:04}", state.next_id);
        let url = format!("https://checkout.test/pay/{id}");
        state.sessions.push(request);

        Ok(CheckoutSession { id, url })
    }

    async fn create_refund(
        &self,
        payment_intent_id: &str,
        amount: Option<Money>,
        _reason: Option<&str>,
    ) -> Result<Refund, PaymentError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_refund {
            return Err(PaymentError::Provider("refund declined".to_string()));
        }

        state.next_id += 1;
        state.refunds.push((payment_intent_id.to_string(), amount));

        Ok(Refund {
            id: format!("re_test_{:04}", state.next_id),
            status: "succeeded".to_string(),
        })
    }
}
