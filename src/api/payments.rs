use serde::Serialize;

use super::ApiClient;
use crate::{
    error::ApiResult,
    models::{Frequency, GatewayForm, Installments},
};

/// What the tenant agreed to pay; the backend turns it into a gateway form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentRequest {
    pub listing_id: String,
    pub bid_thread_id: Option<String>,
    pub annual_rent: f64,
    pub frequency: Frequency,
    pub installments: Installments,
}

impl ApiClient {
    pub async fn initiate_payment(&self, payment: &PaymentRequest) -> ApiResult<GatewayForm> {
        let request = self
            .http()
            .post(self.url("/api/dashboard/tenant/payments/initiate"))
            .json(payment);
        self.send_json(request, "Failed to start payment").await
    }
}
