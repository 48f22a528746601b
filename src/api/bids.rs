use serde_json::json;

use super::{ApiClient, TENANT_LISTINGS};
use crate::{
    error::ApiResult,
    models::{Bid, BidHistoryEntry, BidSuggestion, Collection, NewBid},
};

const TENANT_BIDS: &str = "/api/dashboard/tenant/bids";
const LANDLORD_BIDS: &str = "/api/dashboard/landlord/bids";

impl ApiClient {
    // ==================== Tenant side ====================

    pub async fn place_bid(&self, bid: &NewBid) -> ApiResult<Bid> {
        let request = self.http().post(self.url(TENANT_BIDS)).json(bid);
        self.send_json(request, "Failed to place bid").await
    }

    pub async fn list_bids(&self) -> ApiResult<Vec<Bid>> {
        let request = self.http().get(self.url(TENANT_BIDS));
        self.send_json::<Collection<Bid>>(request, "Failed to fetch bids")
            .await
            .map(Collection::into_vec)
    }

    pub async fn bid_history(&self, bid_thread_id: &str) -> ApiResult<Vec<BidHistoryEntry>> {
        let request = self
            .http()
            .get(self.endpoint(TENANT_BIDS, &[bid_thread_id, "history"])?);
        self.send_json::<Collection<BidHistoryEntry>>(request, "Failed to fetch bid history")
            .await
            .map(Collection::into_vec)
    }

    pub async fn withdraw_bid(&self, bid_thread_id: &str) -> ApiResult<()> {
        let request = self
            .http()
            .post(self.endpoint(TENANT_BIDS, &[bid_thread_id, "withdraw"])?);
        self.send_unit(request, "Failed to withdraw bid").await
    }

    /// Suggested price range and how many offers this tenant already made.
    pub async fn bid_suggestions(&self, listing_id: &str) -> ApiResult<BidSuggestion> {
        let request = self.http().get(self
            .endpoint(TENANT_LISTINGS, &[listing_id, "bid-suggestions"])?);
        self.send_json(request, "Failed to fetch bid suggestions").await
    }

    // ==================== Landlord side ====================

    pub async fn received_bids(&self) -> ApiResult<Vec<Bid>> {
        let request = self.http().get(self.url(LANDLORD_BIDS));
        self.send_json::<Collection<Bid>>(request, "Failed to fetch received bids")
            .await
            .map(Collection::into_vec)
    }

    pub async fn counter_bid(&self, bid_thread_id: &str, amount: f64) -> ApiResult<Bid> {
        let request = self
            .http()
            .post(self.endpoint(LANDLORD_BIDS, &[bid_thread_id, "counter"])?)
            .json(&json!({ "amount": amount }));
        self.send_json(request, "Failed to send counter offer").await
    }

    pub async fn accept_bid(&self, bid_thread_id: &str) -> ApiResult<Bid> {
        let request = self
            .http()
            .post(self.endpoint(LANDLORD_BIDS, &[bid_thread_id, "accept"])?);
        self.send_json(request, "Failed to accept bid").await
    }

    pub async fn reject_bid(&self, bid_thread_id: &str) -> ApiResult<Bid> {
        let request = self
            .http()
            .post(self.endpoint(LANDLORD_BIDS, &[bid_thread_id, "reject"])?);
        self.send_json(request, "Failed to reject bid").await
    }
}
