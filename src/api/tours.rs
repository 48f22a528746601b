use chrono::NaiveDate;
use serde_json::json;

use super::{ApiClient, TENANT_LISTINGS, wire_name, with_query};
use crate::{
    error::ApiResult,
    models::{Collection, NewTour, TimeSlot, Tour, TourStatus},
};

const TOURS: &str = "/api/dashboard/tenant/tours";

impl ApiClient {
    pub async fn book_tour(&self, tour: &NewTour) -> ApiResult<Tour> {
        let request = self.http().post(self.url(TOURS)).json(tour);
        self.send_json(request, "Failed to book tour").await
    }

    pub async fn list_tours(&self, status: Option<TourStatus>) -> ApiResult<Vec<Tour>> {
        let status = status.map(|s| wire_name(&s));
        let query: Vec<(&str, &str)> = status.iter().map(|s| ("status", s.as_str())).collect();
        let url = with_query(self.endpoint(TOURS, &[])?, &query);

        self.send_json::<Collection<Tour>>(self.http().get(url), "Failed to fetch tours")
            .await
            .map(Collection::into_vec)
    }

    pub async fn tour(&self, tour_id: &str) -> ApiResult<Tour> {
        let request = self.http().get(self.endpoint(TOURS, &[tour_id])?);
        self.send_json(request, "Failed to fetch tour details").await
    }

    pub async fn cancel_tour(&self, tour_id: &str, reason: Option<&str>) -> ApiResult<Tour> {
        let request = self
            .http()
            .post(self.endpoint(TOURS, &[tour_id, "cancel"])?)
            .json(&json!({ "reason": reason }));
        self.send_json(request, "Failed to cancel tour").await
    }

    pub async fn reschedule_tour(
        &self,
        tour_id: &str,
        date: NaiveDate,
        time_slot: &str,
    ) -> ApiResult<Tour> {
        let request = self
            .http()
            .post(self.endpoint(TOURS, &[tour_id, "reschedule"])?)
            .json(&json!({ "date": date, "time_slot": time_slot }));
        self.send_json(request, "Failed to reschedule tour").await
    }

    /// Viewing slots for one listing on one day.
    pub async fn tour_availability(
        &self,
        listing_id: &str,
        date: NaiveDate,
    ) -> ApiResult<Vec<TimeSlot>> {
        let date = date.format("%Y-%m-%d").to_string();
        let url = with_query(
            self.endpoint(TENANT_LISTINGS, &[listing_id, "availability"])?,
            &[("date", date.as_str())],
        );

        self.send_json::<Collection<TimeSlot>>(self.http().get(url), "Failed to fetch availability")
            .await
            .map(Collection::into_vec)
    }
}
