//! Multi-step flows: listing submission, tour booking, rent payment.
//!
//! Each wizard is an explicit state machine. A step advances only once the
//! backend call behind it resolves; a failure leaves the step and every
//! entered field as they were. Methods that talk to the backend take
//! `&mut self`, so a second submission cannot start while one is in flight.
//!
//! The backend is reached through the traits below, implemented for
//! [`ApiClient`] and replaceable in tests.

pub mod add_property;
pub mod booking;
pub mod payment;

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

pub use add_property::{AddPropertyStep, AddPropertyWizard, PropertyDraft, StepOutcome};
pub use booking::{BookingStep, BookingWizard};
pub use payment::{Installment, PaymentPlan, PaymentStep, PaymentWizard, installment_schedule};

use crate::{
    api::{ApiClient, PaymentRequest, Upload},
    error::{ApiError, ApiResult},
    models::{
        Amenity, GatewayForm, Listing, ListingCreated, ListingDescription, NewTour, PropertyDetails,
        Pricing, TimeSlot, Tour,
    },
};

#[derive(Debug, Error)]
pub enum WizardError {
    /// Local input problem; nothing was sent.
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("This flow is already complete")]
    Finished,
    #[error("{0} is not available in the current step")]
    OutOfOrder(&'static str),
}

impl WizardError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

#[async_trait]
pub trait ListingBackend: Send + Sync {
    async fn verify_permit(&self, permit_number: &str) -> ApiResult<ListingCreated>;

    async fn upload_documents(
        &self,
        listing_id: &str,
        title_deed: &Upload,
        emirates_id: Option<&Upload>,
    ) -> ApiResult<()>;

    async fn submit_details(&self, listing_id: &str, details: &PropertyDetails) -> ApiResult<()>;

    async fn submit_pricing(&self, listing_id: &str, pricing: &Pricing) -> ApiResult<()>;

    async fn submit_description(
        &self,
        listing_id: &str,
        description: &str,
        amenities: &BTreeSet<Amenity>,
    ) -> ApiResult<()>;

    async fn upload_images(&self, listing_id: &str, images: &[Upload]) -> ApiResult<()>;

    async fn publish(&self, listing_id: &str) -> ApiResult<Listing>;
}

#[async_trait]
impl ListingBackend for ApiClient {
    async fn verify_permit(&self, permit_number: &str) -> ApiResult<ListingCreated> {
        ApiClient::verify_permit(self, permit_number).await
    }

    async fn upload_documents(
        &self,
        listing_id: &str,
        title_deed: &Upload,
        emirates_id: Option<&Upload>,
    ) -> ApiResult<()> {
        ApiClient::upload_documents(self, listing_id, title_deed, emirates_id).await
    }

    async fn submit_details(&self, listing_id: &str, details: &PropertyDetails) -> ApiResult<()> {
        ApiClient::submit_details(self, listing_id, details).await
    }

    async fn submit_pricing(&self, listing_id: &str, pricing: &Pricing) -> ApiResult<()> {
        ApiClient::submit_pricing(self, listing_id, pricing).await
    }

    async fn submit_description(
        &self,
        listing_id: &str,
        description: &str,
        amenities: &BTreeSet<Amenity>,
    ) -> ApiResult<()> {
        let payload = ListingDescription {
            description,
            amenities,
        };
        ApiClient::submit_description(self, listing_id, &payload).await
    }

    async fn upload_images(&self, listing_id: &str, images: &[Upload]) -> ApiResult<()> {
        ApiClient::upload_images(self, listing_id, images).await
    }

    async fn publish(&self, listing_id: &str) -> ApiResult<Listing> {
        self.publish_listing(listing_id).await
    }
}

#[async_trait]
pub trait TourBackend: Send + Sync {
    async fn availability(&self, listing_id: &str, date: NaiveDate) -> ApiResult<Vec<TimeSlot>>;

    async fn book(&self, tour: &NewTour) -> ApiResult<Tour>;
}

#[async_trait]
impl TourBackend for ApiClient {
    async fn availability(&self, listing_id: &str, date: NaiveDate) -> ApiResult<Vec<TimeSlot>> {
        self.tour_availability(listing_id, date).await
    }

    async fn book(&self, tour: &NewTour) -> ApiResult<Tour> {
        self.book_tour(tour).await
    }
}

#[async_trait]
pub trait PaymentBackend: Send + Sync {
    async fn initiate(&self, payment: &PaymentRequest) -> ApiResult<GatewayForm>;
}

#[async_trait]
impl PaymentBackend for ApiClient {
    async fn initiate(&self, payment: &PaymentRequest) -> ApiResult<GatewayForm> {
        self.initiate_payment(payment).await
    }
}
