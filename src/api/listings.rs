use reqwest::multipart::Form;
use serde_json::json;

use super::{ApiClient, Upload};
use crate::{
    error::ApiResult,
    models::{Collection, Listing, ListingCreated, ListingDescription, PropertyDetails, Pricing},
};

const LISTINGS: &str = "/api/dashboard/landlord/listings";

impl ApiClient {
    /// Step 1: validate a RERA/DLD permit and open a draft listing.
    pub async fn verify_permit(&self, permit_number: &str) -> ApiResult<ListingCreated> {
        let request = self
            .http()
            .post(self.url(&format!("{LISTINGS}/verify-permit")))
            .json(&json!({ "permit_number": permit_number }));
        self.send_json(request, "Failed to verify permit").await
    }

    /// Step 2: title deed (required) and Emirates ID (optional).
    pub async fn upload_documents(
        &self,
        listing_id: &str,
        title_deed: &Upload,
        emirates_id: Option<&Upload>,
    ) -> ApiResult<()> {
        let mut form = Form::new().part("title_deed", title_deed.clone().into_part()?);
        if let Some(id_doc) = emirates_id {
            form = form.part("emirates_id", id_doc.clone().into_part()?);
        }

        let request = self
            .http()
            .post(self.endpoint(LISTINGS, &[listing_id, "documents"])?)
            .multipart(form);
        self.send_unit(request, "Failed to upload documents").await
    }

    /// Step 3.
    pub async fn submit_details(&self, listing_id: &str, details: &PropertyDetails) -> ApiResult<()> {
        let request = self
            .http()
            .put(self.endpoint(LISTINGS, &[listing_id, "details"])?)
            .json(details);
        self.send_unit(request, "Failed to save property details").await
    }

    /// Step 5.
    pub async fn submit_pricing(&self, listing_id: &str, pricing: &Pricing) -> ApiResult<()> {
        let request = self
            .http()
            .put(self.endpoint(LISTINGS, &[listing_id, "pricing"])?)
            .json(pricing);
        self.send_unit(request, "Failed to save pricing").await
    }

    pub async fn submit_description(
        &self,
        listing_id: &str,
        description: &ListingDescription<'_>,
    ) -> ApiResult<()> {
        let request = self
            .http()
            .put(self.endpoint(LISTINGS, &[listing_id, "description"])?)
            .json(description);
        self.send_unit(request, "Failed to save description").await
    }

    pub async fn upload_images(&self, listing_id: &str, images: &[Upload]) -> ApiResult<()> {
        let mut form = Form::new();
        for image in images {
            form = form.part("images", image.clone().into_part()?);
        }

        let request = self
            .http()
            .post(self.endpoint(LISTINGS, &[listing_id, "images"])?)
            .multipart(form);
        self.send_unit(request, "Failed to upload images").await
    }

    pub async fn publish_listing(&self, listing_id: &str) -> ApiResult<Listing> {
        let request = self
            .http()
            .post(self.endpoint(LISTINGS, &[listing_id, "publish"])?);
        self.send_json(request, "Failed to publish listing").await
    }

    pub async fn list_listings(&self) -> ApiResult<Vec<Listing>> {
        let request = self.http().get(self.url(LISTINGS));
        self.send_json::<Collection<Listing>>(request, "Failed to fetch listings")
            .await
            .map(Collection::into_vec)
    }

    /// Drafts abandoned part-way through the add-property flow.
    pub async fn incomplete_listings(&self) -> ApiResult<Vec<Listing>> {
        let request = self.http().get(self.url(&format!("{LISTINGS}/incomplete")));
        self.send_json::<Collection<Listing>>(request, "Failed to fetch incomplete listings")
            .await
            .map(Collection::into_vec)
    }
}
