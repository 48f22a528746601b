//! Seven-step listing submission.
//!
//! 1. verify permit, 2. upload documents, 3. property details, 4. images,
//! 5. pricing, 6. amenities, 7. description and publish.
//!
//! Steps 1, 2, 3 and 5 persist through the backend. Steps 4 and 6 stage
//! data locally and step 7 sends the rest before publishing. Going back
//! never undoes what was already saved; an abandoned listing shows up in
//! the landlord's incomplete listings.

use std::collections::BTreeSet;

use super::{ListingBackend, WizardError};
use crate::{
    api::Upload,
    models::{Amenity, Listing, PropertyDetails, Pricing},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AddPropertyStep {
    VerifyPermit,
    UploadDocuments,
    PropertyDetails,
    Images,
    Pricing,
    Amenities,
    Description,
}

impl AddPropertyStep {
    pub const COUNT: u8 = 7;

    /// 1-based position shown in the progress header.
    pub fn number(self) -> u8 {
        match self {
            Self::VerifyPermit => 1,
            Self::UploadDocuments => 2,
            Self::PropertyDetails => 3,
            Self::Images => 4,
            Self::Pricing => 5,
            Self::Amenities => 6,
            Self::Description => 7,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::VerifyPermit => "Verify permit",
            Self::UploadDocuments => "Upload documents",
            Self::PropertyDetails => "Property details",
            Self::Images => "Images",
            Self::Pricing => "Pricing",
            Self::Amenities => "Amenities",
            Self::Description => "Description",
        }
    }

    pub fn next(self) -> Option<Self> {
        match self {
            Self::VerifyPermit => Some(Self::UploadDocuments),
            Self::UploadDocuments => Some(Self::PropertyDetails),
            Self::PropertyDetails => Some(Self::Images),
            Self::Images => Some(Self::Pricing),
            Self::Pricing => Some(Self::Amenities),
            Self::Amenities => Some(Self::Description),
            Self::Description => None,
        }
    }

    pub fn previous(self) -> Option<Self> {
        match self {
            Self::VerifyPermit => None,
            Self::UploadDocuments => Some(Self::VerifyPermit),
            Self::PropertyDetails => Some(Self::UploadDocuments),
            Self::Images => Some(Self::PropertyDetails),
            Self::Pricing => Some(Self::Images),
            Self::Amenities => Some(Self::Pricing),
            Self::Description => Some(Self::Amenities),
        }
    }
}

/// Everything the landlord has entered so far. Lives only in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyDraft {
    pub permit_number: String,
    pub title_deed: Option<Upload>,
    pub emirates_id: Option<Upload>,
    pub details: PropertyDetails,
    pub images: Vec<Upload>,
    pub pricing: Pricing,
    pub amenities: BTreeSet<Amenity>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Advanced(AddPropertyStep),
    Published(Listing),
}

pub struct AddPropertyWizard<B> {
    backend: B,
    step: AddPropertyStep,
    draft: PropertyDraft,
    listing_id: Option<String>,
    /// Permit number the current `listing_id` was issued for.
    verified_permit: Option<String>,
    published: Option<Listing>,
}

impl<B: ListingBackend> AddPropertyWizard<B> {
    pub fn new(backend: B) -> Self {
        Self::with_draft(backend, PropertyDraft::default())
    }

    pub fn with_draft(backend: B, draft: PropertyDraft) -> Self {
        Self {
            backend,
            step: AddPropertyStep::VerifyPermit,
            draft,
            listing_id: None,
            verified_permit: None,
            published: None,
        }
    }

    /// Continue an incomplete listing whose permit was already verified.
    pub fn resume(backend: B, listing_id: String, draft: PropertyDraft) -> Self {
        let verified_permit = Some(draft.permit_number.trim().to_string());
        Self {
            backend,
            step: AddPropertyStep::UploadDocuments,
            draft,
            listing_id: Some(listing_id),
            verified_permit,
            published: None,
        }
    }

    pub fn step(&self) -> AddPropertyStep {
        self.step
    }

    pub fn draft(&self) -> &PropertyDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut PropertyDraft {
        &mut self.draft
    }

    pub fn listing_id(&self) -> Option<&str> {
        self.listing_id.as_deref()
    }

    pub fn published(&self) -> Option<&Listing> {
        self.published.as_ref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Check the current step's fields without touching the network.
    pub fn validate_current(&self) -> Result<(), WizardError> {
        let draft = &self.draft;
        match self.step {
            AddPropertyStep::VerifyPermit => {
                if draft.permit_number.trim().is_empty() {
                    return Err(WizardError::invalid("Please enter the permit number"));
                }
            }
            AddPropertyStep::UploadDocuments => {
                if draft.title_deed.is_none() {
                    return Err(WizardError::invalid("Please select the title deed document"));
                }
            }
            AddPropertyStep::PropertyDetails => {
                let d = &draft.details;
                if d.title.trim().is_empty() {
                    return Err(WizardError::invalid("Please enter a listing title"));
                }
                if d.property_type.trim().is_empty() {
                    return Err(WizardError::invalid("Please choose a property type"));
                }
                if d.location.trim().is_empty() {
                    return Err(WizardError::invalid("Please enter the location"));
                }
                if !d.area.is_finite() || d.area <= 0.0 {
                    return Err(WizardError::invalid("Area must be greater than zero"));
                }
            }
            AddPropertyStep::Images => {
                if let Some(bad) = draft
                    .images
                    .iter()
                    .find(|i| !i.content_type.starts_with("image/"))
                {
                    return Err(WizardError::invalid(format!(
                        "{} is not an image",
                        bad.file_name
                    )));
                }
            }
            AddPropertyStep::Pricing => {
                let p = &draft.pricing;
                if !p.annual_rent.is_finite() || p.annual_rent <= 0.0 {
                    return Err(WizardError::invalid("Annual rent must be greater than zero"));
                }
                if p.security_deposit.is_some_and(|d| !d.is_finite() || d < 0.0) {
                    return Err(WizardError::invalid("Security deposit cannot be negative"));
                }
            }
            AddPropertyStep::Amenities => {}
            AddPropertyStep::Description => {
                if draft.description.trim().is_empty() {
                    return Err(WizardError::invalid("Please write a description"));
                }
            }
        }
        Ok(())
    }

    fn require_listing(&self) -> Result<String, WizardError> {
        self.listing_id
            .clone()
            .ok_or_else(|| WizardError::invalid("Verify the permit before continuing"))
    }

    /// Persist the current step and move to the next one.
    pub async fn next(&mut self) -> Result<StepOutcome, WizardError> {
        if self.published.is_some() {
            return Err(WizardError::Finished);
        }
        self.validate_current()?;

        let step = self.step;
        match self.submit_step(step).await {
            Ok(Some(listing)) => {
                tracing::info!(listing_id = %listing.id, "Listing published");
                self.published = Some(listing.clone());
                Ok(StepOutcome::Published(listing))
            }
            Ok(None) => {
                // Only the final step has no successor, and it always publishes.
                let next = step.next().ok_or(WizardError::Finished)?;
                self.step = next;
                tracing::debug!(from = step.number(), to = next.number(), "Wizard advanced");
                Ok(StepOutcome::Advanced(next))
            }
            Err(e) => {
                tracing::error!(step = step.number(), "{}: {e}", step.title());
                Err(e)
            }
        }
    }

    async fn submit_step(&mut self, step: AddPropertyStep) -> Result<Option<Listing>, WizardError> {
        let draft = &self.draft;
        match step {
            AddPropertyStep::VerifyPermit => {
                let permit = draft.permit_number.trim();
                if self.listing_id.is_some() && self.verified_permit.as_deref() == Some(permit) {
                    return Ok(None);
                }
                let created = self.backend.verify_permit(permit).await?;
                tracing::info!(listing_id = %created.listing_id, "Permit verified");
                self.verified_permit = Some(permit.to_string());
                self.listing_id = Some(created.listing_id);
            }
            AddPropertyStep::UploadDocuments => {
                let id = self.require_listing()?;
                if let Some(deed) = &draft.title_deed {
                    self.backend
                        .upload_documents(&id, deed, draft.emirates_id.as_ref())
                        .await?;
                }
            }
            AddPropertyStep::PropertyDetails => {
                let id = self.require_listing()?;
                self.backend.submit_details(&id, &draft.details).await?;
            }
            AddPropertyStep::Images | AddPropertyStep::Amenities => {}
            AddPropertyStep::Pricing => {
                let id = self.require_listing()?;
                self.backend.submit_pricing(&id, &draft.pricing).await?;
            }
            AddPropertyStep::Description => {
                let id = self.require_listing()?;
                self.backend
                    .submit_description(&id, draft.description.trim(), &draft.amenities)
                    .await?;
                if !draft.images.is_empty() {
                    self.backend.upload_images(&id, &draft.images).await?;
                }
                return Ok(Some(self.backend.publish(&id).await?));
            }
        }
        Ok(None)
    }

    /// Step back without undoing anything already saved. Returns `false` on
    /// the first step or once published.
    pub fn back(&mut self) -> bool {
        if self.published.is_some() {
            return false;
        }
        match self.step.previous() {
            Some(previous) => {
                self.step = previous;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::{
        error::{ApiError, ApiResult},
        models::ListingCreated,
    };

    /// Counts calls and refuses all of them.
    #[derive(Default)]
    struct Unreachable {
        calls: AtomicUsize,
    }

    impl Unreachable {
        fn hit<T>(&self) -> ApiResult<T> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ApiError::InvalidRequest("offline".to_string()))
        }
    }

    #[async_trait]
    impl ListingBackend for Unreachable {
        async fn verify_permit(&self, _: &str) -> ApiResult<ListingCreated> {
            self.hit()
        }
        async fn upload_documents(&self, _: &str, _: &Upload, _: Option<&Upload>) -> ApiResult<()> {
            self.hit()
        }
        async fn submit_details(&self, _: &str, _: &PropertyDetails) -> ApiResult<()> {
            self.hit()
        }
        async fn submit_pricing(&self, _: &str, _: &Pricing) -> ApiResult<()> {
            self.hit()
        }
        async fn submit_description(&self, _: &str, _: &str, _: &BTreeSet<Amenity>) -> ApiResult<()> {
            self.hit()
        }
        async fn upload_images(&self, _: &str, _: &[Upload]) -> ApiResult<()> {
            self.hit()
        }
        async fn publish(&self, _: &str) -> ApiResult<Listing> {
            self.hit()
        }
    }

    #[tokio::test]
    async fn test_step_without_listing_id_is_a_validation_error() {
        let draft = PropertyDraft {
            details: PropertyDetails {
                title: "Loft".to_string(),
                property_type: "apartment".to_string(),
                area: 900.0,
                location: "JLT".to_string(),
                ..PropertyDetails::default()
            },
            ..PropertyDraft::default()
        };
        let mut wizard = AddPropertyWizard::with_draft(Unreachable::default(), draft);
        wizard.step = AddPropertyStep::PropertyDetails;

        let err = wizard.next().await.unwrap_err();

        assert!(err.is_validation(), "got {err:?}");
        assert_eq!(err.to_string(), "Verify the permit before continuing");
        assert_eq!(wizard.step(), AddPropertyStep::PropertyDetails);
        assert_eq!(wizard.backend().calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_step_numbers_are_one_through_seven() {
        let mut step = AddPropertyStep::VerifyPermit;
        let mut numbers = vec![step.number()];
        while let Some(next) = step.next() {
            assert_eq!(next.previous(), Some(step));
            step = next;
            numbers.push(step.number());
        }
        assert_eq!(numbers, (1..=AddPropertyStep::COUNT).collect::<Vec<_>>());
    }

    #[test]
    fn test_first_step_has_no_previous() {
        assert_eq!(AddPropertyStep::VerifyPermit.previous(), None);
        assert_eq!(AddPropertyStep::Description.next(), None);
    }
}
