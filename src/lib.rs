//! Rent Desk Library
//!
//! Client-side core of the rental marketplace: the typed backend client,
//! the listing/booking/payment wizards and the small pure helpers behind
//! the dashboards.

pub mod api;
pub mod bidding;
pub mod calendar;
pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod roles;
pub mod storage;
pub mod traits;
pub mod wizard;

// Re-export commonly used types
pub use api::{ApiClient, PaymentRequest, Upload};
pub use bidding::{
    BidStrength, BiddingError, OfferCheck, StrengthBand, StrengthLabel, SuggestedRange, check_offer,
    ensure_can_offer, offers_left, score_bid, score_bid_with_margin,
};
pub use calendar::{DayCell, MonthGrid};
pub use config::AppConfig;
pub use error::{ApiError, ApiResult};
pub use roles::{Landing, Role, dashboard_path, resolve_landing};
pub use storage::FileStorage;
pub use traits::{Clock, MemoryStorage, MockClock, SessionStorage, SystemClock};
pub use wizard::{
    AddPropertyStep, AddPropertyWizard, BookingStep, BookingWizard, PaymentPlan, PaymentStep,
    PaymentWizard, PropertyDraft, StepOutcome, WizardError,
};
