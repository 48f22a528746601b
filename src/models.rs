//! Data-transfer shapes exchanged with the marketplace backend.
//!
//! The backend is authoritative for every entity here; these are ephemeral
//! copies. Identifiers and money fields are normalized at deserialization
//! time because the backend emits them both as JSON numbers and as strings.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, de};

// ==================== Flexible field decoding ====================

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Str(String),
    Int(i64),
}

impl From<IdRepr> for String {
    fn from(repr: IdRepr) -> Self {
        match repr {
            IdRepr::Str(s) => s,
            IdRepr::Int(n) => n.to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AmountRepr {
    Num(f64),
    Str(String),
}

fn amount_from_repr<E: de::Error>(repr: AmountRepr) -> Result<f64, E> {
    match repr {
        AmountRepr::Num(n) => Ok(n),
        AmountRepr::Str(s) => s
            .trim()
            .replace(',', "")
            .parse::<f64>()
            .map_err(|_| E::custom(format!("invalid amount: {s:?}"))),
    }
}

fn flexible_id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    IdRepr::deserialize(d).map(String::from)
}

fn flexible_opt_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<IdRepr>::deserialize(d)?.map(String::from))
}

fn flexible_amount<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    amount_from_repr(AmountRepr::deserialize(d)?)
}

fn flexible_opt_amount<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Option::<AmountRepr>::deserialize(d)?
        .map(amount_from_repr)
        .transpose()
}

/// The canonical spelling of a field if present, else the legacy one.
/// Payloads carrying both are common; the canonical key wins.
fn either<T>(canonical: Option<T>, legacy: Option<T>, field: &str) -> Result<T, String> {
    canonical
        .or(legacy)
        .ok_or_else(|| format!("missing field `{field}`"))
}

/// A list response in any of the envelopes the backend uses.
///
/// Some endpoints answer with a bare array, others wrap it under
/// `properties`, `listings`, `tours`, `bids` or `data`.
#[derive(Debug)]
pub struct Collection<T>(Vec<T>);

#[derive(Deserialize)]
#[serde(untagged)]
enum CollectionRepr<T> {
    Bare(Vec<T>),
    Wrapped(Envelope<T>),
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: Option<Vec<T>>,
    properties: Option<Vec<T>>,
    listings: Option<Vec<T>>,
    tours: Option<Vec<T>>,
    bids: Option<Vec<T>>,
    history: Option<Vec<T>>,
    slots: Option<Vec<T>>,
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Collection<T> {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        match CollectionRepr::deserialize(d)? {
            CollectionRepr::Bare(items) => Ok(Self(items)),
            CollectionRepr::Wrapped(e) => e
                .data
                .or(e.properties)
                .or(e.listings)
                .or(e.tours)
                .or(e.bids)
                .or(e.history)
                .or(e.slots)
                .map(Self)
                .ok_or_else(|| de::Error::custom("response carries no list")),
        }
    }
}

impl<T> Collection<T> {
    pub fn into_vec(self) -> Vec<T> {
        self.0
    }
}

// ==================== Listings ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListingStatus {
    #[default]
    Draft,
    PendingVerification,
    Active,
    Rented,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    #[serde(deserialize_with = "flexible_id")]
    pub id: String,
    #[serde(default, deserialize_with = "flexible_opt_id")]
    pub property_id: Option<String>,
    #[serde(default, deserialize_with = "flexible_opt_id")]
    pub landlord_id: Option<String>,
    #[serde(default, deserialize_with = "flexible_opt_id")]
    pub agent_id: Option<String>,
    #[serde(default, deserialize_with = "flexible_opt_amount")]
    pub price: Option<f64>,
    #[serde(default)]
    pub status: ListingStatus,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    #[serde(default, deserialize_with = "flexible_opt_amount")]
    pub area: Option<f64>,
    pub property_type: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
}

/// Returned by the permit verification step; carries the id every later
/// step is keyed on.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawListingCreated")]
pub struct ListingCreated {
    pub listing_id: String,
}

#[derive(Deserialize)]
struct RawListingCreated {
    listing_id: Option<IdRepr>,
    id: Option<IdRepr>,
}

impl TryFrom<RawListingCreated> for ListingCreated {
    type Error = String;

    fn try_from(raw: RawListingCreated) -> Result<Self, Self::Error> {
        Ok(Self {
            listing_id: either(raw.listing_id, raw.id, "listing_id")?.into(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyDetails {
    pub title: String,
    pub property_type: String,
    pub bedrooms: u32,
    pub bathrooms: u32,
    /// Square feet.
    pub area: f64,
    pub location: String,
    #[serde(default)]
    pub furnished: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    pub annual_rent: f64,
    #[serde(default)]
    pub security_deposit: Option<f64>,
    pub payment_frequency: Frequency,
    pub max_installments: Installments,
}

impl Default for Pricing {
    fn default() -> Self {
        Self {
            annual_rent: 0.0,
            security_deposit: None,
            payment_frequency: Frequency::Quarterly,
            max_installments: Installments::FOUR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Amenity {
    Parking,
    Pool,
    Gym,
    Balcony,
    CentralAc,
    MaidsRoom,
    Security,
    PetsAllowed,
    ChildrenPlayArea,
    BuiltInWardrobes,
}

/// Payload for the final listing step.
#[derive(Debug, Clone, Serialize)]
pub struct ListingDescription<'a> {
    pub description: &'a str,
    pub amenities: &'a BTreeSet<Amenity>,
}

// ==================== Tours ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TourStatus {
    Scheduled,
    Completed,
    Cancelled,
    Rescheduled,
    NoShow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tour {
    #[serde(deserialize_with = "flexible_id")]
    pub id: String,
    #[serde(deserialize_with = "flexible_id")]
    pub listing_id: String,
    #[serde(default, deserialize_with = "flexible_opt_id")]
    pub tenant_id: Option<String>,
    pub date: NaiveDate,
    pub time_slot: String,
    pub status: TourStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewTour {
    pub listing_id: String,
    pub date: NaiveDate,
    pub time_slot: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTimeSlot")]
pub struct TimeSlot {
    pub time_slot: String,
    pub available: bool,
}

#[derive(Deserialize)]
struct RawTimeSlot {
    time_slot: Option<String>,
    time: Option<String>,
    #[serde(default = "default_true")]
    available: bool,
}

impl TryFrom<RawTimeSlot> for TimeSlot {
    type Error = String;

    fn try_from(raw: RawTimeSlot) -> Result<Self, Self::Error> {
        Ok(Self {
            time_slot: either(raw.time_slot, raw.time, "time_slot")?,
            available: raw.available,
        })
    }
}

fn default_true() -> bool {
    true
}

// ==================== Bids ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BidStatus {
    Open,
    CounterOffer,
    Accepted,
    Rejected,
    Withdrawn,
}

impl BidStatus {
    /// Whether the negotiation can still move.
    pub fn is_open(self) -> bool {
        matches!(self, Self::Open | Self::CounterOffer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frequency {
    Monthly,
    Quarterly,
    Yearly,
}

impl Frequency {
    /// Months between two consecutive payments.
    pub fn months(self) -> u32 {
        match self {
            Self::Monthly => 1,
            Self::Quarterly => 3,
            Self::Yearly => 12,
        }
    }
}

/// Number of cheques a rent is split into. Only 2, 4, 8, 10 or 12 are
/// accepted by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Installments(u8);

impl Installments {
    pub const ALLOWED: [u8; 5] = [2, 4, 8, 10, 12];
    pub const FOUR: Self = Self(4);

    pub fn count(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Installments {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        if Self::ALLOWED.contains(&n) {
            Ok(Self(n))
        } else {
            Err(format!(
                "installment count must be one of {:?}, got {n}",
                Self::ALLOWED
            ))
        }
    }
}

impl From<Installments> for u8 {
    fn from(i: Installments) -> Self {
        i.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBid")]
pub struct Bid {
    pub bid_thread_id: String,
    pub listing_id: String,
    pub tenant_id: Option<String>,
    pub landlord_id: Option<String>,
    pub amount: f64,
    pub frequency: Frequency,
    pub installments: Installments,
    pub status: BidStatus,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct RawBid {
    bid_thread_id: Option<IdRepr>,
    id: Option<IdRepr>,
    #[serde(deserialize_with = "flexible_id")]
    listing_id: String,
    #[serde(default, deserialize_with = "flexible_opt_id")]
    tenant_id: Option<String>,
    #[serde(default, deserialize_with = "flexible_opt_id")]
    landlord_id: Option<String>,
    #[serde(deserialize_with = "flexible_amount")]
    amount: f64,
    frequency: Frequency,
    installments: Option<Installments>,
    installment_count: Option<Installments>,
    status: BidStatus,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl TryFrom<RawBid> for Bid {
    type Error = String;

    fn try_from(raw: RawBid) -> Result<Self, Self::Error> {
        Ok(Self {
            bid_thread_id: either(raw.bid_thread_id, raw.id, "bid_thread_id")?.into(),
            listing_id: raw.listing_id,
            tenant_id: raw.tenant_id,
            landlord_id: raw.landlord_id,
            amount: raw.amount,
            frequency: raw.frequency,
            installments: either(raw.installments, raw.installment_count, "installments")?,
            status: raw.status,
            created_at: raw.created_at,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewBid {
    pub listing_id: String,
    pub amount: f64,
    pub frequency: Frequency,
    pub installments: Installments,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Party {
    Tenant,
    Landlord,
}

/// One event in a negotiation thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBidHistoryEntry")]
pub struct BidHistoryEntry {
    pub amount: f64,
    pub status: BidStatus,
    pub party: Party,
    pub note: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct RawBidHistoryEntry {
    #[serde(deserialize_with = "flexible_amount")]
    amount: f64,
    status: BidStatus,
    party: Option<Party>,
    by: Option<Party>,
    #[serde(default)]
    note: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl TryFrom<RawBidHistoryEntry> for BidHistoryEntry {
    type Error = String;

    fn try_from(raw: RawBidHistoryEntry) -> Result<Self, Self::Error> {
        Ok(Self {
            amount: raw.amount,
            status: raw.status,
            party: either(raw.party, raw.by, "party")?,
            note: raw.note,
            created_at: raw.created_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BidSuggestion {
    #[serde(deserialize_with = "flexible_amount")]
    pub suggested_min: f64,
    #[serde(deserialize_with = "flexible_amount")]
    pub suggested_max: f64,
    /// Offers this tenant already made on the listing. `None` when the
    /// backend does not report it.
    #[serde(default)]
    pub tenant_offer_count: Option<u32>,
}

impl BidSuggestion {
    /// Offers already made, counting an unreported value as none.
    pub fn offer_count(&self) -> u32 {
        self.tenant_offer_count.unwrap_or(0)
    }

    /// The scoring range, if the backend sent a usable one.
    pub fn range(&self) -> Option<crate::bidding::SuggestedRange> {
        crate::bidding::SuggestedRange::new(self.suggested_min, self.suggested_max).ok()
    }
}

// ==================== Identity ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub role_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawAuthStatus")]
pub struct AuthStatus {
    pub authenticated: bool,
    pub user: Option<UserProfile>,
}

#[derive(Deserialize)]
struct RawAuthStatus {
    authenticated: Option<bool>,
    #[serde(rename = "isAuthenticated")]
    is_authenticated: Option<bool>,
    #[serde(default)]
    user: Option<UserProfile>,
}

impl TryFrom<RawAuthStatus> for AuthStatus {
    type Error = String;

    fn try_from(raw: RawAuthStatus) -> Result<Self, Self::Error> {
        Ok(Self {
            authenticated: either(raw.authenticated, raw.is_authenticated, "authenticated")?,
            user: raw.user,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RoleStatus {
    #[serde(default)]
    pub has_role: bool,
    #[serde(default)]
    pub role_id: Option<i64>,
}

// ==================== Payments ====================

/// Opaque redirect to the external payment gateway: post `fields` to
/// `action_url`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GatewayForm {
    pub action_url: String,
    #[serde(default)]
    pub fields: std::collections::BTreeMap<String, String>,
}
