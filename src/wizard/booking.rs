//! Tour booking: pick a day, pick a slot, confirm.

use std::sync::Arc;

use chrono::NaiveDate;

use super::{TourBackend, WizardError};
use crate::{
    calendar,
    models::{NewTour, TimeSlot, Tour},
    traits::Clock,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStep {
    SelectDate,
    SelectTime,
    Confirm,
    Booked,
}

pub struct BookingWizard<B> {
    backend: B,
    clock: Arc<dyn Clock>,
    listing_id: String,
    step: BookingStep,
    date: Option<NaiveDate>,
    slots: Vec<TimeSlot>,
    time_slot: Option<String>,
    tour: Option<Tour>,
}

impl<B: TourBackend> BookingWizard<B> {
    pub fn new(backend: B, clock: Arc<dyn Clock>, listing_id: impl Into<String>) -> Self {
        Self {
            backend,
            clock,
            listing_id: listing_id.into(),
            step: BookingStep::SelectDate,
            date: None,
            slots: Vec::new(),
            time_slot: None,
            tour: None,
        }
    }

    pub fn step(&self) -> BookingStep {
        self.step
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    pub fn time_slot(&self) -> Option<&str> {
        self.time_slot.as_deref()
    }

    pub fn tour(&self) -> Option<&Tour> {
        self.tour.as_ref()
    }

    /// Pick a day and load its slots. Past days are refused before any
    /// request is made.
    pub async fn select_date(&mut self, date: NaiveDate) -> Result<&[TimeSlot], WizardError> {
        match self.step {
            BookingStep::Booked => return Err(WizardError::Finished),
            BookingStep::Confirm => return Err(WizardError::OutOfOrder("Changing the date")),
            BookingStep::SelectDate | BookingStep::SelectTime => {}
        }

        let today = self.clock.today();
        if !calendar::is_selectable(date, today) {
            return Err(WizardError::invalid(format!(
                "{date} is in the past; pick today or a later day"
            )));
        }

        let slots = self
            .backend
            .availability(&self.listing_id, date)
            .await
            .inspect_err(|e| tracing::error!(%date, "Failed to load availability: {e}"))?;

        tracing::debug!(%date, slots = slots.len(), "Availability loaded");
        self.date = Some(date);
        self.slots = slots;
        self.time_slot = None;
        self.step = BookingStep::SelectTime;
        Ok(&self.slots)
    }

    pub fn select_slot(&mut self, time_slot: &str) -> Result<(), WizardError> {
        if self.step != BookingStep::SelectTime {
            return Err(WizardError::OutOfOrder("Choosing a time"));
        }

        let slot = self
            .slots
            .iter()
            .find(|s| s.time_slot == time_slot)
            .ok_or_else(|| WizardError::invalid(format!("{time_slot} is not offered that day")))?;
        if !slot.available {
            return Err(WizardError::invalid(format!("{time_slot} is already taken")));
        }

        self.time_slot = Some(slot.time_slot.clone());
        self.step = BookingStep::Confirm;
        Ok(())
    }

    /// Book the tour. On failure the wizard stays on the confirm step.
    pub async fn confirm(&mut self) -> Result<&Tour, WizardError> {
        if self.step == BookingStep::Booked {
            return Err(WizardError::Finished);
        }
        let (Some(date), Some(time_slot), BookingStep::Confirm) =
            (self.date, self.time_slot.clone(), self.step)
        else {
            return Err(WizardError::OutOfOrder("Confirming"));
        };

        let request = NewTour {
            listing_id: self.listing_id.clone(),
            date,
            time_slot,
        };
        let tour = self
            .backend
            .book(&request)
            .await
            .inspect_err(|e| tracing::error!(%date, "Failed to book tour: {e}"))?;

        tracing::info!(tour_id = %tour.id, %date, "Tour booked");
        self.step = BookingStep::Booked;
        Ok(self.tour.insert(tour))
    }

    pub fn back(&mut self) -> bool {
        self.step = match self.step {
            BookingStep::SelectDate | BookingStep::Booked => return false,
            BookingStep::SelectTime => BookingStep::SelectDate,
            BookingStep::Confirm => BookingStep::SelectTime,
        };
        true
    }
}
