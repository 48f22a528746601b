//! Rent payment: choose a plan, review the cheque schedule, hand off to the
//! payment gateway.

use chrono::{Months, NaiveDate};

use super::{PaymentBackend, WizardError};
use crate::{
    api::PaymentRequest,
    models::{Frequency, GatewayForm, Installments},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStep {
    ChoosePlan,
    Review,
    /// Terminal: the gateway form is ready to be posted.
    Redirect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentPlan {
    pub frequency: Frequency,
    pub installments: Installments,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installment {
    pub number: u8,
    pub due_date: NaiveDate,
    /// Amount in fils (1/100 AED).
    pub amount_minor: i64,
}

impl Installment {
    pub fn amount(&self) -> f64 {
        self.amount_minor as f64 / 100.0
    }
}

/// Split `total` into equal cheques, spaced by `frequency` from `start`.
/// Division happens in minor units; the remainder goes on the first cheque.
pub fn installment_schedule(
    total: f64,
    plan: PaymentPlan,
    start: NaiveDate,
) -> Result<Vec<Installment>, WizardError> {
    if !total.is_finite() || total <= 0.0 {
        return Err(WizardError::invalid("Rent amount must be greater than zero"));
    }

    let count = plan.installments.count();
    let total_minor = (total * 100.0).round() as i64;
    let base = total_minor / i64::from(count);
    let remainder = total_minor - base * i64::from(count);
    let step = plan.frequency.months();

    (0..count)
        .map(|i| {
            let due_date = start
                .checked_add_months(Months::new(u32::from(i) * step))
                .ok_or_else(|| WizardError::invalid("Schedule runs past the calendar"))?;
            let amount_minor = if i == 0 { base + remainder } else { base };
            Ok(Installment {
                number: i + 1,
                due_date,
                amount_minor,
            })
        })
        .collect()
}

pub struct PaymentWizard<B> {
    backend: B,
    listing_id: String,
    bid_thread_id: Option<String>,
    annual_rent: f64,
    start_date: NaiveDate,
    step: PaymentStep,
    plan: Option<PaymentPlan>,
    schedule: Vec<Installment>,
    form: Option<GatewayForm>,
}

impl<B: PaymentBackend> PaymentWizard<B> {
    pub fn new(
        backend: B,
        listing_id: impl Into<String>,
        annual_rent: f64,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            backend,
            listing_id: listing_id.into(),
            bid_thread_id: None,
            annual_rent,
            start_date,
            step: PaymentStep::ChoosePlan,
            plan: None,
            schedule: Vec::new(),
            form: None,
        }
    }

    /// Pay for the terms agreed in a bid thread.
    pub fn for_bid(mut self, bid_thread_id: impl Into<String>) -> Self {
        self.bid_thread_id = Some(bid_thread_id.into());
        self
    }

    pub fn step(&self) -> PaymentStep {
        self.step
    }

    pub fn plan(&self) -> Option<PaymentPlan> {
        self.plan
    }

    pub fn schedule(&self) -> &[Installment] {
        &self.schedule
    }

    pub fn gateway_form(&self) -> Option<&GatewayForm> {
        self.form.as_ref()
    }

    pub fn choose_plan(&mut self, plan: PaymentPlan) -> Result<&[Installment], WizardError> {
        if self.step == PaymentStep::Redirect {
            return Err(WizardError::Finished);
        }

        self.schedule = installment_schedule(self.annual_rent, plan, self.start_date)?;
        self.plan = Some(plan);
        self.step = PaymentStep::Review;
        Ok(&self.schedule)
    }

    /// Ask the backend for the gateway hand-off. On failure the wizard stays
    /// on review so the tenant can retry.
    pub async fn submit(&mut self) -> Result<&GatewayForm, WizardError> {
        let plan = match (self.step, self.plan) {
            (PaymentStep::Redirect, _) => return Err(WizardError::Finished),
            (PaymentStep::Review, Some(plan)) => plan,
            _ => return Err(WizardError::OutOfOrder("Submitting payment")),
        };

        let request = PaymentRequest {
            listing_id: self.listing_id.clone(),
            bid_thread_id: self.bid_thread_id.clone(),
            annual_rent: self.annual_rent,
            frequency: plan.frequency,
            installments: plan.installments,
        };
        let form = self.backend.initiate(&request).await.inspect_err(|e| {
            tracing::error!(listing_id = %self.listing_id, "Failed to start payment: {e}")
        })?;

        tracing::info!(listing_id = %self.listing_id, "Payment handed off to gateway");
        self.step = PaymentStep::Redirect;
        Ok(self.form.insert(form))
    }

    pub fn back(&mut self) -> bool {
        match self.step {
            PaymentStep::Review => {
                self.step = PaymentStep::ChoosePlan;
                true
            }
            PaymentStep::ChoosePlan | PaymentStep::Redirect => false,
        }
    }
}
