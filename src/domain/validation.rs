//! Field-level validation for creation and patch payloads.
//!
//! Type-level problems (missing required keys, malformed values, unknown
//! keys) are caught by deserialization; the checks here are value-level.
//! Failures collect into a list of field errors so the API can report every
//! offending field at once.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::error::JournalError;
use crate::domain::plan::{NewTradingPlan, TradingPlanPatch};
use crate::domain::trade::{NewTrade, TradePatch};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

const MAX_RISK_PERCENTAGE: Decimal = Decimal::ONE_HUNDRED;

pub fn validate_new_trade(new: &NewTrade) -> Result<(), JournalError> {
    let mut errors = Vec::new();

    if new.instrument.trim().is_empty() {
        errors.push(FieldError::new("instrument", "must not be empty"));
    }
    if new.entry_price <= Decimal::ZERO {
        errors.push(FieldError::new("entryPrice", "must be greater than zero"));
    }
    if let Some(exit) = new.exit_price {
        if exit <= Decimal::ZERO {
            errors.push(FieldError::new("exitPrice", "must be greater than zero"));
        }
    }
    if new.size <= Decimal::ZERO {
        errors.push(FieldError::new("size", "must be greater than zero"));
    }

    finish(errors)
}

pub fn validate_trade_patch(patch: &TradePatch) -> Result<(), JournalError> {
    let mut errors = Vec::new();

    if let Some(instrument) = &patch.instrument {
        if instrument.trim().is_empty() {
            errors.push(FieldError::new("instrument", "must not be empty"));
        }
    }
    if let Some(entry) = patch.entry_price {
        if entry <= Decimal::ZERO {
            errors.push(FieldError::new("entryPrice", "must be greater than zero"));
        }
    }
    if let Some(Some(exit)) = patch.exit_price {
        if exit <= Decimal::ZERO {
            errors.push(FieldError::new("exitPrice", "must be greater than zero"));
        }
    }
    if let Some(size) = patch.size {
        if size <= Decimal::ZERO {
            errors.push(FieldError::new("size", "must be greater than zero"));
        }
    }

    finish(errors)
}

pub fn validate_new_plan(new: &NewTradingPlan) -> Result<(), JournalError> {
    let mut errors = Vec::new();

    if new.name.trim().is_empty() {
        errors.push(FieldError::new("name", "must not be empty"));
    }
    check_risk_percentage(new.risk_percentage, &mut errors);
    check_target_return(new.target_return, &mut errors);

    finish(errors)
}

pub fn validate_plan_patch(patch: &TradingPlanPatch) -> Result<(), JournalError> {
    let mut errors = Vec::new();

    if let Some(name) = &patch.name {
        if name.trim().is_empty() {
            errors.push(FieldError::new("name", "must not be empty"));
        }
    }
    check_risk_percentage(patch.risk_percentage.flatten(), &mut errors);
    check_target_return(patch.target_return.flatten(), &mut errors);

    finish(errors)
}

fn check_risk_percentage(value: Option<Decimal>, errors: &mut Vec<FieldError>) {
    if let Some(risk) = value {
        if risk < Decimal::ZERO || risk > MAX_RISK_PERCENTAGE {
            errors.push(FieldError::new(
                "riskPercentage",
                "must be between 0 and 100",
            ));
        }
    }
}

fn check_target_return(value: Option<Decimal>, errors: &mut Vec<FieldError>) {
    if let Some(target) = value {
        if target < Decimal::ZERO {
            errors.push(FieldError::new("targetReturn", "must not be negative"));
        }
    }
}

fn finish(errors: Vec<FieldError>) -> Result<(), JournalError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(JournalError::Validation(errors))
    }
}
