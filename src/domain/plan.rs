//! Trading plan entity.
//!
//! A plan is a written strategy document with optional numeric risk and
//! target parameters. `created_at` is set once by the store and is not
//! patchable.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingPlan {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub objectives: Option<String>,
    pub strategy: Option<String>,
    pub risk_percentage: Option<Decimal>,
    pub target_return: Option<Decimal>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewTradingPlan {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub objectives: Option<String>,
    #[serde(default)]
    pub strategy: Option<String>,
    #[serde(default)]
    pub risk_percentage: Option<Decimal>,
    #[serde(default)]
    pub target_return: Option<Decimal>,
    /// Defaults to true when absent.
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TradingPlanPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub objectives: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub strategy: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub risk_percentage: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    pub target_return: Option<Option<Decimal>>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl TradingPlan {
    /// Assemble a plan from a creation payload; the store supplies the id
    /// and creation timestamp.
    pub fn from_new(id: i64, new: NewTradingPlan, created_at: DateTime<Utc>) -> TradingPlan {
        TradingPlan {
            id,
            name: new.name,
            description: new.description,
            objectives: new.objectives,
            strategy: new.strategy,
            risk_percentage: new.risk_percentage,
            target_return: new.target_return,
            is_active: new.is_active.unwrap_or(true),
            created_at,
        }
    }

    pub fn apply_patch(&mut self, patch: TradingPlanPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(objectives) = patch.objectives {
            self.objectives = objectives;
        }
        if let Some(strategy) = patch.strategy {
            self.strategy = strategy;
        }
        if let Some(risk_percentage) = patch.risk_percentage {
            self.risk_percentage = risk_percentage;
        }
        if let Some(target_return) = patch.target_return {
            self.target_return = target_return;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
    }
}
