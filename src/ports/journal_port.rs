//! Journal store port trait.
//!
//! One contract, two implementations: the in-memory adapter and the SQLite
//! adapter. Identifier assignment is the store's job. Operations on an
//! absent id report it through `Option`/`bool` rather than an error, so the
//! API layer can distinguish "not found" from a failing store.

use crate::domain::error::JournalError;
use crate::domain::plan::{NewTradingPlan, TradingPlan, TradingPlanPatch};
use crate::domain::trade::{NewTrade, Trade, TradePatch};
use crate::domain::user::User;

pub trait JournalPort {
    fn create_trade(&self, new: NewTrade) -> Result<Trade, JournalError>;
    fn get_trade(&self, id: i64) -> Result<Option<Trade>, JournalError>;
    /// All trades, most recent entry time first.
    fn list_trades(&self) -> Result<Vec<Trade>, JournalError>;
    fn update_trade(&self, id: i64, patch: TradePatch) -> Result<Option<Trade>, JournalError>;
    fn delete_trade(&self, id: i64) -> Result<bool, JournalError>;

    fn create_plan(&self, new: NewTradingPlan) -> Result<TradingPlan, JournalError>;
    fn get_plan(&self, id: i64) -> Result<Option<TradingPlan>, JournalError>;
    /// All plans, most recently created first.
    fn list_plans(&self) -> Result<Vec<TradingPlan>, JournalError>;
    fn update_plan(
        &self,
        id: i64,
        patch: TradingPlanPatch,
    ) -> Result<Option<TradingPlan>, JournalError>;
    fn delete_plan(&self, id: i64) -> Result<bool, JournalError>;

    fn upsert_user(&self, user: User) -> Result<User, JournalError>;
    fn get_user(&self, id: &str) -> Result<Option<User>, JournalError>;
}
