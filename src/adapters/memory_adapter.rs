//! In-memory journal store.
//!
//! Entities live in maps behind one mutex; id counters are part of the
//! guarded state, so two adapters never share a sequence.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use crate::domain::error::JournalError;
use crate::domain::plan::{NewTradingPlan, TradingPlan, TradingPlanPatch};
use crate::domain::trade::{NewTrade, Trade, TradePatch};
use crate::domain::user::User;
use crate::ports::journal_port::JournalPort;

pub struct MemoryAdapter {
    inner: Mutex<Inner>,
}

struct Inner {
    trades: HashMap<i64, Trade>,
    plans: HashMap<i64, TradingPlan>,
    users: HashMap<String, User>,
    next_trade_id: i64,
    next_plan_id: i64,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                trades: HashMap::new(),
                plans: HashMap::new(),
                users: HashMap::new(),
                next_trade_id: 1,
                next_plan_id: 1,
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, JournalError> {
        self.inner.lock().map_err(|_| JournalError::Database {
            reason: "store mutex poisoned".into(),
        })
    }
}

impl Default for MemoryAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl JournalPort for MemoryAdapter {
    fn create_trade(&self, new: NewTrade) -> Result<Trade, JournalError> {
        let mut inner = self.lock()?;
        let id = inner.next_trade_id;
        inner.next_trade_id += 1;
        let trade = Trade::from_new(id, new);
        inner.trades.insert(id, trade.clone());
        Ok(trade)
    }

    fn get_trade(&self, id: i64) -> Result<Option<Trade>, JournalError> {
        Ok(self.lock()?.trades.get(&id).cloned())
    }

    fn list_trades(&self) -> Result<Vec<Trade>, JournalError> {
        let inner = self.lock()?;
        let mut trades: Vec<Trade> = inner.trades.values().cloned().collect();
        trades.sort_by(|a, b| b.entry_time.cmp(&a.entry_time).then(b.id.cmp(&a.id)));
        Ok(trades)
    }

    fn update_trade(&self, id: i64, patch: TradePatch) -> Result<Option<Trade>, JournalError> {
        let mut inner = self.lock()?;
        match inner.trades.get_mut(&id) {
            Some(trade) => {
                trade.apply_patch(patch);
                Ok(Some(trade.clone()))
            }
            None => Ok(None),
        }
    }

    fn delete_trade(&self, id: i64) -> Result<bool, JournalError> {
        Ok(self.lock()?.trades.remove(&id).is_some())
    }

    fn create_plan(&self, new: NewTradingPlan) -> Result<TradingPlan, JournalError> {
        let mut inner = self.lock()?;
        let id = inner.next_plan_id;
        inner.next_plan_id += 1;
        let plan = TradingPlan::from_new(id, new, Utc::now());
        inner.plans.insert(id, plan.clone());
        Ok(plan)
    }

    fn get_plan(&self, id: i64) -> Result<Option<TradingPlan>, JournalError> {
        Ok(self.lock()?.plans.get(&id).cloned())
    }

    fn list_plans(&self) -> Result<Vec<TradingPlan>, JournalError> {
        let inner = self.lock()?;
        let mut plans: Vec<TradingPlan> = inner.plans.values().cloned().collect();
        plans.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(plans)
    }

    fn update_plan(
        &self,
        id: i64,
        patch: TradingPlanPatch,
    ) -> Result<Option<TradingPlan>, JournalError> {
        let mut inner = self.lock()?;
        match inner.plans.get_mut(&id) {
            Some(plan) => {
                plan.apply_patch(patch);
                Ok(Some(plan.clone()))
            }
            None => Ok(None),
        }
    }

    fn delete_plan(&self, id: i64) -> Result<bool, JournalError> {
        Ok(self.lock()?.plans.remove(&id).is_some())
    }

    fn upsert_user(&self, user: User) -> Result<User, JournalError> {
        let mut inner = self.lock()?;
        inner.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    fn get_user(&self, id: &str) -> Result<Option<User>, JournalError> {
        Ok(self.lock()?.users.get(id).cloned())
    }
}
