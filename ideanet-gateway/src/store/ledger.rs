//! Contract and balance ledger
//!
//! Explicit store abstraction for the demo accounts and accountability
//! contracts, injected into request handlers instead of living in a
//! process-wide singleton. The in-memory implementation keeps all
//! mutation under one lock: `settle` reads and writes both balances
//! atomically, so concurrent evaluations against the same contract
//! cannot lose updates.

use async_trait::async_trait;
use ideanet_core::round2;
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Balance granted to accounts that have never been seen before.
pub const DEFAULT_STARTING_BALANCE: f64 = 500.0;

/// Stake applied when neither the request nor a contract supplies one.
pub const DEFAULT_STAKE: f64 = 100.0;

/// Daily goal count applied when neither the request nor a contract
/// supplies one.
pub const DEFAULT_GOAL_COUNT: f64 = 1.0;

/// A demo user account. Balances only change through `settle`.
#[derive(Debug, Clone, Serialize)]
pub struct UserAccount {
    pub username: String,
    pub balance: f64,
}

/// An accountability pact between two users. Immutable once created;
/// there is no deletion path.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: String,
    pub username: String,
    pub friend_username: String,
    pub daily_goal_count: f64,
    pub stake_amount: f64,
}

/// Storage seam for accounts and contracts.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Look up an account, creating it with the starting balance if absent.
    async fn ensure_user(&self, username: &str) -> UserAccount;

    /// Create a contract. The goal count floors to 1 and the stake to 0;
    /// absent or non-numeric values fall back to the ledger's configured
    /// defaults.
    async fn create_contract(
        &self,
        username: &str,
        friend_username: &str,
        daily_goal_count: Option<f64>,
        stake_amount: Option<f64>,
    ) -> Contract;

    /// Fetch a contract by id.
    async fn contract(&self, id: &str) -> Option<Contract>;

    /// Move `amount` from evaluator to partner and return both balances
    /// (evaluator first). Each balance is re-rounded to cents after the
    /// arithmetic and floored at zero. An amount of zero or less is a
    /// pure read. The whole operation is atomic: balance mutation is
    /// serialized, which is what enforces at-most-one-in-flight
    /// evaluation per contract.
    async fn settle(&self, evaluator: &str, partner: &str, amount: f64) -> (f64, f64);
}

struct LedgerInner {
    users: HashMap<String, UserAccount>,
    contracts: HashMap<String, Contract>,
    next_contract_id: u64,
}

/// In-memory ledger for the demo backend.
pub struct MemoryLedger {
    starting_balance: f64,
    default_stake: f64,
    inner: Mutex<LedgerInner>,
}

impl MemoryLedger {
    pub fn new(starting_balance: f64, default_stake: f64) -> Self {
        Self {
            starting_balance,
            default_stake,
            inner: Mutex::new(LedgerInner {
                users: HashMap::new(),
                contracts: HashMap::new(),
                next_contract_id: 1,
            }),
        }
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new(DEFAULT_STARTING_BALANCE, DEFAULT_STAKE)
    }
}

impl LedgerInner {
    fn ensure_user(&mut self, username: &str, starting_balance: f64) -> UserAccount {
        self.users
            .entry(username.to_string())
            .or_insert_with(|| UserAccount {
                username: username.to_string(),
                balance: starting_balance,
            })
            .clone()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn ensure_user(&self, username: &str) -> UserAccount {
        let mut inner = self.inner.lock().await;
        inner.ensure_user(username, self.starting_balance)
    }

    async fn create_contract(
        &self,
        username: &str,
        friend_username: &str,
        daily_goal_count: Option<f64>,
        stake_amount: Option<f64>,
    ) -> Contract {
        // Absent or non-numeric inputs fall back to the defaults, then
        // clamp: goal >= 1, stake >= 0. An explicit stake of 0 is kept.
        let daily_goal_count = daily_goal_count
            .filter(|g| g.is_finite())
            .unwrap_or(DEFAULT_GOAL_COUNT)
            .max(1.0);
        let stake_amount = stake_amount
            .filter(|s| s.is_finite())
            .unwrap_or(self.default_stake)
            .max(0.0);

        let mut inner = self.inner.lock().await;
        let id = format!("contract-{}", inner.next_contract_id);
        inner.next_contract_id += 1;

        let contract = Contract {
            id: id.clone(),
            username: username.to_string(),
            friend_username: friend_username.to_string(),
            daily_goal_count,
            stake_amount,
        };
        inner.contracts.insert(id, contract.clone());
        contract
    }

    async fn contract(&self, id: &str) -> Option<Contract> {
        let inner = self.inner.lock().await;
        inner.contracts.get(id).cloned()
    }

    async fn settle(&self, evaluator: &str, partner: &str, amount: f64) -> (f64, f64) {
        let mut inner = self.inner.lock().await;
        inner.ensure_user(evaluator, self.starting_balance);
        inner.ensure_user(partner, self.starting_balance);

        // Self-pact: debit and credit cancel out, report the balance as-is.
        if evaluator == partner || amount <= 0.0 {
            let eval_balance = inner.users[evaluator].balance;
            let partner_balance = inner.users[partner].balance;
            return (eval_balance, partner_balance);
        }

        let debited = {
            let account = inner
                .users
                .get_mut(evaluator)
                .expect("evaluator ensured above");
            account.balance = round2((account.balance - amount).max(0.0));
            account.balance
        };
        let credited = {
            let account = inner
                .users
                .get_mut(partner)
                .expect("partner ensured above");
            account.balance = round2(account.balance + amount);
            account.balance
        };

        (debited, credited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_users_start_with_default_balance() {
        let ledger = MemoryLedger::default();
        let user = ledger.ensure_user("amal").await;
        assert_eq!(user.balance, 500.0);

        // idempotent: a second ensure does not reset anything
        ledger.settle("amal", "blake", 40.0).await;
        let user = ledger.ensure_user("amal").await;
        assert_eq!(user.balance, 460.0);
    }

    #[tokio::test]
    async fn contract_ids_increment() {
        let ledger = MemoryLedger::default();
        let a = ledger.create_contract("amal", "blake", None, None).await;
        let b = ledger.create_contract("blake", "amal", None, None).await;
        assert_eq!(a.id, "contract-1");
        assert_eq!(b.id, "contract-2");
        assert_eq!(ledger.contract("contract-2").await.unwrap().username, "blake");
        assert!(ledger.contract("contract-99").await.is_none());
    }

    #[tokio::test]
    async fn contract_inputs_are_clamped() {
        let ledger = MemoryLedger::default();
        let c = ledger
            .create_contract("amal", "blake", Some(0.0), Some(-50.0))
            .await;
        assert_eq!(c.daily_goal_count, 1.0);
        assert_eq!(c.stake_amount, 0.0);

        let c = ledger.create_contract("amal", "blake", None, None).await;
        assert_eq!(c.daily_goal_count, 1.0);
        assert_eq!(c.stake_amount, 100.0);

        let c = ledger
            .create_contract("amal", "blake", Some(f64::NAN), Some(f64::NAN))
            .await;
        assert_eq!(c.daily_goal_count, 1.0);
        assert_eq!(c.stake_amount, 100.0);

        // an explicit zero stake is a valid choice, not a missing value
        let c = ledger
            .create_contract("amal", "blake", Some(3.0), Some(0.0))
            .await;
        assert_eq!(c.stake_amount, 0.0);
    }

    #[tokio::test]
    async fn settle_moves_the_rounded_amount_both_ways() {
        let ledger = MemoryLedger::default();
        let (debited, credited) = ledger.settle("amal", "blake", 60.0).await;
        assert_eq!(debited, 440.0);
        assert_eq!(credited, 560.0);
    }

    #[tokio::test]
    async fn settle_with_zero_amount_is_a_read() {
        let ledger = MemoryLedger::default();
        let (a, b) = ledger.settle("amal", "blake", 0.0).await;
        assert_eq!((a, b), (500.0, 500.0));
    }

    #[tokio::test]
    async fn configured_default_stake_applies() {
        let ledger = MemoryLedger::new(500.0, 25.0);
        let c = ledger.create_contract("amal", "blake", None, None).await;
        assert_eq!(c.stake_amount, 25.0);
    }

    #[tokio::test]
    async fn balances_never_go_negative() {
        let ledger = MemoryLedger::new(50.0, DEFAULT_STAKE);
        let (debited, credited) = ledger.settle("amal", "blake", 80.0).await;
        assert_eq!(debited, 0.0);
        assert_eq!(credited, 130.0);
    }

    #[tokio::test]
    async fn self_pact_is_a_wash() {
        let ledger = MemoryLedger::default();
        let (a, b) = ledger.settle("amal", "amal", 75.0).await;
        assert_eq!((a, b), (500.0, 500.0));
    }

    #[tokio::test]
    async fn concurrent_settles_lose_no_updates() {
        use std::sync::Arc;

        let ledger = Arc::new(MemoryLedger::default());
        let mut handles = Vec::new();
        for _ in 0..20 {
            let ledger = Arc::clone(&ledger);
            handles.push(tokio::spawn(async move {
                ledger.settle("amal", "blake", 10.0).await;
            }));
        }
        for h in handles {
            h.await.expect("settle task");
        }

        let (a, b) = ledger.settle("amal", "blake", 0.0).await;
        assert_eq!(a, 300.0);
        assert_eq!(b, 700.0);
    }
}
