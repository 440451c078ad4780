// Demo run: insert, list, lookup, transfer, then a transfer that must roll back.
// Each step logs its own failure and the run carries on.

use tracing::error;

use crate::entities::{AccountId, NewAccount};
use crate::store::AccountStore;

pub const SENDER: AccountId = 1;
pub const RECEIVER: AccountId = 2;
pub const TRANSFER_AMOUNT: f64 = 100.0;
pub const OVERDRAW_AMOUNT: f64 = 2000.0;

/// What happened during a demo run
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DemoReport {
    /// Steps that failed and were skipped over
    pub failed_steps: Vec<&'static str>,

    /// Whether the oversized transfer was rejected
    pub overdraw_rejected: bool,

    /// Sender balance before and after the oversized transfer
    pub sender_before_overdraw: Option<f64>,
    pub sender_after_overdraw: Option<f64>,
}

impl DemoReport {
    fn failed(&mut self, step: &'static str, err: &dyn std::fmt::Display) {
        error!(step, error = %err, "Demo step failed");
        self.failed_steps.push(step);
    }
}

pub fn run_demo(store: &AccountStore) -> DemoReport {
    let mut report = DemoReport::default();

    // 1. Insert
    let new_account = NewAccount::new("Alikhan New", "alikhan.new@example.com", 200.00);
    match store.insert_account(&new_account) {
        Ok(account) => println!("✓ Inserted account '{}' (ID {})", account.name, account.id),
        Err(e) => report.failed("insert_account", &e),
    }

    // 2. List
    match store.list_accounts() {
        Ok(accounts) => {
            println!("\n📊 All accounts:");
            for a in accounts {
                println!("ID: {}, Name: {}, Balance: {:.2}", a.id, a.name, a.balance);
            }
        }
        Err(e) => report.failed("list_accounts", &e),
    }

    // 3. Lookup
    match store.get_account(SENDER) {
        Ok(account) => println!(
            "\nAccount ID {}: Name: {}, Balance: {:.2}",
            SENDER, account.name, account.balance
        ),
        Err(e) => report.failed("get_account", &e),
    }

    // 4. Transfer
    println!(
        "\n💸 Transferring {:.2} from ID {} to ID {}",
        TRANSFER_AMOUNT, SENDER, RECEIVER
    );
    println!(
        "Starting balances: ID {} ({}), ID {} ({})",
        SENDER,
        display_balance(store, SENDER),
        RECEIVER,
        display_balance(store, RECEIVER)
    );

    match store.transfer_balance(SENDER, RECEIVER, TRANSFER_AMOUNT) {
        Ok(()) => println!("✓ Transfer complete"),
        Err(e) => report.failed("transfer_balance", &e),
    }

    println!(
        "Final balances: ID {} ({}), ID {} ({})",
        SENDER,
        display_balance(store, SENDER),
        RECEIVER,
        display_balance(store, RECEIVER)
    );

    // 5. Rollback on insufficient funds
    println!(
        "\n🔁 Rollback check: transferring {:.2} from ID {}",
        OVERDRAW_AMOUNT, SENDER
    );
    report.sender_before_overdraw = balance_of(store, SENDER);

    if let Err(e) = store.transfer_balance(SENDER, RECEIVER, OVERDRAW_AMOUNT) {
        println!("Rejected as expected: {}", e);
        report.overdraw_rejected = true;
    }

    report.sender_after_overdraw = balance_of(store, SENDER);
    println!(
        "Sender ID {} balance: before {}, after {}",
        SENDER,
        fmt_balance(report.sender_before_overdraw),
        fmt_balance(report.sender_after_overdraw)
    );

    report
}

/// Point-in-time balance, `None` when the lookup fails
fn balance_of(store: &AccountStore, id: AccountId) -> Option<f64> {
    store.get_account(id).ok().map(|a| a.balance)
}

fn display_balance(store: &AccountStore, id: AccountId) -> String {
    fmt_balance(balance_of(store, id))
}

fn fmt_balance(balance: Option<f64>) -> String {
    balance
        .map(|b| format!("{:.2}", b))
        .unwrap_or_else(|| "n/a".to_string())
}
