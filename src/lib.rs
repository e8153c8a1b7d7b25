//! Splits shared expenses within a group and works out who pays whom.

pub mod balance;
pub mod config;
pub mod error;
pub mod routes;
pub mod schemas;
pub mod session;
pub mod settlement;

pub use balance::{compute_balances, Balances, PersonalBalance, TOLERANCE};
pub use error::{Result, SplitError};
pub use schemas::{Expense, ExpenseId, NewExpense, Person, PersonId, Settlement};
pub use session::{parse_amount, RemovedPerson, Session};
pub use settlement::compute_settlements;
