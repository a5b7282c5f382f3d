/// Budget lifecycle: setup, lookup and account data removal
pub mod budget;
/// Pure balance arithmetic
pub mod calculator;
/// Category running totals and category management
pub mod category;
/// Expense records and their ledger effect
pub mod expense;
/// Ledger transaction coordinator
pub mod ledger;
/// Read-only consistency report over stored aggregates
pub mod reconcile;
/// Storage port with compare-and-swap writes
pub mod store;
/// Ledger value types
pub mod types;
/// Funds and amount validation
pub mod validator;
