//! Monthly budget and spending report for a
//! [Firefly III](https://www.firefly-iii.org/) server.
//!
//! The crate reads categories, budgets and summaries for the previous
//! calendar month through [`client::FinanceApi`], reconciles budgets with
//! what was actually spent, renders the result as HTML and plain text,
//! and sends it by email.

pub mod client;
pub mod config;
pub mod delivery;
pub mod error;
pub mod models;
pub mod period;
pub mod render;
pub mod report;
