//! Types that represent the core data model, such as `Client`, `LedgerEntry` and `Totals`.
mod amount;
mod attachment;
mod calc;
mod client;
mod currency;
mod folio;
mod ledger;
mod rates;
mod totals;

pub use amount::{Amount, AmountError};
pub use attachment::Attachment;
pub use calc::{convert, AdjustmentRow, CalculationRow, Conversion};
pub use client::{Client, Clients, RosterColumns, ALIAS_HEADER, MXN_HEADER, USDT_HEADER};
pub use currency::Currency;
pub use folio::{batch_folios, next_folio_number, Folio};
pub use ledger::{ledger_number, LedgerEntry, OpType, LEDGER_HEADERS, NO_RATE};
pub use rates::{Direction, RateConfig, DEFAULT_BUY_RATE, DEFAULT_SELL_RATE};
pub use totals::{BalanceStatus, OpeningBalance, Totals};
