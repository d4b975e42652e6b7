//! # MoFlow Core
//!
//! Application layer for the MoFlow finance app.
//!
//! ## Architecture
//!
//! - `service` - Use cases over the repository ports
//! - `live` - Queries that re-run after every committed write
//! - `state` - View-state holders (finance, currency, home)
//! - `report` - Paginated PDF export
//!
//! Services are generic over the port traits, allowing different
//! repository implementations to be injected.

pub mod live;
pub mod report;
pub mod service;
pub mod state;


pub use live::Live;
pub use report::{ReportError, ReportOptions, export_report};
pub use service::{CurrencyService, FinanceService};
pub use state::{
    CurrencyState, CurrencyViewModel, EditorMode, FinanceState, FinanceViewModel, HomeState,
    HomeViewModel, TransactionForm,
};
