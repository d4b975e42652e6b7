//! View-state for the transaction list: filters, monthly totals and the
//! add/edit form.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Local, Offset, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinSet;

use moflow_types::{
    MonthFilter, Transaction, TransactionCategory, TransactionFilter, TransactionId,
    TransactionRepository, TransactionType, monthly_total,
};

use crate::report::{self, ReportOptions};
use crate::service::FinanceService;

/// Which editor, if any, is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorMode {
    #[default]
    Closed,
    Adding,
    Editing,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinanceState {
    pub is_loading: bool,
    pub transactions: Vec<Transaction>,
    /// `transactions` narrowed by `filter`
    pub filtered: Vec<Transaction>,
    pub filter: TransactionFilter,
    pub monthly_income: f64,
    pub monthly_expense: f64,
    pub editor: EditorMode,
    pub error: Option<String>,
    /// One-off message, e.g. where a report was written
    pub notice: Option<String>,
}

impl FinanceState {
    fn initial(filter: TransactionFilter) -> Self {
        Self {
            is_loading: true,
            transactions: Vec::new(),
            filtered: Vec::new(),
            filter,
            monthly_income: 0.0,
            monthly_expense: 0.0,
            editor: EditorMode::Closed,
            error: None,
            notice: None,
        }
    }

    fn recompute(&mut self, offset: &FixedOffset) {
        self.filtered = self.filter.apply(&self.transactions, offset);
        self.monthly_income = monthly_total(
            &self.transactions,
            TransactionType::Income,
            self.filter.month,
            offset,
        );
        self.monthly_expense = monthly_total(
            &self.transactions,
            TransactionType::Expense,
            self.filter.month,
            offset,
        );
    }
}

/// Editable fields of the add/edit form. The amount stays text until submit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionForm {
    pub id: Option<TransactionId>,
    pub amount: String,
    pub transaction_type: TransactionType,
    pub category: TransactionCategory,
    pub date: DateTime<Utc>,
    pub notes: String,
}

impl TransactionForm {
    fn blank(now: DateTime<Utc>) -> Self {
        Self {
            id: None,
            amount: String::new(),
            transaction_type: TransactionType::Expense,
            category: TransactionCategory::Other,
            date: now,
            notes: String::new(),
        }
    }

    fn from_transaction(tx: &Transaction) -> Self {
        Self {
            id: Some(tx.id),
            amount: tx.amount.to_string(),
            transaction_type: tx.transaction_type,
            category: tx.category,
            date: tx.date,
            notes: tx.notes.clone(),
        }
    }

    /// Parses the amount text; `None` for blank, unparsable, negative or
    /// non-finite input.
    fn parsed_amount(&self) -> Option<f64> {
        self.amount
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|amount| amount.is_finite() && *amount >= 0.0)
    }
}

/// View-state holder for the finance screen.
///
/// Owns a task that follows the store and folds every snapshot into
/// [`FinanceState`]. Dropping the holder aborts that task.
pub struct FinanceViewModel<R: TransactionRepository> {
    service: FinanceService<R>,
    offset: FixedOffset,
    state: Arc<watch::Sender<FinanceState>>,
    form: watch::Sender<TransactionForm>,
    report_options: ReportOptions,
    _scope: JoinSet<()>,
}

impl<R: TransactionRepository> FinanceViewModel<R> {
    /// Builds the holder using the local UTC offset for month boundaries.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(service: FinanceService<R>) -> Self {
        Self::with_offset(service, Local::now().offset().fix())
    }

    pub fn with_offset(service: FinanceService<R>, offset: FixedOffset) -> Self {
        let now = Utc::now();
        let filter = TransactionFilter {
            month: MonthFilter::containing(&now.with_timezone(&offset)),
            ..TransactionFilter::default()
        };
        let (state, _) = watch::channel(FinanceState::initial(filter));
        let state = Arc::new(state);
        let (form, _) = watch::channel(TransactionForm::blank(now));

        let mut scope = JoinSet::new();
        let mut live = service.observe_transactions();
        let observer = Arc::clone(&state);
        scope.spawn(async move {
            while let Some(result) = live.next().await {
                match result {
                    Ok(transactions) => observer.send_modify(|s| {
                        s.transactions = transactions;
                        s.is_loading = false;
                        s.recompute(&offset);
                    }),
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to load transactions");
                        observer.send_modify(|s| {
                            s.is_loading = false;
                            s.error = Some(e.to_string());
                        });
                    }
                }
            }
        });

        Self {
            service,
            offset,
            state,
            form,
            report_options: ReportOptions::default(),
            _scope: scope,
        }
    }

    pub fn with_report_options(mut self, options: ReportOptions) -> Self {
        self.report_options = options;
        self
    }

    pub fn state(&self) -> watch::Receiver<FinanceState> {
        self.state.subscribe()
    }

    pub fn form(&self) -> watch::Receiver<TransactionForm> {
        self.form.subscribe()
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> FinanceState {
        self.state.borrow().clone()
    }

    /// Waits until the first store snapshot has been folded in.
    pub async fn loaded(&self) -> FinanceState {
        let mut rx = self.state.subscribe();
        match rx.wait_for(|s| !s.is_loading).await {
            Ok(state) => state.clone(),
            Err(_) => self.snapshot(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Filters
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn set_month_filter(&self, month: MonthFilter) {
        self.update_filter(|f| f.month = month);
    }

    pub fn set_category_filter(&self, category: Option<TransactionCategory>) {
        self.update_filter(|f| f.category = category);
    }

    pub fn set_type_filter(&self, transaction_type: Option<TransactionType>) {
        self.update_filter(|f| f.transaction_type = transaction_type);
    }

    fn update_filter(&self, change: impl FnOnce(&mut TransactionFilter)) {
        let offset = self.offset;
        self.state.send_modify(|s| {
            change(&mut s.filter);
            s.recompute(&offset);
        });
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Form
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn set_form_amount(&self, amount: impl Into<String>) {
        let amount = amount.into();
        self.form.send_modify(|f| f.amount = amount);
    }

    pub fn set_form_type(&self, transaction_type: TransactionType) {
        self.form.send_modify(|f| f.transaction_type = transaction_type);
    }

    pub fn set_form_category(&self, category: TransactionCategory) {
        self.form.send_modify(|f| f.category = category);
    }

    pub fn set_form_date(&self, date: DateTime<Utc>) {
        self.form.send_modify(|f| f.date = date);
    }

    pub fn set_form_notes(&self, notes: impl Into<String>) {
        let notes = notes.into();
        self.form.send_modify(|f| f.notes = notes);
    }

    /// Opens the add editor on a blank form dated now.
    pub fn open_add_form(&self) {
        self.reset_form();
        self.state.send_modify(|s| s.editor = EditorMode::Adding);
    }

    /// Opens the edit editor loaded with `tx`.
    pub fn open_edit_form(&self, tx: &Transaction) {
        self.form.send_replace(TransactionForm::from_transaction(tx));
        self.state.send_modify(|s| s.editor = EditorMode::Editing);
    }

    pub fn close_form(&self) {
        self.state.send_modify(|s| s.editor = EditorMode::Closed);
    }

    fn reset_form(&self) {
        self.form.send_replace(TransactionForm::blank(Utc::now()));
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────────────────────────

    /// Stores the form as a new transaction, then resets and closes the form.
    ///
    /// Returns the new id, or `None` when nothing was written.
    pub async fn add_transaction(&self) -> Option<TransactionId> {
        let form = self.form.borrow().clone();
        let amount = self.form_amount(&form)?;

        let tx = Transaction::from_parts(
            TransactionId::new(),
            amount,
            form.transaction_type,
            form.category,
            form.date,
            form.notes,
        );
        match self.service.add_transaction(&tx).await {
            Ok(()) => {
                self.reset_form();
                self.close_form();
                Some(tx.id)
            }
            Err(e) => {
                self.set_error(e.to_string());
                None
            }
        }
    }

    /// Replaces the record being edited with the form contents.
    ///
    /// Returns whether the record was replaced. A record deleted while the
    /// form was open sets an error and keeps the editor open.
    pub async fn update_transaction(&self) -> bool {
        let form = self.form.borrow().clone();
        let Some(id) = form.id else {
            self.set_error("No transaction selected for editing".to_string());
            return false;
        };
        let Some(amount) = self.form_amount(&form) else {
            return false;
        };

        let tx = Transaction::from_parts(
            id,
            amount,
            form.transaction_type,
            form.category,
            form.date,
            form.notes,
        );
        match self.service.update_transaction(&tx).await {
            Ok(()) => {
                self.reset_form();
                self.close_form();
                true
            }
            Err(e) => {
                self.set_error(e.to_string());
                false
            }
        }
    }

    pub async fn delete_transaction(&self, tx: &Transaction) {
        if let Err(e) = self.service.delete_transaction(tx).await {
            self.set_error(e.to_string());
        }
    }

    fn form_amount(&self, form: &TransactionForm) -> Option<f64> {
        let amount = form.parsed_amount();
        if amount.is_none() {
            tracing::debug!(input = %form.amount, "rejected form amount");
            self.set_error(format!("Invalid amount: {:?}", form.amount));
        }
        amount
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Messages
    // ─────────────────────────────────────────────────────────────────────────────

    fn set_error(&self, message: String) {
        self.state.send_modify(|s| s.error = Some(message));
    }

    pub fn clear_error(&self) {
        self.state.send_modify(|s| s.error = None);
    }

    pub fn clear_notice(&self) {
        self.state.send_modify(|s| s.notice = None);
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Export
    // ─────────────────────────────────────────────────────────────────────────────

    /// Writes the currently filtered list as a PDF into `dir`.
    ///
    /// On success the notice names the file; on failure the error holds the reason.
    pub async fn export_report(&self, dir: &Path) -> Option<PathBuf> {
        let rows = self.state.borrow().filtered.clone();
        let now = Utc::now().with_timezone(&self.offset);

        match report::export_report(&rows, dir, &now, &self.report_options).await {
            Ok(path) => {
                let message = format!("PDF saved: {}", path.display());
                self.state.send_modify(|s| s.notice = Some(message));
                Some(path)
            }
            Err(e) => {
                tracing::error!(error = %e, "report export failed");
                self.set_error(format!("Failed to create PDF: {}", e));
                None
            }
        }
    }
}
