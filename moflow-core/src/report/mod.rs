//! Paginated PDF report of a transaction list.
//!
//! Layout is fixed: A4 portrait, a header on the first page, column headings
//! on every page, 25 rows per page and income/expense/balance totals after the
//! last row. Totals that would cross the bottom margin go on a continuation page.

pub mod pdf;

use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use moflow_types::{Transaction, TransactionType};

use self::pdf::{Font, PdfDocument};

pub const PAGE_WIDTH: f32 = 595.0;
pub const PAGE_HEIGHT: f32 = 842.0;
pub const ROWS_PER_PAGE: usize = 25;
pub const NOTES_MAX_CHARS: usize = 15;
pub const DEFAULT_CURRENCY_PREFIX: &str = "Rp";

const TITLE: &str = "MoFlow - Transaction Report";
const MARGIN_LEFT: f32 = 50.0;
const MARGIN_RIGHT: f32 = 545.0;
const ROW_STEP: f32 = 25.0;
const MARGIN_BOTTOM: f32 = 50.0;
const COLUMNS: [(&str, f32); 5] = [
    ("Date", 50.0),
    ("Category", 150.0),
    ("Type", 280.0),
    ("Amount", 350.0),
    ("Notes", 450.0),
];

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

/// Knobs for rendering; the defaults match the app's own export.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub currency_prefix: String,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            currency_prefix: DEFAULT_CURRENCY_PREFIX.to_string(),
        }
    }
}

/// Formats an amount as `<prefix><grouped integer>`, e.g. `Rp1,234,568`.
///
/// Rounds half away from zero. A negative amount keeps its sign after the prefix.
pub fn format_amount(amount: f64, prefix: &str) -> String {
    let rounded = amount.round();
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if rounded < 0.0 {
        format!("{}-{}", prefix, grouped)
    } else {
        format!("{}{}", prefix, grouped)
    }
}

/// Cuts notes longer than [`NOTES_MAX_CHARS`] and appends an ellipsis.
pub fn truncate_notes(notes: &str) -> String {
    if notes.chars().count() > NOTES_MAX_CHARS {
        let head: String = notes.chars().take(NOTES_MAX_CHARS).collect();
        format!("{}...", head)
    } else {
        notes.to_string()
    }
}

/// `MoFlow_Transactions_<yyyyMMdd_HHmmss>.pdf`
pub fn file_name(now: &DateTime<FixedOffset>) -> String {
    format!("MoFlow_Transactions_{}.pdf", now.format("%Y%m%d_%H%M%S"))
}

fn column_headings(doc: &mut PdfDocument, y: &mut f32) {
    for (label, x) in COLUMNS {
        doc.text(x, *y, 16.0, Font::Bold, label);
    }
    *y += 20.0;
    doc.line(MARGIN_LEFT, *y, MARGIN_RIGHT, *y);
    *y += 20.0;
}

/// Opens a new page titled as a continuation and returns the next free y.
fn continuation_page(doc: &mut PdfDocument) -> f32 {
    doc.start_page();
    doc.text(
        MARGIN_LEFT,
        50.0,
        16.0,
        Font::Bold,
        &format!("{} (continued)", TITLE),
    );
    80.0
}

/// Lays the report out page by page.
///
/// Row dates are shown in the offset of `generated_at`.
pub fn render(
    transactions: &[Transaction],
    generated_at: &DateTime<FixedOffset>,
    options: &ReportOptions,
) -> PdfDocument {
    let offset = generated_at.offset();
    let prefix = options.currency_prefix.as_str();
    let mut doc = PdfDocument::new(PAGE_WIDTH, PAGE_HEIGHT);

    doc.start_page();
    doc.text(MARGIN_LEFT, 50.0, 20.0, Font::Bold, TITLE);
    doc.text(
        MARGIN_LEFT,
        80.0,
        14.0,
        Font::Regular,
        &format!("Generated on: {}", generated_at.format("%d %b %Y")),
    );
    doc.line(MARGIN_LEFT, 90.0, MARGIN_RIGHT, 90.0);

    let mut y = 120.0;
    column_headings(&mut doc, &mut y);

    for (i, tx) in transactions.iter().enumerate() {
        if i > 0 && i % ROWS_PER_PAGE == 0 {
            y = continuation_page(&mut doc);
            column_headings(&mut doc, &mut y);
        }

        let date = tx.date.with_timezone(offset).format("%d %b %Y").to_string();
        doc.text(COLUMNS[0].1, y, 14.0, Font::Regular, &date);
        doc.text(COLUMNS[1].1, y, 14.0, Font::Regular, tx.category.as_str());
        doc.text(COLUMNS[2].1, y, 14.0, Font::Regular, tx.transaction_type.as_str());
        doc.text(
            COLUMNS[3].1,
            y,
            14.0,
            Font::Regular,
            &format_amount(tx.amount, prefix),
        );
        doc.text(COLUMNS[4].1, y, 14.0, Font::Regular, &truncate_notes(&tx.notes));
        y += ROW_STEP;
    }

    let total = |kind: TransactionType| -> f64 {
        transactions
            .iter()
            .filter(|tx| tx.transaction_type == kind)
            .map(|tx| tx.amount)
            .sum()
    };
    let income = total(TransactionType::Income);
    let expense = total(TransactionType::Expense);

    // Rule plus three total lines must fit above the bottom margin.
    if y + 3.0 * ROW_STEP > PAGE_HEIGHT - MARGIN_BOTTOM {
        y = continuation_page(&mut doc);
    }
    doc.line(MARGIN_LEFT, y, MARGIN_RIGHT, y);
    y += ROW_STEP;
    doc.text(
        MARGIN_LEFT,
        y,
        16.0,
        Font::Bold,
        &format!("Total Income: {}", format_amount(income, prefix)),
    );
    y += ROW_STEP;
    doc.text(
        MARGIN_LEFT,
        y,
        16.0,
        Font::Bold,
        &format!("Total Expense: {}", format_amount(expense, prefix)),
    );
    y += ROW_STEP;
    doc.text(
        MARGIN_LEFT,
        y,
        16.0,
        Font::Bold,
        &format!("Balance: {}", format_amount(income - expense, prefix)),
    );

    doc
}

/// Renders `transactions` and writes the file into `dir`, creating it if needed.
///
/// Returns the path of the written file. A failed write may leave a partial file.
pub async fn export_report(
    transactions: &[Transaction],
    dir: &Path,
    now: &DateTime<FixedOffset>,
    options: &ReportOptions,
) -> Result<PathBuf, ReportError> {
    let bytes = render(transactions, now, options).to_bytes();

    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(file_name(now));
    tokio::fs::write(&path, &bytes).await?;

    tracing::info!(path = %path.display(), rows = transactions.len(), "report written");
    Ok(path)
}
