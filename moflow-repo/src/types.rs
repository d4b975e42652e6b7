//! Database row types for the SQLite adapter.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use moflow_types::{
    RepoError, Transaction, TransactionCategory, TransactionId, TransactionType,
};

/// Transaction row from database.
///
/// `type` and `category` hold enum names, `date` holds epoch milliseconds.
#[derive(Debug, FromRow)]
pub struct DbTransaction {
    pub id: String,
    pub amount: f64,
    #[sqlx(rename = "type")]
    pub kind: String,
    pub category: String,
    pub date: i64,
    pub notes: String,
}

impl DbTransaction {
    pub fn from_domain(tx: &Transaction) -> Self {
        Self {
            id: tx.id.to_string(),
            amount: tx.amount,
            kind: tx.transaction_type.as_str().to_string(),
            category: tx.category.as_str().to_string(),
            date: tx.date.timestamp_millis(),
            notes: tx.notes.clone(),
        }
    }

    pub fn into_domain(self) -> Result<Transaction, RepoError> {
        let id: TransactionId = self
            .id
            .parse()
            .map_err(|e: uuid::Error| RepoError::Database(e.to_string()))?;
        let transaction_type: TransactionType = self.kind.parse()?;
        let category: TransactionCategory = self.category.parse()?;
        let date = DateTime::<Utc>::from_timestamp_millis(self.date).ok_or_else(|| {
            RepoError::Database(format!("Date out of range: {}", self.date))
        })?;

        Ok(Transaction::from_parts(
            id,
            self.amount,
            transaction_type,
            category,
            date,
            self.notes,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_row_round_trip_keeps_millis() {
        let date = Utc.timestamp_millis_opt(1_710_000_123_456).unwrap();
        let tx = Transaction::new(
            12.75,
            TransactionType::Expense,
            TransactionCategory::Transport,
            date,
            "bus",
        )
        .unwrap();

        let row = DbTransaction::from_domain(&tx);
        assert_eq!(row.kind, "EXPENSE");
        assert_eq!(row.category, "TRANSPORT");
        assert_eq!(row.date, 1_710_000_123_456);

        assert_eq!(row.into_domain().unwrap(), tx);
    }

    #[test]
    fn test_unknown_enum_name_is_rejected() {
        let row = DbTransaction {
            id: TransactionId::new().to_string(),
            amount: 1.0,
            kind: "REFUND".into(),
            category: "FOOD".into(),
            date: 0,
            notes: String::new(),
        };
        assert!(matches!(row.into_domain(), Err(RepoError::Domain(_))));
    }
}
