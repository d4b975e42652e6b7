//! SQLite repository integration tests.

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use moflow_types::{
        Transaction, TransactionCategory, TransactionId, TransactionRepository, TransactionType,
    };

    use crate::SqliteRepo;

    async fn setup_repo() -> SqliteRepo {
        SqliteRepo::new("sqlite::memory:").await.unwrap()
    }

    fn sample(
        amount: f64,
        transaction_type: TransactionType,
        category: TransactionCategory,
        day: u32,
    ) -> Transaction {
        let date = Utc.with_ymd_and_hms(2024, 4, day, 10, 30, 0).unwrap();
        Transaction::new(amount, transaction_type, category, date, "note").unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let repo = setup_repo().await;
        let tx = sample(
            120.5,
            TransactionType::Income,
            TransactionCategory::Salary,
            1,
        );

        repo.insert_transaction(&tx).await.unwrap();

        let fetched = repo.get_transaction(tx.id).await.unwrap().unwrap();
        assert_eq!(fetched, tx);
    }

    #[tokio::test]
    async fn test_get_not_found() {
        let repo = setup_repo().await;

        let result = repo.get_transaction(TransactionId::new()).await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_insert_same_id_replaces() {
        let repo = setup_repo().await;
        let tx = sample(10.0, TransactionType::Expense, TransactionCategory::Food, 2);
        repo.insert_transaction(&tx).await.unwrap();

        let mut changed = tx.clone();
        changed.amount = 99.0;
        repo.insert_transaction(&changed).await.unwrap();

        let all = repo.list_transactions().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].amount, 99.0);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let repo = setup_repo().await;
        let first = sample(1.0, TransactionType::Expense, TransactionCategory::Food, 1);
        let last = sample(2.0, TransactionType::Expense, TransactionCategory::Food, 28);
        let middle = sample(3.0, TransactionType::Income, TransactionCategory::Gift, 15);

        for tx in [&first, &last, &middle] {
            repo.insert_transaction(tx).await.unwrap();
        }

        let ids: Vec<_> = repo
            .list_transactions()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![last.id, middle.id, first.id]);
    }

    #[tokio::test]
    async fn test_same_date_ties_match_memory_order() {
        let repo = setup_repo().await;
        let memory = crate::MemoryRepo::new();
        for _ in 0..6 {
            let tx = sample(1.0, TransactionType::Expense, TransactionCategory::Food, 9);
            repo.insert_transaction(&tx).await.unwrap();
            memory.insert_transaction(&tx).await.unwrap();
        }

        let ids = |list: Vec<Transaction>| list.into_iter().map(|t| t.id).collect::<Vec<_>>();
        let from_sqlite = ids(repo.list_transactions().await.unwrap());
        let from_memory = ids(memory.list_transactions().await.unwrap());

        assert_eq!(from_sqlite, from_memory);
        let mut sorted = from_sqlite.clone();
        sorted.sort();
        assert_eq!(from_sqlite, sorted);
    }

    #[tokio::test]
    async fn test_update_replaces_all_fields() {
        let repo = setup_repo().await;
        let tx = sample(10.0, TransactionType::Expense, TransactionCategory::Food, 5);
        repo.insert_transaction(&tx).await.unwrap();

        let updated = Transaction::with_id(
            tx.id,
            45.0,
            TransactionType::Income,
            TransactionCategory::Gift,
            tx.date + Duration::days(1),
            "changed",
        )
        .unwrap();
        repo.update_transaction(&updated).await.unwrap();

        let fetched = repo.get_transaction(tx.id).await.unwrap().unwrap();
        assert_eq!(fetched, updated);
    }

    #[tokio::test]
    async fn test_update_missing_is_noop() {
        let repo = setup_repo().await;
        let tx = sample(10.0, TransactionType::Expense, TransactionCategory::Food, 5);

        repo.update_transaction(&tx).await.unwrap();

        assert!(repo.list_transactions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_by_record_and_by_id() {
        let repo = setup_repo().await;
        let a = sample(1.0, TransactionType::Expense, TransactionCategory::Food, 3);
        let b = sample(2.0, TransactionType::Expense, TransactionCategory::Other, 4);
        repo.insert_transaction(&a).await.unwrap();
        repo.insert_transaction(&b).await.unwrap();

        repo.delete_transaction(&a).await.unwrap();
        repo.delete_transaction_by_id(b.id).await.unwrap();

        assert!(repo.get_transaction(a.id).await.unwrap().is_none());
        assert!(repo.get_transaction(b.id).await.unwrap().is_none());
        assert!(repo.list_transactions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_filter_by_type_and_category() {
        let repo = setup_repo().await;
        repo.insert_transaction(&sample(
            5.0,
            TransactionType::Expense,
            TransactionCategory::Food,
            1,
        ))
        .await
        .unwrap();
        repo.insert_transaction(&sample(
            7.0,
            TransactionType::Expense,
            TransactionCategory::Transport,
            2,
        ))
        .await
        .unwrap();
        repo.insert_transaction(&sample(
            900.0,
            TransactionType::Income,
            TransactionCategory::Salary,
            3,
        ))
        .await
        .unwrap();

        let expenses = repo
            .list_transactions_by_type(TransactionType::Expense)
            .await
            .unwrap();
        assert_eq!(expenses.len(), 2);
        assert!(
            expenses
                .iter()
                .all(|t| t.transaction_type == TransactionType::Expense)
        );

        let transport = repo
            .list_transactions_by_category(TransactionCategory::Transport)
            .await
            .unwrap();
        assert_eq!(transport.len(), 1);
        assert_eq!(transport[0].amount, 7.0);
    }

    #[tokio::test]
    async fn test_filter_by_date_range_is_inclusive() {
        let repo = setup_repo().await;
        let early = sample(1.0, TransactionType::Expense, TransactionCategory::Food, 1);
        let mid = sample(2.0, TransactionType::Expense, TransactionCategory::Food, 10);
        let late = sample(3.0, TransactionType::Expense, TransactionCategory::Food, 20);
        for tx in [&early, &mid, &late] {
            repo.insert_transaction(tx).await.unwrap();
        }

        let range = repo
            .list_transactions_by_date_range(mid.date, late.date)
            .await
            .unwrap();

        let ids: Vec<_> = range.into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![late.id, mid.id]);
    }

    #[tokio::test]
    async fn test_writes_notify_subscribers() {
        let repo = setup_repo().await;
        let mut rx = repo.subscribe();
        let tx = sample(3.0, TransactionType::Income, TransactionCategory::Gift, 9);

        repo.insert_transaction(&tx).await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), 1);

        // A delete that touches nothing stays silent.
        repo.delete_transaction_by_id(TransactionId::new())
            .await
            .unwrap();
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_file_backed_database_persists() {
        let tmp = tempfile::tempdir().unwrap();
        let url = format!(
            "sqlite://{}/data/moflow.db?mode=rwc",
            tmp.path().display()
        );
        let tx = sample(42.0, TransactionType::Income, TransactionCategory::Gift, 12);

        {
            let repo = SqliteRepo::new(&url).await.unwrap();
            repo.insert_transaction(&tx).await.unwrap();
            repo.pool().close().await;
        }

        let reopened = SqliteRepo::new(&url).await.unwrap();
        let fetched = reopened.get_transaction(tx.id).await.unwrap().unwrap();
        assert_eq!(fetched.amount, 42.0);

        reopened.pool().close().await;
    }
}
