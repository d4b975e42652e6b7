//! View-state for the home screen: the most recent transactions.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinSet;

use moflow_types::{Transaction, TransactionRepository};

use crate::service::FinanceService;

pub const RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeState {
    pub recent: Vec<Transaction>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl Default for HomeState {
    fn default() -> Self {
        Self {
            recent: Vec::new(),
            is_loading: true,
            error: None,
        }
    }
}

/// Follows the store and keeps the newest [`RECENT_LIMIT`] records.
pub struct HomeViewModel {
    state: Arc<watch::Sender<HomeState>>,
    _scope: JoinSet<()>,
}

impl HomeViewModel {
    /// Must be called inside a tokio runtime.
    pub fn new<R: TransactionRepository>(service: &FinanceService<R>) -> Self {
        let (state, _) = watch::channel(HomeState::default());
        let state = Arc::new(state);

        let mut scope = JoinSet::new();
        let mut live = service.observe_transactions();
        let observer = Arc::clone(&state);
        scope.spawn(async move {
            while let Some(result) = live.next().await {
                observer.send_modify(|s| {
                    s.is_loading = false;
                    match result {
                        Ok(mut transactions) => {
                            transactions.truncate(RECENT_LIMIT);
                            s.recent = transactions;
                            s.error = None;
                        }
                        Err(e) => s.error = Some(e.to_string()),
                    }
                });
            }
        });

        Self {
            state,
            _scope: scope,
        }
    }

    pub fn state(&self) -> watch::Receiver<HomeState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> HomeState {
        self.state.borrow().clone()
    }

    /// Waits until the first store snapshot has been folded in.
    pub async fn loaded(&self) -> HomeState {
        let mut rx = self.state.subscribe();
        match rx.wait_for(|s| !s.is_loading).await {
            Ok(state) => state.clone(),
            Err(_) => self.snapshot(),
        }
    }
}
