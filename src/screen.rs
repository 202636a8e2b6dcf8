use crate::confirm::{ActionOutcome, ConfirmationWorkflow};
use crate::errors::{AppError, AppResult};
use crate::expansion::ExpansionState;
use crate::loader::{ListLoader, LoadOutcome, RequestToken};
use crate::models::{ApiEnvelope, ConsoleSettings, DerivedPage, FilterSet};
use crate::notify::Notifier;
use crate::pagination::{ListQuery, Navigation};
use crate::resources::ListRow;
use std::future::Future;
use std::sync::Arc;
use tokio::time::Duration;

/// State owned by one tabular resource browser.
#[derive(Debug)]
pub struct ListScreen<T> {
    records: Vec<T>,
    query: ListQuery,
    expansion: ExpansionState,
    loading: bool,
    loader: ListLoader,
    confirmations: ConfirmationWorkflow,
}

impl<T: ListRow> ListScreen<T> {
    pub fn new(settings: &ConsoleSettings, notifier: Arc<dyn Notifier>) -> AppResult<Self> {
        Ok(Self {
            records: Vec::new(),
            query: ListQuery::new(settings.items_per_page)?,
            expansion: ExpansionState::new(),
            loading: false,
            loader: ListLoader::new(
                Duration::from_millis(settings.loading_floor_ms),
                notifier.clone(),
            ),
            confirmations: ConfirmationWorkflow::new(settings.confirmation_policy, notifier),
        })
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    pub fn expansion(&self) -> &ExpansionState {
        &self.expansion
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn loader(&self) -> ListLoader {
        self.loader.clone()
    }

    pub fn confirmations(&self) -> ConfirmationWorkflow {
        self.confirmations.clone()
    }

    pub fn view(&self) -> DerivedPage<'_, T> {
        self.query.derive(&self.records, T::search_fields)
    }

    pub fn set_search(&mut self, search: &str) {
        self.query.set_search(search);
    }

    /// Filters are applied server-side, so the caller refetches afterwards.
    pub fn set_filters(&mut self, filters: FilterSet) {
        self.query.set_filters(filters);
    }

    pub fn navigate(&mut self, navigation: Navigation) -> bool {
        let total_pages = self.view().total_pages;
        self.query.navigate(navigation, total_pages)
    }

    pub fn toggle_expansion(&mut self, row_id: &str) {
        self.expansion.toggle(row_id);
    }

    pub fn apply(&mut self, outcome: LoadOutcome<T>) {
        match outcome {
            LoadOutcome::Loaded(records) => {
                self.records = records;
                self.loading = false;
            }
            LoadOutcome::Failed(_) => {
                self.records.clear();
                self.loading = false;
            }
            LoadOutcome::Stale => {
                self.loading = false;
                return;
            }
        }
        let ids = self.records.iter().map(T::row_id).collect::<Vec<_>>();
        self.expansion.retain_visible(ids.iter().map(String::as_str));
    }

    /// Fetches with the current filter set and applies the result.
    pub async fn refresh<F, Fut>(&mut self, fetch: F)
    where
        F: FnOnce(FilterSet, RequestToken) -> Fut,
        Fut: Future<Output = AppResult<ApiEnvelope<Vec<T>>>>,
    {
        self.loading = true;
        let filters = self.query.filters().clone();
        let outcome = self
            .loader
            .load(T::KIND, move |token| fetch(filters, token))
            .await;
        self.apply(outcome);
    }

    /// Asks for confirmation, then runs `delete` for the row.
    pub async fn delete<R, F, Fut>(&self, row_id: &str, delete: F) -> AppResult<ActionOutcome>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = AppResult<ApiEnvelope<R>>>,
    {
        let row = self
            .records
            .iter()
            .find(|row| row.row_id() == row_id)
            .ok_or_else(|| AppError::NotFound(format!("{} {} not loaded", T::KIND.as_str(), row_id)))?;
        let message = T::KIND.delete_confirmation_message(&row.display_name());
        let row_id = row_id.to_string();
        Ok(self
            .confirmations
            .run(T::KIND, &message, move || delete(row_id))
            .await)
    }

    /// Deletes the row and, once the delete response has arrived, refetches.
    pub async fn delete_and_refresh<R, D, DFut, F, FFut>(
        &mut self,
        row_id: &str,
        delete: D,
        fetch: F,
    ) -> AppResult<ActionOutcome>
    where
        D: FnOnce(String) -> DFut,
        DFut: Future<Output = AppResult<ApiEnvelope<R>>>,
        F: FnOnce(FilterSet, RequestToken) -> FFut,
        FFut: Future<Output = AppResult<ApiEnvelope<Vec<T>>>>,
    {
        let outcome = self.delete(row_id, delete).await?;
        if outcome.should_refresh() {
            self.refresh(fetch).await;
        }
        Ok(outcome)
    }
}
