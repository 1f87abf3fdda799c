//! Optimistic list mutations with rollback.
//!
//! The visible list changes as soon as the user acts. Each change is logged
//! as a pending action until the store confirms it (commit) or refuses it
//! (rollback). The authoritative list from the server is only adopted when
//! nothing is pending, so a refresh never undoes an action in flight.

use std::fmt::Debug;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{EditorError, SessionError, TransportError};

use super::backend::{MutationResponse, PostStore};
use super::record::PostStatus;
use super::state::DEFAULT_SAVE_TIMEOUT;

pub trait ListItem: Clone {
    type Id: Clone + PartialEq + Debug;

    fn id(&self) -> Self::Id;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListActionKind {
    Delete,
    Restore,
}

/// Identifies one pending action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListTicket(u64);

#[derive(Debug, Clone)]
struct PendingAction<T: ListItem> {
    ticket: ListTicket,
    kind: ListActionKind,
    id: T::Id,
}

/// A row of the full list. Pending deletes stay in place, hidden, until
/// they are committed or rolled back.
#[derive(Debug, Clone)]
struct Entry<T> {
    item: T,
    hidden: bool,
}

#[derive(Debug, Clone)]
pub struct OptimisticList<T: ListItem> {
    entries: Vec<Entry<T>>,
    /// Non-hidden entries, in order.
    visible: Vec<T>,
    pending: Vec<PendingAction<T>>,
    next_ticket: u64,
}

impl<T: ListItem> Default for OptimisticList<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T: ListItem> OptimisticList<T> {
    pub fn new(items: Vec<T>) -> Self {
        let mut list = Self {
            entries: Vec::new(),
            visible: Vec::new(),
            pending: Vec::new(),
            next_ticket: 0,
        };
        list.replace(items);
        list
    }

    pub fn items(&self) -> &[T] {
        &self.visible
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending(&self) -> impl Iterator<Item = (ListActionKind, T::Id)> + '_ {
        self.pending
            .iter()
            .map(|action| (action.kind, action.id.clone()))
    }

    pub fn is_pending(&self, id: &T::Id) -> bool {
        self.pending.iter().any(|action| action.id == *id)
    }

    /// Removes the item from the visible list. `None` if it is not visible
    /// or already has an action pending.
    pub fn begin_delete(&mut self, id: &T::Id) -> Option<ListTicket> {
        if self.is_pending(id) {
            return None;
        }
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| !entry.hidden && entry.item.id() == *id)?;
        entry.hidden = true;
        self.refresh_visible();
        Some(self.log(ListActionKind::Delete, id.clone()))
    }

    /// Inserts `item` at visible position `index` (clamped). `None` if an
    /// item with the same id is visible or already has an action pending.
    pub fn begin_restore(&mut self, item: T, index: usize) -> Option<ListTicket> {
        let id = item.id();
        if self.is_pending(&id) || self.visible.iter().any(|v| v.id() == id) {
            return None;
        }
        let position = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| !entry.hidden)
            .nth(index)
            .map_or(self.entries.len(), |(position, _)| position);
        self.entries.insert(
            position,
            Entry {
                item,
                hidden: false,
            },
        );
        self.refresh_visible();
        Some(self.log(ListActionKind::Restore, id))
    }

    /// Keeps the optimistic change as the new baseline.
    pub fn commit(&mut self, ticket: ListTicket) -> bool {
        let Some(action) = self.take(ticket) else {
            return false;
        };
        if action.kind == ListActionKind::Delete {
            self.entries
                .retain(|entry| !(entry.hidden && entry.item.id() == action.id));
        }
        true
    }

    /// Undoes the optimistic change. A deleted item reappears where it was,
    /// whatever else was deleted or restored around it meanwhile.
    pub fn rollback(&mut self, ticket: ListTicket) -> bool {
        let Some(action) = self.take(ticket) else {
            return false;
        };
        match action.kind {
            ListActionKind::Delete => {
                for entry in &mut self.entries {
                    if entry.hidden && entry.item.id() == action.id {
                        entry.hidden = false;
                    }
                }
            }
            ListActionKind::Restore => {
                self.entries
                    .retain(|entry| entry.hidden || entry.item.id() != action.id);
            }
        }
        self.refresh_visible();
        true
    }

    /// Adopts the authoritative list, unless an action is pending.
    pub fn reconcile(&mut self, authoritative: Vec<T>) -> bool {
        if self.has_pending() {
            log::debug!(
                "not reconciling list, {} actions pending",
                self.pending.len()
            );
            return false;
        }
        self.replace(authoritative);
        true
    }

    fn replace(&mut self, items: Vec<T>) {
        self.entries = items
            .into_iter()
            .map(|item| Entry {
                item,
                hidden: false,
            })
            .collect();
        self.refresh_visible();
    }

    fn refresh_visible(&mut self) {
        self.visible = self
            .entries
            .iter()
            .filter(|entry| !entry.hidden)
            .map(|entry| entry.item.clone())
            .collect();
    }

    fn log(&mut self, kind: ListActionKind, id: T::Id) -> ListTicket {
        let ticket = ListTicket(self.next_ticket);
        self.next_ticket += 1;
        self.pending.push(PendingAction { ticket, kind, id });
        ticket
    }

    fn take(&mut self, ticket: ListTicket) -> Option<PendingAction<T>> {
        let position = self.pending.iter().position(|a| a.ticket == ticket)?;
        Some(self.pending.remove(position))
    }
}

/// A row of the dashboard post list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub id: String,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub status: PostStatus,
    #[serde(default)]
    pub date: String,
}

impl ListItem for PostSummary {
    type Id = String;

    fn id(&self) -> String {
        self.id.clone()
    }
}

/// Dashboard post list whose delete and restore actions go through the
/// store optimistically.
pub struct PostListController {
    store: Arc<dyn PostStore>,
    timeout: Duration,
    list: Mutex<OptimisticList<PostSummary>>,
}

impl PostListController {
    pub fn new(store: Arc<dyn PostStore>, posts: Vec<PostSummary>) -> Self {
        Self {
            store,
            timeout: DEFAULT_SAVE_TIMEOUT,
            list: Mutex::new(OptimisticList::new(posts)),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn lock(&self) -> MutexGuard<'_, OptimisticList<PostSummary>> {
        self.list.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn posts(&self) -> Vec<PostSummary> {
        self.lock().items().to_vec()
    }

    pub fn has_pending(&self) -> bool {
        self.lock().has_pending()
    }

    pub fn refresh(&self, posts: Vec<PostSummary>) -> bool {
        self.lock().reconcile(posts)
    }

    /// Hides the post at once and deletes it in the store. On failure the
    /// post reappears where it was.
    pub async fn delete(&self, id: &str) -> Result<MutationResponse, EditorError> {
        let ticket = self
            .lock()
            .begin_delete(&id.to_string())
            .ok_or_else(|| EditorError::ConcurrencyConflict {
                message: format!("post {id} is not in the list"),
            })?;
        let result = self.settle(self.store.delete(id)).await;
        self.finish(ticket, "delete", id, result)
    }

    /// Shows a previously deleted post again at `index` and restores it in
    /// the store. On failure it is hidden again.
    pub async fn restore(
        &self,
        post: PostSummary,
        index: usize,
    ) -> Result<MutationResponse, EditorError> {
        let id = post.id.clone();
        let ticket = self.lock().begin_restore(post, index).ok_or_else(|| {
            EditorError::from(SessionError::Rejected(format!("post {id} is already listed")))
        })?;
        let result = self.settle(self.store.restore(&id)).await;
        self.finish(ticket, "restore", &id, result)
    }

    async fn settle(
        &self,
        call: impl Future<Output = Result<MutationResponse, TransportError>>,
    ) -> Result<MutationResponse, EditorError> {
        match tokio::time::timeout(self.timeout, call).await {
            Err(_) => Err(EditorError::Timeout {
                after: self.timeout,
            }),
            Ok(Err(TransportError(message))) => Err(EditorError::Network(message)),
            Ok(Ok(response)) => response.into_result(),
        }
    }

    fn finish(
        &self,
        ticket: ListTicket,
        action: &str,
        id: &str,
        result: Result<MutationResponse, EditorError>,
    ) -> Result<MutationResponse, EditorError> {
        let mut list = self.lock();
        match &result {
            Ok(_) => {
                log::info!("{action} of post {id} confirmed");
                list.commit(ticket);
            }
            Err(e) => {
                log::warn!("{action} of post {id} failed, rolling back: {e}");
                list.rollback(ticket);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::save::backend::SaveResponse;
    use crate::save::record::PostRecord;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, PartialEq)]
    struct Row(&'static str);

    impl ListItem for Row {
        type Id = &'static str;

        fn id(&self) -> &'static str {
            self.0
        }
    }

    fn ids(list: &OptimisticList<Row>) -> Vec<&'static str> {
        list.items().iter().map(|r| r.0).collect()
    }

    fn list() -> OptimisticList<Row> {
        OptimisticList::new(vec![Row("a"), Row("b"), Row("c"), Row("d")])
    }

    #[test]
    fn test_rollback_reinserts_at_original_index() {
        let mut list = list();
        let ticket = list.begin_delete(&"b").unwrap();
        assert_eq!(ids(&list), vec!["a", "c", "d"]);

        assert!(list.rollback(ticket));

        assert_eq!(ids(&list), vec!["a", "b", "c", "d"]);
        assert!(!list.has_pending());
    }

    #[test]
    fn test_commit_keeps_optimistic_state() {
        let mut list = list();
        let ticket = list.begin_delete(&"c").unwrap();
        assert!(list.commit(ticket));
        assert!(!list.rollback(ticket));
        assert_eq!(ids(&list), vec!["a", "b", "d"]);
    }

    #[test]
    fn test_interleaved_rollback() {
        // Given two deletes in flight
        let mut list = list();
        let first = list.begin_delete(&"a").unwrap();
        let second = list.begin_delete(&"c").unwrap();

        // When the second fails and the first succeeds
        list.rollback(second);
        list.commit(first);

        // Then c is back where it was relative to the remaining list
        assert_eq!(ids(&list), vec!["b", "c", "d"]);
    }

    #[test]
    fn test_failed_deletes_restore_order_in_any_sequence() {
        // Given two deletes in flight, b then a
        let mut list = list();
        let delete_b = list.begin_delete(&"b").unwrap();
        let delete_a = list.begin_delete(&"a").unwrap();
        assert_eq!(ids(&list), vec!["c", "d"]);

        // When both fail in the order they were issued
        list.rollback(delete_b);
        assert_eq!(ids(&list), vec!["b", "c", "d"]);
        list.rollback(delete_a);

        // Then the list is exactly what it was
        assert_eq!(ids(&list), vec!["a", "b", "c", "d"]);
        assert!(!list.has_pending());
    }

    #[test]
    fn test_rollback_around_committed_neighbours() {
        let mut list = list();
        let delete_b = list.begin_delete(&"b").unwrap();
        let delete_c = list.begin_delete(&"c").unwrap();
        let restore_z = list.begin_restore(Row("z"), 1).unwrap();
        assert_eq!(ids(&list), vec!["a", "z", "d"]);

        list.commit(delete_c);
        list.rollback(delete_b);
        list.commit(restore_z);

        assert_eq!(ids(&list), vec!["a", "b", "z", "d"]);
    }

    #[test]
    fn test_restore_and_rollback() {
        let mut list = list();
        let ticket = list.begin_restore(Row("z"), 1).unwrap();
        assert_eq!(ids(&list), vec!["a", "z", "b", "c", "d"]);
        assert!(list.begin_restore(Row("z"), 0).is_none());

        list.rollback(ticket);
        assert_eq!(ids(&list), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_reconcile_waits_for_pending_actions() {
        let mut list = list();
        let ticket = list.begin_delete(&"a").unwrap();
        assert!(!list.reconcile(vec![Row("a"), Row("b")]));
        assert_eq!(ids(&list), vec!["b", "c", "d"]);

        list.commit(ticket);
        assert!(list.reconcile(vec![Row("b")]));
        assert_eq!(ids(&list), vec!["b"]);
    }

    #[test]
    fn test_double_delete_is_refused() {
        let mut list = list();
        list.begin_delete(&"a").unwrap();
        assert_eq!(list.begin_delete(&"a"), None);
        assert_eq!(list.begin_delete(&"missing"), None);
    }

    struct Store {
        delete: Result<MutationResponse, TransportError>,
    }

    #[async_trait]
    impl PostStore for Store {
        async fn save(&self, _record: &PostRecord) -> Result<SaveResponse, TransportError> {
            Ok(SaveResponse::ok("saved"))
        }

        async fn delete(&self, _id: &str) -> Result<MutationResponse, TransportError> {
            tokio::time::sleep(Duration::from_secs(1)).await;
            self.delete.clone()
        }

        async fn restore(&self, _id: &str) -> Result<MutationResponse, TransportError> {
            Ok(MutationResponse::ok("restored"))
        }
    }

    fn post(id: &str) -> PostSummary {
        PostSummary {
            id: id.into(),
            title: id.to_uppercase(),
            slug: id.into(),
            status: PostStatus::Published,
            date: "2024-01-01".into(),
        }
    }

    fn controller(delete: Result<MutationResponse, TransportError>) -> PostListController {
        PostListController::new(
            Arc::new(Store { delete }),
            vec![post("one"), post("two"), post("three")],
        )
    }

    fn post_ids(controller: &PostListController) -> Vec<String> {
        controller.posts().into_iter().map(|p| p.id).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_delete_restores_position() {
        let controller = controller(Ok(MutationResponse::failed("Database unavailable")));

        let (result, during) = tokio::join!(controller.delete("two"), async {
            tokio::task::yield_now().await;
            post_ids(&controller)
        });

        assert_eq!(during, vec!["one", "three"]);
        assert_eq!(result, Err(EditorError::Network("Database unavailable".into())));
        assert_eq!(post_ids(&controller), vec!["one", "two", "three"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_delete_is_baseline() {
        let controller = controller(Ok(MutationResponse::ok("Post deleted")));
        controller.delete("one").await.unwrap();
        assert_eq!(post_ids(&controller), vec!["two", "three"]);
        assert!(!controller.has_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_timeout_rolls_back() {
        let controller = controller(Ok(MutationResponse::ok("late")))
            .with_timeout(Duration::from_millis(500));
        let err = controller.delete("three").await.unwrap_err();
        assert!(matches!(err, EditorError::Timeout { .. }));
        assert_eq!(post_ids(&controller), vec!["one", "two", "three"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_is_network_error() {
        let controller = controller(Err(TransportError("connection reset".into())));
        let err = controller.delete("one").await.unwrap_err();
        assert_eq!(err, EditorError::Network("connection reset".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_restore_goes_to_requested_index() {
        let controller = controller(Ok(MutationResponse::ok("ok")));
        controller.restore(post("zero"), 0).await.unwrap();
        assert_eq!(post_ids(&controller), vec!["zero", "one", "two", "three"]);
    }
}
