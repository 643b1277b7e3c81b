/// Task store
///
/// This module owns the authenticated user's task collection and mediates
/// every task mutation through the transport. Local state is never
/// authoritative: each mutation applies the server's returned record, and
/// nothing is removed locally until the server has confirmed the delete.
///
/// # Collection semantics
///
/// - Order is the server's response order; newly created tasks are
///   appended at the end, never re-sorted.
/// - `fetch_all` replaces the whole collection and is safe to call
///   repeatedly.
/// - The collection is cleared the moment the session becomes
///   unauthenticated: the store subscribes to the session store at
///   construction, so the clear lands before `logout()` resolves and a
///   previous user's tasks are never shown.
///
/// # The busy flag
///
/// One `loading` flag is shared by every operation; overlapping calls
/// share the single busy indicator, and the UI is expected to disable
/// controls while it is set rather than rely on the store serializing
/// requests. Every exit path (including errors) clears the flag.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskdeck_client::config::Config;
/// use taskdeck_client::credentials::{CredentialStore, MemoryCredentialStore};
/// use taskdeck_client::session::SessionStore;
/// use taskdeck_client::tasks::TaskStore;
/// use taskdeck_client::transport::Transport;
/// use taskdeck_shared::models::task::TaskDraft;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::new("http://localhost:8080");
/// let credentials: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::new());
/// let transport = Arc::new(Transport::new(&config, credentials.clone())?);
/// let session = SessionStore::new(transport.clone(), credentials);
/// let tasks = TaskStore::new(transport, session.clone());
///
/// session.login("user@example.com", "secret").await?;
/// tasks.fetch_all().await?;
/// let created = tasks.create(TaskDraft::new("Buy milk", "")).await?;
/// tasks.toggle_completion(created.id).await?;
/// # Ok(())
/// # }
/// ```

use std::sync::{Arc, RwLock, Weak};
use taskdeck_shared::models::task::{Task, TaskDraft, TaskPatch, TaskPayload};
use taskdeck_shared::models::user::User;

use crate::error::{ClientError, ClientResult};
use crate::session::SessionStore;
use crate::transport::Transport;

/// Snapshot of the task collection and busy flag
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TasksState {
    /// The task collection, in server order with local appends at the end
    pub tasks: Vec<Task>,

    /// True while any store operation is in flight
    pub loading: bool,
}

type Observer = Box<dyn Fn(&TasksState) + Send + Sync>;

struct TaskInner {
    transport: Arc<Transport>,
    session: SessionStore,
    state: RwLock<TasksState>,
    observers: RwLock<Vec<Observer>>,
}

/// Reactive store for the authenticated user's tasks
///
/// Cheap to clone; clones share state and subscriptions.
#[derive(Clone)]
pub struct TaskStore {
    inner: Arc<TaskInner>,
}

impl TaskStore {
    /// Creates a store bound to a session
    ///
    /// Subscribes to the session store so the collection is cleared
    /// synchronously whenever the user becomes absent (logout, or startup
    /// restoration finding no session).
    pub fn new(transport: Arc<Transport>, session: SessionStore) -> Self {
        let inner = Arc::new(TaskInner {
            transport,
            session: session.clone(),
            state: RwLock::new(TasksState::default()),
            observers: RwLock::new(Vec::new()),
        });

        // Weak, so the subscription does not keep the store alive through
        // the session store it is itself holding.
        let weak: Weak<TaskInner> = Arc::downgrade(&inner);
        session.subscribe(move |session_state| {
            if session_state.user.is_none() {
                if let Some(inner) = weak.upgrade() {
                    clear_collection(&inner);
                }
            }
        });

        TaskStore { inner }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> TasksState {
        self.inner.state.read().unwrap().clone()
    }

    /// Snapshot of the task collection
    pub fn tasks(&self) -> Vec<Task> {
        self.inner.state.read().unwrap().tasks.clone()
    }

    /// True while any store operation is in flight
    pub fn is_loading(&self) -> bool {
        self.inner.state.read().unwrap().loading
    }

    /// Registers an observer called on every collection or busy-flag change
    ///
    /// Observers run synchronously inside the change. Subscriptions last
    /// for the lifetime of the store.
    pub fn subscribe(&self, observer: impl Fn(&TasksState) + Send + Sync + 'static) {
        self.inner.observers.write().unwrap().push(Box::new(observer));
    }

    /// Fetches the full task collection
    ///
    /// Without an authenticated user this performs no request and leaves
    /// the collection exactly as it is. Otherwise the response replaces
    /// the whole collection; on failure the collection is left untouched
    /// (stale reads beat an empty screen) and the error is returned.
    pub async fn fetch_all(&self) -> ClientResult<()> {
        if self.inner.session.current_user().is_none() {
            tracing::debug!("No authenticated user, skipping task fetch");
            return Ok(());
        }

        let _busy = BusyGuard::engage(&self.inner);

        let tasks: Vec<Task> = self.inner.transport.get("/api/tasks").await?;

        let snapshot = {
            let mut state = self.inner.state.write().unwrap();
            state.tasks = tasks;
            state.clone()
        };
        notify_observers(&self.inner, &snapshot);

        Ok(())
    }

    /// Fetches a single task, for read-before-edit
    ///
    /// A missing task is a normal outcome and comes back as `Ok(None)`;
    /// transport-level failures are still errors. The local collection is
    /// not touched either way.
    pub async fn fetch_one(&self, id: i64) -> ClientResult<Option<Task>> {
        let _busy = BusyGuard::engage(&self.inner);

        match self
            .inner
            .transport
            .get::<Task>(&format!("/api/tasks/{id}"))
            .await
        {
            Ok(task) => Ok(Some(task)),
            Err(ClientError::Http { status: 404, .. }) => {
                tracing::debug!(task_id = id, "Task not found");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Creates a task owned by the current user
    ///
    /// Requires an authenticated user; no request is sent without one. On
    /// success the server's record (with its assigned id) is appended to
    /// the end of the collection.
    pub async fn create(&self, draft: TaskDraft) -> ClientResult<Task> {
        let user = self.require_user()?;
        let _busy = BusyGuard::engage(&self.inner);

        let payload = TaskPayload::from_draft(draft, &user.id);
        let created: Task = self.inner.transport.post("/api/tasks", &payload).await?;

        tracing::debug!(task_id = created.id, "Task created");

        let snapshot = {
            let mut state = self.inner.state.write().unwrap();
            state.tasks.push(created.clone());
            state.clone()
        };
        notify_observers(&self.inner, &snapshot);

        Ok(created)
    }

    /// Updates a task with the fields present in `patch`
    ///
    /// Requires an authenticated user. Absent patch fields are not sent;
    /// the caller resupplies whatever it wants preserved. On success the
    /// server's record replaces the matching local entry; on failure the
    /// local state is unchanged and the error is returned for display.
    pub async fn update(&self, id: i64, patch: TaskPatch) -> ClientResult<Task> {
        let user = self.require_user()?;
        let _busy = BusyGuard::engage(&self.inner);

        let payload = TaskPayload::from_patch(patch, &user.id);
        let updated: Task = self
            .inner
            .transport
            .put(&format!("/api/tasks/{id}"), &payload)
            .await?;

        let snapshot = {
            let mut state = self.inner.state.write().unwrap();
            if let Some(slot) = state.tasks.iter_mut().find(|t| t.id == id) {
                *slot = updated.clone();
            }
            state.clone()
        };
        notify_observers(&self.inner, &snapshot);

        Ok(updated)
    }

    /// Deletes a task
    ///
    /// The local entry is removed only after the server confirms; a failed
    /// delete leaves the collection unchanged and returns the error.
    pub async fn delete(&self, id: i64) -> ClientResult<()> {
        let _busy = BusyGuard::engage(&self.inner);

        self.inner
            .transport
            .delete(&format!("/api/tasks/{id}"))
            .await?;

        tracing::debug!(task_id = id, "Task deleted");

        let snapshot = {
            let mut state = self.inner.state.write().unwrap();
            state.tasks.retain(|t| t.id != id);
            state.clone()
        };
        notify_observers(&self.inner, &snapshot);

        Ok(())
    }

    /// Inverts the completion state of a locally known task
    ///
    /// Reads the local copy (no fetch-first): a task the store does not
    /// hold is a no-op returning `Ok(None)`. Otherwise sends a full update
    /// with `completed` inverted and the other fields resupplied
    /// unchanged, and returns the server's record.
    pub async fn toggle_completion(&self, id: i64) -> ClientResult<Option<Task>> {
        let current = {
            let state = self.inner.state.read().unwrap();
            state.tasks.iter().find(|t| t.id == id).cloned()
        };

        let Some(task) = current else {
            tracing::debug!(task_id = id, "Toggle requested for task not in local collection");
            return Ok(None);
        };

        let updated = self.update(id, TaskPatch::toggled_from(&task)).await?;
        Ok(Some(updated))
    }

    fn require_user(&self) -> ClientResult<User> {
        self.inner
            .session
            .current_user()
            .ok_or_else(|| ClientError::Precondition("No authenticated user".to_string()))
    }
}

/// Empties the collection and notifies, skipping the no-op case
fn clear_collection(inner: &TaskInner) {
    let snapshot = {
        let mut state = inner.state.write().unwrap();
        if state.tasks.is_empty() {
            None
        } else {
            state.tasks.clear();
            Some(state.clone())
        }
    };

    if let Some(snapshot) = snapshot {
        tracing::debug!("Session ended, task collection cleared");
        notify_observers(inner, &snapshot);
    }
}

fn set_loading(inner: &TaskInner, loading: bool) {
    let snapshot = {
        let mut state = inner.state.write().unwrap();
        if state.loading == loading {
            None
        } else {
            state.loading = loading;
            Some(state.clone())
        }
    };

    if let Some(snapshot) = snapshot {
        notify_observers(inner, &snapshot);
    }
}

fn notify_observers(inner: &TaskInner, state: &TasksState) {
    for observer in inner.observers.read().unwrap().iter() {
        observer(state);
    }
}

/// Clears the shared busy flag on every exit path, including early returns
/// and cancelled futures. The first finishing call clears it even if
/// another is still in flight; overlapping calls share the one indicator.
struct BusyGuard {
    inner: Arc<TaskInner>,
}

impl BusyGuard {
    fn engage(inner: &Arc<TaskInner>) -> Self {
        set_loading(inner, true);
        BusyGuard {
            inner: Arc::clone(inner),
        }
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        set_loading(&self.inner, false);
    }
}
