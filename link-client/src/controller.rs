//! Optimistic reordering of a user's link set.
//!
//! The controller keeps the list locally and treats it as the source of truth
//! while saves are outstanding. A drop is applied to the local list at once;
//! the links whose position changed are marked dirty and saved together once
//! the debounce window has gone quiet. If a save fails, the list is reloaded
//! from the server rather than left diverged.
//!
//! Phases of a list:
//!
//! ```text
//! Idle -> Dragging -> Reordering -> PersistencePending -> Idle
//! ```
//!
//! `PersistencePending` may overlap with a new `Dragging`.

use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;

use link_common::reorder::{display_order, index_of, reorder, sort_by_position};
use link_common::{LinkEntity, NewLink, PositionUpdate, ReorderError};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::debounce::Debouncer;
use crate::error::ClientError;
use crate::notify::{LogNotifier, Notification, Notifier};
use crate::persistence::{HttpLinkPersistence, LinkPersistence};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// A link was picked up and has not been dropped yet.
    Dragging(Uuid),
    /// A drop is being applied to the local list.
    Reordering,
    /// Local changes are waiting for the debounce window or for the server.
    PersistencePending,
}

/// A link as held locally. `dirty` links have a position the server has not
/// confirmed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedLink {
    pub link: LinkEntity,
    pub dirty: bool,
}

impl CachedLink {
    fn clean(link: LinkEntity) -> Self {
        Self { link, dirty: false }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragOutcome {
    /// Nothing moved and nothing will be sent.
    Noop,
    /// The local list was reordered. `updates` is the changed range.
    Reordered {
        range: RangeInclusive<usize>,
        updates: Vec<PositionUpdate>,
    },
}

struct ListState {
    entries: Vec<CachedLink>,
    phase: Phase,
    dragging: Option<Uuid>,
    /// Bumped whenever the local order changes or is replaced.
    generation: u64,
    /// Saves and reloads currently waiting on the server.
    in_flight: usize,
}

struct Inner {
    user_id: Uuid,
    persistence: Arc<dyn LinkPersistence + Send + Sync>,
    notifier: Arc<dyn Notifier>,
    debouncer: Debouncer,
    state: Mutex<ListState>,
}

/// Handle to the reorder controller of one user's link set. Cheap to clone.
#[derive(Clone)]
pub struct ReorderController {
    inner: Arc<Inner>,
}

impl ReorderController {
    /// Saves are spawned onto `runtime`, so the drag methods may be called
    /// from any thread.
    pub fn new(
        user_id: Uuid,
        persistence: Arc<dyn LinkPersistence + Send + Sync>,
        notifier: Arc<dyn Notifier>,
        debounce: Duration,
        runtime: Handle,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                user_id,
                persistence,
                notifier,
                debouncer: Debouncer::new(debounce, runtime),
                state: Mutex::new(ListState {
                    entries: Vec::new(),
                    phase: Phase::Idle,
                    dragging: None,
                    generation: 0,
                    in_flight: 0,
                }),
            }),
        }
    }

    /// A controller talking to link-api over HTTP that reports failures to the log.
    /// Saves run on the current tokio runtime.
    pub fn from_config(config: &ClientConfig, user_id: Uuid) -> Result<Self, ClientError> {
        let runtime = Handle::try_current()?;
        let persistence = HttpLinkPersistence::new(config)?;
        Ok(Self::new(
            user_id,
            Arc::new(persistence),
            Arc::new(LogNotifier),
            config.debounce(),
            runtime,
        ))
    }

    pub fn user_id(&self) -> Uuid {
        self.inner.user_id
    }

    pub fn phase(&self) -> Phase {
        self.inner.state.lock().phase
    }

    /// The links in display order.
    pub fn links(&self) -> Vec<LinkEntity> {
        self.inner
            .state
            .lock()
            .entries
            .iter()
            .map(|entry| entry.link.clone())
            .collect()
    }

    pub fn entries(&self) -> Vec<CachedLink> {
        self.inner.state.lock().entries.clone()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.inner.state.lock().entries.iter().any(|e| e.dirty)
    }

    /// Replace the local list with the server's.
    pub async fn load(&self) -> Result<(), ClientError> {
        let mut links = self.inner.persistence.list_links(self.inner.user_id).await?;
        sort_by_position(&mut links);

        self.inner.debouncer.cancel();
        let mut state = self.inner.state.lock();
        state.entries = links.into_iter().map(CachedLink::clean).collect();
        state.generation += 1;
        self.inner.settle(&mut state);

        info!(user_id = %self.inner.user_id, links = state.entries.len(), "loaded links");
        Ok(())
    }

    pub fn drag_start(&self, link_id: Uuid) -> Result<(), ClientError> {
        let mut state = self.inner.state.lock();
        if !state.entries.iter().any(|e| e.link.id == link_id) {
            return Err(ReorderError::UnknownLink(link_id).into());
        }
        state.dragging = Some(link_id);
        self.inner.settle(&mut state);
        Ok(())
    }

    pub fn drag_cancel(&self) {
        let mut state = self.inner.state.lock();
        state.dragging = None;
        self.inner.settle(&mut state);
    }

    /// Apply a drop of `source_id` onto `destination_id`.
    ///
    /// No destination, or a drop onto itself, changes nothing. Otherwise the
    /// local list is reordered right away and the changed range is scheduled
    /// for saving. If the drop can't be applied the list is left untouched.
    pub fn drag_end(
        &self,
        source_id: Uuid,
        destination_id: Option<Uuid>,
    ) -> Result<DragOutcome, ClientError> {
        let mut state = self.inner.state.lock();
        state.dragging = None;

        let destination_id = match destination_id {
            Some(destination_id) if destination_id != source_id => destination_id,
            _ => {
                self.inner.settle(&mut state);
                return Ok(DragOutcome::Noop);
            }
        };

        self.inner.transition(&mut state, Phase::Reordering);

        let links: Vec<LinkEntity> = state.entries.iter().map(|e| e.link.clone()).collect();
        let result = index_of(&links, source_id)
            .and_then(|old| Ok((old, index_of(&links, destination_id)?)))
            .and_then(|(old, new)| reorder(&links, old, new));

        let reordered = match result {
            Ok(reordered) => reordered,
            Err(e) => {
                self.inner.settle(&mut state);
                drop(state);
                warn!(%source_id, %destination_id, "rejected drop: {}", e);
                self.inner.notifier.notify(Notification::ReorderRejected);
                return Err(e.into());
            }
        };

        let was_dirty: HashSet<Uuid> = state
            .entries
            .iter()
            .filter(|e| e.dirty)
            .map(|e| e.link.id)
            .collect();
        let changed: HashSet<Uuid> = reordered.updates.iter().map(|u| u.id).collect();
        state.entries = reordered
            .order
            .into_iter()
            .map(|link| CachedLink {
                dirty: changed.contains(&link.id) || was_dirty.contains(&link.id),
                link,
            })
            .collect();
        state.generation += 1;

        debug!(
            user_id = %self.inner.user_id,
            range = ?reordered.range,
            updates = reordered.updates.len(),
            "reordered links"
        );

        if !reordered.updates.is_empty() {
            Inner::schedule_flush(&self.inner);
        }
        self.inner.settle(&mut state);

        Ok(DragOutcome::Reordered {
            range: reordered.range,
            updates: reordered.updates,
        })
    }

    /// Save pending changes now instead of waiting for the debounce window.
    pub async fn flush(&self) {
        self.inner.debouncer.cancel();
        self.inner.flush().await;
    }

    /// Create a link and append it locally. Invalid input never reaches the server.
    pub async fn create(&self, new_link: &NewLink) -> Result<LinkEntity, ClientError> {
        let new_link = new_link.validate()?;

        match self
            .inner
            .persistence
            .create_link(self.inner.user_id, &new_link)
            .await
        {
            Ok(created) => {
                let mut state = self.inner.state.lock();
                state.entries.push(CachedLink::clean(created.clone()));
                state.entries.sort_by(|a, b| display_order(&a.link, &b.link));
                Ok(created)
            }
            Err(e) => {
                error!(user_id = %self.inner.user_id, "failed to create link: {}", e);
                self.inner.notifier.notify(Notification::CreateFailed {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Change the platform and url of a link. The local entry keeps its place
    /// in the list and any position that is still waiting to be saved.
    pub async fn edit(&self, link_id: Uuid, edit: &NewLink) -> Result<LinkEntity, ClientError> {
        let edit = edit.validate()?;

        match self
            .inner
            .persistence
            .update_link(self.inner.user_id, link_id, &edit)
            .await
        {
            Ok(updated) => {
                let mut state = self.inner.state.lock();
                match state.entries.iter_mut().find(|e| e.link.id == link_id) {
                    Some(entry) => {
                        entry.link.platform = updated.platform;
                        entry.link.url = updated.url;
                        Ok(entry.link.clone())
                    }
                    // Dropped locally while the request was out.
                    None => Ok(updated),
                }
            }
            Err(e) => {
                error!(user_id = %self.inner.user_id, %link_id, "failed to edit link: {}", e);
                self.inner.notifier.notify(Notification::EditFailed {
                    link_id,
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Delete a link. It is removed locally only once the server confirmed.
    pub async fn delete(&self, link_id: Uuid) -> Result<(), ClientError> {
        match self
            .inner
            .persistence
            .delete_link(self.inner.user_id, link_id)
            .await
        {
            Ok(()) => {
                let mut state = self.inner.state.lock();
                state.entries.retain(|e| e.link.id != link_id);
                Ok(())
            }
            Err(e) => {
                error!(user_id = %self.inner.user_id, %link_id, "failed to delete link: {}", e);
                self.inner.notifier.notify(Notification::DeleteFailed {
                    link_id,
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }
}

impl Inner {
    fn transition(&self, state: &mut ListState, next: Phase) {
        if state.phase != next {
            debug!(user_id = %self.user_id, from = ?state.phase, to = ?next, "phase change");
            state.phase = next;
        }
    }

    /// Work out the resting phase from what is still outstanding.
    fn settle(&self, state: &mut ListState) {
        let next = if let Some(link_id) = state.dragging {
            Phase::Dragging(link_id)
        } else if state.in_flight > 0 || self.debouncer.is_pending() {
            Phase::PersistencePending
        } else {
            Phase::Idle
        };
        self.transition(state, next);
    }

    fn schedule_flush(this: &Arc<Inner>) {
        let inner = Arc::clone(this);
        this.debouncer
            .schedule(move || async move { inner.flush().await });
    }

    /// Send every dirty link with its current position.
    async fn flush(&self) {
        let (updates, generation) = {
            let mut state = self.state.lock();
            let updates: Vec<PositionUpdate> = state
                .entries
                .iter()
                .filter(|e| e.dirty)
                .map(|e| PositionUpdate {
                    id: e.link.id,
                    position: e.link.position,
                })
                .collect();
            if updates.is_empty() {
                self.settle(&mut state);
                return;
            }
            state.in_flight += 1;
            self.settle(&mut state);
            (updates, state.generation)
        };

        let result = self
            .persistence
            .update_positions(self.user_id, &updates)
            .await;

        match result {
            Ok(()) => {
                let mut state = self.state.lock();
                state.in_flight -= 1;
                for update in &updates {
                    // A newer drop may have moved it again since.
                    if let Some(entry) = state
                        .entries
                        .iter_mut()
                        .find(|e| e.link.id == update.id && e.link.position == update.position)
                    {
                        entry.dirty = false;
                    }
                }
                self.settle(&mut state);
                info!(user_id = %self.user_id, updates = updates.len(), "saved link order");
            }
            Err(e) => {
                error!(user_id = %self.user_id, updates = updates.len(), "failed to save link order: {}", e);
                let superseded = {
                    let mut state = self.state.lock();
                    state.in_flight -= 1;
                    self.settle(&mut state);
                    state.generation != generation
                };
                self.notifier.notify(Notification::PersistenceFailed {
                    message: e.to_string(),
                });

                if superseded {
                    debug!(user_id = %self.user_id, "newer changes pending, not reloading");
                } else {
                    self.reconcile(generation).await;
                }
            }
        }
    }

    /// Reload the server's list after a failed save. Skipped if the list
    /// changed locally in the meantime.
    async fn reconcile(&self, generation: u64) {
        {
            let mut state = self.state.lock();
            state.in_flight += 1;
            self.settle(&mut state);
        }

        let result = self.persistence.list_links(self.user_id).await;

        let mut state = self.state.lock();
        state.in_flight -= 1;
        match result {
            Ok(mut links) if state.generation == generation => {
                sort_by_position(&mut links);
                state.entries = links.into_iter().map(CachedLink::clean).collect();
                state.generation += 1;
                self.settle(&mut state);
                info!(user_id = %self.user_id, "reloaded links after failed save");
            }
            Ok(_) => {
                self.settle(&mut state);
                debug!(user_id = %self.user_id, "list changed during reload, keeping local order");
            }
            Err(e) => {
                self.settle(&mut state);
                drop(state);
                error!(user_id = %self.user_id, "failed to reload links: {}", e);
                self.notifier.notify(Notification::ReconcileFailed {
                    message: e.to_string(),
                });
            }
        }
    }
}
