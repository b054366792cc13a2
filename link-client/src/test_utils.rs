use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use link_common::{LinkEntity, NewLink, PositionUpdate};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::error::ClientError;
use crate::notify::{Notification, Notifier};
use crate::persistence::LinkPersistence;

pub fn link(n: u128, position: i32) -> LinkEntity {
    LinkEntity {
        id: Uuid::from_u128(n),
        platform: "GitHub".to_owned(),
        url: format!("https://github.com/user{n}"),
        position,
        created_at: Utc.timestamp_opt(1_700_000_000 + n as i64, 0).unwrap(),
    }
}

pub fn id(n: u128) -> Uuid {
    Uuid::from_u128(n)
}

pub fn update(n: u128, position: i32) -> PositionUpdate {
    PositionUpdate {
        id: id(n),
        position,
    }
}

fn unavailable() -> ClientError {
    ClientError::Status {
        status: 503,
        message: "unavailable".to_owned(),
    }
}

/// In memory server side of a link set that records every call made to it.
#[derive(Default)]
pub struct FakePersistence {
    pub links: Mutex<Vec<LinkEntity>>,
    pub position_calls: Mutex<Vec<Vec<PositionUpdate>>>,
    pub list_calls: AtomicUsize,
    pub deleted: Mutex<Vec<Uuid>>,
    pub fail_positions: AtomicBool,
    pub fail_list: AtomicBool,
    pub fail_delete: AtomicBool,
    /// How long a position update takes to answer.
    pub position_latency: Mutex<Duration>,
}

impl FakePersistence {
    pub fn with_links(links: Vec<LinkEntity>) -> Self {
        Self {
            links: Mutex::new(links),
            ..Default::default()
        }
    }

    pub fn position_calls(&self) -> Vec<Vec<PositionUpdate>> {
        self.position_calls.lock().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn deleted(&self) -> Vec<Uuid> {
        self.deleted.lock().clone()
    }
}

#[async_trait]
impl LinkPersistence for FakePersistence {
    async fn list_links(&self, _user_id: Uuid) -> Result<Vec<LinkEntity>, ClientError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(self.links.lock().clone())
    }

    async fn create_link(&self, _user_id: Uuid, link: &NewLink) -> Result<LinkEntity, ClientError> {
        let mut links = self.links.lock();
        let position = links.iter().map(|l| l.position + 1).max().unwrap_or(0);
        let created = LinkEntity {
            id: Uuid::new_v4(),
            platform: link.platform.clone(),
            url: link.url.clone(),
            position,
            created_at: Utc::now(),
        };
        links.push(created.clone());
        Ok(created)
    }

    async fn update_link(
        &self,
        _user_id: Uuid,
        link_id: Uuid,
        link: &NewLink,
    ) -> Result<LinkEntity, ClientError> {
        let mut links = self.links.lock();
        match links.iter_mut().find(|l| l.id == link_id) {
            Some(stored) => {
                stored.platform = link.platform.clone();
                stored.url = link.url.clone();
                Ok(stored.clone())
            }
            None => Err(ClientError::Status {
                status: 404,
                message: format!("link {link_id} not found"),
            }),
        }
    }

    async fn delete_link(&self, _user_id: Uuid, link_id: Uuid) -> Result<(), ClientError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.deleted.lock().push(link_id);
        self.links.lock().retain(|l| l.id != link_id);
        Ok(())
    }

    async fn update_positions(
        &self,
        _user_id: Uuid,
        updates: &[PositionUpdate],
    ) -> Result<(), ClientError> {
        self.position_calls.lock().push(updates.to_vec());

        let latency = *self.position_latency.lock();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if self.fail_positions.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let mut links = self.links.lock();
        for update in updates {
            if let Some(link) = links.iter_mut().find(|l| l.id == update.id) {
                link.position = update.position;
            }
        }
        links.sort_by_key(|l| l.position);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.notifications.lock().push(notification);
    }
}
