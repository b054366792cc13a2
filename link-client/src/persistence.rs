use async_trait::async_trait;
use link_common::{LinkEntity, NewLink, PositionUpdate};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::ClientError;

/// The server side of a link set, as seen by the reorder controller.
#[async_trait]
pub trait LinkPersistence {
    async fn list_links(&self, user_id: Uuid) -> Result<Vec<LinkEntity>, ClientError>;

    async fn create_link(&self, user_id: Uuid, link: &NewLink) -> Result<LinkEntity, ClientError>;

    /// Replace the platform and url of a link. The server keeps its position.
    async fn update_link(
        &self,
        user_id: Uuid,
        link_id: Uuid,
        link: &NewLink,
    ) -> Result<LinkEntity, ClientError>;

    async fn delete_link(&self, user_id: Uuid, link_id: Uuid) -> Result<(), ClientError>;

    /// Apply a partial position update. Only success or failure is reported.
    async fn update_positions(
        &self,
        user_id: Uuid,
        updates: &[PositionUpdate],
    ) -> Result<(), ClientError>;
}

#[derive(Serialize)]
struct PositionsBody<'a> {
    updates: &'a [PositionUpdate],
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// `LinkPersistence` backed by the link-api HTTP service.
#[derive(Clone, Debug)]
pub struct HttpLinkPersistence {
    client: Client,
    base_url: Url,
}

impl HttpLinkPersistence {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        let mut base_url = Url::parse(&config.api_url)?;
        // Url::join drops the last path segment unless it ends in a slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self { client, base_url })
    }

    fn links_url(&self, user_id: Uuid) -> Result<Url, ClientError> {
        Ok(self.base_url.join(&format!("users/{user_id}/links"))?)
    }

    fn link_url(&self, user_id: Uuid, link_id: Uuid) -> Result<Url, ClientError> {
        Ok(self
            .base_url
            .join(&format!("users/{user_id}/links/{link_id}"))?)
    }
}

/// Turn a non 2xx response into an error, keeping the server's message if it sent one.
async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status.canonical_reason().unwrap_or("unknown error").to_owned(),
    };
    Err(ClientError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl LinkPersistence for HttpLinkPersistence {
    #[instrument(skip(self))]
    async fn list_links(&self, user_id: Uuid) -> Result<Vec<LinkEntity>, ClientError> {
        let response = self.client.get(self.links_url(user_id)?).send().await?;
        let links = check_status(response).await?.json().await?;
        Ok(links)
    }

    #[instrument(skip(self, link))]
    async fn create_link(&self, user_id: Uuid, link: &NewLink) -> Result<LinkEntity, ClientError> {
        let response = self
            .client
            .post(self.links_url(user_id)?)
            .json(link)
            .send()
            .await?;
        let created = check_status(response).await?.json().await?;
        Ok(created)
    }

    #[instrument(skip(self, link))]
    async fn update_link(
        &self,
        user_id: Uuid,
        link_id: Uuid,
        link: &NewLink,
    ) -> Result<LinkEntity, ClientError> {
        let response = self
            .client
            .put(self.link_url(user_id, link_id)?)
            .json(link)
            .send()
            .await?;
        let updated = check_status(response).await?.json().await?;
        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn delete_link(&self, user_id: Uuid, link_id: Uuid) -> Result<(), ClientError> {
        let response = self
            .client
            .delete(self.link_url(user_id, link_id)?)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    #[instrument(skip(self, updates), fields(updates = updates.len()))]
    async fn update_positions(
        &self,
        user_id: Uuid,
        updates: &[PositionUpdate],
    ) -> Result<(), ClientError> {
        debug!("sending position batch");
        let response = self
            .client
            .patch(self.links_url(user_id)?)
            .json(&PositionsBody { updates })
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}
