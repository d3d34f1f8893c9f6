use super::ClientError;
use super::repository::RecordSource;
use crate::models::{PingResponse, Record};
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP backend for the `/api` resources.
#[derive(Clone)]
pub struct RemoteApi {
    client: Client,
    base_url: String,
}

impl RemoteApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn ping(&self) -> Result<PingResponse, ClientError> {
        let response = self
            .client
            .get(format!("{}/api/ping", self.base_url))
            .send()
            .await?;
        Ok(check(response)?.json().await?)
    }

    fn collection_url<T: Record>(&self) -> String {
        format!("{}/api/{}", self.base_url, T::RESOURCE)
    }

    fn record_url<T: Record>(&self, id: &str) -> String {
        format!("{}/{}", self.collection_url::<T>(), urlencoding::encode(id))
    }
}

fn check(response: Response) -> Result<Response, ClientError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(ClientError::Status(response.status()))
    }
}

#[async_trait]
impl RecordSource for RemoteApi {
    async fn list<T: Record>(&self) -> Result<Vec<T>, ClientError> {
        let response = self.client.get(self.collection_url::<T>()).send().await?;
        Ok(check(response)?.json().await?)
    }

    async fn upsert<T: Record>(&self, items: &[T]) -> Result<(), ClientError> {
        let response = self
            .client
            .post(self.collection_url::<T>())
            .json(items)
            .send()
            .await?;
        check(response)?;
        Ok(())
    }

    async fn delete<T: Record>(&self, id: &str) -> Result<(), ClientError> {
        let response = self
            .client
            .delete(self.record_url::<T>(id))
            .send()
            .await?;
        check(response)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SavedLocation, ShiftEntry};

    #[test]
    fn record_urls_encode_the_id() {
        let api = RemoteApi::with_client(Client::new(), "http://localhost:8080/");
        assert_eq!(
            api.record_url::<ShiftEntry>("a/b?c"),
            "http://localhost:8080/api/shifts/a%2Fb%3Fc"
        );
        assert_eq!(
            api.record_url::<SavedLocation>("l1"),
            "http://localhost:8080/api/locations/l1"
        );
    }
}
