use std::sync::Arc;

use huddle_wire::{
    ApiErrorKind, ChatApi, Conversation, ConversationId, Message, MessageId,
    NewMessage, WorkItemId,
};
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{Error, HttpConfig};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GetOrCreateBody<'a> {
    work_item_id: &'a WorkItemId,
}

/// Chat service client over HTTP.
#[derive(Clone, Debug)]
pub struct HttpApi {
    client: Client,
    config: Arc<HttpConfig>,
}

impl HttpApi {
    /// Creates a new `HttpApi` with the given configuration.
    #[inline]
    pub fn new(config: HttpConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.config.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

async fn read_json<T: DeserializeOwned>(
    resp: Result<Response, reqwest::Error>,
) -> Result<T, Error> {
    let resp = resp
        .and_then(Response::error_for_status)
        .map_err(Error::from_reqwest)?;
    resp.json().await.map_err(|err| {
        Error::new(
            format!("malformed service response: {err}"),
            ApiErrorKind::Other,
        )
    })
}

impl ChatApi for HttpApi {
    type Error = Error;

    fn get_or_create_conversation(
        &self,
        work_item: &WorkItemId,
    ) -> impl Future<Output = Result<Conversation, Self::Error>> + Send + 'static
    {
        let url = format!("{}/conversations", self.config.base_url);
        let resp_fut = self
            .authed(self.client.post(url))
            .json(&GetOrCreateBody {
                work_item_id: work_item,
            })
            .send();
        async move {
            trace!("fetching conversation");
            read_json(resp_fut.await).await
        }
    }

    fn list_messages(
        &self,
        conversation: &ConversationId,
    ) -> impl Future<Output = Result<Vec<Message>, Self::Error>> + Send + 'static
    {
        let url = format!(
            "{}/conversations/{}/messages",
            self.config.base_url, conversation
        );
        let resp_fut = self.authed(self.client.get(url)).send();
        async move { read_json(resp_fut.await).await }
    }

    fn create_message(
        &self,
        conversation: &ConversationId,
        message: NewMessage,
    ) -> impl Future<Output = Result<Message, Self::Error>> + Send + 'static
    {
        let url = format!(
            "{}/conversations/{}/messages",
            self.config.base_url, conversation
        );
        let resp_fut = self.authed(self.client.post(url)).json(&message).send();
        async move { read_json(resp_fut.await).await }
    }

    fn delete_message(
        &self,
        conversation: &ConversationId,
        message: &MessageId,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'static {
        let url = format!(
            "{}/conversations/{}/messages/{}",
            self.config.base_url, conversation, message
        );
        let resp_fut = self.authed(self.client.delete(url)).send();
        async move {
            resp_fut
                .await
                .and_then(Response::error_for_status)
                .map_err(Error::from_reqwest)?;
            Ok(())
        }
    }
}
