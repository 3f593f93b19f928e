//! Type-erased access to the chat service.

use std::pin::Pin;
use std::sync::Arc;

use huddle_wire::{
    ApiError, ChatApi, Conversation, ConversationId, Message, MessageId,
    NewMessage, WorkItemId,
};

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
pub(crate) type ApiResult<T> = Result<T, Box<dyn ApiError>>;

trait ApiObject: Send + Sync {
    fn get_or_create_conversation(
        &self,
        work_item: WorkItemId,
    ) -> BoxFuture<ApiResult<Conversation>>;

    fn list_messages(
        &self,
        conversation: ConversationId,
    ) -> BoxFuture<ApiResult<Vec<Message>>>;

    fn create_message(
        &self,
        conversation: ConversationId,
        message: NewMessage,
    ) -> BoxFuture<ApiResult<Message>>;

    fn delete_message(
        &self,
        conversation: ConversationId,
        message: MessageId,
    ) -> BoxFuture<ApiResult<()>>;
}

struct AnyApi<A: ChatApi>(A);

impl<A: ChatApi> ApiObject for AnyApi<A> {
    fn get_or_create_conversation(
        &self,
        work_item: WorkItemId,
    ) -> BoxFuture<ApiResult<Conversation>> {
        let fut = self.0.get_or_create_conversation(&work_item);
        Box::pin(async move { fut.await.map_err(erase) })
    }

    fn list_messages(
        &self,
        conversation: ConversationId,
    ) -> BoxFuture<ApiResult<Vec<Message>>> {
        let fut = self.0.list_messages(&conversation);
        Box::pin(async move { fut.await.map_err(erase) })
    }

    fn create_message(
        &self,
        conversation: ConversationId,
        message: NewMessage,
    ) -> BoxFuture<ApiResult<Message>> {
        let fut = self.0.create_message(&conversation, message);
        Box::pin(async move { fut.await.map_err(erase) })
    }

    fn delete_message(
        &self,
        conversation: ConversationId,
        message: MessageId,
    ) -> BoxFuture<ApiResult<()>> {
        let fut = self.0.delete_message(&conversation, &message);
        Box::pin(async move { fut.await.map_err(erase) })
    }
}

#[inline]
fn erase<E: ApiError>(err: E) -> Box<dyn ApiError> {
    Box::new(err)
}

/// A wrapper around a chat service implementation that provides a
/// type-erased interface for the rest of the engine.
///
/// Cloning is cheap; all clones talk to the same underlying service.
#[derive(Clone)]
pub struct Api {
    inner: Arc<dyn ApiObject>,
}

impl Api {
    /// Wraps a chat service implementation.
    #[inline]
    pub fn new<A: ChatApi>(api: A) -> Self {
        // We have to erase the type `A`, since the engine state doesn't
        // have a generic parameter and we don't want it either.
        Self {
            inner: Arc::new(AnyApi(api)),
        }
    }

    #[inline]
    pub(crate) fn get_or_create_conversation(
        &self,
        work_item: WorkItemId,
    ) -> BoxFuture<ApiResult<Conversation>> {
        self.inner.get_or_create_conversation(work_item)
    }

    #[inline]
    pub(crate) fn list_messages(
        &self,
        conversation: ConversationId,
    ) -> BoxFuture<ApiResult<Vec<Message>>> {
        self.inner.list_messages(conversation)
    }

    #[inline]
    pub(crate) fn create_message(
        &self,
        conversation: ConversationId,
        message: NewMessage,
    ) -> BoxFuture<ApiResult<Message>> {
        self.inner.create_message(conversation, message)
    }

    #[inline]
    pub(crate) fn delete_message(
        &self,
        conversation: ConversationId,
        message: MessageId,
    ) -> BoxFuture<ApiResult<()>> {
        self.inner.delete_message(conversation, message)
    }
}
