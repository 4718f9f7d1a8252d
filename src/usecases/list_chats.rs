use std::fmt;

use thiserror::Error;

use crate::domain::chat::ChatSummary;

const DEFAULT_CHAT_PAGE_SIZE: usize = 50;
const MAX_CHAT_PAGE_SIZE: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListChatsQuery {
    pub limit: usize,
    /// Case-insensitive title filter.
    pub search: Option<String>,
}

impl Default for ListChatsQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_CHAT_PAGE_SIZE,
            search: None,
        }
    }
}

impl ListChatsQuery {
    pub fn search(query: impl Into<String>) -> Self {
        Self {
            search: Some(query.into()),
            ..Self::default()
        }
    }

    fn normalized_limit(&self) -> usize {
        match self.limit {
            0 => DEFAULT_CHAT_PAGE_SIZE,
            value if value > MAX_CHAT_PAGE_SIZE => MAX_CHAT_PAGE_SIZE,
            value => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListChatsOutput {
    pub chats: Vec<ChatSummary>,
}

impl ListChatsOutput {
    pub fn total_unread(&self) -> u32 {
        self.chats.iter().map(|chat| chat.unread_count).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListChatsSourceError {
    Unauthorized,
    Unavailable,
    InvalidData,
    Unknown,
}

pub trait ListChatsSource: Send + Sync + fmt::Debug {
    fn list_chats(&self, limit: usize) -> Result<Vec<ChatSummary>, ListChatsSourceError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListChatsError {
    #[error("sign in to see your chats")]
    Unauthorized,
    #[error("chat list is temporarily unavailable")]
    TemporarilyUnavailable,
    #[error("chat list came back malformed")]
    DataContractViolation,
}

pub fn list_chats(
    source: &dyn ListChatsSource,
    query: ListChatsQuery,
) -> Result<ListChatsOutput, ListChatsError> {
    let limit = query.normalized_limit();
    let mut chats = source.list_chats(limit).map_err(map_source_error)?;

    if let Some(search) = query.search.as_deref() {
        chats.retain(|chat| chat.matches_query(search));
    }

    Ok(ListChatsOutput { chats })
}

fn map_source_error(error: ListChatsSourceError) -> ListChatsError {
    match error {
        ListChatsSourceError::Unauthorized => ListChatsError::Unauthorized,
        ListChatsSourceError::Unavailable | ListChatsSourceError::Unknown => {
            ListChatsError::TemporarilyUnavailable
        }
        ListChatsSourceError::InvalidData => ListChatsError::DataContractViolation,
    }
}
