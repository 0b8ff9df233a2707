use crate::domain::page::Page;
use crate::error::{Result, ShopError};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiStatus {
    Success,
    Error,
    #[default]
    #[serde(other)]
    Unknown,
}

/// The `{ status, message, data }` wrapper every endpoint answers with.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub status: ApiStatus,
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// The payload of a successful envelope, if it carried one. Any status
    /// other than `success` becomes [`ShopError::Api`] with the server message.
    pub fn into_data(self) -> Result<Option<T>> {
        match self.status {
            ApiStatus::Success => Ok(self.data),
            ApiStatus::Error | ApiStatus::Unknown => Err(ShopError::Api(
                self.message
                    .unwrap_or_else(|| "Unexpected response from server".to_string()),
            )),
        }
    }

    pub fn require_data(self) -> Result<T> {
        self.into_data()?
            .ok_or_else(|| ShopError::Api("Response contained no data".to_string()))
    }
}

/// List endpoints answer with either a bare array or a paginated object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    List(Vec<T>),
    Paged(Page<T>),
}

impl<T> From<Listing<T>> for Page<T> {
    fn from(listing: Listing<T>) -> Self {
        match listing {
            Listing::List(items) => Page::single(items),
            Listing::Paged(page) => page,
        }
    }
}
