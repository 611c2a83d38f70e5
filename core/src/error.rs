use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No promoter with tracking code '{tracking_code}'")]
    PromoterNotFound { tracking_code: String },

    #[error("No event with id '{event_id}'")]
    EventNotFound { event_id: String },

    #[error("No order with order number '{order_number}'")]
    OrderNotFound { order_number: String },

    #[error("Data integrity error: {detail}")]
    DataIntegrity { detail: String },

    #[error("Malformed webhook payload: {detail}")]
    MalformedPayload { detail: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LedgerError {
    /// Resolution failures are reported to the sender as not-found;
    /// everything else is an internal error.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            LedgerError::PromoterNotFound { .. }
                | LedgerError::EventNotFound { .. }
                | LedgerError::OrderNotFound { .. }
        )
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
