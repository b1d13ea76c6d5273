//! Hub -> client wire messages.
//!
//! ```json
//! { "type": "PRICE_UPDATE", "data": { "productId": 1, "storeId": 2, "price": 799 } }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::event::PriceChangeEvent;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    #[serde(rename = "PRICE_UPDATE")]
    PriceUpdate(PriceChangeEvent),
}

impl ServerMessage {
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }
}

impl From<PriceChangeEvent> for ServerMessage {
    fn from(event: PriceChangeEvent) -> Self {
        Self::PriceUpdate(event)
    }
}
