use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct BoostPurchasedEvent {
    pub purchase_id: Uuid,
    pub owner_id: i32,
    pub package_id: i32,
    pub scope: String,
    pub target_listing_id: Option<i32>,
    pub price_minor: i64,
    pub expires_at: i64,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct BoostCancelledEvent {
    pub purchase_id: Uuid,
    pub owner_id: i32,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct BoostExpiredEvent {
    pub purchase_id: Uuid,
    pub owner_id: i32,
    pub expired_at: i64,
    pub timestamp: i64,
}

/// Envelope for everything the boost engine emits on its event sink.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum BoostEvent {
    Purchased(BoostPurchasedEvent),
    Cancelled(BoostCancelledEvent),
    Expired(BoostExpiredEvent),
}

impl BoostEvent {
    /// Routing key for the event ("boost_purchased", ...)
    pub fn event_type(&self) -> &'static str {
        match self {
            BoostEvent::Purchased(_) => "boost_purchased",
            BoostEvent::Cancelled(_) => "boost_cancelled",
            BoostEvent::Expired(_) => "boost_expired",
        }
    }

    pub fn purchase_id(&self) -> Uuid {
        match self {
            BoostEvent::Purchased(e) => e.purchase_id,
            BoostEvent::Cancelled(e) => e.purchase_id,
            BoostEvent::Expired(e) => e.purchase_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_envelope_shape() {
        let event = BoostEvent::Cancelled(BoostCancelledEvent {
            purchase_id: Uuid::nil(),
            owner_id: 7,
            timestamp: 1_700_000_000,
        });

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "cancelled");
        assert_eq!(json["payload"]["owner_id"], 7);
        assert_eq!(json["payload"]["timestamp"], 1_700_000_000);
        assert_eq!(event.event_type(), "boost_cancelled");
    }
}
