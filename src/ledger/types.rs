use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time earnings state for one provider address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub available: f64,
    pub total_earned: f64,
    pub total_withdrawn: f64,
    pub active_rentals: u32,
    pub earnings_per_hour: f64,
    /// Server-side time this snapshot reflects.
    pub as_of: Option<DateTime<Utc>>,
}

impl LedgerSnapshot {
    /// `available == total_earned - total_withdrawn`, up to float noise.
    pub fn is_balanced(&self) -> bool {
        (self.available - (self.total_earned - self.total_withdrawn)).abs() < 1e-9
    }
}

/// Escrow balance as returned by the billing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscrowBalance {
    #[serde(default)]
    pub available: f64,
    #[serde(default)]
    pub total_earned: f64,
    #[serde(default)]
    pub total_withdrawn: f64,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RentalStatus {
    Provisioning,
    Running,
    Completed,
    Failed,
    Cancelled,
    #[serde(other)]
    Other,
}

impl RentalStatus {
    /// Statuses that are billed while they last.
    pub fn is_active(self) -> bool {
        matches!(self, RentalStatus::Provisioning | RentalStatus::Running)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalSession {
    pub id: String,
    pub owner_address: String,
    pub status: RentalStatus,
    #[serde(default)]
    pub rate_per_hour: f64,
}

impl RentalSession {
    pub fn is_active_for(&self, address: &str) -> bool {
        self.status.is_active() && self.owner_address.eq_ignore_ascii_case(address)
    }
}

/// The rentals endpoint answers either with a bare list or wrapped in an object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RentalsResponse {
    List(Vec<RentalSession>),
    Wrapped { rentals: Vec<RentalSession> },
}

impl RentalsResponse {
    pub(crate) fn into_sessions(self) -> Vec<RentalSession> {
        match self {
            RentalsResponse::List(v) => v,
            RentalsResponse::Wrapped { rentals } => rentals,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Earning,
    Withdrawal,
    JobCompleted,
    RentalBilling,
    #[serde(other)]
    Unknown,
}

impl EventKind {
    /// Kinds that credit the provider.
    pub fn is_credit(self) -> bool {
        matches!(
            self,
            EventKind::Earning | EventKind::JobCompleted | EventKind::RentalBilling
        )
    }
}

/// One incremental change pushed by the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rental_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl LedgerEvent {
    pub fn parse(payload: &str) -> crate::error::SyncResult<Self> {
        Ok(serde_json::from_str(payload)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_and_unknown_event_types() {
        let e = LedgerEvent::parse(
            r#"{"type":"rental_billing","amount":1.25,"rental_id":"r-1","timestamp":"2026-03-01T12:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(e.kind, EventKind::RentalBilling);
        assert_eq!(e.rental_id.as_deref(), Some("r-1"));
        assert!(e.job_id.is_none());

        let e = LedgerEvent::parse(
            r#"{"type":"staking_reward","amount":3,"timestamp":"2026-03-01T12:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(e.kind, EventKind::Unknown);
    }

    #[test]
    fn malformed_event_is_a_parse_error() {
        let err = LedgerEvent::parse(r#"{"type":"earning"}"#).unwrap_err();
        assert!(matches!(err, crate::error::SyncError::Parse(_)));
    }

    #[test]
    fn rentals_accept_list_or_wrapped() {
        let body = r#"[{"id":"1","owner_address":"0xA","status":"running","rate_per_hour":2.0}]"#;
        let list: RentalsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(list.into_sessions().len(), 1);

        let body = r#"{"rentals":[{"id":"1","owner_address":"0xA","status":"terminating"}]}"#;
        let wrapped = serde_json::from_str::<RentalsResponse>(body).unwrap().into_sessions();
        assert_eq!(wrapped[0].status, RentalStatus::Other);
        assert_eq!(wrapped[0].rate_per_hour, 0.0);
    }

    #[test]
    fn escrow_ignores_extra_fields() {
        let body = r#"{"available":5,"total_earned":8,"total_withdrawn":3,"currency":"USDC"}"#;
        let b: EscrowBalance = serde_json::from_str(body).unwrap();
        assert_eq!(b.available, 5.0);
        assert!(b.updated_at.is_none());
    }
}
