use super::log_level::Severity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single structured log record as it travels to the broker.
///
/// Built once per emit call by the encoder and never mutated afterwards; the
/// queue only ever sees its serialized form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogMessage {
    /// Correlation id, unique per record.
    pub id: String,
    pub application: String,
    pub category: String,
    pub date: DateTime<Utc>,
    pub hostname: String,
    pub ip_address: String,
    pub ip_address_remote: Option<String>,
    pub level: Severity,
    pub message: String,
    pub message_identifier: Option<String>,
    pub operation: Option<String>,
    pub process_id: u32,
    pub user_agent: Option<String>,
    pub thread_id: u64,
    pub thread_name: Option<String>,
}
