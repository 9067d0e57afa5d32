//! Authorization flow configuration.
//!
//! Built once at process start and passed to the flow operations. Every
//! switch defaults to the long-standing behaviour: referer unchecked,
//! transactions reusable until expiry, fixed ten-minute lifetime.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;

use crate::models::auth::Application;

/// Fixed transaction lifetime: 10 minutes.
pub const TRANSACTION_TTL_SECS: i64 = 10 * 60;

/// How a transaction's `expire_at` is computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransactionExpiry {
    /// Creation time + [`TRANSACTION_TTL_SECS`], whatever the application says.
    #[default]
    Fixed,
    /// Creation time + the application's own `expiration`.
    PerApplication,
}

impl TransactionExpiry {
    /// Lifetime of a transaction issued for `app`.
    pub fn ttl_for(&self, app: &Application) -> Duration {
        match self {
            Self::Fixed => Duration::seconds(TRANSACTION_TTL_SECS),
            Self::PerApplication => Duration::seconds(i64::from(app.expiration.max(0))),
        }
    }
}

impl FromStr for TransactionExpiry {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(Self::Fixed),
            "application" | "per-application" => Ok(Self::PerApplication),
            other => Err(format!(
                "unknown transaction expiry '{other}' (expected 'fixed' or 'application')"
            )),
        }
    }
}

impl fmt::Display for TransactionExpiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed => f.write_str("fixed"),
            Self::PerApplication => f.write_str("application"),
        }
    }
}

/// Switches for the authorize/exchange flow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowConfig {
    /// Require the referer (query stripped) to be in `allowed_web_origins`.
    pub check_referer: bool,
    /// Consume a transaction on its first successful exchange.
    pub single_use_transactions: bool,
    pub transaction_expiry: TransactionExpiry,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_reusable_fixed_transactions() {
        let config = FlowConfig::default();
        assert!(!config.check_referer);
        assert!(!config.single_use_transactions);
        assert_eq!(config.transaction_expiry, TransactionExpiry::Fixed);
    }

    #[test]
    fn fixed_expiry_ignores_application_expiration() {
        let mut app = Application::new("owner", "app");
        app.expiration = 30;
        assert_eq!(TransactionExpiry::Fixed.ttl_for(&app), Duration::minutes(10));
        assert_eq!(
            TransactionExpiry::PerApplication.ttl_for(&app),
            Duration::seconds(30)
        );
    }

    #[test]
    fn expiry_parses_and_displays() {
        assert_eq!("Fixed".parse::<TransactionExpiry>(), Ok(TransactionExpiry::Fixed));
        assert_eq!(
            "application".parse::<TransactionExpiry>(),
            Ok(TransactionExpiry::PerApplication)
        );
        assert!("weekly".parse::<TransactionExpiry>().is_err());
        assert_eq!(TransactionExpiry::PerApplication.to_string(), "application");
    }
}
