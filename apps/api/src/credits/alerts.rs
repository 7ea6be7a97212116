use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    OutOfCredits,
    LowBalance,
    CreditsExpiring,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditAlert {
    pub severity: AlertSeverity,
    pub kind: AlertKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertThresholds {
    pub warning: i64,
    pub critical: i64,
}

/// Alerts for a balance and the number of credits about to expire.
/// At most one balance alert is raised; the critical one wins.
pub fn compute_alerts(
    balance: i64,
    expiring_soon: i64,
    thresholds: AlertThresholds,
) -> Vec<CreditAlert> {
    let mut alerts = Vec::new();

    if balance <= thresholds.critical {
        let kind = if balance <= 0 {
            AlertKind::OutOfCredits
        } else {
            AlertKind::LowBalance
        };
        alerts.push(CreditAlert {
            severity: AlertSeverity::Critical,
            kind,
            message: if balance <= 0 {
                "You have no job posting credits left. New listings cannot be activated."
                    .to_string()
            } else {
                format!("Only {balance} job posting credit(s) left.")
            },
        });
    } else if balance <= thresholds.warning {
        alerts.push(CreditAlert {
            severity: AlertSeverity::Warning,
            kind: AlertKind::LowBalance,
            message: format!("Only {balance} job posting credit(s) left."),
        });
    }

    if expiring_soon > 0 {
        alerts.push(CreditAlert {
            severity: AlertSeverity::Warning,
            kind: AlertKind::CreditsExpiring,
            message: format!("{expiring_soon} credit(s) expire within 7 days."),
        });
    }

    alerts
}
