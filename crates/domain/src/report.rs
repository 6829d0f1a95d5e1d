use std::str::FromStr;

use driftscan_core::AppError;
use serde::{Deserialize, Serialize};

use crate::DecoratedAlert;

/// How risk columns are assigned to report rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskAttribution {
    /// Each row carries the risk values of its own alert.
    #[default]
    PerAlert,
    /// Every row carries the risk values of the last alert.
    ///
    /// Reproduces the report produced by earlier releases of this pipeline.
    LastAlert,
}

impl RiskAttribution {
    /// Returns the configuration value for this mode.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PerAlert => "per-alert",
            Self::LastAlert => "last-alert",
        }
    }
}

impl FromStr for RiskAttribution {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "per-alert" => Ok(Self::PerAlert),
            "last-alert" => Ok(Self::LastAlert),
            _ => Err(AppError::Validation(format!(
                "risk attribution must be either 'per-alert' or 'last-alert', got '{value}'"
            ))),
        }
    }
}

/// Risk values of the three contexts; empty when not provided.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RiskTriple {
    /// General context risk.
    pub general: String,
    /// Resource context risk.
    pub resource: String,
    /// Policy context risk.
    pub policy: String,
}

impl RiskTriple {
    /// Extracts the risk values of one decorated alert.
    #[must_use]
    pub fn from_alert(alert: &DecoratedAlert) -> Self {
        let decoration = &alert.decoration;
        Self {
            general: decoration
                .general_context
                .risk_value()
                .unwrap_or_default()
                .to_owned(),
            resource: decoration
                .resource_context
                .risk_value()
                .unwrap_or_default()
                .to_owned(),
            policy: decoration
                .policy_context
                .risk_value()
                .unwrap_or_default()
                .to_owned(),
        }
    }
}

/// One line of the change analysis report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    /// Resource id.
    pub resource: String,
    /// `service:type` compound type.
    pub resource_type: String,
    /// Violated policy id.
    pub policy: String,
    /// Risk values shown for the row.
    pub risk: RiskTriple,
}

/// Flattens decorated alerts into report rows, one row per alert in input order.
#[must_use]
pub fn build_report_rows(
    alerts: &[DecoratedAlert],
    attribution: RiskAttribution,
) -> Vec<ReportRow> {
    let broadcast_risk = match attribution {
        RiskAttribution::PerAlert => None,
        RiskAttribution::LastAlert => alerts.last().map(RiskTriple::from_alert),
    };

    alerts
        .iter()
        .map(|alert| ReportRow {
            resource: alert.resource_id().to_owned(),
            resource_type: alert.compound_type(),
            policy: alert.policy_id().to_owned(),
            risk: broadcast_risk
                .clone()
                .unwrap_or_else(|| RiskTriple::from_alert(alert)),
        })
        .collect()
}
