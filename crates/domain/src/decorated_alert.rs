use serde::{Deserialize, Serialize};

/// Enrichment service response for one alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoratedAlert {
    /// Decoration produced by the enrichment pipeline.
    #[serde(rename = "dassana")]
    pub decoration: Decoration,
}

/// Normalized alert plus its three risk contexts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decoration {
    /// Normalization stage result.
    pub normalize: NormalizeStage,
    /// Risk in the general context.
    #[serde(rename = "general-context", default)]
    pub general_context: RiskContext,
    /// Risk in the context of the affected resource.
    #[serde(rename = "resource-context", default)]
    pub resource_context: RiskContext,
    /// Risk in the context of the violated policy.
    #[serde(rename = "policy-context", default)]
    pub policy_context: RiskContext,
}

/// Wrapper around the normalizer output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeStage {
    /// Normalized alert fields.
    pub output: NormalizedOutput,
}

/// Normalized alert fields used in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedOutput {
    /// Identifier of the affected resource.
    pub resource_id: String,
    /// Cloud service, e.g. `s3`.
    pub service: String,
    /// Service-scoped resource type, e.g. `bucket`.
    pub resource_type: String,
    /// Violated vendor policy id.
    pub vendor_policy: String,
}

/// One risk bucket; `risk` is absent when the service has no opinion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskContext {
    /// Risk assessment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<Risk>,
}

impl RiskContext {
    /// Returns the risk value, if the context carries one.
    #[must_use]
    pub fn risk_value(&self) -> Option<&str> {
        self.risk.as_ref().and_then(|risk| risk.risk_value.as_deref())
    }
}

/// Risk assessment within one context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Risk {
    /// Risk level, e.g. `HIGH`.
    #[serde(default)]
    pub risk_value: Option<String>,
}

impl DecoratedAlert {
    /// Returns the normalized resource id.
    #[must_use]
    pub fn resource_id(&self) -> &str {
        self.decoration.normalize.output.resource_id.as_str()
    }

    /// Returns the `service:resourceType` compound type.
    #[must_use]
    pub fn compound_type(&self) -> String {
        let output = &self.decoration.normalize.output;
        format!("{}:{}", output.service, output.resource_type)
    }

    /// Returns the violated policy id.
    #[must_use]
    pub fn policy_id(&self) -> &str {
        self.decoration.normalize.output.vendor_policy.as_str()
    }
}
