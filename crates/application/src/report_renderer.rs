//! Markdown rendering of the change analysis report.

use driftscan_domain::ReportRow;
use tabled::settings::Style;
use tabled::{Table, Tabled};

const COMMENT_HEADER: &str = "<h3>Dassana has detected changes in your tracked CloudFormation template</h3></br>Review the following to avoid service disruptions and/or security risks <hr/></br><details><summary>View Dassana's Change Analysis</summary></br>";

#[derive(Tabled)]
struct ReportTableRow<'a> {
    #[tabled(rename = "Resource")]
    resource: &'a str,
    #[tabled(rename = "Type")]
    resource_type: &'a str,
    #[tabled(rename = "Policy")]
    policy: &'a str,
    #[tabled(rename = "General Risk")]
    general_risk: &'a str,
    #[tabled(rename = "Resource Risk")]
    resource_risk: &'a str,
    #[tabled(rename = "Policy Risk")]
    policy_risk: &'a str,
}

impl<'a> From<&'a ReportRow> for ReportTableRow<'a> {
    fn from(row: &'a ReportRow) -> Self {
        Self {
            resource: row.resource.as_str(),
            resource_type: row.resource_type.as_str(),
            policy: row.policy.as_str(),
            general_risk: row.risk.general.as_str(),
            resource_risk: row.risk.resource.as_str(),
            policy_risk: row.risk.policy.as_str(),
        }
    }
}

/// Renders report rows as a Markdown pipe table keyed by resource.
#[must_use]
pub fn render_report_table(rows: &[ReportRow]) -> String {
    Table::new(rows.iter().map(ReportTableRow::from))
        .with(Style::markdown())
        .to_string()
}

/// Wraps a rendered table in the pull request comment template.
#[must_use]
pub fn compose_comment_body(table: &str) -> String {
    format!("{COMMENT_HEADER}\n\n{table}</details>")
}
