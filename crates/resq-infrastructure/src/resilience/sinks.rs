//! Tracing-backed report sink

use resq_domain::{ErrorReport, ReportSink};

/// Report sink that writes forwarded reports to the `resq::report` target
///
/// The breadcrumb trail and source chain are included, which the regular
/// severity-level log line omits.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReportSink;

impl ReportSink for TracingReportSink {
    fn report(&self, report: &ErrorReport) {
        tracing::error!(
            target: "resq::report",
            report_id = %report.id,
            origin = %report.context.origin,
            category = %report.category,
            severity = %report.severity,
            handled = report.handled,
            chain = ?report.chain,
            breadcrumbs = ?report.breadcrumbs,
            "{}",
            report.message
        );
    }
}

/// Report sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReportSink;

impl ReportSink for NullReportSink {
    fn report(&self, _report: &ErrorReport) {}
}
