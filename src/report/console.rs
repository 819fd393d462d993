use crate::report::report_model::SuiteReport;
use crate::report::summary::IndexSummary;

// ============================================================================
// Console reporter: formatted terminal output
// ============================================================================

/// Format a suite report for terminal output.
///
/// Produces output like:
/// ```text
/// === Suite: checkout ===
///
/// ✓ PASS  Toggle settings (4 steps)
/// ✗ FAIL  Pick a city (2 steps)
///     [FAIL] Step 1 (Select): not_found: no element found: kind=dropdown ...
///
/// === Results: 1 passed, 1 failed (2 total), 6 step(s), 3 driver call(s) ===
/// ```
pub fn format_console_report(report: &SuiteReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== Suite: {} ===\n\n", report.suite_name));

    for result in &report.results {
        let marker = if result.passed {
            "\u{2713} PASS"
        } else {
            "\u{2717} FAIL"
        };

        out.push_str(&format!(
            "{}  {} ({} steps)\n",
            marker, result.name, result.steps_run
        ));

        if !result.passed {
            let failed_steps: Vec<_> = result.failed_steps().collect();
            for outcome in &failed_steps {
                let kind = outcome.error_kind.as_deref().unwrap_or("expectation");
                let detail = outcome.message.as_deref().unwrap_or("step failed");
                out.push_str(&format!(
                    "    [FAIL] Step {} ({:?}): {}: {}\n",
                    outcome.index, outcome.action, kind, detail
                ));
            }
            if failed_steps.is_empty() {
                if let Some(ref error) = result.error {
                    out.push_str(&format!("    [ERROR] {}\n", error));
                }
            }
        }
    }

    out.push_str(&format!(
        "\n=== Results: {} passed, {} failed ({} total), {} step(s), {} driver call(s)",
        report.passed, report.failed, report.total, report.steps_run, report.mutating_calls
    ));

    if let Some(ms) = report.duration_ms {
        let secs = ms as f64 / 1000.0;
        out.push_str(&format!(" in {:.1}s", secs));
    }

    out.push_str(" ===\n");

    out
}

/// Format a discovery summary: counts per kind, then one line per element.
pub fn format_index_summary(summary: &IndexSummary) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "=== Generation {}: {} element(s) ===\n",
        summary.generation, summary.total
    ));

    for (kind, counts) in &summary.by_kind {
        out.push_str(&format!(
            "  {:<12} {:>3} total  {:>3} visible  {:>3} disabled  {:>3} loading",
            kind, counts.total, counts.visible, counts.disabled, counts.loading
        ));
        if let Some(checked) = counts.checked {
            out.push_str(&format!("  {:>3} checked", checked));
        }
        out.push('\n');
    }

    if !summary.duplicate_markers.is_empty() {
        out.push_str(&format!(
            "  duplicate markers: {}\n",
            summary.duplicate_markers.join(", ")
        ));
    }

    out.push('\n');
    for entry in &summary.elements {
        let marker = entry.marker.as_deref().unwrap_or("-");
        let flags = [
            (!entry.state.visible).then_some("hidden"),
            entry.state.disabled.then_some("disabled"),
            entry.state.loading.then_some("loading"),
            (entry.state.checked() == Some(true)).then_some("checked"),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(",");

        out.push_str(&format!(
            "  #{:<4} {:<12} {:<30} marker={} {}\n",
            entry.order,
            entry.kind,
            format!("{:?}", entry.state.label),
            marker,
            flags
        ));
    }

    out
}
