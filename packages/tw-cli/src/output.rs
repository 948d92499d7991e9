use std::io::Write;
use std::path::Path;

use tw_rs::AnalysisResult;

/// Write a rendered string to stdout or a file.
pub fn write_output(text: &str, output_path: Option<&str>) -> Result<(), String> {
    match output_path {
        Some(path) => std::fs::write(Path::new(path), text)
            .map_err(|e| format!("Failed to write output file '{}': {}", path, e)),
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(text.as_bytes())
                .and_then(|_| handle.write_all(b"\n"))
                .map_err(|e| format!("Failed to write to stdout: {}", e))
        }
    }
}

/// Serialize a value to JSON (pretty or compact).
pub fn to_json<T: serde::Serialize>(value: &T, compact: bool) -> Result<String, String> {
    if compact {
        serde_json::to_string(value).map_err(|e| format!("JSON serialization failed: {}", e))
    } else {
        serde_json::to_string_pretty(value)
            .map_err(|e| format!("JSON serialization failed: {}", e))
    }
}

/// Render the analysis report the way the lab reads it: grouped descriptives
/// first, then the pairwise and omnibus tests.
pub fn render_report(result: &AnalysisResult) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Analysis: {} / participant {}\n",
        result.experiment, result.participant
    ));
    out.push_str(&format!(
        "Trials: {} ({} excluded, policy {})\n",
        result.trials, result.excluded, result.outlier_policy
    ));
    out.push_str(&format!("Baseline: {:.4} s\n\n", result.baseline));

    out.push_str(&format!(
        "  {:<16} {:>5} {:>9} {:>9} {:>9} {:>9}\n",
        "Condition", "n", "mean", "std", "median", "sem"
    ));
    out.push_str(&format!("  {}\n", "-".repeat(60)));
    for (condition, d) in &result.descriptives {
        out.push_str(&format!(
            "  {:<16} {:>5} {:>9.4} {:>9.4} {:>9.4} {:>9.4}\n",
            condition, d.n, d.mean, d.std, d.median, d.sem
        ));
    }

    if !result.pairwise_tests.is_empty() {
        out.push('\n');
        out.push_str("Pairwise comparisons (Welch):\n");
        for pair in &result.pairwise_tests {
            out.push_str(&format!(
                "  {} vs {}: t = {:.4}, df = {:.1}, p = {}\n",
                pair.group_a,
                pair.group_b,
                pair.test.t,
                pair.test.df,
                format_p(pair.test.p)
            ));
        }
    }

    if let Some(anova) = &result.anova {
        out.push('\n');
        out.push_str(&format!(
            "One-way ANOVA: F({:.0}, {:.0}) = {:.4}, p = {}\n",
            anova.df_between,
            anova.df_within,
            anova.f,
            format_p(anova.p)
        ));
    }

    out.push('\n');
    out.push_str(&format!("Cleaned table: {}", result.output_path));
    out
}

fn format_p(p: f64) -> String {
    if p.is_nan() {
        "n/a".to_string()
    } else if p < 0.001 {
        "<0.001".to_string()
    } else {
        format!("{:.4}", p)
    }
}
