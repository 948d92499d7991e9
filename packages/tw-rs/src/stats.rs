//! Descriptive and inferential statistics for cleaned trial tables.
//!
//! Missing values (non-finite or absent response times) are ignored in every
//! computation, matching the NaN-ignoring aggregation the analysis scripts
//! relied on. P-values use a normal approximation to the t distribution and
//! the Paulson cube-root transform for F; both are adequate at the sample
//! sizes these experiments produce (dozens of trials per condition).

use serde::{Deserialize, Serialize};

/// Descriptive statistics for one group of response times
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Descriptives {
    pub n: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator)
    pub std: f64,
    pub sem: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

/// Two-sample (or paired) t-test outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TTestResult {
    pub t: f64,
    pub df: f64,
    pub p: f64,
}

/// One-way ANOVA outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnovaResult {
    pub f: f64,
    pub df_between: f64,
    pub df_within: f64,
    pub p: f64,
}

fn finite(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| v.is_finite()).collect()
}

/// Mean over finite values only; NaN when none remain
pub fn nanmean(values: &[f64]) -> f64 {
    let kept = finite(values);
    if kept.is_empty() {
        f64::NAN
    } else {
        kept.iter().sum::<f64>() / kept.len() as f64
    }
}

/// Compute descriptives over the finite values of a group
///
/// An empty (or all-NaN) group yields `n == 0` with NaN statistics; a single
/// value yields a NaN standard deviation, as with an n-1 denominator.
pub fn describe(values: &[f64]) -> Descriptives {
    let mut kept = finite(values);
    let n = kept.len();
    if n == 0 {
        return Descriptives {
            n: 0,
            mean: f64::NAN,
            std: f64::NAN,
            sem: f64::NAN,
            median: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
        };
    }

    let mean = kept.iter().sum::<f64>() / n as f64;
    let std = if n > 1 {
        let ss: f64 = kept.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (n - 1) as f64).sqrt()
    } else {
        f64::NAN
    };

    kept.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let median = if n % 2 == 1 {
        kept[n / 2]
    } else {
        (kept[n / 2 - 1] + kept[n / 2]) / 2.0
    };

    Descriptives {
        n,
        mean,
        std,
        sem: std / (n as f64).sqrt(),
        median,
        min: kept[0],
        max: kept[n - 1],
    }
}

/// Welch's two-sample t-test (unequal variances)
///
/// Degenerate inputs (fewer than two finite values per group) yield NaN
/// statistics rather than an error, like the scipy routines the analysis
/// scripts called.
pub fn welch_t_test(a: &[f64], b: &[f64]) -> TTestResult {
    let a = finite(a);
    let b = finite(b);
    if a.len() < 2 || b.len() < 2 {
        return TTestResult {
            t: f64::NAN,
            df: f64::NAN,
            p: f64::NAN,
        };
    }

    let (na, nb) = (a.len() as f64, b.len() as f64);
    let ma = a.iter().sum::<f64>() / na;
    let mb = b.iter().sum::<f64>() / nb;
    let va = a.iter().map(|v| (v - ma).powi(2)).sum::<f64>() / (na - 1.0);
    let vb = b.iter().map(|v| (v - mb).powi(2)).sum::<f64>() / (nb - 1.0);

    let se2 = va / na + vb / nb;
    let t = (ma - mb) / se2.sqrt();
    let df = se2.powi(2) / ((va / na).powi(2) / (na - 1.0) + (vb / nb).powi(2) / (nb - 1.0));

    TTestResult {
        t,
        df,
        p: two_sided_p(t),
    }
}

/// Student's two-sample t-test with pooled variance
pub fn student_t_test(a: &[f64], b: &[f64]) -> TTestResult {
    let a = finite(a);
    let b = finite(b);
    if a.len() < 2 || b.len() < 2 {
        return TTestResult {
            t: f64::NAN,
            df: f64::NAN,
            p: f64::NAN,
        };
    }

    let (na, nb) = (a.len() as f64, b.len() as f64);
    let ma = a.iter().sum::<f64>() / na;
    let mb = b.iter().sum::<f64>() / nb;
    let ssa: f64 = a.iter().map(|v| (v - ma).powi(2)).sum();
    let ssb: f64 = b.iter().map(|v| (v - mb).powi(2)).sum();

    let df = na + nb - 2.0;
    let pooled = (ssa + ssb) / df;
    let t = (ma - mb) / (pooled * (1.0 / na + 1.0 / nb)).sqrt();

    TTestResult {
        t,
        df,
        p: two_sided_p(t),
    }
}

/// Paired t-test over positionally matched samples
///
/// Pairs where either member is missing are dropped before differencing.
pub fn paired_t_test(a: &[f64], b: &[f64]) -> TTestResult {
    let diffs: Vec<f64> = a
        .iter()
        .zip(b.iter())
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .map(|(x, y)| x - y)
        .collect();

    if diffs.len() < 2 {
        return TTestResult {
            t: f64::NAN,
            df: f64::NAN,
            p: f64::NAN,
        };
    }

    let n = diffs.len() as f64;
    let mean = diffs.iter().sum::<f64>() / n;
    let var = diffs.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let t = mean / (var / n).sqrt();

    TTestResult {
        t,
        df: n - 1.0,
        p: two_sided_p(t),
    }
}

/// One-way ANOVA across condition groups
pub fn one_way_anova(groups: &[Vec<f64>]) -> AnovaResult {
    let groups: Vec<Vec<f64>> = groups.iter().map(|g| finite(g)).collect();
    let k = groups.len();
    let total_n: usize = groups.iter().map(Vec::len).sum();

    if k < 2 || total_n <= k || groups.iter().any(Vec::is_empty) {
        return AnovaResult {
            f: f64::NAN,
            df_between: f64::NAN,
            df_within: f64::NAN,
            p: f64::NAN,
        };
    }

    let grand_mean: f64 = groups.iter().flatten().sum::<f64>() / total_n as f64;

    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    for group in &groups {
        let n = group.len() as f64;
        let mean = group.iter().sum::<f64>() / n;
        ss_between += n * (mean - grand_mean).powi(2);
        ss_within += group.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
    }

    let df_between = (k - 1) as f64;
    let df_within = (total_n - k) as f64;
    let f = (ss_between / df_between) / (ss_within / df_within);

    AnovaResult {
        f,
        df_between,
        df_within,
        p: f_upper_tail(f, df_between, df_within),
    }
}

fn two_sided_p(t: f64) -> f64 {
    if !t.is_finite() {
        return f64::NAN;
    }
    2.0 * (1.0 - normal_cdf(t.abs()))
}

/// Upper-tail F probability via the Paulson cube-root normal transform
fn f_upper_tail(f: f64, df1: f64, df2: f64) -> f64 {
    if !f.is_finite() || f <= 0.0 {
        return f64::NAN;
    }
    let a = 2.0 / (9.0 * df1);
    let b = 2.0 / (9.0 * df2);
    let cube = f.cbrt();
    let z = ((1.0 - b) * cube - (1.0 - a)) / (a + cube * cube * b).sqrt();
    1.0 - normal_cdf(z)
}

/// Standard normal CDF via the error function
fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / 2.0_f64.sqrt()))
}

/// Error function approximation (Abramowitz and Stegun 7.1.26, Horner form)
fn erf(x: f64) -> f64 {
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();

    sign * y
}
