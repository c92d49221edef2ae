use crate::models::PaymentPlatforms;

/// Compact visit counts: `1.5B` / `15.0亿`, `3.2M` / `3.2百万`, otherwise grouped digits.
pub fn format_number(value: f64, language: &str) -> String {
    let chinese = language == "zh";
    let abs = value.abs();
    let sign = if value < 0.0 { "-" } else { "" };

    if chinese && abs >= 100_000_000.0 {
        format!("{sign}{:.1}亿", abs / 100_000_000.0)
    } else if !chinese && abs >= 1_000_000_000.0 {
        format!("{sign}{:.1}B", abs / 1_000_000_000.0)
    } else if abs >= 1_000_000.0 {
        if chinese {
            format!("{sign}{:.1}百万", abs / 1_000_000.0)
        } else {
            format!("{sign}{:.1}M", abs / 1_000_000.0)
        }
    } else {
        // Up to three fraction digits, trailing zeros dropped
        let fixed = format!("{abs:.3}");
        let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
        let fraction = fraction.trim_end_matches('0');
        let whole = group_thousands(whole.parse().unwrap_or_default());
        if fraction.is_empty() {
            format!("{sign}{whole}")
        } else {
            format!("{sign}{whole}.{fraction}")
        }
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn format_growth_rate(rate: f64) -> String {
    let sign = if rate >= 0.0 { "+" } else { "" };
    format!("{sign}{:.1}%", rate * 100.0)
}

/// Signed growth with its rate, e.g. `+1.2M (+15.0%)`.
pub fn format_growth(growth: f64, rate: f64, language: &str) -> String {
    let sign = if growth > 0.0 {
        "+"
    } else if growth < 0.0 {
        "-"
    } else {
        ""
    };
    format!(
        "{sign}{} ({})",
        format_number(growth.abs(), language),
        format_growth_rate(rate)
    )
}

pub fn format_income(income: f64) -> String {
    if income >= 1_000_000.0 {
        format!("${:.1}M", income / 1_000_000.0)
    } else if income >= 1_000.0 {
        format!("${:.1}K", income / 1_000.0)
    } else {
        format!("${}", income)
    }
}

pub fn payment_label(platforms: Option<&PaymentPlatforms>) -> String {
    match platforms {
        Some(p) if !p.names().is_empty() => p.names().join(", "),
        _ => "-".to_string(),
    }
}
