//! Display strings for offer item pricing payloads.
//!
//! A pricing payload is a free-form JSON object (camelCase keys once it
//! has crossed the backend). The first recognised shape wins, in this
//! order: `min`/`max`, `monthlyMin`/`monthlyMax`, `total`, `monthly`,
//! `perHour`, `unit` (+ `unitLabel`), `minTotal`, `surcharge`,
//! `percentSurcharge`. Labels are Polish, matching the site copy.

use serde::{Deserialize, Serialize};
use serde_json::Value;

const DEFAULT_CURRENCY: &str = "PLN";
const PER_MONTH: &str = " / miesiąc";
const RANGE_DASH: char = '–';

/// Formatted price with an optional footnote.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PricingFormatted {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Price text for `pricing`, or an empty string when it is not an object.
pub fn format_pricing(pricing: &Value) -> String {
    format_pricing_detailed(pricing)
        .map(|p| p.value)
        .unwrap_or_default()
}

/// Price text and note for `pricing`; `None` when it is not an object.
pub fn format_pricing_detailed(pricing: &Value) -> Option<PricingFormatted> {
    if !(pricing.is_object() || pricing.is_array()) {
        return None;
    }

    let currency = pricing
        .get("currency")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_CURRENCY);
    let note = pricing
        .get("pricingNote")
        .and_then(Value::as_str)
        .map(str::to_string);
    let net = if pricing.get("net").and_then(Value::as_bool) == Some(true) {
        " netto"
    } else {
        ""
    };

    let money = |key: &str| format_money(pricing.get(key), currency);
    let range = |min_key: &str, max_key: &str| {
        Some(format!("{} {RANGE_DASH} {}{net}", money(min_key)?, money(max_key)?))
    };

    let value = if let Some(r) = range("min", "max") {
        r
    } else if let Some(r) = range("monthlyMin", "monthlyMax") {
        format!("{r}{PER_MONTH}")
    } else if let Some(total) = money("total") {
        format!("{total}{net}")
    } else if let Some(monthly) = money("monthly") {
        format!("{monthly}{net}{PER_MONTH}")
    } else if let Some(per_hour) = money("perHour") {
        format!("{per_hour}{net} / h")
    } else if let Some(unit) = money("unit") {
        match pricing.get("unitLabel").and_then(Value::as_str) {
            Some(label) if !label.is_empty() => format!("{unit}{net} / {label}"),
            _ => format!("{unit}{net}"),
        }
    } else if let Some(min_total) = money("minTotal") {
        format!("od {min_total}{net}")
    } else if let Some(surcharge) = money("surcharge") {
        format!("+{surcharge}{net}")
    } else if let Some(percent) = to_number(pricing.get("percentSurcharge")) {
        format!("+{percent}%{net}")
    } else {
        pricing.to_string()
    };

    Some(PricingFormatted { value, note })
}

/// Like [`format_pricing_detailed`], but marks flat amounts as add-ons with `+`.
///
/// Ranges, minimums, percentages and values already signed are left alone.
pub fn format_addon_pricing(pricing: &Value) -> Option<PricingFormatted> {
    let base = format_pricing_detailed(pricing)?;
    let keep = base.value.starts_with('+')
        || base.value.starts_with("od ")
        || base.value.contains(RANGE_DASH)
        || base.value.contains('%');
    if keep {
        return Some(base);
    }
    Some(PricingFormatted {
        value: format!("+{}", base.value),
        note: base.note,
    })
}

fn to_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        // blank text reads as zero, as the site's number coercion does
        Value::String(s) if s.trim().is_empty() => Some(0.0),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

/// Whole amounts print without decimals, others with two.
fn format_money(value: Option<&Value>, currency: &str) -> Option<String> {
    let n = to_number(value)?;
    if n.fract() == 0.0 {
        Some(format!("{n:.0} {currency}"))
    } else {
        Some(format!("{n:.2} {currency}"))
    }
}
