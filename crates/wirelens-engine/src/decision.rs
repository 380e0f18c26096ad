use serde_json::Value;
use wirelens_contracts::{Judgment, Verdict};

use crate::truncate_text;

/// Reason reported when the service returned nothing usable.
pub const NO_CONTENT_REASON: &str = "no usable content returned";
/// Judgment label substituted when the reply omits the judgment key.
const MISSING_JUDGMENT_LABEL: &str = "오류";
/// Reason substituted when the reply omits the reason key.
const MISSING_REASON: &str = "이유를 파악할 수 없음";
/// Bound on raw text leaked into a fallback reason.
const RAW_REASON_MAX_CHARS: usize = 200;

/// Interprets the raw inference reply as a verdict. Total: every
/// reachable reply shape maps to a verdict, and every ambiguity
/// collapses to indeterminate rather than guessing, since a false
/// "normal" costs more than a false "indeterminate".
pub fn parse_verdict(raw: &str) -> Verdict {
    if raw.trim().is_empty() {
        return Verdict::indeterminate(NO_CONTENT_REASON);
    }

    let Ok(parsed) = serde_json::from_str::<Value>(raw) else {
        return Verdict::indeterminate(truncate_text(raw, RAW_REASON_MAX_CHARS));
    };
    let Some(record) = parsed.as_object() else {
        return Verdict::indeterminate(truncate_text(raw, RAW_REASON_MAX_CHARS));
    };

    let label = record
        .get("판단")
        .and_then(Value::as_str)
        .unwrap_or(MISSING_JUDGMENT_LABEL);
    let reason = record
        .get("이유")
        .and_then(Value::as_str)
        .unwrap_or(MISSING_REASON);
    Verdict::new(Judgment::from_label(label), reason)
}
