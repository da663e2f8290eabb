//! Reconciliation of caller-supplied data against a template's key set.
//!
//! Caller input is free-form: arbitrary field names, accented variants,
//! typos. The authoritative key set derived from the template is the only
//! contract downstream code relies on, so this module is the trust boundary
//! that enforces a closed, exact key set. Reconciliation never fails:
//! unmatched input is dropped and missing keys are filled with the sentinel.

use std::collections::{BTreeMap, HashSet};

use serde_json::{Map, Value};
use tracing::debug;

use crate::slug::slugify;
use crate::template::Field;

/// Fixed "no data" marker. Policy-visible: it appears verbatim in the
/// completed document wherever no value could be resolved, and the model is
/// instructed to return it for fields it cannot complete.
pub const NO_DATA: &str = "Sin datos";

/// Authoritative keys of a template, deduplicated in first-occurrence
/// (template line) order.
pub fn authoritative_keys(fields: &[Field]) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for field in fields {
        if !keys.contains(&field.key) {
            keys.push(field.key.clone());
        }
    }
    keys
}

/// Map arbitrary caller-supplied data onto the authoritative key set.
///
/// Every authoritative key appears in the result exactly once: with the
/// caller's value when an input key slugs to it exactly or sits within the
/// fuzzy threshold of it, with the no-data sentinel otherwise. Input keys
/// matching nothing are dropped silently.
///
/// Caller entries are processed in `serde_json::Map` order (lexicographic by
/// key), which is stable across request representations: among exact-equal
/// duplicates the last writer wins, and in the fuzzy pass the first
/// processed input claims a key. Ties among equally-similar authoritative
/// keys break to template order.
pub fn reconcile(
    user_data: &Map<String, Value>,
    authoritative: &[String],
) -> BTreeMap<String, String> {
    let mut out: BTreeMap<String, String> = authoritative
        .iter()
        .map(|key| (key.clone(), NO_DATA.to_string()))
        .collect();
    let mut assigned: HashSet<String> = HashSet::new();
    let mut unmatched: Vec<(String, &Value)> = Vec::new();

    for (input_key, value) in user_data {
        let slugged = slugify(input_key);
        if out.contains_key(&slugged) {
            out.insert(slugged.clone(), coerce_value(value));
            assigned.insert(slugged);
        } else {
            unmatched.push((slugged, value));
        }
    }

    for (slugged, value) in unmatched {
        match best_fuzzy_match(&slugged, authoritative, &assigned) {
            Some(key) => {
                debug!("fuzzy-matched input key '{slugged}' to '{key}'");
                out.insert(key.clone(), coerce_value(value));
                assigned.insert(key);
            }
            None => debug!("discarding input key '{slugged}': no authoritative match"),
        }
    }

    out
}

/// Best still-unassigned authoritative key within the fuzzy threshold, if
/// any.
///
/// Candidates are ranked by normalized Levenshtein ratio. Comparisons stay
/// in integers (cross-multiplied distance/length ratios), so the inclusive
/// 0.8 acceptance boundary is exact: the floating-point ratio for one edit
/// over five characters computes to just under 0.8 and would miss it.
fn best_fuzzy_match(
    input: &str,
    authoritative: &[String],
    assigned: &HashSet<String>,
) -> Option<String> {
    let input_len = input.chars().count();
    let mut best: Option<(&String, usize, usize)> = None;
    for key in authoritative {
        if assigned.contains(key) {
            continue;
        }
        let distance = strsim::levenshtein(input, key);
        let max_len = input_len.max(key.chars().count());
        let improves = match best {
            // Strictly better ratio only: the first enumerated key, in
            // template order, keeps ties.
            Some((_, best_distance, best_len)) => distance * best_len < best_distance * max_len,
            None => true,
        };
        if improves {
            best = Some((key, distance, max_len));
        }
    }
    // ratio >= 0.8  <=>  1 - d/len >= 4/5  <=>  5*d <= len
    best.and_then(|(key, distance, max_len)| (distance * 5 <= max_len).then(|| key.clone()))
}

/// Boundary coercion of an arbitrary caller value into the display string
/// written into the document. Total over every JSON shape: null and blank
/// strings become the sentinel, objects and arrays their compact JSON text,
/// other scalars their display form.
pub fn coerce_value(value: &Value) -> String {
    match value {
        Value::Null => NO_DATA.to_string(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                NO_DATA.to_string()
            } else {
                trimmed.to_string()
            }
        }
        other => other.to_string(),
    }
}
