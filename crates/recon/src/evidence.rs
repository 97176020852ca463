use log::warn;

use crate::model::{Diagnostics, KeySample};

/// Bounded sample of distinct keys: the first `limit`, plus how many more.
pub fn sample_keys(keys: &[String], limit: usize) -> KeySample {
    let shown = keys.len().min(limit);
    KeySample {
        distinct: keys.len(),
        sample: keys[..shown].to_vec(),
        omitted: keys.len() - shown,
    }
}

/// Emit one warning per recoverable finding.
pub fn log_diagnostics(diagnostics: &Diagnostics) {
    if diagnostics.unmatched_rows > 0 {
        let items = &diagnostics.unmatched_items;
        warn!(
            "{} part(s) don't have BOM data ({} demand row(s)): {}",
            items.distinct,
            diagnostics.unmatched_rows,
            describe(items)
        );
    }

    if diagnostics.undated_rows > 0 {
        warn!(
            "{} demand row(s) have an unreadable date and were left out of the timeline: {}",
            diagnostics.undated_rows,
            describe(&diagnostics.undated_items)
        );
    }

    if diagnostics.blank_quantities > 0 {
        warn!(
            "{} demand row(s) have a blank quantity; counted as 0",
            diagnostics.blank_quantities
        );
    }
}

fn describe(sample: &KeySample) -> String {
    let mut out = sample.sample.join(", ");
    if sample.omitted > 0 {
        out.push_str(&format!(" ... and {} more", sample.omitted));
    }
    out
}
