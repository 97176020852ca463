use std::collections::{HashMap, HashSet};

use crate::model::{BomRecord, DemandRecord, JoinedRow};

/// Left-outer join result.
#[derive(Debug)]
pub struct JoinOutput<'a> {
    pub rows: Vec<JoinedRow<'a>>,
    /// Demand rows with no BOM match.
    pub unmatched_rows: usize,
    /// Item numbers of unmatched rows, deduplicated, in first-seen order.
    pub unmatched_items: Vec<String>,
}

/// Join demand to BOM on `item_number = parent_item`.
///
/// Demand order is kept; a row with several BOM matches expands in BOM
/// order. A row with no match appears once with `bom: None`. Blank item
/// numbers never match.
pub fn join_demand_bom<'a>(demand: &'a [DemandRecord], bom: &'a [BomRecord]) -> JoinOutput<'a> {
    let mut by_parent: HashMap<&str, Vec<&BomRecord>> = HashMap::new();
    for b in bom {
        by_parent.entry(b.parent_item.as_str()).or_default().push(b);
    }

    let mut rows = Vec::with_capacity(demand.len());
    let mut unmatched_rows = 0;
    let mut unmatched_items: Vec<String> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for d in demand {
        let matches = if d.item_number.is_empty() {
            None
        } else {
            by_parent.get(d.item_number.as_str())
        };

        match matches {
            Some(boms) => {
                rows.extend(boms.iter().map(|b| JoinedRow {
                    demand: d,
                    bom: Some(*b),
                }));
            }
            None => {
                unmatched_rows += 1;
                if seen.insert(d.item_number.as_str()) {
                    unmatched_items.push(d.item_number.clone());
                }
                rows.push(JoinedRow { demand: d, bom: None });
            }
        }
    }

    JoinOutput {
        rows,
        unmatched_rows,
        unmatched_items,
    }
}
