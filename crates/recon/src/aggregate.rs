use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::model::{ComponentDemandRow, ComponentDemandTable, ComponentKey, PivotTable};

/// Roll pivot rows up to component level, sum demand per date, total it,
/// and order by total demand descending.
///
/// Several parents can drive the same component, so `parent_item` and
/// `qty_per` are not part of the key. The sort is stable: equal totals stay
/// in key order.
pub fn aggregate_components(pivot: &PivotTable) -> ComponentDemandTable {
    let mut groups: BTreeMap<ComponentKey, BTreeMap<NaiveDate, f64>> = BTreeMap::new();

    for row in &pivot.rows {
        let entry = groups.entry(row.key.component_key()).or_insert_with(|| {
            pivot.dates.iter().map(|d| (*d, 0.0)).collect()
        });
        for (date, value) in &row.demand {
            *entry.entry(*date).or_insert(0.0) += value;
        }
    }

    let mut rows: Vec<ComponentDemandRow> = groups
        .into_iter()
        .map(|(key, demand)| {
            let total_demand: f64 = demand.values().sum();
            ComponentDemandRow {
                key,
                demand,
                total_demand,
            }
        })
        .collect();

    rows.sort_by(|a, b| b.total_demand.total_cmp(&a.total_demand));

    ComponentDemandTable {
        dates: pivot.dates.clone(),
        rows,
    }
}
