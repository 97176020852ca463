use std::collections::BTreeMap;

use crate::model::{ComponentDemandRow, SummaryDimension, SummaryRow, SummaryTable};

/// The four summary tables of a report.
#[derive(Debug, Clone)]
pub struct Summaries {
    pub vendor: SummaryTable,
    pub product_line: SummaryTable,
    pub design_group: SummaryTable,
    pub combined: SummaryTable,
}

pub fn build_summaries(rows: &[ComponentDemandRow]) -> Summaries {
    Summaries {
        vendor: summarize(rows, &[SummaryDimension::Vendor]),
        product_line: summarize(rows, &[SummaryDimension::ProductLine]),
        design_group: summarize(rows, &[SummaryDimension::DesignGroup]),
        combined: summarize(rows, &[SummaryDimension::Vendor, SummaryDimension::ProductLine]),
    }
}

/// Sum `total_demand` by the given dimensions, largest first.
///
/// Works from the detail rows, so each summary adds up to the detail total.
pub fn summarize(rows: &[ComponentDemandRow], dimensions: &[SummaryDimension]) -> SummaryTable {
    let mut groups: BTreeMap<Vec<String>, f64> = BTreeMap::new();
    for row in rows {
        let key = dimensions
            .iter()
            .map(|d| d.value(&row.key).to_string())
            .collect();
        *groups.entry(key).or_insert(0.0) += row.total_demand;
    }

    let mut summary: Vec<SummaryRow> = groups
        .into_iter()
        .map(|(key, total_demand)| SummaryRow { key, total_demand })
        .collect();
    summary.sort_by(|a, b| b.total_demand.total_cmp(&a.total_demand));

    SummaryTable {
        dimensions: dimensions.to_vec(),
        rows: summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ComponentKey;
    use std::collections::BTreeMap;

    fn row(vendor: &str, line: &str, group: &str, total: f64) -> ComponentDemandRow {
        ComponentDemandRow {
            key: ComponentKey {
                plant: "2674".into(),
                component: format!("{vendor}-{line}-{group}"),
                description: String::new(),
                vendor: vendor.into(),
                product_line: line.into(),
                design_group: group.into(),
                authoritative_vendor: vendor.into(),
                authoritative_buyer: "B".into(),
                reported_buyer: "B".into(),
            },
            demand: BTreeMap::new(),
            total_demand: total,
        }
    }

    fn rows() -> Vec<ComponentDemandRow> {
        vec![
            row("VEND1", "LINE1", "GROUP1", 10.0),
            row("VEND2", "LINE1", "GROUP2", 40.0),
            row("VEND1", "LINE2", "GROUP1", 5.0),
            row("VEND1", "LINE1", "GROUP2", 2.5),
        ]
    }

    #[test]
    fn vendor_summary_sums_and_sorts() {
        let s = build_summaries(&rows());
        assert_eq!(s.vendor.rows.len(), 2);
        assert_eq!(s.vendor.rows[0].key, vec!["VEND2".to_string()]);
        assert_eq!(s.vendor.get(&["VEND2"]), Some(40.0));
        assert_eq!(s.vendor.get(&["VEND1"]), Some(17.5));
    }

    #[test]
    fn other_single_dimension_summaries() {
        let s = build_summaries(&rows());
        assert_eq!(s.product_line.get(&["LINE1"]), Some(52.5));
        assert_eq!(s.product_line.get(&["LINE2"]), Some(5.0));
        assert_eq!(s.design_group.get(&["GROUP1"]), Some(15.0));
        assert_eq!(s.design_group.get(&["GROUP2"]), Some(42.5));
        assert_eq!(s.design_group.rows[0].key[0], "GROUP2");
    }

    #[test]
    fn combined_summary_keys_on_pair() {
        let s = build_summaries(&rows());
        assert_eq!(s.combined.dimensions, vec![SummaryDimension::Vendor, SummaryDimension::ProductLine]);
        assert_eq!(s.combined.rows.len(), 3);
        assert_eq!(s.combined.get(&["VEND1", "LINE1"]), Some(12.5));
        assert_eq!(s.combined.get(&["VEND1", "LINE2"]), Some(5.0));
        assert_eq!(s.combined.get(&["VEND2", "LINE1"]), Some(40.0));
        assert_eq!(s.combined.get(&["VEND2", "LINE2"]), None);
    }

    #[test]
    fn every_summary_reconciles_to_detail() {
        let detail = rows();
        let total: f64 = detail.iter().map(|r| r.total_demand).sum();
        let s = build_summaries(&detail);
        for table in [&s.vendor, &s.product_line, &s.design_group, &s.combined] {
            assert!((table.total() - total).abs() < 1e-9);
        }
    }

    #[test]
    fn empty_detail_gives_empty_summaries() {
        let s = build_summaries(&[]);
        assert!(s.vendor.is_empty());
        assert!(s.combined.is_empty());
        assert_eq!(s.combined.dimensions.len(), 2);
    }
}
