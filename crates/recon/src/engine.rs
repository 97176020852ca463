use chrono::NaiveDate;
use log::{debug, info};

use crate::aggregate::aggregate_components;
use crate::config::PipelineConfig;
use crate::error::ReconError;
use crate::evidence::{log_diagnostics, sample_keys};
use crate::inconsistency::detect_inconsistencies;
use crate::join::join_demand_bom;
use crate::loader::{load_demand, BomSource};
use crate::model::{
    BomRecord, ComponentDemandRow, ComponentDemandTable, DemandRecord, DemandReport, Diagnostics,
    InconsistencyReport, PivotTable, ReportMeta, SummaryTable,
};
use crate::pivot::build_pivot;
use crate::summary::build_summaries;
use crate::table::{CellValue, NamedTable, RawTable};

pub const COMPONENT_DEMAND: &str = "Component Demand";
pub const DEMAND_TIMELINE: &str = "Demand Timeline";
pub const VENDOR_SUMMARY: &str = "Vendor Summary";
pub const PRODUCT_LINE_SUMMARY: &str = "Product Line Summary";
pub const DESIGN_GROUP_SUMMARY: &str = "Design Group Summary";
pub const COMBINED_SUMMARY: &str = "Combined Summary";
pub const INCONSISTENCY_REPORT: &str = "Inconsistency Report";

/// Output table names in sink order.
pub const TABLE_NAMES: [&str; 7] = [
    COMPONENT_DEMAND,
    DEMAND_TIMELINE,
    VENDOR_SUMMARY,
    PRODUCT_LINE_SUMMARY,
    DESIGN_GROUP_SUMMARY,
    COMBINED_SUMMARY,
    INCONSISTENCY_REPORT,
];

const COMPONENT_COLUMNS: [&str; 9] = [
    "Plant",
    "Component",
    "Description",
    "Vendor",
    "Product_Line",
    "Design_Group",
    "PT_Vend",
    "PT_Buyer",
    "POD_CHR08",
];

const TIMELINE_COLUMNS: [&str; 12] = [
    "Plant",
    "ps_par",
    "ps_comp",
    "pt_desc1",
    "pt_desc2",
    "ps_qty_per",
    "po_vend",
    "pt_prod_line",
    "pt_dsgn_grp",
    "pt_vend",
    "pt_buyer",
    "pod__chr08",
];

const TOTAL_DEMAND: &str = "Total_Demand";

/// Run the pipeline over pre-loaded records.
///
/// Empty demand yields an empty report whether or not BOM rows exist;
/// non-empty demand with no BOM rows is an error. Typed records carry no
/// blank quantities, so `blank_quantities` is always zero here.
pub fn run(
    config: &PipelineConfig,
    demand: &[DemandRecord],
    bom: &[BomRecord],
) -> Result<DemandReport, ReconError> {
    reconcile(config, demand, bom, 0)
}

fn reconcile(
    config: &PipelineConfig,
    demand: &[DemandRecord],
    bom: &[BomRecord],
    blank_quantities: usize,
) -> Result<DemandReport, ReconError> {
    if !demand.is_empty() && bom.is_empty() {
        return Err(ReconError::MissingBomData {
            demand_rows: demand.len(),
        });
    }

    info!(
        "Analyzing {} demand row(s) against {} BOM row(s)",
        demand.len(),
        bom.len()
    );

    let joined = join_demand_bom(demand, bom);
    debug!(
        "join: {} row(s), {} unmatched",
        joined.rows.len(),
        joined.unmatched_rows
    );

    let pivot = build_pivot(&joined.rows);
    let component_demand = aggregate_components(&pivot.table);
    let summaries = build_summaries(&component_demand.rows);
    let inconsistencies = detect_inconsistencies(&component_demand);

    let limit = config.diagnostics.sample_limit;
    let diagnostics = Diagnostics {
        demand_rows: demand.len(),
        bom_rows: bom.len(),
        joined_rows: joined.rows.len(),
        unmatched_rows: joined.unmatched_rows,
        unmatched_items: sample_keys(&joined.unmatched_items, limit),
        undated_rows: pivot.undated_rows,
        undated_items: sample_keys(&pivot.undated_items, limit),
        blank_quantities,
    };
    log_diagnostics(&diagnostics);

    info!(
        "Component demand calculation completed: {} component row(s), {} date(s), {}",
        component_demand.rows.len(),
        component_demand.dates.len(),
        inconsistencies.status_message()
    );

    Ok(DemandReport {
        meta: ReportMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        diagnostics,
        pivot: pivot.table,
        component_demand,
        vendor_summary: summaries.vendor,
        product_line_summary: summaries.product_line,
        design_group_summary: summaries.design_group,
        combined_summary: summaries.combined,
        inconsistencies,
    })
}

/// Run the pipeline from a raw demand table and a BOM source.
///
/// Normalizes demand headers, loads typed records, then delegates to
/// [`run`]. A demand table without the item-number column fails here.
pub fn run_tables(
    config: &PipelineConfig,
    demand: &RawTable,
    bom_source: &dyn BomSource,
) -> Result<DemandReport, ReconError> {
    let mut demand_table = demand.clone();
    demand_table.normalize_columns();
    let loaded = load_demand(&demand_table, &config.demand)?;
    info!("Demand data loaded. {} rows found.", loaded.records.len());

    let bom = bom_source.supply()?;

    reconcile(config, &loaded.records, &bom, loaded.blank_quantities)
}

// ---------------------------------------------------------------------------
// Named tables
// ---------------------------------------------------------------------------

impl DemandReport {
    /// All seven output tables, in sink order. Every table is present even
    /// when it has no rows.
    pub fn tables(&self) -> Vec<NamedTable> {
        vec![
            component_demand_table(&self.component_demand),
            timeline_table(&self.pivot),
            summary_table(VENDOR_SUMMARY, &self.vendor_summary),
            summary_table(PRODUCT_LINE_SUMMARY, &self.product_line_summary),
            summary_table(DESIGN_GROUP_SUMMARY, &self.design_group_summary),
            summary_table(COMBINED_SUMMARY, &self.combined_summary),
            inconsistency_table(&self.inconsistencies),
        ]
    }

    pub fn table(&self, name: &str) -> Option<NamedTable> {
        self.tables().into_iter().find(|t| t.name == name)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn date_header(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn headers(fixed: &[&str], dates: &[NaiveDate]) -> Vec<String> {
    fixed
        .iter()
        .map(|c| c.to_string())
        .chain(dates.iter().map(date_header))
        .collect()
}

fn component_cells(row: &ComponentDemandRow, dates: &[NaiveDate]) -> Vec<CellValue> {
    let k = &row.key;
    let mut cells: Vec<CellValue> = [
        &k.plant,
        &k.component,
        &k.description,
        &k.vendor,
        &k.product_line,
        &k.design_group,
        &k.authoritative_vendor,
        &k.authoritative_buyer,
        &k.reported_buyer,
    ]
    .into_iter()
    .map(|s| CellValue::text(s.as_str()))
    .collect();
    cells.extend(
        dates
            .iter()
            .map(|d| CellValue::Number(row.demand.get(d).copied().unwrap_or(0.0))),
    );
    cells.push(CellValue::Number(row.total_demand));
    cells
}

fn component_demand_table(table: &ComponentDemandTable) -> NamedTable {
    let mut columns = headers(&COMPONENT_COLUMNS, &table.dates);
    columns.push(TOTAL_DEMAND.into());

    let mut out = NamedTable::new(COMPONENT_DEMAND, columns);
    out.rows = table
        .rows
        .iter()
        .map(|r| component_cells(r, &table.dates))
        .collect();
    out
}

fn timeline_table(pivot: &PivotTable) -> NamedTable {
    let mut columns = headers(&TIMELINE_COLUMNS, &pivot.dates);
    columns.extend(pivot.dates.iter().map(|d| format!("Demand_{}", date_header(d))));

    let mut out = NamedTable::new(DEMAND_TIMELINE, columns);
    for row in &pivot.rows {
        let k = &row.key;
        let mut cells: Vec<CellValue> = vec![
            CellValue::text(k.plant.as_str()),
            CellValue::text(k.parent_item.as_str()),
            CellValue::text(k.component.as_str()),
            CellValue::text(k.component_desc1.as_str()),
            CellValue::text(k.component_desc2.as_str()),
            CellValue::Number(k.qty_per.into_inner()),
            CellValue::text(k.vendor.as_str()),
            CellValue::text(k.product_line.as_str()),
            CellValue::text(k.design_group.as_str()),
            CellValue::text(k.authoritative_vendor.as_str()),
            CellValue::text(k.authoritative_buyer.as_str()),
            CellValue::text(k.reported_buyer.as_str()),
        ];
        for map in [&row.quantities, &row.demand] {
            cells.extend(
                pivot
                    .dates
                    .iter()
                    .map(|d| CellValue::Number(map.get(d).copied().unwrap_or(0.0))),
            );
        }
        out.rows.push(cells);
    }
    out
}

fn summary_table(name: &str, summary: &SummaryTable) -> NamedTable {
    let mut columns: Vec<String> = summary
        .dimensions
        .iter()
        .map(|d| d.column_name().to_string())
        .collect();
    columns.push(TOTAL_DEMAND.into());

    let mut out = NamedTable::new(name, columns);
    out.rows = summary
        .rows
        .iter()
        .map(|r| {
            let mut cells: Vec<CellValue> = r.key.iter().map(|k| CellValue::text(k.as_str())).collect();
            cells.push(CellValue::Number(r.total_demand));
            cells
        })
        .collect();
    out
}

fn inconsistency_table(report: &InconsistencyReport) -> NamedTable {
    let mut columns = headers(&COMPONENT_COLUMNS, &report.dates);
    columns.push(TOTAL_DEMAND.into());
    columns.push("Vendor_Mismatch".into());
    columns.push("Buyer_Mismatch".into());

    let mut out = NamedTable::new(INCONSISTENCY_REPORT, columns);
    out.rows = report
        .rows
        .iter()
        .map(|r| {
            let mut cells = component_cells(&r.row, &report.dates);
            cells.push(CellValue::Bool(r.vendor_mismatch));
            cells.push(CellValue::Bool(r.buyer_mismatch));
            cells
        })
        .collect();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MockBomSource;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn bom(parent: &str, comp: &str, qty_per: f64, vendor: &str, pt_vend: &str) -> BomRecord {
        BomRecord {
            plant: "2674".into(),
            parent_item: parent.into(),
            component: comp.into(),
            component_desc1: "Desc".into(),
            component_desc2: "Detail".into(),
            qty_per,
            vendor: vendor.into(),
            product_line: "LINE1".into(),
            design_group: "GROUP1".into(),
            authoritative_vendor: pt_vend.into(),
            authoritative_buyer: "B1".into(),
            reported_buyer: "B1".into(),
        }
    }

    fn demand_table(rows: Vec<Vec<CellValue>>) -> RawTable {
        RawTable::with_rows(
            vec!["Item Number ".into(), " Date".into(), "Discrete Qty".into()],
            rows,
        )
    }

    #[test]
    fn scenario_single_component() {
        let d = vec![DemandRecord::new("PART1", Some(date("2024-01-01")), 10.0)];
        let b = vec![bom("PART1", "COMP1", 2.0, "VEND1", "VEND1")];
        let report = run(&PipelineConfig::default(), &d, &b).unwrap();

        let row = report.component_demand.find("2674", "COMP1").unwrap();
        assert_eq!(row.demand[&date("2024-01-01")], 20.0);
        assert_eq!(row.total_demand, 20.0);
        assert!(report.inconsistencies.is_empty());
        assert!(!report.diagnostics.has_warnings());
    }

    #[test]
    fn scenario_unmatched_item() {
        let d = vec![
            DemandRecord::new("PART1", Some(date("2024-01-01")), 10.0),
            DemandRecord::new("PART9", Some(date("2024-01-01")), 4.0),
        ];
        let b = vec![bom("PART1", "COMP1", 2.0, "VEND1", "VEND1")];
        let report = run(&PipelineConfig::default(), &d, &b).unwrap();

        assert_eq!(report.diagnostics.joined_rows, 2);
        assert_eq!(report.diagnostics.unmatched_rows, 1);
        assert_eq!(report.diagnostics.unmatched_items.distinct, 1);
        assert_eq!(report.diagnostics.unmatched_items.sample, vec!["PART9".to_string()]);
        assert_eq!(report.component_demand.rows.len(), 1);
        assert_eq!(report.component_demand.total_demand(), 20.0);
    }

    #[test]
    fn scenario_vendor_mismatch() {
        let d = vec![DemandRecord::new("PART1", Some(date("2024-01-01")), 1.0)];
        let b = vec![bom("PART1", "COMP1", 1.0, "VEND1", "VEND2")];
        let report = run(&PipelineConfig::default(), &d, &b).unwrap();
        assert_eq!(report.inconsistencies.rows.len(), 1);
        assert!(report.inconsistencies.rows[0].vendor_mismatch);
        assert!(!report.inconsistencies.rows[0].buyer_mismatch);
    }

    #[test]
    fn scenario_empty_demand() {
        let report = run(&PipelineConfig::default(), &[], &[]).unwrap();
        let tables = report.tables();
        assert_eq!(tables.len(), 7);
        for (table, name) in tables.iter().zip(TABLE_NAMES) {
            assert_eq!(table.name, name);
            assert!(table.is_empty(), "{name} should be empty");
        }
        assert_eq!(report.inconsistencies.status_message(), "No inconsistencies found");
    }

    #[test]
    fn empty_demand_with_bom_is_not_an_error() {
        let b = vec![bom("PART1", "COMP1", 2.0, "V", "V")];
        let report = run(&PipelineConfig::default(), &[], &b).unwrap();
        assert!(report.component_demand.is_empty());
        assert_eq!(report.diagnostics.bom_rows, 1);
    }

    #[test]
    fn demand_without_bom_is_fatal() {
        let d = vec![DemandRecord::new("PART1", Some(date("2024-01-01")), 1.0)];
        let err = run(&PipelineConfig::default(), &d, &[]).unwrap_err();
        assert_eq!(err, ReconError::MissingBomData { demand_rows: 1 });
    }

    #[test]
    fn sample_limit_bounds_unmatched_listing() {
        let d: Vec<DemandRecord> = (0..15)
            .map(|i| DemandRecord::new(format!("MISSING{i:02}"), Some(date("2024-01-01")), 1.0))
            .collect();
        let b = vec![bom("PART1", "COMP1", 1.0, "V", "V")];
        let mut config = PipelineConfig::default();
        config.diagnostics.sample_limit = 4;
        let report = run(&config, &d, &b).unwrap();
        let items = &report.diagnostics.unmatched_items;
        assert_eq!(items.distinct, 15);
        assert_eq!(items.sample.len(), 4);
        assert_eq!(items.omitted, 11);
        assert_eq!(items.sample[0], "MISSING00");
    }

    #[test]
    fn run_tables_normalizes_and_uses_source() {
        let table = demand_table(vec![
            vec!["PART1".into(), "2024-01-01".into(), 10.0.into()],
            vec!["PART2".into(), "bad date".into(), 3.0.into()],
            vec!["PART3".into(), "2024-01-02".into(), CellValue::Empty],
        ]);
        let report = run_tables(&PipelineConfig::default(), &table, &MockBomSource).unwrap();

        assert_eq!(report.diagnostics.undated_rows, 1);
        assert_eq!(report.diagnostics.undated_items.sample, vec!["PART2".to_string()]);
        assert_eq!(report.diagnostics.blank_quantities, 1);
        // PART1 x 2 on 2024-01-01; PART3 blank qty contributes 0 on 2024-01-02.
        assert_eq!(report.component_demand.dates.len(), 2);
        let comp1 = report.component_demand.find("2674", "COMP1").unwrap();
        assert_eq!(comp1.total_demand, 20.0);
        assert_eq!(report.component_demand.rows[0].key.component, "COMP1");
    }

    #[test]
    fn run_reports_no_blank_quantities_for_typed_records() {
        let d = vec![DemandRecord::new("PART1", Some(date("2024-01-01")), 0.0)];
        let b = vec![bom("PART1", "COMP1", 2.0, "V", "V")];
        let report = run(&PipelineConfig::default(), &d, &b).unwrap();
        assert_eq!(report.diagnostics.blank_quantities, 0);
        assert!(!report.diagnostics.has_warnings());
    }

    #[test]
    fn run_tables_missing_item_column_is_fatal() {
        let table = RawTable::with_rows(
            vec!["Part".into(), "Date".into(), "Discrete Qty".into()],
            vec![vec!["PART1".into(), "2024-01-01".into(), 1.0.into()]],
        );
        let err = run_tables(&PipelineConfig::default(), &table, &MockBomSource).unwrap_err();
        assert_eq!(err, ReconError::missing_column("demand", "Item Number"));
    }

    #[test]
    fn component_table_layout() {
        let d = vec![
            DemandRecord::new("PART1", Some(date("2024-01-02")), 1.0),
            DemandRecord::new("PART1", Some(date("2024-01-01")), 2.0),
        ];
        let b = vec![bom("PART1", "COMP1", 3.0, "VEND1", "VEND1")];
        let report = run(&PipelineConfig::default(), &d, &b).unwrap();
        let table = report.table(COMPONENT_DEMAND).unwrap();

        assert_eq!(&table.columns[..9], &COMPONENT_COLUMNS.map(String::from)[..]);
        assert_eq!(table.columns[9], "2024-01-01");
        assert_eq!(table.columns[10], "2024-01-02");
        assert_eq!(table.columns[11], "Total_Demand");
        assert_eq!(table.rows[0][9], CellValue::Number(6.0));
        assert_eq!(table.rows[0][10], CellValue::Number(3.0));
        assert_eq!(table.rows[0][11], CellValue::Number(9.0));
    }

    #[test]
    fn timeline_table_has_quantity_and_demand_columns() {
        let d = vec![DemandRecord::new("PART1", Some(date("2024-01-01")), 2.0)];
        let b = vec![bom("PART1", "COMP1", 1.5, "VEND1", "VEND1")];
        let report = run(&PipelineConfig::default(), &d, &b).unwrap();
        let table = report.table(DEMAND_TIMELINE).unwrap();

        assert_eq!(table.columns.len(), 14);
        assert_eq!(table.columns[12], "2024-01-01");
        assert_eq!(table.columns[13], "Demand_2024-01-01");
        assert_eq!(table.rows[0][5], CellValue::Number(1.5));
        assert_eq!(table.rows[0][12], CellValue::Number(2.0));
        assert_eq!(table.rows[0][13], CellValue::Number(3.0));
    }

    #[test]
    fn summary_and_inconsistency_tables() {
        let d = vec![DemandRecord::new("PART1", Some(date("2024-01-01")), 1.0)];
        let b = vec![bom("PART1", "COMP1", 1.0, "VEND1", "VEND2")];
        let report = run(&PipelineConfig::default(), &d, &b).unwrap();

        let combined = report.table(COMBINED_SUMMARY).unwrap();
        assert_eq!(combined.columns, vec!["Vendor", "Product_Line", "Total_Demand"]);
        assert_eq!(combined.rows[0], vec!["VEND1".into(), "LINE1".into(), CellValue::Number(1.0)]);

        let inconsistent = report.table(INCONSISTENCY_REPORT).unwrap();
        let n = inconsistent.columns.len();
        assert_eq!(inconsistent.columns[n - 2], "Vendor_Mismatch");
        assert_eq!(inconsistent.rows[0][n - 2], CellValue::Bool(true));
        assert_eq!(inconsistent.rows[0][n - 1], CellValue::Bool(false));
    }

    #[test]
    fn report_serializes_to_json() {
        let d = vec![DemandRecord::new("PART1", Some(date("2024-01-01")), 10.0)];
        let b = vec![bom("PART1", "COMP1", 2.0, "VEND1", "VEND1")];
        let report = run(&PipelineConfig::default(), &d, &b).unwrap();
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        let row = &json["component_demand"]["rows"][0];
        assert_eq!(row["component"], "COMP1");
        assert_eq!(row["demand"]["2024-01-01"], 20.0);
        assert_eq!(row["total_demand"], 20.0);
        assert_eq!(json["meta"]["engine_version"], env!("CARGO_PKG_VERSION"));
    }
}
