use std::collections::BTreeMap;

use chrono::NaiveDate;
use ordered_float::OrderedFloat;
use serde::Serialize;

use crate::table::CellValue;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One scheduled shipment / order line from the demand export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemandRecord {
    pub item_number: String,
    pub plant: Option<String>,
    /// `None` when the source value could not be read as a date.
    pub date: Option<NaiveDate>,
    pub discrete_qty: f64,
    /// Columns the engine does not use, carried through untouched.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, CellValue>,
}

impl DemandRecord {
    pub fn new(item_number: impl Into<String>, date: Option<NaiveDate>, discrete_qty: f64) -> Self {
        Self {
            item_number: item_number.into(),
            plant: None,
            date,
            discrete_qty,
            extra: BTreeMap::new(),
        }
    }
}

/// One parent → component relationship from the BOM extract.
///
/// Text attributes are never null: blanks in the source arrive as `""`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BomRecord {
    pub plant: String,
    pub parent_item: String,
    pub component: String,
    pub component_desc1: String,
    pub component_desc2: String,
    pub qty_per: f64,
    pub vendor: String,
    pub product_line: String,
    pub design_group: String,
    pub authoritative_vendor: String,
    pub authoritative_buyer: String,
    pub reported_buyer: String,
}

// ---------------------------------------------------------------------------
// Join
// ---------------------------------------------------------------------------

/// A demand row paired with one of its BOM rows, or with none.
#[derive(Debug, Clone, Copy)]
pub struct JoinedRow<'a> {
    pub demand: &'a DemandRecord,
    pub bom: Option<&'a BomRecord>,
}

impl JoinedRow<'_> {
    pub fn is_matched(&self) -> bool {
        self.bom.is_some()
    }
}

// ---------------------------------------------------------------------------
// Pivot
// ---------------------------------------------------------------------------

/// Full grouping key of the date pivot. Field order is sort order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PivotKey {
    pub plant: String,
    pub parent_item: String,
    pub component: String,
    pub component_desc1: String,
    pub component_desc2: String,
    pub qty_per: OrderedFloat<f64>,
    pub vendor: String,
    pub product_line: String,
    pub design_group: String,
    pub authoritative_vendor: String,
    pub authoritative_buyer: String,
    pub reported_buyer: String,
}

impl PivotKey {
    pub fn from_bom(bom: &BomRecord) -> Self {
        Self {
            plant: bom.plant.clone(),
            parent_item: bom.parent_item.clone(),
            component: bom.component.clone(),
            component_desc1: bom.component_desc1.clone(),
            component_desc2: bom.component_desc2.clone(),
            qty_per: OrderedFloat(bom.qty_per),
            vendor: bom.vendor.clone(),
            product_line: bom.product_line.clone(),
            design_group: bom.design_group.clone(),
            authoritative_vendor: bom.authoritative_vendor.clone(),
            authoritative_buyer: bom.authoritative_buyer.clone(),
            reported_buyer: bom.reported_buyer.clone(),
        }
    }

    /// Drop `parent_item`, `qty_per` and `component_desc2`.
    pub fn component_key(&self) -> ComponentKey {
        ComponentKey {
            plant: self.plant.clone(),
            component: self.component.clone(),
            description: self.component_desc1.clone(),
            vendor: self.vendor.clone(),
            product_line: self.product_line.clone(),
            design_group: self.design_group.clone(),
            authoritative_vendor: self.authoritative_vendor.clone(),
            authoritative_buyer: self.authoritative_buyer.clone(),
            reported_buyer: self.reported_buyer.clone(),
        }
    }
}

/// One pivot row. Both maps hold every date of the owning [`PivotTable`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotRow {
    #[serde(flatten)]
    pub key: PivotKey,
    /// Summed `discrete_qty` per date.
    pub quantities: BTreeMap<NaiveDate, f64>,
    /// `quantities` × `qty_per` per date.
    pub demand: BTreeMap<NaiveDate, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PivotTable {
    /// Distinct dates seen in the pivoted rows, ascending.
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<PivotRow>,
}

impl PivotTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Component demand
// ---------------------------------------------------------------------------

/// Component-level grouping key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ComponentKey {
    pub plant: String,
    pub component: String,
    pub description: String,
    pub vendor: String,
    pub product_line: String,
    pub design_group: String,
    pub authoritative_vendor: String,
    pub authoritative_buyer: String,
    pub reported_buyer: String,
}

impl ComponentKey {
    pub fn vendor_mismatch(&self) -> bool {
        self.authoritative_vendor != self.vendor
    }

    pub fn buyer_mismatch(&self) -> bool {
        self.authoritative_buyer != self.reported_buyer
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentDemandRow {
    #[serde(flatten)]
    pub key: ComponentKey,
    pub demand: BTreeMap<NaiveDate, f64>,
    pub total_demand: f64,
}

/// The primary deliverable: component demand per date, largest total first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComponentDemandTable {
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<ComponentDemandRow>,
}

impl ComponentDemandTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total_demand(&self) -> f64 {
        self.rows.iter().map(|r| r.total_demand).sum()
    }

    pub fn find(&self, plant: &str, component: &str) -> Option<&ComponentDemandRow> {
        self.rows
            .iter()
            .find(|r| r.key.plant == plant && r.key.component == component)
    }
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryDimension {
    Vendor,
    ProductLine,
    DesignGroup,
}

impl SummaryDimension {
    pub fn column_name(&self) -> &'static str {
        match self {
            Self::Vendor => "Vendor",
            Self::ProductLine => "Product_Line",
            Self::DesignGroup => "Design_Group",
        }
    }

    pub fn value<'a>(&self, key: &'a ComponentKey) -> &'a str {
        match self {
            Self::Vendor => &key.vendor,
            Self::ProductLine => &key.product_line,
            Self::DesignGroup => &key.design_group,
        }
    }
}

impl std::fmt::Display for SummaryDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vendor => write!(f, "vendor"),
            Self::ProductLine => write!(f, "product_line"),
            Self::DesignGroup => write!(f, "design_group"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    /// One value per dimension of the owning table.
    pub key: Vec<String>,
    pub total_demand: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryTable {
    pub dimensions: Vec<SummaryDimension>,
    pub rows: Vec<SummaryRow>,
}

impl SummaryTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.rows.iter().map(|r| r.total_demand).sum()
    }

    pub fn get(&self, key: &[&str]) -> Option<f64> {
        self.rows
            .iter()
            .find(|r| r.key.iter().map(String::as_str).eq(key.iter().copied()))
            .map(|r| r.total_demand)
    }
}

// ---------------------------------------------------------------------------
// Inconsistencies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InconsistencyRow {
    #[serde(flatten)]
    pub row: ComponentDemandRow,
    pub vendor_mismatch: bool,
    pub buyer_mismatch: bool,
}

/// Always present after a run, even when empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InconsistencyReport {
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<InconsistencyRow>,
}

impl InconsistencyReport {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn status_message(&self) -> String {
        if self.rows.is_empty() {
            "No inconsistencies found".to_string()
        } else {
            format!("Found {} rows with inconsistencies", self.rows.len())
        }
    }
}

// ---------------------------------------------------------------------------
// Diagnostics + Output
// ---------------------------------------------------------------------------

/// Count of affected records plus the first few distinct keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KeySample {
    /// Distinct keys affected.
    pub distinct: usize,
    pub sample: Vec<String>,
    /// Distinct keys beyond the sample.
    pub omitted: usize,
}

impl KeySample {
    pub fn is_empty(&self) -> bool {
        self.distinct == 0
    }
}

/// Recoverable data-quality findings from one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    pub demand_rows: usize,
    pub bom_rows: usize,
    pub joined_rows: usize,
    /// Demand rows with no BOM match.
    pub unmatched_rows: usize,
    pub unmatched_items: KeySample,
    /// Matched rows left out of the pivot because their date was unreadable.
    pub undated_rows: usize,
    pub undated_items: KeySample,
    /// Demand rows whose quantity was blank and counted as zero. Only raw
    /// tables can carry blanks, so this is non-zero only via `run_tables`.
    pub blank_quantities: usize,
}

impl Diagnostics {
    pub fn has_warnings(&self) -> bool {
        self.unmatched_rows > 0 || self.undated_rows > 0 || self.blank_quantities > 0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub engine_version: String,
    pub run_at: String,
}

/// Everything one run produces.
#[derive(Debug, Clone, Serialize)]
pub struct DemandReport {
    pub meta: ReportMeta,
    pub diagnostics: Diagnostics,
    pub pivot: PivotTable,
    pub component_demand: ComponentDemandTable,
    pub vendor_summary: SummaryTable,
    pub product_line_summary: SummaryTable,
    pub design_group_summary: SummaryTable,
    pub combined_summary: SummaryTable,
    pub inconsistencies: InconsistencyReport,
}
