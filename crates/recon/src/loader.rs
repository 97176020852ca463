//! Typed records from raw input tables, and the BOM source capability.
//!
//! Tables are expected to have normalized headers already
//! (see [`RawTable::normalize_columns`]).

use std::collections::BTreeMap;

use log::{info, warn};

use crate::config::{BomColumns, DemandConfig};
use crate::error::ReconError;
use crate::model::{BomRecord, DemandRecord};
use crate::table::RawTable;

/// Demand records plus the number of blank quantities read as zero.
#[derive(Debug, Clone, Default)]
pub struct LoadedDemand {
    pub records: Vec<DemandRecord>,
    pub blank_quantities: usize,
}

/// Read demand rows. Item number, date and quantity columns are required;
/// unreadable dates become `None`, blank quantities become zero.
pub fn load_demand(table: &RawTable, config: &DemandConfig) -> Result<LoadedDemand, ReconError> {
    let cols = &config.columns;
    let idx = |name: &str| -> Result<usize, ReconError> {
        table
            .column_index(name)
            .ok_or_else(|| ReconError::missing_column("demand", name))
    };

    let item_idx = idx(&cols.item_number)?;
    let date_idx = idx(&cols.date)?;
    let qty_idx = idx(&cols.discrete_qty)?;
    let plant_idx = match cols.plant {
        Some(ref plant) => Some(idx(plant)?),
        None => None,
    };

    let used = [Some(item_idx), Some(date_idx), Some(qty_idx), plant_idx];
    let passthrough: Vec<(usize, &String)> = table
        .columns
        .iter()
        .enumerate()
        .filter(|(i, _)| !used.contains(&Some(*i)))
        .collect();

    let mut loaded = LoadedDemand::default();

    for row in 0..table.len() {
        let qty_cell = table.cell(row, qty_idx);
        let discrete_qty = match qty_cell.as_number() {
            Ok(Some(q)) if q >= 0.0 => q,
            Ok(Some(q)) => {
                return Err(ReconError::InvalidNumber {
                    table: "demand".into(),
                    row: row + 1,
                    column: cols.discrete_qty.clone(),
                    value: q.to_string(),
                })
            }
            Ok(None) => {
                loaded.blank_quantities += 1;
                0.0
            }
            Err(value) => {
                return Err(ReconError::InvalidNumber {
                    table: "demand".into(),
                    row: row + 1,
                    column: cols.discrete_qty.clone(),
                    value,
                })
            }
        };

        let extra: BTreeMap<String, _> = passthrough
            .iter()
            .map(|(i, name)| ((*name).clone(), table.cell(row, *i).clone()))
            .collect();

        loaded.records.push(DemandRecord {
            item_number: table.cell(row, item_idx).to_key_string(),
            plant: plant_idx.map(|i| table.cell(row, i).to_key_string()),
            date: table.cell(row, date_idx).as_date(&config.date_formats),
            discrete_qty,
            extra,
        });
    }

    Ok(loaded)
}

/// Read BOM rows. All twelve columns are required and `qty_per` must be
/// present on every row.
pub fn load_bom(table: &RawTable, columns: &BomColumns) -> Result<Vec<BomRecord>, ReconError> {
    let mut idx = [0usize; 12];
    for (slot, (_, header)) in idx.iter_mut().zip(columns.named()) {
        *slot = table
            .column_index(header)
            .ok_or_else(|| ReconError::missing_column("bom", header))?;
    }
    let [plant, parent, component, desc1, desc2, qty_per, vendor, product_line, design_group, pt_vend, pt_buyer, reported_buyer] =
        idx;

    let mut records = Vec::with_capacity(table.len());
    for row in 0..table.len() {
        let text = |col: usize| table.cell(row, col).to_key_string();

        let qty = match table.cell(row, qty_per).as_number() {
            Ok(Some(q)) => q,
            Ok(None) => {
                return Err(ReconError::MissingQtyPer {
                    parent: text(parent),
                    component: text(component),
                })
            }
            Err(value) => {
                return Err(ReconError::InvalidNumber {
                    table: "bom".into(),
                    row: row + 1,
                    column: columns.qty_per.clone(),
                    value,
                })
            }
        };

        records.push(BomRecord {
            plant: text(plant),
            parent_item: text(parent),
            component: text(component),
            component_desc1: text(desc1),
            component_desc2: text(desc2),
            qty_per: qty,
            vendor: text(vendor),
            product_line: text(product_line),
            design_group: text(design_group),
            authoritative_vendor: text(pt_vend),
            authoritative_buyer: text(pt_buyer),
            reported_buyer: text(reported_buyer),
        });
    }

    Ok(records)
}

// ---------------------------------------------------------------------------
// BOM sources
// ---------------------------------------------------------------------------

/// Anything that can supply BOM rows. The engine only sees the rows, never
/// which source produced them.
pub trait BomSource {
    fn name(&self) -> &str;
    fn supply(&self) -> Result<Vec<BomRecord>, ReconError>;
}

/// BOM rows from a table produced by a live query.
#[derive(Debug, Clone)]
pub struct TableBomSource {
    name: String,
    table: RawTable,
    columns: BomColumns,
}

impl TableBomSource {
    pub fn new(name: impl Into<String>, table: RawTable, columns: BomColumns) -> Self {
        Self {
            name: name.into(),
            table,
            columns,
        }
    }
}

impl BomSource for TableBomSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn supply(&self) -> Result<Vec<BomRecord>, ReconError> {
        let mut table = self.table.clone();
        table.normalize_columns();
        let records = load_bom(&table, &self.columns)?;
        info!("BOM source '{}': {} row(s)", self.name, records.len());
        Ok(records)
    }
}

/// Fixed-shape fallback used when the live source is unreachable.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockBomSource;

impl BomSource for MockBomSource {
    fn name(&self) -> &str {
        "mock"
    }

    fn supply(&self) -> Result<Vec<BomRecord>, ReconError> {
        let rows = [
            ("2674", "PART1", "COMP1", 1, 2.0, "VEND1", "LINE1", "GROUP1"),
            ("2674", "PART2", "COMP2", 2, 3.0, "VEND2", "LINE2", "GROUP2"),
            ("2798", "PART3", "COMP3", 3, 1.0, "VEND3", "LINE1", "GROUP1"),
            ("2798", "PART4", "COMP4", 4, 4.0, "VEND4", "LINE2", "GROUP2"),
        ];
        let records: Vec<BomRecord> = rows
            .into_iter()
            .map(|(plant, parent, comp, n, qty_per, vend, line, group)| BomRecord {
                plant: plant.into(),
                parent_item: parent.into(),
                component: comp.into(),
                component_desc1: format!("Description {n}"),
                component_desc2: format!("Detail {n}"),
                qty_per,
                vendor: vend.into(),
                product_line: line.into(),
                design_group: group.into(),
                authoritative_vendor: vend.into(),
                authoritative_buyer: format!("BUYER{n}"),
                reported_buyer: format!("BUYER{n}"),
            })
            .collect();
        info!("Mock BOM data created. {} rows.", records.len());
        Ok(records)
    }
}

/// Try `primary`; if it cannot be reached, warn and use `fallback`.
///
/// Only [`ReconError::BomSource`] triggers the fallback. A primary that
/// answers with malformed rows fails the run.
#[derive(Debug, Clone)]
pub struct FallbackBomSource<P, F> {
    primary: P,
    fallback: F,
}

impl<P: BomSource, F: BomSource> FallbackBomSource<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P: BomSource, F: BomSource> BomSource for FallbackBomSource<P, F> {
    fn name(&self) -> &str {
        self.primary.name()
    }

    fn supply(&self) -> Result<Vec<BomRecord>, ReconError> {
        match self.primary.supply() {
            Ok(records) => Ok(records),
            Err(e @ ReconError::BomSource { .. }) => {
                warn!(
                    "BOM source '{}' failed ({e}); using '{}' instead",
                    self.primary.name(),
                    self.fallback.name()
                );
                self.fallback.supply()
            }
            Err(e) => Err(e),
        }
    }
}
