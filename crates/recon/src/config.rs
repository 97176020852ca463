use serde::Deserialize;

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Pipeline configuration. Every section is optional; an empty document
/// yields the ERP export defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub demand: DemandConfig,
    pub bom: BomConfig,
    pub diagnostics: DiagnosticsConfig,
}

// ---------------------------------------------------------------------------
// Demand
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DemandConfig {
    pub columns: DemandColumns,
    /// Accepted textual date formats, tried in order.
    pub date_formats: Vec<String>,
}

impl Default for DemandConfig {
    fn default() -> Self {
        Self {
            columns: DemandColumns::default(),
            date_formats: vec![
                "%Y-%m-%d".into(),
                "%Y-%m-%d %H:%M:%S".into(),
                "%m/%d/%Y".into(),
                "%d.%m.%Y".into(),
            ],
        }
    }
}

/// Header names in the demand export.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DemandColumns {
    pub item_number: String,
    pub date: String,
    pub discrete_qty: String,
    /// The ERP export does not always carry a plant column.
    pub plant: Option<String>,
}

impl Default for DemandColumns {
    fn default() -> Self {
        Self {
            item_number: "Item Number".into(),
            date: "Date".into(),
            discrete_qty: "Discrete Qty".into(),
            plant: None,
        }
    }
}

// ---------------------------------------------------------------------------
// BOM
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BomConfig {
    pub columns: BomColumns,
}

/// Header names in the BOM extract. Defaults match the ERP query aliases.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BomColumns {
    pub plant: String,
    pub parent_item: String,
    pub component: String,
    pub component_desc1: String,
    pub component_desc2: String,
    pub qty_per: String,
    pub vendor: String,
    pub product_line: String,
    pub design_group: String,
    pub authoritative_vendor: String,
    pub authoritative_buyer: String,
    pub reported_buyer: String,
}

impl Default for BomColumns {
    fn default() -> Self {
        Self {
            plant: "Plant".into(),
            parent_item: "ps_par".into(),
            component: "ps_comp".into(),
            component_desc1: "pt_desc1".into(),
            component_desc2: "pt_desc2".into(),
            qty_per: "ps_qty_per".into(),
            vendor: "po_vend".into(),
            product_line: "pt_prod_line".into(),
            design_group: "pt_dsgn_grp".into(),
            authoritative_vendor: "pt_vend".into(),
            authoritative_buyer: "pt_buyer".into(),
            reported_buyer: "pod__chr08".into(),
        }
    }
}

impl BomColumns {
    /// (field, header) pairs in pivot-key order.
    pub fn named(&self) -> [(&'static str, &str); 12] {
        [
            ("plant", self.plant.as_str()),
            ("parent_item", self.parent_item.as_str()),
            ("component", self.component.as_str()),
            ("component_desc1", self.component_desc1.as_str()),
            ("component_desc2", self.component_desc2.as_str()),
            ("qty_per", self.qty_per.as_str()),
            ("vendor", self.vendor.as_str()),
            ("product_line", self.product_line.as_str()),
            ("design_group", self.design_group.as_str()),
            ("authoritative_vendor", self.authoritative_vendor.as_str()),
            ("authoritative_buyer", self.authoritative_buyer.as_str()),
            ("reported_buyer", self.reported_buyer.as_str()),
        ]
    }
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// How many affected keys to list in a warning before eliding the rest.
    pub sample_limit: usize,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self { sample_limit: 10 }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl PipelineConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: PipelineConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        let demand = &self.demand.columns;
        let mut named: Vec<(&str, &str)> = vec![
            ("demand.columns.item_number", demand.item_number.as_str()),
            ("demand.columns.date", demand.date.as_str()),
            ("demand.columns.discrete_qty", demand.discrete_qty.as_str()),
        ];
        if let Some(ref plant) = demand.plant {
            named.push(("demand.columns.plant", plant.as_str()));
        }
        for (field, header) in self.bom.columns.named() {
            named.push((field, header));
        }

        for (field, header) in named {
            if header.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "column name for '{field}' must not be empty"
                )));
            }
        }

        if self.demand.date_formats.is_empty() {
            return Err(ReconError::ConfigValidation(
                "at least one date format is required".into(),
            ));
        }

        if self.diagnostics.sample_limit == 0 {
            return Err(ReconError::ConfigValidation(
                "diagnostics.sample_limit must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
