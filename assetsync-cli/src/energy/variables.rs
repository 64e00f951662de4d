//! Data variables generated for tagged assets
//!
//! Every asset in the [`EnergyMap`] gets one variable per template of its
//! energy type. Variables are created in chunks; a failed chunk is logged and
//! reported, and the remaining chunks still go out.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use futures::StreamExt;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::api::{AssetApi, Variable, VariableDataType};

use super::propagate::HierarchyLink;
use super::types::{EnergyMap, EnergyType};

/// Variables per creation request
pub const DEFAULT_VARIABLE_CHUNK_SIZE: usize = 1000;

static NAME_STRIP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_\s]").expect("static regex"));
static NAME_SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// How one variable is derived from an asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableTemplate {
    pub name_suffix: String,
    pub topic_suffix: String,
    pub data_type: VariableDataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl VariableTemplate {
    fn double(name_suffix: &str, topic_suffix: &str, units: &str, description: &str) -> Self {
        Self {
            name_suffix: name_suffix.to_string(),
            topic_suffix: topic_suffix.to_string(),
            data_type: VariableDataType::Double,
            units: Some(units.to_string()),
            description: Some(description.to_string()),
        }
    }

    fn boolean(name_suffix: &str, topic_suffix: &str, description: &str) -> Self {
        Self {
            name_suffix: name_suffix.to_string(),
            topic_suffix: topic_suffix.to_string(),
            data_type: VariableDataType::Boolean,
            units: None,
            description: Some(description.to_string()),
        }
    }
}

fn default_templates(kind: EnergyType) -> Vec<VariableTemplate> {
    use VariableTemplate as T;

    match kind {
        EnergyType::Electricity => vec![
            T::double("Power", "power", "kW", "Electricity power consumption"),
            T::double("Energy", "energy", "kWh", "Electricity energy consumption"),
            T::double("Voltage", "voltage", "V", "Electricity voltage level"),
            T::boolean("State", "state", "On/Off state"),
        ],
        EnergyType::Gas => vec![
            T::double("Flow", "flow", "m³/h", "Gas flow rate"),
            T::double("Volume", "volume", "m³", "Gas volume consumption"),
            T::double("Pressure", "pressure", "bar", "Gas pressure"),
        ],
        EnergyType::Water => vec![
            T::double("Flow", "flow", "m³/h", "Water flow rate"),
            T::double("Volume", "volume", "m³", "Water volume consumption"),
            T::double("Temperature", "temperature", "°C", "Water temperature"),
            T::double("Pressure", "pressure", "bar", "Water pressure"),
        ],
        EnergyType::Thermal => vec![
            T::double("Power", "power", "kW", "Thermal power"),
            T::double("Energy", "energy", "kWh", "Thermal energy consumption"),
            T::double("Flow Temperature", "flow_temperature", "°C", "Thermal flow temperature"),
            T::double(
                "Return Temperature",
                "return_temperature",
                "°C",
                "Thermal return temperature",
            ),
        ],
        EnergyType::Other => Vec::new(),
    }
}

/// Templates per energy type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableTemplates(BTreeMap<EnergyType, Vec<VariableTemplate>>);

impl Default for VariableTemplates {
    fn default() -> Self {
        Self(
            EnergyType::ALL
                .iter()
                .map(|kind| (*kind, default_templates(*kind)))
                .collect(),
        )
    }
}

impl VariableTemplates {
    /// Load overrides from JSON (`{"gas": [{"nameSuffix": ...}], ...}`).
    ///
    /// A type listed in the file replaces the built-in templates for that type;
    /// unlisted types keep the defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read templates file: {}", path.display()))?;
        let overrides: BTreeMap<EnergyType, Vec<VariableTemplate>> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse templates JSON: {}", path.display()))?;

        let mut templates = Self::default();
        templates.0.extend(overrides);
        Ok(templates)
    }

    pub fn for_type(&self, kind: EnergyType) -> &[VariableTemplate] {
        self.0.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }
}

/// `<asset name>_<suffix>`, with punctuation dropped and whitespace runs as `_`
pub fn format_variable_name(asset_name: &str, suffix: &str) -> String {
    let stripped = NAME_STRIP.replace_all(asset_name, "");
    let joined = NAME_SPACES.replace_all(&stripped, "_");
    format!("{}_{}", joined, suffix)
}

pub fn format_topic_path(asset_id: &str, adapter_id: &str, suffix: &str) -> String {
    format!("/{}/{}/{}", adapter_id, asset_id, suffix)
}

/// One variable per template for every tagged asset found in `assets`
pub fn build_variables<T: HierarchyLink>(
    assets: &[T],
    energy: &EnergyMap,
    adapter_id: &str,
    templates: &VariableTemplates,
) -> Vec<Variable> {
    let names: HashMap<&str, &str> = assets
        .iter()
        .map(|a| (a.asset_id(), a.asset_name()))
        .collect();

    let mut variables = Vec::new();
    let mut unknown = 0usize;

    for (asset_id, kind) in energy {
        let Some(name) = names.get(asset_id.as_str()) else {
            unknown += 1;
            continue;
        };
        for template in templates.for_type(*kind) {
            variables.push(Variable {
                name: format_variable_name(name, &template.name_suffix),
                topic: format_topic_path(asset_id, adapter_id, &template.topic_suffix),
                data_type: template.data_type,
                description: template.description.clone(),
                units: template.units.clone(),
                asset_id: asset_id.clone(),
            });
        }
    }

    if unknown > 0 {
        debug!("{} tagged assets are unknown; no variables built for them", unknown);
    }
    variables
}

/// A variable chunk the service did not accept
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableChunkFailure {
    /// Zero-based chunk number
    pub chunk: usize,
    pub size: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableReport {
    pub submitted: usize,
    pub created: usize,
    pub failures: Vec<VariableChunkFailure>,
}

impl VariableReport {
    pub fn failed(&self) -> usize {
        self.failures.iter().map(|f| f.size).sum()
    }
}

/// Create `variables` in chunks of `chunk_size`, up to `concurrency` at a time
pub async fn create_variables(
    api: &dyn AssetApi,
    variables: &[Variable],
    chunk_size: usize,
    concurrency: usize,
) -> VariableReport {
    let chunk_size = chunk_size.max(1);
    let total_chunks = variables.len().div_ceil(chunk_size);
    let mut report = VariableReport {
        submitted: variables.len(),
        ..Default::default()
    };

    let mut results = futures::stream::iter(variables.chunks(chunk_size).enumerate())
        .map(|(index, chunk)| async move {
            (index, chunk.len(), api.bulk_create_variables(chunk).await)
        })
        .buffered(concurrency.max(1));

    while let Some((index, size, result)) = results.next().await {
        match result {
            Ok(()) => {
                report.created += size;
                debug!("Variable chunk {}/{} created ({} variables)", index + 1, total_chunks, size);
            }
            Err(e) => {
                warn!(
                    "Failed to create variable chunk {}/{} ({} variables): {}",
                    index + 1,
                    total_chunks,
                    size,
                    e
                );
                report.failures.push(VariableChunkFailure {
                    chunk: index,
                    size,
                    message: e.to_string(),
                });
            }
        }
    }

    info!(
        "Created {} of {} variables ({} chunks failed)",
        report.created,
        report.submitted,
        report.failures.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeAssetApi;
    use crate::sync::CreatedAsset;

    fn created(id: &str, name: &str, parent: &str) -> CreatedAsset {
        CreatedAsset {
            asset_id: id.to_string(),
            name: name.to_string(),
            parent_id: parent.to_string(),
            external_id: name.to_string(),
        }
    }

    #[test]
    fn test_format_variable_name() {
        assert_eq!(format_variable_name("Pump 1", "Power"), "Pump_1_Power");
        assert_eq!(format_variable_name("Pompe (N°2)  Sud", "Flow"), "Pompe_N2_Sud_Flow");
        assert_eq!(format_topic_path("a1", "adp", "flow"), "/adp/a1/flow");
    }

    #[test]
    fn test_build_variables_per_energy_type() {
        let assets = vec![
            created("p", "Plant1", "0"),
            created("pump1", "Pump1", "p"),
            created("fan1", "Fan 1", "p"),
            created("misc", "Compressor", "p"),
        ];
        let energy = EnergyMap::from([
            ("pump1".to_string(), EnergyType::Electricity),
            ("fan1".to_string(), EnergyType::Gas),
            ("misc".to_string(), EnergyType::Other),
            ("ghost".to_string(), EnergyType::Water),
        ]);

        let variables = build_variables(&assets, &energy, "adp", &VariableTemplates::default());

        // 3 gas + 4 electricity; Other has no templates and "ghost" is unknown
        assert_eq!(variables.len(), 7);
        assert_eq!(variables[0].name, "Fan_1_Flow");
        assert_eq!(variables[0].topic, "/adp/fan1/flow");
        assert_eq!(variables[0].units.as_deref(), Some("m³/h"));

        let state = variables
            .iter()
            .find(|v| v.name == "Pump1_State")
            .unwrap();
        assert_eq!(state.data_type, VariableDataType::Boolean);
        assert_eq!(state.units, None);
        assert_eq!(state.asset_id, "pump1");
    }

    #[test]
    fn test_template_overrides_replace_listed_types_only() {
        let dir = std::env::temp_dir().join(format!("assetsync-templates-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("templates.json");
        std::fs::write(
            &path,
            r#"{"gas": [{"nameSuffix": "Meter", "topicSuffix": "meter", "dataType": "Integer"}]}"#,
        )
        .unwrap();

        let templates = VariableTemplates::from_json_file(&path).unwrap();
        std::fs::remove_dir_all(&dir).ok();

        let gas = templates.for_type(EnergyType::Gas);
        assert_eq!(gas.len(), 1);
        assert_eq!(gas[0].data_type, VariableDataType::Integer);
        assert_eq!(templates.for_type(EnergyType::Electricity).len(), 4);
        assert!(templates.for_type(EnergyType::Other).is_empty());
    }

    #[tokio::test]
    async fn test_create_variables_in_chunks_isolates_failures() {
        let api = FakeAssetApi::new();
        api.fail_variables_for("fan1");
        let assets = vec![created("pump1", "Pump1", "0"), created("fan1", "Fan1", "0")];
        let energy = EnergyMap::from([
            ("fan1".to_string(), EnergyType::Gas),
            ("pump1".to_string(), EnergyType::Electricity),
        ]);
        let variables = build_variables(&assets, &energy, "adp", &VariableTemplates::default());

        // fan1's 3 gas variables, then pump1's 4: chunks [3, 3, 1] with size 3
        let report = create_variables(&api, &variables, 3, 2).await;

        let sizes: Vec<usize> = api.variable_chunks().iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![3, 3, 1]);
        assert_eq!(report.submitted, 7);
        assert_eq!(report.created, 4);
        assert_eq!(report.failed(), 3);
        assert_eq!(report.failures[0].chunk, 0);
    }

    #[tokio::test]
    async fn test_create_no_variables_sends_nothing() {
        let api = FakeAssetApi::new();
        let report = create_variables(&api, &[], DEFAULT_VARIABLE_CHUNK_SIZE, 1).await;

        assert_eq!(report, VariableReport::default());
        assert!(api.variable_chunks().is_empty());
    }
}
