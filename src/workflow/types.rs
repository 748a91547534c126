use serde::{Deserialize, Deserializer};

/// A node id or slot index, written either as a number or as a numeric string.
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
enum NumberOrString {
    Number(i64),
    String(String),
}

impl NumberOrString {
    fn parse<E: serde::de::Error>(self) -> Result<i64, E> {
        match self {
            NumberOrString::Number(n) => Ok(n),
            NumberOrString::String(s) => s
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("expected a numeric id, got '{s}'"))),
        }
    }
}

fn node_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    NumberOrString::deserialize(deserializer)?.parse()
}

fn slot_index<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    let value = NumberOrString::deserialize(deserializer)?.parse::<D::Error>()?;
    usize::try_from(value)
        .map_err(|_| serde::de::Error::custom(format!("slot index {value} is negative")))
}

/// Data types are usually strings, but legacy custom nodes also use numbers and
/// arrays. Arrays become comma lists, which `SlotType` already understands.
fn data_type<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        serde_json::Value::Array(items) => items
            .iter()
            .map(|item| match item {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    })
}

/// Input slot of a node or of a subgraph interface.
#[derive(Debug, Deserialize, Clone)]
pub struct WorkflowInput {
    pub name: String,
    #[serde(rename = "type", default, deserialize_with = "data_type")]
    pub slot_type: String,
    #[serde(default)]
    pub link: Option<u32>,
    #[serde(default, alias = "linkIds")]
    pub link_ids: Option<Vec<u32>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WorkflowOutput {
    pub name: String,
    #[serde(rename = "type", default, deserialize_with = "data_type")]
    pub slot_type: String,
    #[serde(default)]
    pub links: Option<Vec<u32>>,
    #[serde(default, alias = "linkIds")]
    pub link_ids: Option<Vec<u32>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WorkflowNode {
    #[serde(deserialize_with = "node_id")]
    pub id: i64,
    /// A registered node type, or the uuid of a subgraph definition for instances.
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub mode: u8,
    #[serde(default)]
    pub inputs: Vec<WorkflowInput>,
    #[serde(default)]
    pub outputs: Vec<WorkflowOutput>,
}

/// `[id, origin_id, origin_slot, target_id, target_slot, type]`, the compact form used
/// by the root graph of older files.
#[derive(Debug, Deserialize, Clone)]
pub struct LinkTuple(
    pub u32,
    #[serde(deserialize_with = "node_id")] pub i64,
    #[serde(deserialize_with = "slot_index")] pub usize,
    #[serde(deserialize_with = "node_id")] pub i64,
    #[serde(deserialize_with = "slot_index")] pub usize,
    #[serde(deserialize_with = "data_type")] pub String,
);

#[derive(Debug, Deserialize, Clone)]
pub struct LinkObject {
    pub id: u32,
    #[serde(deserialize_with = "node_id")]
    pub origin_id: i64,
    #[serde(deserialize_with = "slot_index")]
    pub origin_slot: usize,
    #[serde(deserialize_with = "node_id")]
    pub target_id: i64,
    #[serde(deserialize_with = "slot_index")]
    pub target_slot: usize,
    #[serde(rename = "type", default, deserialize_with = "data_type")]
    pub slot_type: String,
    #[serde(default, alias = "parentId")]
    pub parent_id: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum WorkflowLink {
    Tuple(LinkTuple),
    Object(LinkObject),
}

impl WorkflowLink {
    /// Normalizes both encodings into the object form.
    pub fn into_object(self) -> LinkObject {
        match self {
            WorkflowLink::Object(link) => link,
            WorkflowLink::Tuple(LinkTuple(id, origin_id, origin_slot, target_id, target_slot, ty)) => {
                LinkObject {
                    id,
                    origin_id,
                    origin_slot,
                    target_id,
                    target_slot,
                    slot_type: ty,
                    parent_id: None,
                }
            }
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WorkflowReroute {
    pub id: u32,
    #[serde(default, alias = "parentId")]
    pub parent_id: Option<u32>,
    #[serde(default, alias = "linkIds")]
    pub link_ids: Option<Vec<u32>>,
}

/// Parent reroute of a tuple-encoded link, stored out of line.
#[derive(Debug, Deserialize, Clone)]
pub struct LinkExtension {
    pub id: u32,
    #[serde(alias = "parentId")]
    pub parent_id: u32,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct WorkflowExtra {
    #[serde(default)]
    pub reroutes: Vec<WorkflowReroute>,
    #[serde(default, alias = "linkExtensions")]
    pub link_extensions: Vec<LinkExtension>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct WorkflowDefinitions {
    #[serde(default)]
    pub subgraphs: Vec<WorkflowSubgraph>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WorkflowSubgraph {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<WorkflowInput>,
    #[serde(default)]
    pub outputs: Vec<WorkflowOutput>,
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,
    #[serde(default)]
    pub links: Vec<WorkflowLink>,
    #[serde(default)]
    pub reroutes: Vec<WorkflowReroute>,
    /// Definitions may nest further definitions; all of them share one registry.
    #[serde(default)]
    pub definitions: Option<WorkflowDefinitions>,
}

/// A complete workflow file.
#[derive(Debug, Deserialize, Clone)]
pub struct Workflow {
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,
    #[serde(default)]
    pub links: Vec<WorkflowLink>,
    #[serde(default)]
    pub reroutes: Vec<WorkflowReroute>,
    #[serde(default)]
    pub extra: Option<WorkflowExtra>,
    #[serde(default)]
    pub definitions: Option<WorkflowDefinitions>,
}
