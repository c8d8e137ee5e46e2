use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::utils::env::Mapping;

/// One deployed image bundle and the commands it declares.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Workload {
    // names the working directory on the host
    pub name: String,

    #[serde(default)]
    pub image_name: String,

    #[serde(default)]
    pub env: Mapping,

    // always run, in order
    #[serde(default)]
    pub entrypoint: Vec<String>,

    // run after the entrypoint unless overridden
    #[serde(default)]
    pub cmd: Vec<String>,
}
