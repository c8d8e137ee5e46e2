use log::warn;
use std::collections::HashMap;

/// Variable name to value.
pub type Mapping = HashMap<String, String>;

/// Builds the mapping used to expand the commands of one workload.
///
/// The result holds every key of both inputs. When a key is declared by the workload and by the
/// cluster, the cluster value wins.
pub fn merge(workload_env: &Mapping, cluster_env: &Mapping) -> Mapping {
    let mut merged = workload_env.clone();
    for (key, value) in cluster_env.iter() {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Parses `KEY=VALUE` entries. The value is everything after the first `=`; entries without one
/// are skipped. Later entries win over earlier ones.
pub fn parse_env_list(entries: &[String]) -> Mapping {
    let mut mapping = Mapping::new();

    for entry in entries.iter() {
        match entry.split_once('=') {
            Some((key, value)) => {
                mapping.insert(key.to_string(), value.to_string());
            }
            None => warn!("ignoring env entry {:?} without '='", entry),
        }
    }

    mapping
}
