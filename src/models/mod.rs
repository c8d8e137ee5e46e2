pub mod cluster;
pub mod workload;
