use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::workload::Workload;
use crate::utils::env::{parse_env_list, Mapping};

pub const MASTER_ROLE: &str = "master";
pub const DEFAULT_SSH_PORT: u16 = 22;

#[derive(CustomResource, Serialize, Deserialize, Debug, PartialEq, Clone, Default, JsonSchema)]
#[kube(
    group = "apps.sealos.io",
    version = "v1beta1",
    kind = "Cluster",
    namespaced,
    status = "ClusterStatus"
)]
pub struct ClusterSpec {
    #[serde(default)]
    pub hosts: Vec<Host>,

    // cluster wide KEY=VALUE entries
    #[serde(default)]
    pub env: Vec<String>,

    // replaces the cmd of the first workload when not empty
    #[serde(default)]
    pub command: Vec<String>,

    #[serde(default)]
    pub ssh: Ssh,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default, JsonSchema)]
pub struct ClusterStatus {
    #[serde(default)]
    pub mounts: Vec<Workload>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default, JsonSchema)]
pub struct Host {
    // ip or ip:port
    pub ips: Vec<String>,

    #[serde(default)]
    pub roles: Vec<String>,

    #[serde(default)]
    pub env: Vec<String>,

    pub ssh: Option<Ssh>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default, JsonSchema)]
pub struct Ssh {
    pub user: Option<String>,

    // private key file
    pub pk: Option<String>,

    pub port: Option<u16>,
}

impl Ssh {
    /// Fields set in `other` win over the ones in `self`.
    pub fn overlay(&self, other: &Ssh) -> Ssh {
        Ssh {
            user: other.user.clone().or_else(|| self.user.clone()),
            pk: other.pk.clone().or_else(|| self.pk.clone()),
            port: other.port.or(self.port),
        }
    }
}

/// Splits `ip:port`. Addresses with more than one `:` are taken as a bare host.
pub fn split_host_port(address: &str) -> (&str, Option<&str>) {
    match address.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') => (host, Some(port)),
        _ => (address, None),
    }
}

impl Cluster {
    /// The first host carrying the master role.
    pub fn master0(&self) -> Option<&Host> {
        self.spec
            .hosts
            .iter()
            .find(|host| host.roles.iter().any(|role| role == MASTER_ROLE) && !host.ips.is_empty())
    }

    pub fn master0_ip(&self) -> Option<String> {
        let address = self.master0()?.ips.first()?;
        Some(split_host_port(address).0.to_string())
    }

    /// Address of the first master with the SSH port made explicit.
    pub fn master0_ip_and_port(&self) -> Option<String> {
        let address = self.master0()?.ips.first()?;
        match split_host_port(address) {
            (_, Some(_)) => Some(address.clone()),
            (ip, None) => {
                let port = self.ssh_for(ip).port.unwrap_or(DEFAULT_SSH_PORT);
                Some(format!("{}:{}", ip, port))
            }
        }
    }

    /// The host owning `ip`, with or without a port on either side.
    pub fn host_for(&self, ip: &str) -> Option<&Host> {
        let ip = split_host_port(ip).0;
        self.spec.hosts.iter().find(|host| {
            host.ips
                .iter()
                .any(|address| split_host_port(address).0 == ip)
        })
    }

    /// SSH settings for `ip`: the cluster defaults overlaid with the host's own.
    pub fn ssh_for(&self, ip: &str) -> Ssh {
        match self.host_for(ip).and_then(|host| host.ssh.as_ref()) {
            Some(host_ssh) => self.spec.ssh.overlay(host_ssh),
            None => self.spec.ssh.clone(),
        }
    }

    /// Cluster wide variables as seen from `ip`. Host entries win over cluster entries.
    pub fn env_for_host(&self, ip: &str) -> Mapping {
        let mut env = parse_env_list(&self.spec.env);
        if let Some(host) = self.host_for(ip) {
            env.extend(parse_env_list(&host.env));
        }
        env
    }

    pub fn mounts(&self) -> Vec<Workload> {
        match &self.status {
            Some(status) => status.mounts.clone(),
            None => Vec::new(),
        }
    }
}
