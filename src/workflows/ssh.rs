use log::{debug, info};
use std::collections::HashMap;
use std::path::Path;
use std::process::Command;

use crate::models::cluster::{split_host_port, Cluster, Ssh, DEFAULT_SSH_PORT};
use crate::utils::error::Error;
use crate::workflows::workflow::RemoteExecutor;

const DEFAULT_USER: &str = "root";

/// Runs commands through the `ssh` client installed on this machine.
pub struct SshExecutor {
    program: String,
    default_ssh: Ssh,
    // per host ip, already overlaid on the default
    host_ssh: HashMap<String, Ssh>,
}

impl SshExecutor {
    pub fn from_cluster(cluster: &Cluster) -> SshExecutor {
        let default_ssh = cluster.spec.ssh.clone();
        let mut host_ssh = HashMap::new();

        for host in cluster.spec.hosts.iter() {
            if let Some(ssh) = &host.ssh {
                for address in host.ips.iter() {
                    host_ssh.insert(
                        split_host_port(address).0.to_string(),
                        default_ssh.overlay(ssh),
                    );
                }
            }
        }

        SshExecutor {
            program: "ssh".to_string(),
            default_ssh,
            host_ssh,
        }
    }

    /// Uses `program` in place of `ssh`. It receives the same arguments.
    #[cfg(test)]
    pub fn with_program(mut self, program: &str) -> SshExecutor {
        self.program = program.to_string();
        self
    }

    fn ssh_for(&self, host: &str) -> &Ssh {
        self.host_ssh.get(host).unwrap_or(&self.default_ssh)
    }

    /// Only the key of the host being contacted has to exist.
    fn check_private_key(&self, host_and_port: &str) -> Result<(), Error> {
        match &self.ssh_for(split_host_port(host_and_port).0).pk {
            Some(pk) if !Path::new(pk).exists() => Err(Error::UserInputError(format!(
                "ssh private key {} for {} does not exist",
                pk, host_and_port
            ))),
            _ => Ok(()),
        }
    }

    fn args(&self, host_and_port: &str, command: &str) -> Vec<String> {
        let (host, port) = split_host_port(host_and_port);
        let ssh = self.ssh_for(host);

        let port = port
            .map(|port| port.to_string())
            .or_else(|| ssh.port.map(|port| port.to_string()))
            .unwrap_or_else(|| DEFAULT_SSH_PORT.to_string());
        let user = ssh.user.as_deref().unwrap_or(DEFAULT_USER);

        let mut args = vec!["-o".to_string(), "BatchMode=yes".to_string()];
        if let Some(pk) = &ssh.pk {
            args.push("-i".to_string());
            args.push(pk.clone());
        }
        args.push("-p".to_string());
        args.push(port);
        args.push(format!("{}@{}", user, host));
        args.push(command.to_string());

        args
    }
}

impl RemoteExecutor for SshExecutor {
    fn exec(&self, host_and_port: &str, command: &str) -> Result<(), Error> {
        debug!("[{}] exec {}", host_and_port, command);
        self.check_private_key(host_and_port)?;

        let output = Command::new(&self.program)
            .args(self.args(host_and_port, command))
            .output()?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        for line in stdout.lines() {
            info!("[{}] {}", host_and_port, line);
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines() {
            debug!("[{}] stderr: {}", host_and_port, line);
        }

        if !output.status.success() {
            return Err(Error::RemoteCommandFailed {
                host: host_and_port.to_string(),
                exit_code: output.status.code().unwrap_or(-1),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(())
    }
}
