use log::info;

use crate::models::cluster::Cluster;
use crate::models::workload::Workload;
use crate::utils::config::Config;
use crate::utils::error::Error;
use crate::utils::render::ExecWrapper;
use crate::workflows::guest::GuestWorkflow;
use crate::workflows::ssh::SshExecutor;
use crate::workflows::workflow::RemoteExecutor;

pub struct GuestController {
    config: Config,
}

impl GuestController {
    pub fn new(config: Config) -> Self {
        GuestController { config }
    }

    /// Runs the startup commands of `workloads` on the first master of `cluster`.
    ///
    /// One SSH executor is built for the call and used for every command.
    pub fn apply(&self, cluster: &Cluster, workloads: &[Workload]) -> Result<(), Error> {
        let executor = SshExecutor::from_cluster(cluster);
        self.apply_with(cluster, workloads, &executor)
    }

    /// Same as [`GuestController::apply`], dispatching through `executor`.
    ///
    /// # Arguments
    /// - `cluster` - provides the target host, the cluster wide env and the override commands.
    /// - `workloads` - deployed workloads, in declaration order.
    /// - `executor` - runs each expanded command on the host.
    pub fn apply_with(
        &self,
        cluster: &Cluster,
        workloads: &[Workload],
        executor: &dyn RemoteExecutor,
    ) -> Result<(), Error> {
        let cluster_name = cluster.metadata.name.clone().ok_or_else(|| {
            Error::UserInputError("Expected Cluster resource to have a name.".to_owned())
        })?;
        let (master0_ip, host_and_port) = match (cluster.master0_ip(), cluster.master0_ip_and_port())
        {
            (Some(ip), Some(host_and_port)) => (ip, host_and_port),
            _ => {
                return Err(Error::UserInputError(format!(
                    "Cluster {} has no host with the master role.",
                    cluster_name
                )))
            }
        };

        info!(
            "applying {} workload(s) of cluster {} on {}",
            workloads.len(),
            cluster_name,
            host_and_port
        );

        let wrapper = ExecWrapper::new(&self.config.exec_template)?;
        let workflow = GuestWorkflow::new(
            &cluster_name,
            &host_and_port,
            cluster.env_for_host(&master0_ip),
            wrapper,
            executor,
        )
        .with_override_commands(cluster.spec.command.clone())
        .with_data_root(self.config.data_root.clone())
        .with_strict_expansion(self.config.strict_expansion);

        workflow.run(workloads)
    }

    /// Removing guest workloads is not supported; always returns `Error::NotSupported`.
    #[allow(dead_code)]
    pub fn delete(&self, cluster: &Cluster) -> Result<(), Error> {
        info!(
            "delete requested for cluster {:?}",
            cluster.metadata.name.as_deref().unwrap_or_default()
        );
        Err(Error::NotSupported("delete"))
    }
}
