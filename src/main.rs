use kube::{client::Client, Api};
use log::{error, info};

mod controllers;
mod models;
mod utils;
mod workflows;

use controllers::guest::GuestController;
use models::cluster::Cluster;
use utils::config::Config;
use utils::error::Error;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run().await {
        error!("guest apply failed: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Error> {
    let config = Config::from_env()?;

    // A KUBECONFIG or in-cluster service account is needed to read the Cluster resource
    let kubernetes_client: Client = Client::try_default().await?;
    let cluster_api: Api<Cluster> = Api::namespaced(kubernetes_client, &config.namespace);
    let cluster = cluster_api.get(&config.cluster_name).await?;

    let workloads = cluster.mounts();
    info!(
        "cluster {} has {} mounted workload(s)",
        config.cluster_name,
        workloads.len()
    );

    // Commands are dispatched one by one over blocking SSH calls
    let controller = GuestController::new(config);
    tokio::task::spawn_blocking(move || controller.apply(&cluster, &workloads)).await?
}
