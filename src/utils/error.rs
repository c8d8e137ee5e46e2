use crate::workflows::guest::Phase;

/// Utility enum that covers all possible errors while running guest commands
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Any error originating from the `kube-rs` crate
    #[error("Kubernetes reported error: {source}")]
    KubeError {
        #[from]
        source: kube::Error,
    },

    /// Error in user input or Cluster resource definition, typically missing fields.
    #[error("Invalid Cluster definition: {0}")]
    UserInputError(String),

    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("Template error: {source}")]
    TemplateError {
        #[from]
        source: handlebars::TemplateError,
    },

    #[error("Render error: {source}")]
    RenderError {
        #[from]
        source: handlebars::RenderError,
    },

    /// A command of `workload` failed on the remote host. `command` is the text as declared,
    /// before placeholder expansion.
    #[error("run {phase} command {command} of {workload} error: {source}")]
    CommandFailed {
        phase: Phase,
        workload: String,
        command: String,
        #[source]
        source: Box<Error>,
    },

    #[error("remote command on {host} exited with {exit_code}: {stderr}")]
    RemoteCommandFailed {
        host: String,
        exit_code: i32,
        stderr: String,
    },

    /// Only raised when strict expansion is enabled.
    #[error("undefined variable $({name}) in {phase} command {command} of {workload}")]
    UndefinedVariable {
        name: String,
        phase: Phase,
        workload: String,
        command: String,
    },

    #[error("Task error: {source}")]
    JoinError {
        #[from]
        source: tokio::task::JoinError,
    },

    #[error("{0} is not supported")]
    NotSupported(&'static str),
}
