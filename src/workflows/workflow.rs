use crate::utils::error::Error;

/// Runs one fully expanded command on a remote host.
///
/// Calls block until the command has finished. Connection handling, authentication and
/// timeouts are up to the implementation.
pub trait RemoteExecutor {
    fn exec(&self, host_and_port: &str, command: &str) -> Result<(), Error>;
}
