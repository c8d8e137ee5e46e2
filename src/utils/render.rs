use handlebars::Handlebars;
use serde_json::json;
use std::path::{Path, PathBuf};

use crate::utils::error::Error;

pub const DEFAULT_DATA_ROOT: &str = "/var/lib/sealos/data";
pub const DEFAULT_EXEC_TEMPLATE: &str = "cd {{work_dir}} && {{command}}";

const TEMPLATE_NAME: &str = "exec";

/// Directory a workload's commands run in on the host.
pub fn app_work_dir(data_root: &Path, cluster_name: &str, workload_name: &str) -> PathBuf {
    data_root
        .join(cluster_name)
        .join("applications")
        .join(workload_name)
        .join("workdir")
}

/// Wraps an expanded command so that it runs inside a working directory.
pub struct ExecWrapper {
    handlebars: Handlebars<'static>,
}

impl ExecWrapper {
    pub fn new(template: &str) -> Result<ExecWrapper, Error> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.set_strict_mode(true);
        handlebars.register_template_string(TEMPLATE_NAME, template)?;

        Ok(ExecWrapper { handlebars })
    }

    pub fn wrap(&self, work_dir: &Path, command: &str) -> Result<String, Error> {
        let values = json!({
            "work_dir": work_dir.to_string_lossy(),
            "command": command,
        });

        Ok(self.handlebars.render(TEMPLATE_NAME, &values)?)
    }
}
