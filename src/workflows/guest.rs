use log::{debug, info};
use std::fmt;
use std::path::PathBuf;

use crate::models::workload::Workload;
use crate::utils::env::{merge, Mapping};
use crate::utils::error::Error;
use crate::utils::expansion::{expand, expand_strict, Unresolved};
use crate::utils::render::{app_work_dir, ExecWrapper, DEFAULT_DATA_ROOT};
use crate::workflows::workflow::RemoteExecutor;

/// Which command list of a workload a command came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Entrypoint,
    Override,
    Cmd,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Entrypoint => "entrypoint",
            Phase::Override => "override",
            Phase::Cmd => "cmd",
        };
        f.write_str(name)
    }
}

/// Expands and dispatches the startup commands of every workload, in order, on one host.
///
/// For each workload the entrypoint runs first, then its cmd. A non-empty override list
/// replaces the cmd of the first workload only. The first failing command ends the run.
pub struct GuestWorkflow<'a> {
    cluster_name: String,
    host_and_port: String,
    cluster_env: Mapping,
    override_commands: Vec<String>,
    data_root: PathBuf,
    wrapper: ExecWrapper,
    strict_expansion: bool,
    executor: &'a dyn RemoteExecutor,
}

impl<'a> GuestWorkflow<'a> {
    pub fn new(
        cluster_name: &str,
        host_and_port: &str,
        cluster_env: Mapping,
        wrapper: ExecWrapper,
        executor: &'a dyn RemoteExecutor,
    ) -> Self {
        GuestWorkflow {
            cluster_name: cluster_name.to_string(),
            host_and_port: host_and_port.to_string(),
            cluster_env,
            override_commands: Vec::new(),
            data_root: PathBuf::from(DEFAULT_DATA_ROOT),
            wrapper,
            strict_expansion: false,
            executor,
        }
    }

    pub fn with_override_commands(mut self, override_commands: Vec<String>) -> Self {
        self.override_commands = override_commands;
        self
    }

    pub fn with_data_root(mut self, data_root: PathBuf) -> Self {
        self.data_root = data_root;
        self
    }

    pub fn with_strict_expansion(mut self, strict_expansion: bool) -> Self {
        self.strict_expansion = strict_expansion;
        self
    }

    pub fn run(&self, workloads: &[Workload]) -> Result<(), Error> {
        for (index, workload) in workloads.iter().enumerate() {
            info!(
                "running commands of {} ({}) on {}",
                workload.name, workload.image_name, self.host_and_port
            );
            let mapping = merge(&workload.env, &self.cluster_env);

            self.run_phase(workload, &mapping, Phase::Entrypoint, &workload.entrypoint)?;

            // the override only ever applies to the first workload
            if index == 0 && !self.override_commands.is_empty() {
                self.run_phase(workload, &mapping, Phase::Override, &self.override_commands)?;
                continue;
            }

            self.run_phase(workload, &mapping, Phase::Cmd, &workload.cmd)?;
        }

        Ok(())
    }

    fn run_phase(
        &self,
        workload: &Workload,
        mapping: &Mapping,
        phase: Phase,
        commands: &[String],
    ) -> Result<(), Error> {
        if !commands.is_empty() {
            info!("{}: running {} {} command(s)", workload.name, commands.len(), phase);
        }

        for command in commands.iter() {
            let expanded = self.expand(workload, mapping, phase, command)?;
            if expanded.trim().is_empty() {
                debug!("{}: skipping empty {} command {:?}", workload.name, phase, command);
                continue;
            }

            self.dispatch(workload, &expanded)
                .map_err(|source| Error::CommandFailed {
                    phase,
                    workload: workload.name.clone(),
                    command: command.clone(),
                    source: Box::new(source),
                })?;
        }

        Ok(())
    }

    fn expand(
        &self,
        workload: &Workload,
        mapping: &Mapping,
        phase: Phase,
        command: &str,
    ) -> Result<String, Error> {
        if !self.strict_expansion {
            return Ok(expand(command, mapping));
        }

        expand_strict(command, mapping).map_err(|Unresolved(name)| Error::UndefinedVariable {
            name,
            phase,
            workload: workload.name.clone(),
            command: command.to_string(),
        })
    }

    fn dispatch(&self, workload: &Workload, expanded: &str) -> Result<(), Error> {
        let work_dir = app_work_dir(&self.data_root, &self.cluster_name, &workload.name);
        let wrapped = self.wrapper.wrap(&work_dir, expanded)?;

        debug!("{}: {}", workload.name, wrapped);
        self.executor.exec(&self.host_and_port, &wrapped)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::{GuestWorkflow, Phase};
    use crate::models::workload::Workload;
    use crate::utils::error::Error;
    use crate::utils::render::{ExecWrapper, DEFAULT_EXEC_TEMPLATE};
    use crate::workflows::workflow::RemoteExecutor;

    /// Records every dispatched command and fails the ones containing `fail_on`.
    #[derive(Default)]
    pub struct RecordingExecutor {
        pub calls: RefCell<Vec<(String, String)>>,
        pub fail_on: Option<String>,
    }

    impl RecordingExecutor {
        pub fn failing_on(pattern: &str) -> Self {
            RecordingExecutor {
                calls: RefCell::new(Vec::new()),
                fail_on: Some(pattern.to_string()),
            }
        }

        pub fn commands(&self) -> Vec<String> {
            self.calls
                .borrow()
                .iter()
                .map(|(_, command)| command.clone())
                .collect()
        }
    }

    impl RemoteExecutor for RecordingExecutor {
        fn exec(&self, host_and_port: &str, command: &str) -> Result<(), Error> {
            self.calls
                .borrow_mut()
                .push((host_and_port.to_string(), command.to_string()));

            match &self.fail_on {
                Some(pattern) if command.contains(pattern.as_str()) => {
                    Err(Error::RemoteCommandFailed {
                        host: host_and_port.to_string(),
                        exit_code: 1,
                        stderr: "boom".to_string(),
                    })
                }
                _ => Ok(()),
            }
        }
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn workload(name: &str, entrypoint: &[&str], cmd: &[&str]) -> Workload {
        Workload {
            name: name.to_string(),
            entrypoint: strings(entrypoint),
            cmd: strings(cmd),
            ..Workload::default()
        }
    }

    fn cluster_env() -> HashMap<String, String> {
        [("MASTER_IP".to_string(), "10.0.0.1".to_string())]
            .iter()
            .cloned()
            .collect()
    }

    fn workflow(executor: &RecordingExecutor) -> GuestWorkflow<'_> {
        GuestWorkflow::new(
            "default",
            "10.0.0.1:22",
            cluster_env(),
            ExecWrapper::new("{{command}}").unwrap(),
            executor,
        )
    }

    #[test]
    fn can_run_example_scenario() {
        let executor = RecordingExecutor::default();
        let mut app = workload("w", &["start --ip=$(MASTER_IP) --port=$(PORT)"], &[]);
        app.env.insert("PORT".to_string(), "8080".to_string());

        workflow(&executor).run(&[app]).unwrap();

        assert_eq!(
            *executor.calls.borrow(),
            vec![(
                "10.0.0.1:22".to_string(),
                "start --ip=10.0.0.1 --port=8080".to_string()
            )]
        );
    }

    #[test]
    fn can_run_in_declaration_order() {
        let executor = RecordingExecutor::default();
        let workloads = vec![
            workload("a", &["A.e1", "A.e2"], &["A.c1"]),
            workload("b", &["B.e1", "B.e2"], &["B.c1"]),
        ];

        workflow(&executor).run(&workloads).unwrap();

        assert_eq!(
            executor.commands(),
            strings(&["A.e1", "A.e2", "A.c1", "B.e1", "B.e2", "B.c1"])
        );
    }

    #[test]
    fn can_override_cmd_of_first_workload_only() {
        let executor = RecordingExecutor::default();
        let workloads = vec![
            workload("a", &["A.e1"], &["A.c1"]),
            workload("b", &["B.e1"], &["B.c1"]),
        ];

        workflow(&executor)
            .with_override_commands(strings(&["O.1 $(MASTER_IP)", "O.2"]))
            .run(&workloads)
            .unwrap();

        assert_eq!(
            executor.commands(),
            strings(&["A.e1", "O.1 10.0.0.1", "O.2", "B.e1", "B.c1"])
        );
    }

    #[test]
    fn can_ignore_empty_override() {
        let executor = RecordingExecutor::default();

        workflow(&executor)
            .with_override_commands(Vec::new())
            .run(&[workload("a", &["A.e1"], &["A.c1"])])
            .unwrap();

        assert_eq!(executor.commands(), strings(&["A.e1", "A.c1"]));
    }

    #[test]
    fn can_stop_on_first_failure() {
        let executor = RecordingExecutor::failing_on("A.e1");
        let workloads = vec![
            workload("a", &["A.e1 $(MASTER_IP)", "A.e2"], &["A.c1"]),
            workload("b", &["B.e1"], &["B.c1"]),
        ];

        let result = workflow(&executor).run(&workloads);

        assert_eq!(executor.commands(), strings(&["A.e1 10.0.0.1"]));
        match result {
            Err(Error::CommandFailed {
                phase,
                workload,
                command,
                source,
            }) => {
                assert_eq!(phase, Phase::Entrypoint);
                assert_eq!(workload, "a");
                assert_eq!(command, "A.e1 $(MASTER_IP)");
                assert!(matches!(*source, Error::RemoteCommandFailed { .. }));
            }
            other => panic!("expected command failure, got {:?}", other),
        }
    }

    #[test]
    fn can_report_failing_phase() {
        let executor = RecordingExecutor::failing_on("O.1");

        let result = workflow(&executor)
            .with_override_commands(strings(&["O.1"]))
            .run(&[workload("a", &["A.e1"], &["A.c1"])]);

        match result {
            Err(err @ Error::CommandFailed { phase: Phase::Override, .. }) => {
                assert!(err.to_string().starts_with("run override command O.1 of a error"));
            }
            other => panic!("expected override failure, got {:?}", other),
        }
        assert_eq!(executor.commands(), strings(&["A.e1", "O.1"]));
    }

    #[test]
    fn can_skip_empty_commands() {
        let executor = RecordingExecutor::default();
        let mut app = workload("a", &["", "$(BLANK)", "   "], &["A.c1"]);
        app.env.insert("BLANK".to_string(), " ".to_string());

        workflow(&executor).run(&[app]).unwrap();

        assert_eq!(executor.commands(), strings(&["A.c1"]));
    }

    #[test]
    fn can_let_cluster_env_win() {
        let executor = RecordingExecutor::default();
        let mut app = workload("a", &["echo $(MASTER_IP)"], &[]);
        app.env.insert("MASTER_IP".to_string(), "127.0.0.1".to_string());

        workflow(&executor).run(&[app]).unwrap();

        assert_eq!(executor.commands(), strings(&["echo 10.0.0.1"]));
    }

    #[test]
    fn can_keep_workload_env_separate() {
        let executor = RecordingExecutor::default();
        let mut first = workload("a", &["echo $(PORT)"], &[]);
        first.env.insert("PORT".to_string(), "1".to_string());
        let second = workload("b", &["echo $(PORT)"], &[]);

        workflow(&executor).run(&[first, second]).unwrap();

        assert_eq!(executor.commands(), strings(&["echo 1", "echo $(PORT)"]));
    }

    #[test]
    fn can_fail_strict_expansion_before_dispatch() {
        let executor = RecordingExecutor::default();

        let result = workflow(&executor)
            .with_strict_expansion(true)
            .run(&[workload("a", &["A.e1"], &["echo $(MISSING)", "A.c2"])]);

        match result {
            Err(Error::UndefinedVariable { name, phase, workload, .. }) => {
                assert_eq!(name, "MISSING");
                assert_eq!(phase, Phase::Cmd);
                assert_eq!(workload, "a");
            }
            other => panic!("expected undefined variable, got {:?}", other),
        }
        assert_eq!(executor.commands(), strings(&["A.e1"]));
    }

    #[test]
    fn can_run_inside_work_dir() {
        let executor = RecordingExecutor::default();

        GuestWorkflow::new(
            "prod",
            "10.0.0.1:22",
            cluster_env(),
            ExecWrapper::new(DEFAULT_EXEC_TEMPLATE).unwrap(),
            &executor,
        )
        .with_data_root("/data".into())
        .run(&[workload("calico", &["kubectl apply -f manifests"], &[])])
        .unwrap();

        assert_eq!(
            executor.commands(),
            strings(&["cd /data/prod/applications/calico/workdir && kubectl apply -f manifests"])
        );
    }
}
