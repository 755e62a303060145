//! Stateful mock for the process execution boundary.
//!
//! [`MockRunner`] serves canned output per command line and records every
//! invocation, so tests can assert on what was pushed to the OS rather than
//! only on return values.

#![cfg(test)]

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::shell_command_ext::{CommandRunner, Error};

#[derive(Debug, Default)]
pub struct RunnerState {
    /// Full command line -> stdout lines. Unknown commands print nothing.
    pub outputs: HashMap<String, Vec<String>>,
    /// Every invocation as program followed by its arguments.
    pub calls: Vec<Vec<String>>,
    /// Command line prefix -> stderr. Matching commands exit non-zero.
    pub fail_on: HashMap<String, String>,
}

#[derive(Clone, Default)]
pub struct MockRunner {
    pub state: Arc<Mutex<RunnerState>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// A machine whose default route goes through `iface`, bound to `service`.
    pub fn local_network(iface: &str, service: &str, subnet_mask: &str, router: &str) -> Self {
        let runner = Self::new();
        runner.set_output(
            "route -n get default",
            &[
                "   route to: default",
                "destination: default",
                "    gateway: 192.168.1.1",
                &format!("  interface: {iface}"),
            ],
        );
        runner.set_output(
            "networksetup -listnetworkserviceorder",
            &[
                "An asterisk (*) denotes that a network service is disabled.",
                &format!("(1) {service}"),
                &format!("(Hardware Port: {service}, Device: {iface})"),
                "",
            ],
        );
        runner.set_output(
            &format!("networksetup -getinfo {service}"),
            &[
                "DHCP Configuration",
                &format!("Subnet mask: {subnet_mask}"),
                &format!("Router: {router}"),
            ],
        );
        runner
    }

    /// Configures L2TP services as `(name, connected)` pairs.
    pub fn with_vpns(self, vpns: &[(&str, bool)]) -> Self {
        let lines: Vec<String> = vpns
            .iter()
            .map(|(name, connected)| {
                let status = if *connected { "(Connected)" } else { "(Disconnected)" };
                format!(r#"* {status}   5E2A PPP --> L2TP   "{name}"   [PPP:L2TP]"#)
            })
            .collect();
        self.state
            .lock()
            .unwrap()
            .outputs
            .insert("scutil --nc list".to_string(), lines);
        self
    }

    pub fn set_output(&self, command: &str, lines: &[&str]) {
        self.state
            .lock()
            .unwrap()
            .outputs
            .insert(command.to_string(), lines.iter().map(|l| l.to_string()).collect());
    }

    pub fn fail_on(&self, command_prefix: &str, stderr: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_on
            .insert(command_prefix.to_string(), stderr.to_string());
    }

    pub fn clear_failures(&self) {
        self.state.lock().unwrap().fail_on.clear();
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.iter().map(|c| c.join(" ")).collect()
    }

    /// Host triples of every `-setadditionalroutes` call for `service`, in call order.
    pub fn additional_routes(&self, service: &str) -> Vec<Vec<String>> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| c.len() >= 3 && c[0] == "networksetup" && c[1] == "-setadditionalroutes" && c[2] == service)
            .map(|c| c[3..].to_vec())
            .collect()
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(&self, cancel: &CancellationToken, program: &str, args: &[String]) -> Result<Vec<String>, Error> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let mut s = self.state.lock().unwrap();
        let mut argv = vec![program.to_string()];
        argv.extend(args.iter().cloned());
        let line = argv.join(" ");
        s.calls.push(argv);

        if let Some((_, stderr)) = s.fail_on.iter().find(|(prefix, _)| line.starts_with(prefix.as_str())) {
            return Err(Error::CommandFailed {
                status: Some(1),
                stderr: stderr.clone(),
            });
        }
        Ok(s.outputs.get(&line).cloned().unwrap_or_default())
    }
}
