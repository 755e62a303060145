use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use splitvpn_lib::shell_command_ext::{CommandRunner, Error};

/// Serves fixed output per command line and keeps every invocation.
#[derive(Clone, Default)]
pub struct ScriptedRunner {
    outputs: Arc<Mutex<HashMap<String, Vec<String>>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedRunner {
    /// A laptop on Wi-Fi (`en0`, 192.168.88.0/24) with two L2TP VPNs, `Office` connected.
    pub fn laptop() -> Self {
        let runner = Self::default();
        runner.script(
            "route -n get default",
            "   route to: default\ndestination: default\n       mask: default\n    gateway: 192.168.88.1\n  interface: en0\n      flags: <UP,GATEWAY,DONE,STATIC,PRCLONING,GLOBAL>",
        );
        runner.script(
            "networksetup -listnetworkserviceorder",
            "An asterisk (*) denotes that a network service is disabled.\n(1) Wi-Fi\n(Hardware Port: Wi-Fi, Device: en0)\n\n(2) Office\n(Hardware Port: L2TP, Device: )",
        );
        runner.script(
            "networksetup -getinfo Wi-Fi",
            "DHCP Configuration\nIP address: 192.168.88.20\nSubnet mask: 255.255.255.0\nRouter: 192.168.88.1\nClient ID:",
        );
        runner.script(
            "scutil --nc list",
            "Available network connection services in the current set (*=enabled):\n* (Connected)      6F1E PPP --> L2TP  \"Office\"   [PPP:L2TP]\n* (Disconnected)   7A2B PPP --> L2TP  \"Home\"     [PPP:L2TP]\n* (Disconnected)   8C3D PPP --> PPTP  \"Legacy\"   [PPP:PPTP]",
        );
        runner
    }

    pub fn script(&self, command: &str, stdout: &str) {
        self.outputs
            .lock()
            .unwrap()
            .insert(command.to_string(), stdout.lines().map(str::to_string).collect());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, _cancel: &CancellationToken, program: &str, args: &[String]) -> Result<Vec<String>, Error> {
        let line = std::iter::once(program.to_string())
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");
        self.calls.lock().unwrap().push(line.clone());
        Ok(self.outputs.lock().unwrap().get(&line).cloned().unwrap_or_default())
    }
}
