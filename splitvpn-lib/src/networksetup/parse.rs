//! Pure parsers over the text output of the macOS network tools.
//!
//! Every parser makes a single forward pass, matches case-sensitive literal
//! markers and returns the first hit. Malformed or empty input degrades to the
//! matching "not found" error instead of panicking.

use regex::Regex;

use std::sync::LazyLock;

use super::{Error, NetworkInfo, NetworkInterface, NetworkService, VpnService};

const INTERFACE_MARKER: &str = "interface";
const SUBNET_MASK_MARKER: &str = "Subnet mask:";
const ROUTER_MARKER: &str = "Router:";
const DEVICE_MARKER: &str = "Device:";
const CONNECTED_MARKER: &str = "(Connected)";

static L2TP_SERVICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(?P<name>[^"]+)"\s+\[PPP:L2TP\]"#).expect("the L2TP service regex is constructible")
});

/// Extracts the device from `route -n get default` output.
///
/// Only lines made of exactly two tokens qualify, the first being the
/// `interface` marker (with or without its trailing colon).
pub fn default_interface<S: AsRef<str>>(lines: &[S]) -> Result<NetworkInterface, Error> {
    lines
        .iter()
        .find_map(|line| {
            let mut tokens = line.as_ref().split_whitespace();
            match (tokens.next(), tokens.next(), tokens.next()) {
                (Some(marker), Some(device), None) if marker.trim_end_matches(':') == INTERFACE_MARKER => {
                    Some(NetworkInterface::from(device))
                }
                _ => None,
            }
        })
        .ok_or(Error::InterfaceNotFound)
}

/// Finds the service bound to `iface` in `networksetup -listnetworkserviceorder` output.
///
/// The output pairs a numbered service line with the descriptor line right
/// below it:
///
/// ```text
/// (1) Wi-Fi
/// (Hardware Port: Wi-Fi, Device: en0)
/// ```
///
/// A descriptor only counts when it directly follows a service line.
pub fn network_service<S: AsRef<str>>(lines: &[S], iface: &NetworkInterface) -> Result<NetworkService, Error> {
    let mut pending: Option<&str> = None;
    for line in lines {
        let line = line.as_ref().trim();
        if let (Some(name), Some(device)) = (pending, descriptor_device(line)) {
            if device == iface.as_str() {
                return Ok(NetworkService::from(name));
            }
        }
        pending = numbered_service(line);
    }
    Err(Error::ServiceNotFound(iface.clone()))
}

/// Reads subnet mask and router from `networksetup -getinfo <service>` output.
pub fn network_info<S: AsRef<str>>(lines: &[S], service: &NetworkService) -> Result<NetworkInfo, Error> {
    let mut subnet_mask = None;
    let mut router = None;
    for line in lines {
        let line = line.as_ref().trim();
        if subnet_mask.is_none() {
            subnet_mask = marked_value(line, SUBNET_MASK_MARKER);
        }
        if router.is_none() {
            router = marked_value(line, ROUTER_MARKER);
        }
    }

    match (subnet_mask, router) {
        (Some(subnet_mask), Some(router)) => Ok(NetworkInfo {
            subnet_mask: subnet_mask.to_string(),
            router: router.to_string(),
        }),
        _ => Err(Error::NetworkInfoNotFound(service.clone())),
    }
}

/// Collects all L2TP services from `scutil --nc list` output.
/// Other PPP flavours are not considered VPN services.
pub fn vpn_services<S: AsRef<str>>(lines: &[S]) -> Vec<VpnService> {
    lines.iter().filter_map(|line| l2tp_service(line.as_ref())).collect()
}

/// Returns the first connected L2TP service from `scutil --nc list` output.
pub fn connected_vpn_service<S: AsRef<str>>(lines: &[S]) -> Result<VpnService, Error> {
    lines
        .iter()
        .map(AsRef::as_ref)
        .filter(|line| line.contains(CONNECTED_MARKER))
        .find_map(l2tp_service)
        .ok_or(Error::VpnServiceNotFound)
}

fn l2tp_service(line: &str) -> Option<VpnService> {
    L2TP_SERVICE
        .captures(line)
        .and_then(|caps| caps.name("name"))
        .map(|name| VpnService::from(name.as_str()))
}

// "(3) USB 10/100 LAN" -> "USB 10/100 LAN"
fn numbered_service(line: &str) -> Option<&str> {
    let (index, name) = line.strip_prefix('(')?.split_once(')')?;
    if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let name = name.trim();
    (!name.is_empty()).then_some(name)
}

// "(Hardware Port: Wi-Fi, Device: en0)" -> "en0"
fn descriptor_device(line: &str) -> Option<&str> {
    let inner = line.strip_prefix('(')?.strip_suffix(')')?;
    let (_, device) = inner.split_once(DEVICE_MARKER)?;
    let mut tokens = device.split_whitespace();
    match (tokens.next(), tokens.next()) {
        (Some(device), None) => Some(device),
        _ => None,
    }
}

fn marked_value<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    let value = line.strip_prefix(marker)?.trim();
    (!value.is_empty()).then_some(value)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    const ROUTE_GET_DEFAULT: &str = r#"
   route to: default
destination: default
       mask: default
    gateway: 192.168.178.1
  interface: en1
      flags: <UP,GATEWAY,DONE,STATIC,PRCLONING,GLOBAL>
 recvpipe  sendpipe  ssthresh  rtt,msec    rttvar  hopcount      mtu     expire
       0         0         0         0         0         0      1500         0
"#;

    const SERVICE_ORDER: &str = r#"An asterisk (*) denotes that a network service is disabled.
(1) Wi-Fi
(Hardware Port: Wi-Fi, Device: en0)

(2) Thunderbolt Bridge
(Hardware Port: Thunderbolt Bridge, Device: bridge0)

(3) USB 10/100 LAN
(Hardware Port: USB 10/100 LAN, Device: en7)

(4) Office VPN
(Hardware Port: L2TP, Device: )
"#;

    const GET_INFO: &str = r#"DHCP Configuration
IP address: 192.168.1.23
Subnet mask: 255.255.255.0
Router: 192.168.1.1
Client ID:
IPv6: Automatic
IPv6 IP address: none
IPv6 Router: none
Wi-Fi ID: 3c:22:fb:00:00:01
"#;

    const NC_LIST: &str = r#"Available network connection services in the current set (*=enabled):
* (Disconnected)   2D6C1A4E-5F0B-4C6B-9A57-1B7E2C0F4A11 PPP --> L2TP       "Office"                         [PPP:L2TP]
* (Connected)      8A1F0C3D-7B2E-4E9A-B1C4-5D6E7F809A12 PPP --> L2TP       "Home Lab"                       [PPP:L2TP]
* (Connected)      91B2C3D4-E5F6-4711-8899-AABBCCDDEEFF PPP --> PPTP       "Legacy"                         [PPP:PPTP]
"#;

    #[test]
    fn parses_default_interface_from_route_output() -> anyhow::Result<()> {
        let iface = default_interface(&lines(ROUTE_GET_DEFAULT))?;
        assert_eq!(iface.as_str(), "en1");
        Ok(())
    }

    #[rstest]
    #[case::bare_marker(&["interface en0"], "en0")]
    #[case::first_conforming_line_wins(&["interface", "interface utun3 extra", "interface en5", "interface: en6"], "en5")]
    fn default_interface_takes_first_two_token_line(#[case] input: &[&str], #[case] expected: &str) -> anyhow::Result<()> {
        assert_eq!(default_interface(input)?.as_str(), expected);
        Ok(())
    }

    #[rstest]
    #[case::empty(&[])]
    #[case::wrong_case(&["Interface: en0"])]
    #[case::marker_only(&["interface:"])]
    #[case::unrelated(&["gateway: 10.0.0.1", "flags: <UP>"])]
    fn default_interface_not_found(#[case] input: &[&str]) {
        assert!(matches!(default_interface(input), Err(Error::InterfaceNotFound)));
    }

    #[rstest]
    #[case("en0", "Wi-Fi")]
    #[case("bridge0", "Thunderbolt Bridge")]
    #[case("en7", "USB 10/100 LAN")]
    fn finds_service_for_interface(#[case] iface: &str, #[case] expected: &str) -> anyhow::Result<()> {
        let service = network_service(&lines(SERVICE_ORDER), &NetworkInterface::from(iface))?;
        assert_eq!(service.as_str(), expected);
        Ok(())
    }

    #[test]
    fn minimal_pair_resolves_wifi() -> anyhow::Result<()> {
        let output = ["(1) Wi-Fi", "(Hardware Port: Wi-Fi, Device: en0)"];
        assert_eq!(network_service(&output, &NetworkInterface::from("en0"))?.as_str(), "Wi-Fi");
        Ok(())
    }

    #[rstest]
    #[case::unknown_device(&["(1) Wi-Fi", "(Hardware Port: Wi-Fi, Device: en0)"], "en9")]
    #[case::empty(&[], "en0")]
    #[case::descriptor_without_service(&["(Hardware Port: Wi-Fi, Device: en0)"], "en0")]
    #[case::not_adjacent(&["(1) Wi-Fi", "", "(Hardware Port: Wi-Fi, Device: en0)"], "en0")]
    #[case::descriptor_first(&["(Hardware Port: Wi-Fi, Device: en0)", "(1) Wi-Fi"], "en0")]
    #[case::unclosed_descriptor(&["(1) Wi-Fi", "(Hardware Port: Wi-Fi, Device: en0"], "en0")]
    #[case::empty_device(&["(4) Office VPN", "(Hardware Port: L2TP, Device: )"], "")]
    #[case::disabled_marker(&["(*) Wi-Fi", "(Hardware Port: Wi-Fi, Device: en0)"], "en0")]
    fn service_not_found(#[case] input: &[&str], #[case] iface: &str) {
        let res = network_service(input, &NetworkInterface::from(iface));
        assert!(matches!(res, Err(Error::ServiceNotFound(i)) if i.as_str() == iface));
    }

    #[test]
    fn parses_network_info() -> anyhow::Result<()> {
        let info = network_info(&lines(GET_INFO), &NetworkService::from("Wi-Fi"))?;
        assert_eq!(
            info,
            NetworkInfo {
                subnet_mask: "255.255.255.0".into(),
                router: "192.168.1.1".into(),
            }
        );
        Ok(())
    }

    #[test]
    fn network_info_order_does_not_matter() -> anyhow::Result<()> {
        let output = ["Router:   10.0.0.1  ", "Subnet mask: 255.255.255.0"];
        let info = network_info(&output, &NetworkService::from("Ethernet"))?;
        assert_eq!(info.subnet_mask, "255.255.255.0");
        assert_eq!(info.router, "10.0.0.1");
        Ok(())
    }

    #[rstest]
    #[case::no_router(&["Subnet mask: 255.255.255.0"])]
    #[case::no_mask(&["Router: 10.0.0.1"])]
    #[case::ipv6_router_only(&["Subnet mask: 255.255.255.0", "IPv6 Router: none"])]
    #[case::empty_value(&["Subnet mask:", "Router: 10.0.0.1"])]
    #[case::empty(&[])]
    fn network_info_not_found(#[case] input: &[&str]) {
        let res = network_info(input, &NetworkService::from("Wi-Fi"));
        assert!(matches!(res, Err(Error::NetworkInfoNotFound(s)) if s.as_str() == "Wi-Fi"));
    }

    #[test]
    fn lists_only_l2tp_services() {
        let services = vpn_services(&lines(NC_LIST));
        assert_eq!(services, vec![VpnService::from("Office"), VpnService::from("Home Lab")]);
    }

    #[test]
    fn pptp_is_excluded() {
        let output = [r#""A" [PPP:L2TP]"#, r#""B" [PPP:PPTP]"#];
        assert_eq!(vpn_services(&output), vec![VpnService::from("A")]);
    }

    #[test]
    fn no_vpn_services_is_empty_list() {
        let services = vpn_services(&["Available network connection services in the current set (*=enabled):"]);
        assert!(services.is_empty());
    }

    #[test]
    fn finds_connected_vpn() -> anyhow::Result<()> {
        let output = [r#""A" [PPP:L2TP] (Disconnected)"#, r#""B" [PPP:L2TP] (Connected)"#];
        assert_eq!(connected_vpn_service(&output)?, VpnService::from("B"));
        assert_eq!(connected_vpn_service(&lines(NC_LIST))?, VpnService::from("Home Lab"));
        Ok(())
    }

    #[rstest]
    #[case::all_disconnected(&[r#""A" [PPP:L2TP] (Disconnected)"#])]
    #[case::connected_pptp(&[r#"* (Connected) "Legacy" [PPP:PPTP]"#])]
    #[case::empty(&[])]
    fn no_connected_vpn(#[case] input: &[&str]) {
        assert!(matches!(connected_vpn_service(input), Err(Error::VpnServiceNotFound)));
    }
}
