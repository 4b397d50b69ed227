#![deny(unsafe_code)]
#![deny(warnings)]
//! Network stack manager

use defmt::{info, warn};
use embassy_net::Stack;

/// Wait for DHCP, then log the lease
///
/// Reports are only attempted once this returns.
pub async fn wait_for_config(stack: &Stack<'_>) {
    info!("Waiting for DHCP...");
    stack.wait_config_up().await;
    info!("Network is UP!");

    let Some(config) = stack.config_v4() else {
        warn!("Link up without an IPv4 configuration");
        return;
    };

    let octets = config.address.address().octets();
    info!(
        "IP: {}.{}.{}.{}/{}",
        octets[0],
        octets[1],
        octets[2],
        octets[3],
        config.address.prefix_len()
    );

    if let Some(gateway) = config.gateway {
        let gw = gateway.octets();
        info!("Gateway: {}.{}.{}.{}", gw[0], gw[1], gw[2], gw[3]);
    }

    if config.dns_servers.is_empty() {
        warn!("DHCP offered no DNS servers; only IP backend hosts will resolve");
    }
    for dns in config.dns_servers.iter() {
        let d = dns.octets();
        info!("DNS: {}.{}.{}.{}", d[0], d[1], d[2], d[3]);
    }
}
