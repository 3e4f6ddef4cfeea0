use std::{net::IpAddr, str::FromStr};

use actix_web::HttpRequest;
use log::{debug, trace, warn};

pub const FALLBACK_CUSTOMER_IP: &str = "127.0.0.1";

/// Get the remote IP address from the request. It uses 3 sources to determine the IP address, in decreasing order
/// of preference:
/// 1. The first entry of the `X-Forwarded-For` header, iif `use_x_forwarded_for` is set to true in the configuration.
/// 2. The `for=` entry of the `Forwarded` header, iif `use_forwarded` is set to true in the configuration.
/// 3. The peer address from the connection info.
pub fn get_remote_ip(req: &HttpRequest, use_x_forwarded_for: bool, use_forwarded: bool) -> Option<IpAddr> {
    let mut result = None;
    if use_x_forwarded_for {
        trace!("Checking X-Forwarded-For header");
        result = req
            .headers()
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| IpAddr::from_str(s.trim()).ok());
        if let Some(ip) = result {
            debug!("Using X-Forwarded-For header for remote address: {ip}");
        }
    }
    if use_forwarded && result.is_none() {
        trace!("Checking Forwarded header");
        result = req.headers().get("Forwarded").and_then(|v| v.to_str().ok()).and_then(forwarded_for);
        if let Some(ip) = result {
            debug!("Using Forwarded header for remote address: {ip}");
        }
    }
    result.or_else(|| {
        let peer_addr = req.peer_addr().map(|a| a.ip());
        trace!("Using Peer address for remote address: {:?}", peer_addr);
        peer_addr
    })
}

/// The customer IP that is reported to the gateway. Falls back to the loopback address when nothing better is known.
pub fn customer_ip(req: &HttpRequest, use_x_forwarded_for: bool, use_forwarded: bool) -> String {
    get_remote_ip(req, use_x_forwarded_for, use_forwarded).map(|ip| ip.to_string()).unwrap_or_else(|| {
        warn!("💻️ Customer IP not found. Using {FALLBACK_CUSTOMER_IP}.");
        FALLBACK_CUSTOMER_IP.to_string()
    })
}

// Forwarded: for=192.0.2.60;proto=http;by=203.0.113.43, for="[2001:db8:cafe::17]:4711"
fn forwarded_for(value: &str) -> Option<IpAddr> {
    value.split([';', ',']).map(str::trim).find_map(|pair| {
        let (key, val) = pair.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("for") {
            return None;
        }
        let val = val.trim().trim_matches('"');
        let host = match val.strip_prefix('[') {
            Some(v6) => v6.split(']').next()?,
            None => val.rsplit_once(':').filter(|(h, _)| !h.contains(':')).map(|(h, _)| h).unwrap_or(val),
        };
        IpAddr::from_str(host).ok()
    })
}
