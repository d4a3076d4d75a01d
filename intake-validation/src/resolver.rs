//! Host name resolution for the `activeUrl` rule

use std::net::ToSocketAddrs;

/// Resolves host names; the `activeUrl` rule passes when this returns true.
pub trait HostResolver: Send + Sync {
    fn resolves(&self, host: &str) -> bool;
}

/// Resolver backed by the system's blocking name lookup
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemResolver;

impl HostResolver for SystemResolver {
    fn resolves(&self, host: &str) -> bool {
        (host, 80)
            .to_socket_addrs()
            .map(|mut addrs| addrs.next().is_some())
            .unwrap_or(false)
    }
}

impl<F> HostResolver for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn resolves(&self, host: &str) -> bool {
        self(host)
    }
}
