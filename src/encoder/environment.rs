use parking_lot::{Mutex, RwLock};
use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use std::time::{Duration, Instant};
use tracing::debug;

/// How long a resolved interface address is reused before the route is
/// looked up again.
pub const DEFAULT_ADDRESS_REFRESH: Duration = Duration::from_secs(30);

#[cfg(test)]
use mockall::automock;

/// Identity of the emitting process, sampled fresh for every record.
#[cfg_attr(test, automock)]
pub trait EnvironmentInfo: Send + Sync {
    fn application_name(&self) -> String;
    fn host(&self) -> String;
    fn process_id(&self) -> u32;
    fn ip_address(&self) -> String;
    fn ip_address_remote(&self) -> Option<String>;
    fn user_agent(&self) -> Option<String>;
    fn operation(&self) -> Option<String>;
}

#[derive(Debug, Default, Clone)]
struct OperationContext {
    user_agent: Option<String>,
    operation: Option<String>,
}

/// [`EnvironmentInfo`] backed by the operating system.
///
/// User agent and operation are application-provided context; set them with
/// [`SystemEnvironment::set_user_agent`] and [`SystemEnvironment::set_operation`].
#[derive(Debug)]
pub struct SystemEnvironment {
    application_name: String,
    remote_address: Option<String>,
    context: RwLock<OperationContext>,
    address_refresh: Duration,
    local_address: Mutex<Option<(IpAddr, Instant)>>,
}

impl SystemEnvironment {
    pub fn new(application_name: impl Into<String>) -> Self {
        Self {
            application_name: application_name.into(),
            remote_address: None,
            context: RwLock::new(OperationContext::default()),
            address_refresh: DEFAULT_ADDRESS_REFRESH,
            local_address: Mutex::new(None),
        }
    }

    /// Sets how long the local address is cached. `Duration::ZERO` resolves it
    /// on every record.
    pub fn with_address_refresh(mut self, refresh: Duration) -> Self {
        self.address_refresh = refresh;
        self
    }

    pub fn with_remote_address(mut self, remote_address: impl Into<String>) -> Self {
        self.remote_address = Some(remote_address.into());
        self
    }

    pub fn set_user_agent(&self, user_agent: Option<String>) {
        self.context.write().user_agent = user_agent;
    }

    pub fn set_operation(&self, operation: Option<String>) {
        self.context.write().operation = operation;
    }

    /// Local address, resolved at most once per refresh interval so the emit
    /// path does not open a socket for every record.
    fn cached_local_address(&self) -> IpAddr {
        let mut cached = self.local_address.lock();
        if let Some((address, resolved_at)) = *cached {
            if resolved_at.elapsed() < self.address_refresh {
                return address;
            }
        }
        let address = Self::resolve_local_address();
        *cached = Some((address, Instant::now()));
        address
    }

    /// Address of the interface holding the default route. Connecting a UDP
    /// socket sends nothing; it only resolves the route. Falls back to
    /// loopback when no route or socket is available, and keeps that until the
    /// next refresh.
    fn resolve_local_address() -> IpAddr {
        UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
            .and_then(|socket| {
                socket.connect((Ipv4Addr::new(192, 0, 2, 1), 9))?;
                socket.local_addr()
            })
            .map(|addr| addr.ip())
            .unwrap_or_else(|e| {
                debug!(error = %e, "Could not resolve local address, reporting loopback");
                IpAddr::V4(Ipv4Addr::LOCALHOST)
            })
    }
}

impl Default for SystemEnvironment {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_NAME"))
    }
}

impl EnvironmentInfo for SystemEnvironment {
    fn application_name(&self) -> String {
        self.application_name.clone()
    }

    fn host(&self) -> String {
        hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "unknown".to_string())
    }

    fn process_id(&self) -> u32 {
        std::process::id()
    }

    fn ip_address(&self) -> String {
        self.cached_local_address().to_string()
    }

    fn ip_address_remote(&self) -> Option<String> {
        self.remote_address.clone()
    }

    fn user_agent(&self) -> Option<String> {
        self.context.read().user_agent.clone()
    }

    fn operation(&self) -> Option<String> {
        self.context.read().operation.clone()
    }
}
