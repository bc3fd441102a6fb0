use std::fmt::{Display, Formatter};
use std::net::IpAddr;

pub mod ipify;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpFamily {
    V4,
    V6,
}

impl IpFamily {
    pub fn matches(&self, addr: &IpAddr) -> bool {
        match self {
            IpFamily::V4 => addr.is_ipv4(),
            IpFamily::V6 => addr.is_ipv6(),
        }
    }

    /// The `[DNS]` flag switching this family on or off.
    pub fn setting(&self) -> &'static str {
        match self {
            IpFamily::V4 => "ipv4",
            IpFamily::V6 => "ipv6",
        }
    }
}

impl Display for IpFamily {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            IpFamily::V4 => f.write_str("IPv4"),
            IpFamily::V6 => f.write_str("IPv6"),
        }
    }
}

/// Looks up the public address of this host.
#[cfg_attr(test, mockall::automock(type Error = ipify::IpifyError;))]
#[async_trait::async_trait]
pub trait IpSource: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the address exactly as the lookup service reported it.
    async fn public_ip(&self, family: IpFamily) -> Result<String, Self::Error>;
}

/// Addresses resolved once per run. A family is `None` only when it is
/// disabled in the settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicAddresses {
    pub ipv4: Option<String>,
    pub ipv6: Option<String>,
}

impl PublicAddresses {
    pub fn get(&self, family: IpFamily) -> Option<&str> {
        match family {
            IpFamily::V4 => self.ipv4.as_deref(),
            IpFamily::V6 => self.ipv6.as_deref(),
        }
    }

    pub fn set(&mut self, family: IpFamily, ip: String) {
        match family {
            IpFamily::V4 => self.ipv4 = Some(ip),
            IpFamily::V6 => self.ipv6 = Some(ip),
        }
    }
}
