//! CIDR subnet literals for IPWithin

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use crate::error::Error;

/// An address prefix such as `192.168.1.0/24` or `fd00::/8`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subnet {
    network: IpAddr,
    prefix_len: u8,
}

impl Subnet {
    pub fn new(network: IpAddr, prefix_len: u8) -> Result<Self, Error> {
        let max = match network {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        if prefix_len > max {
            return Err(Error::InvalidSubnet(format!("{}/{}", network, prefix_len)));
        }
        Ok(Self {
            network,
            prefix_len,
        })
    }

    /// Strict containment test; an address never matches a subnet of the other family
    pub fn contains(&self, addr: &IpAddr) -> bool {
        match (self.network, addr) {
            (IpAddr::V4(net), IpAddr::V4(a)) => {
                let mask = mask_u32(self.prefix_len);
                u32::from(net) & mask == u32::from(*a) & mask
            }
            (IpAddr::V6(net), IpAddr::V6(a)) => {
                let mask = mask_u128(self.prefix_len);
                u128::from(net) & mask == u128::from(*a) & mask
            }
            _ => false,
        }
    }
}

fn mask_u32(len: u8) -> u32 {
    if len == 0 { 0 } else { u32::MAX << (32 - u32::from(len)) }
}

fn mask_u128(len: u8) -> u128 {
    if len == 0 { 0 } else { u128::MAX << (128 - u32::from(len)) }
}

impl FromStr for Subnet {
    type Err = Error;

    /// A bare address is read as a single-host subnet
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidSubnet(s.to_string());
        match s.split_once('/') {
            Some((addr, len)) => {
                let network: IpAddr = addr.trim().parse().map_err(|_| invalid())?;
                let prefix_len: u8 = len.trim().parse().map_err(|_| invalid())?;
                Self::new(network, prefix_len)
            }
            None => {
                let network: IpAddr = s.trim().parse().map_err(|_| invalid())?;
                let len = if network.is_ipv4() { 32 } else { 128 };
                Self::new(network, len)
            }
        }
    }
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}
