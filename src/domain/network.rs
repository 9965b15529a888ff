// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Fabric with Computed Subnet Partition
//!
//! The fabric is the only node every other resource attaches to. Its subnet
//! layout is derived from the address space, not listed literally: the CIDR
//! block is split into equal blocks, one public and one private per
//! availability zone.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use super::invariants::ValidationError;

/// Smallest subnet a provider will accept
pub const MIN_SUBNET_PREFIX: u8 = 28;

/// Address space used when no other is configured
pub const DEFAULT_NETWORK_CIDR: Cidr = Cidr {
    address: Ipv4Addr::new(10, 0, 0, 0),
    prefix_length: 16,
};

/// IPv4 block in CIDR notation
///
/// # Invariants
/// - Valid IPv4 address
/// - Prefix length 0-32
/// - Host bits are cleared (the stored address is the network address)
///
/// # Examples
///
/// ```rust
/// use cim_topology::domain::Cidr;
///
/// let cidr = Cidr::new("10.0.0.0/16").unwrap();
/// assert_eq!(cidr.prefix_length(), 16);
/// assert!(Cidr::new("10.0.0.1/16").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cidr {
    address: Ipv4Addr,
    prefix_length: u8,
}

impl Cidr {
    /// Parse a CIDR block such as `10.0.0.0/16`
    pub fn new(cidr: impl AsRef<str>) -> Result<Self, ValidationError> {
        let cidr = cidr.as_ref();
        let (addr_str, prefix_str) = cidr
            .split_once('/')
            .ok_or_else(|| ValidationError::InvalidCidr(cidr.to_string()))?;

        let address = Ipv4Addr::from_str(addr_str)
            .map_err(|_| ValidationError::InvalidCidr(cidr.to_string()))?;
        let prefix_length = prefix_str
            .parse::<u8>()
            .map_err(|_| ValidationError::InvalidCidr(cidr.to_string()))?;

        Self::from_parts(address, prefix_length)
            .map_err(|_| ValidationError::InvalidCidr(cidr.to_string()))
    }

    /// Create from an address and prefix
    pub fn from_parts(address: Ipv4Addr, prefix_length: u8) -> Result<Self, ValidationError> {
        if prefix_length > 32 {
            return Err(ValidationError::InvalidCidr(format!(
                "{address}/{prefix_length}"
            )));
        }

        // Invariant: no host bits
        let bits = u32::from(address);
        if bits & !Self::mask(prefix_length) != 0 {
            return Err(ValidationError::InvalidCidr(format!(
                "{address}/{prefix_length}"
            )));
        }

        Ok(Self {
            address,
            prefix_length,
        })
    }

    fn mask(prefix_length: u8) -> u32 {
        if prefix_length == 0 {
            0
        } else {
            u32::MAX << (32 - u32::from(prefix_length))
        }
    }

    /// Network address
    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    /// Prefix length
    pub fn prefix_length(&self) -> u8 {
        self.prefix_length
    }

    /// Number of addresses in the block
    pub fn size(&self) -> u64 {
        1u64 << (32 - u32::from(self.prefix_length))
    }

    /// Whether `other` lies entirely inside this block
    pub fn contains(&self, other: &Cidr) -> bool {
        other.prefix_length >= self.prefix_length
            && u32::from(other.address) & Self::mask(self.prefix_length) == u32::from(self.address)
    }

    /// Split into `2^extra_bits` equal consecutive blocks
    pub fn split(&self, extra_bits: u8) -> Result<Vec<Cidr>, ValidationError> {
        let prefix = self.prefix_length.saturating_add(extra_bits);
        if prefix > 32 {
            return Err(ValidationError::InvalidNetwork(format!(
                "{self} cannot be split into 2^{extra_bits} blocks"
            )));
        }

        let step = 1u64 << (32 - u32::from(prefix));
        let base = u64::from(u32::from(self.address));
        (0..(1u64 << extra_bits))
            .map(|i| {
                // base + i * step stays within the parent block, so it fits in u32
                let addr = (base + i * step) as u32;
                Cidr::from_parts(Ipv4Addr::from(addr), prefix)
            })
            .collect()
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_length)
    }
}

impl FromStr for Cidr {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Cidr {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Cidr> for String {
    fn from(cidr: Cidr) -> Self {
        cidr.to_string()
    }
}

/// Subnet reachability tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubnetTier {
    /// Routed through an internet gateway
    Public,
    /// Egress only, through a NAT gateway
    Private,
}

/// One block of the fabric's partition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subnet {
    pub name: String,
    pub tier: SubnetTier,
    /// Zero-based availability zone slot
    pub zone: u8,
    pub cidr: Cidr,
}

/// Isolated address space and its subnet partition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkFabric {
    pub cidr: Cidr,
    pub max_azs: u8,
    pub nat_gateways: u8,
    pub subnets: Vec<Subnet>,
}

impl NetworkFabric {
    /// Partition `cidr` into one public and one private subnet per zone
    ///
    /// # Invariants
    /// - At least one zone
    /// - NAT gateways never exceed the zone count
    /// - Every subnet is at least a /28
    /// - Public subnets come first, ordered by zone
    pub fn partition(cidr: Cidr, max_azs: u8, nat_gateways: u8) -> Result<Self, ValidationError> {
        if max_azs == 0 {
            return Err(ValidationError::InvalidNetwork(
                "at least one availability zone is required".to_string(),
            ));
        }
        if nat_gateways > max_azs {
            return Err(ValidationError::InvalidNetwork(format!(
                "{nat_gateways} NAT gateways requested for {max_azs} zones"
            )));
        }

        let count = u32::from(max_azs) * 2;
        let extra_bits = u32::BITS - (count - 1).leading_zeros();
        let blocks = cidr.split(extra_bits as u8)?;

        if let Some(first) = blocks.first() {
            if first.prefix_length() > MIN_SUBNET_PREFIX {
                return Err(ValidationError::InvalidNetwork(format!(
                    "{cidr} is too small for {count} subnets"
                )));
            }
        }

        let subnets = [SubnetTier::Public, SubnetTier::Private]
            .into_iter()
            .flat_map(|tier| (0..max_azs).map(move |zone| (tier, zone)))
            .zip(blocks)
            .map(|((tier, zone), cidr)| Subnet {
                name: match tier {
                    SubnetTier::Public => format!("Public{}", zone + 1),
                    SubnetTier::Private => format!("Private{}", zone + 1),
                },
                tier,
                zone,
                cidr,
            })
            .collect();

        Ok(Self {
            cidr,
            max_azs,
            nat_gateways,
            subnets,
        })
    }

    /// Subnets of one tier
    pub fn subnets_in(&self, tier: SubnetTier) -> impl Iterator<Item = &Subnet> {
        self.subnets.iter().filter(move |s| s.tier == tier)
    }
}
