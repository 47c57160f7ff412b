//! "Find the network, broadcast and host range of this address."

use super::sample::{class_address, class_for};
use super::{reject, Difficulty, Exercise, ExerciseKind, ExercisePayload, Rejection};
use crate::error::SubnetError;
use crate::models::{IpClass, Network};
use crate::processing::MAX_ASSIGNABLE_PREFIX;
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentifyParams {
    pub address: Ipv4Addr,
    pub prefix: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentifySolution {
    pub network: Network,
    pub mask: Ipv4Addr,
    pub broadcast: Ipv4Addr,
    pub first_usable: Ipv4Addr,
    pub last_usable: Ipv4Addr,
    pub usable_hosts: u64,
    pub class: IpClass,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentifyNetworkExercise {
    pub params: IdentifyParams,
    pub solution: IdentifySolution,
}

impl IdentifyNetworkExercise {
    fn solve(params: IdentifyParams) -> Result<Self, SubnetError> {
        let network = Network::containing(params.address, params.prefix)?;
        let (first_usable, last_usable) = match (network.first_usable(), network.last_usable()) {
            (Some(first), Some(last)) => (first, last),
            _ => {
                return Err(SubnetError::InsufficientSpace {
                    requested: network.to_string(),
                    reason: "a /31 or /32 has no host range".to_string(),
                    suggestion: format!("use a prefix of /{MAX_ASSIGNABLE_PREFIX} or shorter"),
                })
            }
        };
        let solution = IdentifySolution {
            network,
            mask: network.netmask(),
            broadcast: network.broadcast(),
            first_usable,
            last_usable,
            usable_hosts: network.usable_hosts(),
            class: IpClass::of(params.address),
        };
        Ok(IdentifyNetworkExercise { params, solution })
    }
}

impl Exercise for IdentifyNetworkExercise {
    const KIND: ExerciseKind = ExerciseKind::IdentifyNetwork;

    fn sample<R: Rng + ?Sized>(difficulty: Difficulty, rng: &mut R) -> Result<Self, Rejection> {
        let class = class_for(difficulty);
        let prefix = match difficulty {
            Difficulty::Easy => rng.gen_range(25..=MAX_ASSIGNABLE_PREFIX),
            Difficulty::Medium => rng.gen_range(17..=28),
            Difficulty::Hard => rng.gen_range(9..=29),
        };
        let params = IdentifyParams {
            address: class_address(class, rng),
            prefix,
        };
        Self::solve(params).map_err(Rejection::from)
    }

    fn validate(&self) -> Result<(), Rejection> {
        let IdentifyParams { address, prefix } = self.params;
        let solution = &self.solution;
        if prefix > MAX_ASSIGNABLE_PREFIX {
            return reject(format!("/{prefix} leaves no host range"));
        }
        match IpClass::of(address).default_prefix() {
            Some(default) if prefix > default => {}
            _ => return reject(format!("{address}/{prefix} is not subnetted past its class")),
        }
        if address == solution.network.addr() || address == solution.broadcast {
            return reject(format!("{address} is not a host address in {}", solution.network));
        }
        if !solution.network.contains(address) {
            return reject(format!("{} does not contain {address}", solution.network));
        }
        Ok(())
    }

    fn recompute(&self) -> Result<Self, SubnetError> {
        Self::solve(self.params.clone())
    }

    fn fallback() -> Self {
        Self::solve(IdentifyParams {
            address: Ipv4Addr::new(192, 168, 10, 77),
            prefix: 26,
        })
        .unwrap_or_else(|e| panic!("fixed identify-network instance should never fail: {e}"))
    }

    fn solution_fields(&self) -> BTreeMap<String, String> {
        let s = &self.solution;
        BTreeMap::from([
            ("network".to_string(), s.network.addr().to_string()),
            ("mask".to_string(), s.mask.to_string()),
            ("broadcast".to_string(), s.broadcast.to_string()),
            ("first_usable".to_string(), s.first_usable.to_string()),
            ("last_usable".to_string(), s.last_usable.to_string()),
            ("usable_hosts".to_string(), s.usable_hosts.to_string()),
        ])
    }

    fn into_payload(self) -> ExercisePayload {
        ExercisePayload::IdentifyNetwork(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_solution() {
        let e = IdentifyNetworkExercise::fallback();
        assert_eq!(e.solution.network, Network::new("192.168.10.64/26").unwrap());
        assert_eq!(e.solution.broadcast, Ipv4Addr::new(192, 168, 10, 127));
        assert_eq!(e.solution.first_usable, Ipv4Addr::new(192, 168, 10, 65));
        assert_eq!(e.solution.last_usable, Ipv4Addr::new(192, 168, 10, 126));
        assert_eq!(e.solution.usable_hosts, 62);
        assert_eq!(e.validate(), Ok(()));
    }

    #[test]
    fn test_rejects_network_address_as_host() {
        let e = IdentifyNetworkExercise::solve(IdentifyParams {
            address: Ipv4Addr::new(192, 168, 10, 64),
            prefix: 26,
        })
        .unwrap();
        assert!(e.validate().is_err());
    }

    #[test]
    fn test_rejects_unsubnetted_prefix() {
        let e = IdentifyNetworkExercise::solve(IdentifyParams {
            address: Ipv4Addr::new(10, 1, 2, 3),
            prefix: 8,
        })
        .unwrap();
        assert!(e.validate().is_err());
    }
}
