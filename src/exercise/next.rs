//! "What is the next network after the one containing this address?"

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
pub struct NextParams {
    pub address: Ipv4Addr,
    pub prefix: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NextSolution {
    pub network: Network,
    /// Increment between consecutive networks.
    pub block_size: u64,
    pub next_network: Network,
    pub next_broadcast: Ipv4Addr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NextNetworkExercise {
    pub params: NextParams,
    pub solution: NextSolution,
}

impl NextNetworkExercise {
    fn solve(params: NextParams) -> Result<Self, SubnetError> {
        let network = Network::containing(params.address, params.prefix)?;
        let next_network = network.next()?;
        Ok(NextNetworkExercise {
            params,
            solution: NextSolution {
                network,
                block_size: network.block_size(),
                next_network,
                next_broadcast: next_network.broadcast(),
            },
        })
    }
}

impl Exercise for NextNetworkExercise {
    const KIND: ExerciseKind = ExerciseKind::NextNetwork;

    fn sample<R: Rng + ?Sized>(difficulty: Difficulty, rng: &mut R) -> Result<Self, Rejection> {
        let prefix = match difficulty {
            Difficulty::Easy => rng.gen_range(25..=MAX_ASSIGNABLE_PREFIX),
            Difficulty::Medium => rng.gen_range(17..=28),
            Difficulty::Hard => rng.gen_range(9..=29),
        };
        let params = NextParams {
            address: class_address(class_for(difficulty), rng),
            prefix,
        };
        Self::solve(params).map_err(Rejection::from)
    }

    fn validate(&self) -> Result<(), Rejection> {
        let NextParams { address, prefix } = self.params;
        if prefix > MAX_ASSIGNABLE_PREFIX {
            return reject(format!("/{prefix} is not assignable"));
        }
        let class = IpClass::of(address);
        let default_prefix = match class.default_prefix() {
            Some(default) if prefix > default => default,
            _ => return reject(format!("{address}/{prefix} is not subnetted past class {class}")),
        };
        // The next network must still belong to the same classful network.
        let classful = Network::containing(address, default_prefix)?;
        if !classful.contains_network(&self.solution.next_network) {
            return reject(format!(
                "{} leaves the classful network {classful}",
                self.solution.next_network
            ));
        }
        Ok(())
    }

    fn recompute(&self) -> Result<Self, SubnetError> {
        Self::solve(self.params.clone())
    }

    fn fallback() -> Self {
        Self::solve(NextParams {
            address: Ipv4Addr::new(192, 168, 1, 70),
            prefix: 26,
        })
        .unwrap_or_else(|e| panic!("fixed next-network instance should never fail: {e}"))
    }

    fn solution_fields(&self) -> BTreeMap<String, String> {
        let s = &self.solution;
        BTreeMap::from([
            ("next_network".to_string(), s.next_network.addr().to_string()),
            ("next_broadcast".to_string(), s.next_broadcast.to_string()),
        ])
    }

    fn into_payload(self) -> ExercisePayload {
        ExercisePayload::NextNetwork(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_solution() {
        let e = NextNetworkExercise::fallback();
        assert_eq!(e.solution.network, Network::new("192.168.1.64/26").unwrap());
        assert_eq!(e.solution.next_network, Network::new("192.168.1.128/26").unwrap());
        assert_eq!(e.solution.next_broadcast, Ipv4Addr::new(192, 168, 1, 191));
        assert_eq!(e.validate(), Ok(()));
    }

    #[test]
    fn test_carry_into_higher_octet() {
        let e = NextNetworkExercise::solve(NextParams {
            address: Ipv4Addr::new(172, 16, 3, 200),
            prefix: 22,
        })
        .unwrap();
        assert_eq!(e.solution.next_network, Network::new("172.16.4.0/22").unwrap());
        assert_eq!(e.validate(), Ok(()));
    }

    #[test]
    fn test_rejects_leaving_classful_network() {
        let e = NextNetworkExercise::solve(NextParams {
            address: Ipv4Addr::new(192, 168, 1, 200),
            prefix: 26,
        })
        .unwrap();
        assert_eq!(e.solution.next_network, Network::new("192.168.2.0/26").unwrap());
        assert!(e.validate().is_err());
    }
}
