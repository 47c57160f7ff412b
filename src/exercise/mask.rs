//! "Which mask gives at least N hosts per subnet?"

use super::sample::{class_for, classful_network};
use super::{reject, Difficulty, Exercise, ExerciseKind, ExercisePayload, Rejection};
use crate::error::SubnetError;
use crate::models::{Network, MAX_LENGTH};
use crate::processing::{calculate_vlsm, VlsmRequirement, VlsmStatus, MAX_ASSIGNABLE_PREFIX};
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaskParams {
    pub base: Network,
    pub hosts_needed: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaskSolution {
    pub prefix: u8,
    pub mask: Ipv4Addr,
    pub wildcard: Ipv4Addr,
    pub host_bits: u8,
    pub block_size: u64,
    pub usable_hosts: u64,
    /// Blocks of this size inside `base`.
    pub subnets_in_base: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalculateMaskExercise {
    pub params: MaskParams,
    pub solution: MaskSolution,
}

impl CalculateMaskExercise {
    /// The first block VLSM hands out for a single requirement is the answer.
    fn solve(params: MaskParams) -> Result<Self, SubnetError> {
        let requirement = VlsmRequirement::new("hosts", params.hosts_needed);
        let result = calculate_vlsm(&params.base, &[requirement]);
        let entry = result.entries.into_iter().next().ok_or_else(|| {
            SubnetError::invalid_format(&params.hosts_needed.to_string(), "host count")
        })?;
        let network = match entry.status {
            VlsmStatus::Assigned { network, .. } => network,
            VlsmStatus::Error { reason } => return Err(reason),
        };
        let solution = MaskSolution {
            prefix: network.prefix(),
            mask: network.netmask(),
            wildcard: network.wildcard(),
            host_bits: entry.host_bits,
            block_size: network.block_size(),
            usable_hosts: network.usable_hosts(),
            subnets_in_base: 1u64 << (network.prefix() - params.base.prefix()),
        };
        Ok(CalculateMaskExercise { params, solution })
    }
}

impl Exercise for CalculateMaskExercise {
    const KIND: ExerciseKind = ExerciseKind::CalculateMask;

    fn sample<R: Rng + ?Sized>(difficulty: Difficulty, rng: &mut R) -> Result<Self, Rejection> {
        let base = classful_network(class_for(difficulty), rng);
        let hosts_needed = match difficulty {
            Difficulty::Easy => rng.gen_range(2..=250),
            Difficulty::Medium => rng.gen_range(60..=40_000),
            Difficulty::Hard => rng.gen_range(500..=9_000_000),
        };
        Self::solve(MaskParams { base, hosts_needed }).map_err(Rejection::from)
    }

    fn validate(&self) -> Result<(), Rejection> {
        let base = self.params.base;
        let s = &self.solution;
        if s.prefix <= base.prefix() {
            return reject(format!(
                "{} hosts leave no subnet bits in {base}",
                self.params.hosts_needed
            ));
        }
        if s.prefix > MAX_ASSIGNABLE_PREFIX {
            return reject(format!("/{} is not assignable", s.prefix));
        }
        if s.usable_hosts < self.params.hosts_needed as u64 {
            return reject("mask does not fit the hosts");
        }
        // Smallest: one more host bit would be too many, one fewer too few.
        if s.prefix < MAX_ASSIGNABLE_PREFIX
            && s.usable_hosts / 2 > self.params.hosts_needed as u64
        {
            return reject(format!("/{} is larger than needed", s.prefix));
        }
        if s.host_bits != MAX_LENGTH - s.prefix {
            return reject("host bits disagree with the prefix");
        }
        Ok(())
    }

    fn recompute(&self) -> Result<Self, SubnetError> {
        Self::solve(self.params.clone())
    }

    fn fallback() -> Self {
        Self::solve(MaskParams {
            base: Network::from_parts(Ipv4Addr::new(192, 168, 1, 0), 24)
                .unwrap_or_else(|e| panic!("fixed base should never be invalid: {e}")),
            hosts_needed: 50,
        })
        .unwrap_or_else(|e| panic!("fixed calculate-mask instance should never fail: {e}"))
    }

    fn solution_fields(&self) -> BTreeMap<String, String> {
        let s = &self.solution;
        BTreeMap::from([
            ("prefix".to_string(), format!("/{}", s.prefix)),
            ("mask".to_string(), s.mask.to_string()),
            ("usable_hosts".to_string(), s.usable_hosts.to_string()),
            ("block_size".to_string(), s.block_size.to_string()),
        ])
    }

    fn into_payload(self) -> ExercisePayload {
        ExercisePayload::CalculateMask(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solve(base: &str, hosts: u32) -> CalculateMaskExercise {
        CalculateMaskExercise::solve(MaskParams {
            base: Network::new(base).unwrap(),
            hosts_needed: hosts,
        })
        .unwrap()
    }

    #[test]
    fn test_fallback_solution() {
        let e = CalculateMaskExercise::fallback();
        assert_eq!(e.solution.prefix, 26);
        assert_eq!(e.solution.mask, Ipv4Addr::new(255, 255, 255, 192));
        assert_eq!(e.solution.usable_hosts, 62);
        assert_eq!(e.solution.subnets_in_base, 4);
        assert_eq!(e.validate(), Ok(()));
    }

    #[test]
    fn test_power_of_two_boundaries() {
        // 62 fits a /26 exactly, 63 spills into a /25
        assert_eq!(solve("192.168.1.0/24", 62).solution.prefix, 26);
        assert_eq!(solve("192.168.1.0/24", 63).solution.prefix, 25);
        assert_eq!(solve("172.16.0.0/16", 1000).solution.prefix, 22);
    }

    #[test]
    fn test_rejects_hosts_filling_the_network() {
        let e = solve("192.168.1.0/24", 200);
        assert_eq!(e.solution.prefix, 24);
        assert!(e.validate().is_err());
    }

    #[test]
    fn test_too_many_hosts_is_an_engine_error() {
        let err = CalculateMaskExercise::solve(MaskParams {
            base: Network::new("192.168.1.0/24").unwrap(),
            hosts_needed: 300,
        })
        .unwrap_err();
        assert!(matches!(err, SubnetError::InsufficientSpace { .. }));
    }
}
