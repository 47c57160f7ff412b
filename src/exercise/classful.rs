//! "Subnet this classful network for N subnets / N hosts" under the
//! legacy zero/all-ones convention.

use super::sample::{class_for, classful_network, value_needing_bits};
use super::{reject, Difficulty, Exercise, ExerciseKind, ExercisePayload, Rejection};
use crate::error::SubnetError;
use crate::models::Network;
use crate::processing::{
    calculate_classful, ClassfulRequirement, ClassfulSummary, RequirementKind, SubnetPolicy,
    MIN_HOST_BITS,
};
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassfulParams {
    pub base: Network,
    pub requirement: ClassfulRequirement,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassfulSolution {
    #[serde(flatten)]
    pub summary: ClassfulSummary,
    pub first_usable_subnet: Network,
    pub last_usable_subnet: Network,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassfulExercise {
    pub params: ClassfulParams,
    pub solution: ClassfulSolution,
}

/// Only the summary and the two usable ends are kept, so listing stays tiny.
fn policy() -> SubnetPolicy {
    SubnetPolicy::legacy().with_max_listed(2)
}

impl ClassfulExercise {
    fn solve(params: ClassfulParams) -> Result<Self, SubnetError> {
        let result = calculate_classful(params.base.addr(), params.requirement, &policy())?;
        let first = result.first_usable_subnet();
        let last = result.last_usable_subnet();
        let (first, last) = match (first, last) {
            (Some(first), Some(last)) => (first.network, last.network),
            _ => {
                return Err(SubnetError::InsufficientSpace {
                    requested: params.requirement.to_string(),
                    reason: "no usable subnet remains".to_string(),
                    suggestion: "borrow more bits".to_string(),
                })
            }
        };
        Ok(ClassfulExercise {
            params,
            solution: ClassfulSolution {
                summary: result.summary,
                first_usable_subnet: first,
                last_usable_subnet: last,
            },
        })
    }
}

impl Exercise for ClassfulExercise {
    const KIND: ExerciseKind = ExerciseKind::ClassfulLegacy;

    fn sample<R: Rng + ?Sized>(difficulty: Difficulty, rng: &mut R) -> Result<Self, Rejection> {
        let base = classful_network(class_for(difficulty), rng);
        // Ranges reach one bit past the class limit; those draws get rejected.
        let requirement = if rng.gen_bool(0.5) {
            let bits = match difficulty {
                Difficulty::Easy => rng.gen_range(2..=7),
                Difficulty::Medium => rng.gen_range(3..=15),
                Difficulty::Hard => rng.gen_range(4..=23),
            };
            ClassfulRequirement::subnets(value_needing_bits(bits, rng))
        } else {
            let bits = match difficulty {
                Difficulty::Easy => rng.gen_range(2..=7),
                Difficulty::Medium => rng.gen_range(4..=15),
                Difficulty::Hard => rng.gen_range(6..=23),
            };
            ClassfulRequirement::hosts(value_needing_bits(bits, rng))
        };
        Self::solve(ClassfulParams { base, requirement }).map_err(Rejection::from)
    }

    fn validate(&self) -> Result<(), Rejection> {
        let summary = &self.solution.summary;
        let requirement = self.params.requirement;
        let value = requirement.value as u64;
        if summary.bits_borrowed < 2 {
            return reject(format!("only {} bits borrowed", summary.bits_borrowed));
        }
        if summary.host_bits < MIN_HOST_BITS {
            return reject(format!("only {} host bits left", summary.host_bits));
        }
        let satisfied = match requirement.kind {
            RequirementKind::Subnets => summary.usable_subnets >= value,
            RequirementKind::Hosts => summary.usable_hosts_per_subnet >= value,
        };
        if !satisfied {
            return reject(format!("{requirement} not met by /{}", summary.new_prefix));
        }
        let base = self.params.base;
        let (first, last) = (self.solution.first_usable_subnet, self.solution.last_usable_subnet);
        if !base.contains_network(&first) || !base.contains_network(&last) || first > last {
            return reject(format!("usable range {first}..{last} is outside {base}"));
        }
        Ok(())
    }

    fn recompute(&self) -> Result<Self, SubnetError> {
        Self::solve(self.params.clone())
    }

    fn fallback() -> Self {
        Self::solve(ClassfulParams {
            base: Network::from_parts(Ipv4Addr::new(192, 168, 1, 0), 24)
                .unwrap_or_else(|e| panic!("fixed base should never be invalid: {e}")),
            requirement: ClassfulRequirement::subnets(2),
        })
        .unwrap_or_else(|e| panic!("fixed classful-legacy instance should never fail: {e}"))
    }

    fn solution_fields(&self) -> BTreeMap<String, String> {
        let s = &self.solution.summary;
        BTreeMap::from([
            ("new_prefix".to_string(), format!("/{}", s.new_prefix)),
            ("new_mask".to_string(), s.new_mask.to_string()),
            ("bits_borrowed".to_string(), s.bits_borrowed.to_string()),
            ("total_subnets".to_string(), s.total_subnets.to_string()),
            ("usable_subnets".to_string(), s.usable_subnets.to_string()),
            (
                "usable_hosts_per_subnet".to_string(),
                s.usable_hosts_per_subnet.to_string(),
            ),
            (
                "first_usable_subnet".to_string(),
                self.solution.first_usable_subnet.to_string(),
            ),
            (
                "last_usable_subnet".to_string(),
                self.solution.last_usable_subnet.to_string(),
            ),
        ])
    }

    fn into_payload(self) -> ExercisePayload {
        ExercisePayload::ClassfulLegacy(self)
    }
}
