//! "Allocate these departments inside this block with VLSM."

use super::{reject, Difficulty, Exercise, ExerciseKind, ExercisePayload, Rejection};
use crate::error::SubnetError;
use crate::models::Network;
use crate::processing::{calculate_vlsm, VlsmRequirement, VlsmResult};
use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

const SEGMENT_NAMES: [&str; 12] = [
    "Sales",
    "Engineering",
    "HR",
    "Admin",
    "Guest",
    "Servers",
    "VoIP",
    "Lab",
    "Finance",
    "Support",
    "Printers",
    "Management",
];

/// Scenarios that leave most of the parent empty are not worth solving.
const MIN_UTILIZATION_PERCENT: f64 = 20.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VlsmParams {
    pub base: Network,
    pub requirements: Vec<VlsmRequirement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VlsmExercise {
    pub params: VlsmParams,
    pub solution: VlsmResult,
}

impl VlsmExercise {
    fn solve(params: VlsmParams) -> Self {
        let solution = calculate_vlsm(&params.base, &params.requirements);
        VlsmExercise { params, solution }
    }
}

impl Exercise for VlsmExercise {
    const KIND: ExerciseKind = ExerciseKind::VlsmScenario;

    fn sample<R: Rng + ?Sized>(difficulty: Difficulty, rng: &mut R) -> Result<Self, Rejection> {
        let (address, prefix, count, max_hosts) = match difficulty {
            Difficulty::Easy => (
                Ipv4Addr::new(192, 168, rng.gen(), 0),
                24,
                rng.gen_range(2..=3),
                60,
            ),
            Difficulty::Medium => (
                Ipv4Addr::new(172, rng.gen_range(16..=31), rng.gen(), 0),
                rng.gen_range(22..=23),
                rng.gen_range(3..=5),
                250,
            ),
            Difficulty::Hard => (
                Ipv4Addr::new(10, rng.gen(), rng.gen(), 0),
                rng.gen_range(20..=21),
                rng.gen_range(4..=7),
                1000,
            ),
        };
        let base = Network::containing(address, prefix)?;
        let names: Vec<&str> = SEGMENT_NAMES.choose_multiple(rng, count).copied().collect();
        let requirements = names
            .into_iter()
            .map(|name| VlsmRequirement::new(name, rng.gen_range(2..=max_hosts)))
            .collect();
        Ok(Self::solve(VlsmParams { base, requirements }))
    }

    fn validate(&self) -> Result<(), Rejection> {
        let requirements = &self.params.requirements;
        let solution = &self.solution;
        if requirements.len() < 2 {
            return reject("fewer than two requirements");
        }
        if !requirements.iter().map(|r| &r.name).all_unique() {
            return reject("duplicate segment names");
        }
        if let Some(entry) = solution.entries.iter().find(|e| e.network().is_none()) {
            return reject(format!("{} could not be placed", entry.requirement.name));
        }
        let networks = solution.networks();
        let base = self.params.base;
        if let Some(outside) = networks.iter().find(|n| !base.contains_network(n)) {
            return reject(format!("{outside} is outside {base}"));
        }
        if networks
            .iter()
            .tuple_combinations()
            .any(|(a, b)| a.overlaps(b))
        {
            return reject("assigned blocks overlap");
        }
        if solution.summary.utilization_percent < MIN_UTILIZATION_PERCENT {
            return reject(format!(
                "only {:.1}% of {base} is used",
                solution.summary.utilization_percent
            ));
        }
        Ok(())
    }

    fn recompute(&self) -> Result<Self, SubnetError> {
        Ok(Self::solve(self.params.clone()))
    }

    fn fallback() -> Self {
        let base = Network::from_parts(Ipv4Addr::new(192, 168, 1, 0), 24)
            .unwrap_or_else(|e| panic!("fixed base should never be invalid: {e}"));
        Self::solve(VlsmParams {
            base,
            requirements: vec![
                VlsmRequirement::new("Sales", 100),
                VlsmRequirement::new("Engineering", 50),
                VlsmRequirement::new("Admin", 10),
            ],
        })
    }

    fn solution_fields(&self) -> BTreeMap<String, String> {
        self.solution
            .entries
            .iter()
            .filter_map(|e| Some((e.requirement.name.clone(), e.network()?.to_string())))
            .collect()
    }

    fn into_payload(self) -> ExercisePayload {
        ExercisePayload::VlsmScenario(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_solution() {
        let e = VlsmExercise::fallback();
        let fields = e.solution_fields();
        assert_eq!(fields["Sales"], "192.168.1.0/25");
        assert_eq!(fields["Engineering"], "192.168.1.128/26");
        assert_eq!(fields["Admin"], "192.168.1.192/28");
        assert_eq!(e.validate(), Ok(()));
    }

    #[test]
    fn test_rejects_overflowing_scenario() {
        let e = VlsmExercise::solve(VlsmParams {
            base: Network::new("192.168.1.0/24").unwrap(),
            requirements: vec![
                VlsmRequirement::new("A", 120),
                VlsmRequirement::new("B", 120),
                VlsmRequirement::new("C", 10),
            ],
        });
        assert!(e.validate().is_err());
    }

    #[test]
    fn test_rejects_mostly_empty_parent() {
        let e = VlsmExercise::solve(VlsmParams {
            base: Network::new("10.0.0.0/20").unwrap(),
            requirements: vec![VlsmRequirement::new("A", 2), VlsmRequirement::new("B", 2)],
        });
        assert!(e.validate().is_err());
    }
}
