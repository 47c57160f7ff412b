//! "Find the summary route for these networks."
//!
//! Members are a run of equal-size networks. Harder levels use smaller or
//! unaligned members, knock holes in the run and shuffle the list.

use super::sample::{class_address, class_for};
use super::{reject, Difficulty, Exercise, ExerciseKind, ExercisePayload, Rejection};
use crate::error::SubnetError;
use crate::models::{Network, MAX_LENGTH};
use crate::processing::{aggregation_efficiency, find_summary_for_networks, AggregationEfficiency};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

/// Summaries wider than this are not realistic routing table entries.
const MIN_SUMMARY_PREFIX: u8 = 8;

/// Summary block may be at most four times the address space in use.
const MIN_EFFICIENCY_PERCENT: f64 = 25.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryParams {
    pub networks: Vec<Network>,
    /// Members removed from the middle of the run.
    pub holes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummarySolution {
    pub summary: Network,
    pub mask: Ipv4Addr,
    pub efficiency: AggregationEfficiency,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummarizationExercise {
    pub params: SummaryParams,
    pub solution: SummarySolution,
}

impl SummarizationExercise {
    fn solve(params: SummaryParams) -> Result<Self, SubnetError> {
        let summary = find_summary_for_networks(&params.networks)
            .ok_or_else(|| SubnetError::invalid_format("", "non-empty network list"))?;
        let efficiency = aggregation_efficiency(&params.networks, &summary);
        Ok(SummarizationExercise {
            params,
            solution: SummarySolution {
                summary,
                mask: summary.netmask(),
                efficiency,
            },
        })
    }
}

/// `count` consecutive /`prefix` networks starting at `start`.
fn run_of(start: Ipv4Addr, prefix: u8, count: u64) -> Result<Vec<Network>, SubnetError> {
    let size = 1u64 << (MAX_LENGTH - prefix);
    let first = u32::from(start) as u64;
    if first + count * size > 1u64 << MAX_LENGTH {
        return Err(SubnetError::InsufficientSpace {
            requested: format!("{count} x /{prefix} from {start}"),
            reason: "the run passes the end of the address space".to_string(),
            suggestion: "start lower".to_string(),
        });
    }
    (0..count)
        .map(|i| Network::from_parts(Ipv4Addr::from((first + i * size) as u32), prefix))
        .collect()
}

impl Exercise for SummarizationExercise {
    const KIND: ExerciseKind = ExerciseKind::Summarization;

    fn sample<R: Rng + ?Sized>(difficulty: Difficulty, rng: &mut R) -> Result<Self, Rejection> {
        let address = class_address(class_for(difficulty), rng);
        let (member_prefix, count, holes, align_run) = match difficulty {
            Difficulty::Easy => (24, 1u64 << rng.gen_range(1..=2u32), 0, true),
            Difficulty::Medium => (
                rng.gen_range(20..=26),
                rng.gen_range(2..=8),
                rng.gen_range(0..=1),
                rng.gen_bool(0.5),
            ),
            Difficulty::Hard => {
                let count = rng.gen_range(3..=16u64);
                (rng.gen_range(16..=28), count, rng.gen_range(0..=count as usize / 3), false)
            }
        };
        // Aligning the start to the whole run makes the summary exact.
        let align_prefix = if align_run {
            member_prefix - count.next_power_of_two().trailing_zeros() as u8
        } else {
            member_prefix
        };
        let start = Network::containing(address, align_prefix)?.addr();
        let mut networks = run_of(start, member_prefix, count)?;

        let mut removed = 0;
        for _ in 0..holes {
            if networks.len() > 2 {
                let i = rng.gen_range(1..networks.len() - 1);
                networks.remove(i);
                removed += 1;
            }
        }
        if difficulty == Difficulty::Hard {
            networks.shuffle(rng);
        }

        Self::solve(SummaryParams {
            networks,
            holes: removed,
        })
        .map_err(Rejection::from)
    }

    fn validate(&self) -> Result<(), Rejection> {
        let networks = &self.params.networks;
        let s = &self.solution;
        if networks.len() < 2 {
            return reject("fewer than two networks to summarize");
        }
        if s.summary.prefix() < MIN_SUMMARY_PREFIX {
            return reject(format!("summary {} is wider than /{MIN_SUMMARY_PREFIX}", s.summary));
        }
        if let Some(outside) = networks.iter().find(|n| !s.summary.contains_network(n)) {
            return reject(format!("{outside} is not inside {}", s.summary));
        }
        if s.efficiency.percent < MIN_EFFICIENCY_PERCENT {
            return reject(format!(
                "summary {} is only {:.1}% used",
                s.summary, s.efficiency.percent
            ));
        }
        Ok(())
    }

    fn recompute(&self) -> Result<Self, SubnetError> {
        Self::solve(self.params.clone())
    }

    fn fallback() -> Self {
        let networks = run_of(Ipv4Addr::new(192, 168, 0, 0), 24, 4)
            .unwrap_or_else(|e| panic!("fixed summarization run should never fail: {e}"));
        Self::solve(SummaryParams { networks, holes: 0 })
            .unwrap_or_else(|e| panic!("fixed summarization instance should never fail: {e}"))
    }

    fn solution_fields(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("summary".to_string(), self.solution.summary.to_string()),
            ("mask".to_string(), self.solution.mask.to_string()),
        ])
    }

    fn into_payload(self) -> ExercisePayload {
        ExercisePayload::Summarization(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::EfficiencyRating;

    #[test]
    fn test_fallback_solution() {
        let e = SummarizationExercise::fallback();
        assert_eq!(e.solution.summary, Network::new("192.168.0.0/22").unwrap());
        assert_eq!(e.solution.mask, Ipv4Addr::new(255, 255, 252, 0));
        assert_eq!(e.solution.efficiency.rating, EfficiencyRating::Efficient);
        assert_eq!(e.validate(), Ok(()));
    }

    #[test]
    fn test_unaligned_run_widens_summary() {
        let networks = run_of(Ipv4Addr::new(10, 0, 7, 0), 24, 2).unwrap();
        let e = SummarizationExercise::solve(SummaryParams { networks, holes: 0 }).unwrap();
        // 10.0.7.0 and 10.0.8.0 first differ in the 12th host bit
        assert_eq!(e.solution.summary, Network::new("10.0.0.0/20").unwrap());
        assert_eq!(e.solution.efficiency.used_addresses, 512);
        assert!(e.validate().is_err());
    }

    #[test]
    fn test_run_past_end_of_address_space() {
        assert!(run_of(Ipv4Addr::new(255, 255, 255, 0), 24, 2).is_err());
        assert_eq!(run_of(Ipv4Addr::new(255, 255, 254, 0), 24, 2).unwrap().len(), 2);
    }
}
