//! String-level entry points for front ends.
//!
//! Everything here parses user text, calls into [`crate::processing`] or
//! [`crate::exercise`], and hands back typed results. Nothing panics on
//! malformed input.

use crate::config::Config;
use crate::error::SubnetError;
use crate::exercise::{self, Difficulty, ExerciseKind, ExerciseProblem};
use crate::models::{parse_address, parse_cidr, Network, NetworkDetails};
use crate::processing::{
    self, aggregation_efficiency, find_summary, AggregationEfficiency, ClassfulRequirement,
    ClassfulResult, RequirementKind, SubnetPolicy, VlsmRequirement, VlsmResult,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::net::Ipv4Addr;

/// Summary route as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRoute {
    pub network: Ipv4Addr,
    pub prefix: u8,
    pub mask: Ipv4Addr,
    pub cidr: String,
}

impl From<Network> for SummaryRoute {
    fn from(net: Network) -> Self {
        SummaryRoute {
            network: net.addr(),
            prefix: net.prefix(),
            mask: net.netmask(),
            cidr: net.to_string(),
        }
    }
}

/// Derived values for the network containing `input` (`a.b.c.d/n` or dotted mask).
pub fn network_info(input: &str) -> Result<NetworkDetails, SubnetError> {
    let (addr, prefix) = parse_cidr(input)?;
    let network = Network::containing(addr, prefix)?;
    if network.addr() != addr {
        log::info!("network_info: {addr} is a host in {network}");
    }
    Ok(network.details())
}

/// Classful division of the network at `ip`.
pub fn calculate_classful(
    ip: &str,
    kind: RequirementKind,
    value: u32,
    policy: &SubnetPolicy,
) -> Result<ClassfulResult, SubnetError> {
    let base = parse_address(ip)?;
    let requirement = ClassfulRequirement { kind, value };
    processing::calculate_classful(base, requirement, policy)
}

/// VLSM allocation inside `cidr`, which must be a network address.
pub fn calculate_vlsm(
    cidr: &str,
    requirements: &[VlsmRequirement],
) -> Result<VlsmResult, SubnetError> {
    let base = Network::new(cidr)?;
    Ok(processing::calculate_vlsm(&base, requirements))
}

/// Parse `name:hosts`, e.g. `Sales:100`.
pub fn parse_vlsm_requirement(input: &str) -> Result<VlsmRequirement, SubnetError> {
    let (name, hosts) = input
        .rsplit_once(':')
        .ok_or_else(|| SubnetError::invalid_format(input, "requirement (name:hosts)"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(SubnetError::invalid_format(input, "requirement (name:hosts)"));
    }
    let hosts = hosts
        .trim()
        .parse::<u32>()
        .map_err(|_| SubnetError::invalid_format(input, "requirement (name:hosts)"))?;
    Ok(VlsmRequirement::new(name, hosts))
}

/// Read one summary input: a bare address, or a CIDR block contributing both ends.
fn summary_endpoints(input: &str) -> Result<Vec<Ipv4Addr>, SubnetError> {
    if input.contains('/') {
        let (addr, prefix) = parse_cidr(input)?;
        let network = Network::containing(addr, prefix)?;
        Ok(vec![network.lo(), network.hi()])
    } else {
        Ok(vec![parse_address(input)?])
    }
}

/// Smallest block covering every input; `None` for an empty list.
///
/// Inputs may be plain addresses or CIDR blocks.
pub fn find_summary_route<S: AsRef<str>>(inputs: &[S]) -> Result<Option<SummaryRoute>, SubnetError> {
    let mut endpoints = Vec::with_capacity(inputs.len() * 2);
    for input in inputs {
        endpoints.extend(summary_endpoints(input.as_ref())?);
    }
    Ok(find_summary(&endpoints).map(SummaryRoute::from))
}

/// Summary route plus how well the CIDR-block inputs fill it.
pub fn summarize_networks<S: AsRef<str>>(
    inputs: &[S],
) -> Result<Option<(SummaryRoute, AggregationEfficiency)>, SubnetError> {
    let networks = inputs
        .iter()
        .map(|s| {
            let (addr, prefix) = parse_cidr(s.as_ref())?;
            Network::from_parts(addr, prefix)
        })
        .collect::<Result<Vec<Network>, SubnetError>>()?;
    Ok(processing::find_summary_for_networks(&networks).map(|summary| {
        let efficiency = aggregation_efficiency(&networks, &summary);
        (SummaryRoute::from(summary), efficiency)
    }))
}

/// Generator RNG: seeded when `config.seed` is set.
pub fn rng_from(config: &Config) -> StdRng {
    match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Generate one exercise with the configured seed and retry ceiling.
pub fn generate_exercise(
    kind: ExerciseKind,
    difficulty: Difficulty,
    config: &Config,
) -> ExerciseProblem {
    generate_exercise_with(kind, difficulty, &mut rng_from(config), config)
}

/// Generate one exercise from a caller-supplied random source.
pub fn generate_exercise_with<R: Rng + ?Sized>(
    kind: ExerciseKind,
    difficulty: Difficulty,
    rng: &mut R,
    config: &Config,
) -> ExerciseProblem {
    let problem = exercise::generate_exercise(kind, difficulty, rng, config.max_attempts);
    log::info!(
        "generate_exercise: {kind} {difficulty} -> {} after {} attempts{}",
        problem.generated_difficulty,
        problem.attempts,
        if problem.degraded { " (degraded)" } else { "" }
    );
    problem
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_info_accepts_host_address() {
        let details = network_info("192.168.10.77/26").unwrap();
        assert_eq!(details.cidr, "192.168.10.64/26");
        let details = network_info("10.0.0.0/255.255.0.0").unwrap();
        assert_eq!(details.prefix, 16);
        assert!(network_info("10.0.0.0/255.0.255.0").is_err());
    }

    #[test]
    fn test_calculate_classful_parses_address() {
        let result =
            calculate_classful("192.168.1.0", RequirementKind::Subnets, 2, &SubnetPolicy::legacy())
                .unwrap();
        assert_eq!(result.summary.new_prefix, 26);
        assert!(matches!(
            calculate_classful("192.168.1.", RequirementKind::Subnets, 2, &SubnetPolicy::legacy()),
            Err(SubnetError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_calculate_vlsm_requires_network_address() {
        let err = calculate_vlsm("192.168.1.5/24", &[VlsmRequirement::new("A", 10)]).unwrap_err();
        assert!(matches!(err, SubnetError::NotNetworkAddress { .. }));
    }

    #[test]
    fn test_parse_vlsm_requirement() {
        assert_eq!(
            parse_vlsm_requirement("Sales:100").unwrap(),
            VlsmRequirement::new("Sales", 100)
        );
        assert_eq!(
            parse_vlsm_requirement("WAN link: 2").unwrap(),
            VlsmRequirement::new("WAN link", 2)
        );
        assert!(parse_vlsm_requirement("Sales").is_err());
        assert!(parse_vlsm_requirement(":5").is_err());
        assert!(parse_vlsm_requirement("Sales:-1").is_err());
    }

    #[test]
    fn test_find_summary_route() {
        let route = find_summary_route(&["192.168.0.0", "192.168.1.0", "192.168.2.0", "192.168.3.0"])
            .unwrap()
            .unwrap();
        assert_eq!(route.cidr, "192.168.0.0/22");
        assert_eq!(route.mask, Ipv4Addr::new(255, 255, 252, 0));

        // The block's broadcast widens the summary.
        let route = find_summary_route(&["10.0.0.0/24", "10.0.1.0/24"]).unwrap().unwrap();
        assert_eq!(route.cidr, "10.0.0.0/23");

        let empty: [&str; 0] = [];
        assert_eq!(find_summary_route(&empty).unwrap(), None);
        assert!(find_summary_route(&["10.0.0.256"]).is_err());
    }

    #[test]
    fn test_summarize_networks_efficiency() {
        let (route, efficiency) = summarize_networks(&["10.1.0.0/24", "10.1.3.0/24"])
            .unwrap()
            .unwrap();
        assert_eq!(route.cidr, "10.1.0.0/22");
        assert_eq!(efficiency.used_addresses, 512);
        assert_eq!(efficiency.percent, 50.0);
    }

    #[test]
    fn test_generate_exercise_is_reproducible_with_seed() {
        let config = Config {
            seed: Some(2024),
            ..Config::default()
        };
        let a = generate_exercise(ExerciseKind::VlsmScenario, Difficulty::Medium, &config);
        let b = generate_exercise(ExerciseKind::VlsmScenario, Difficulty::Medium, &config);
        assert_eq!(a, b);
    }
}
