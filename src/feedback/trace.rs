//! Step-by-step derivations for generated exercises.
//!
//! The trace is worked out from the problem parameters alone, the way a
//! student would do it by hand (magic number, powers of two, binary
//! comparison). It never reads the canonical solution, so the two can be
//! checked against each other.

use super::binary::{nibble_binary, split_binary};
use crate::exercise::{
    CalculateMaskExercise, ClassfulExercise, ExercisePayload, IdentifyNetworkExercise,
    NextNetworkExercise, SummarizationExercise, VlsmExercise,
};
use crate::models::{Network, MAX_LENGTH};
use crate::processing::{distinct_blocks, RequirementKind, MAX_ASSIGNABLE_PREFIX};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

/// Named steps and intermediate values, ordered by key.
pub type TraceData = BTreeMap<String, String>;

/// The "magic number" shortcut on the octet where the mask stops being 255.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MagicMethod {
    /// 1-based octet position.
    pub octet: usize,
    pub mask_octet: u8,
    /// `256 - mask_octet`
    pub magic: u16,
    pub address_octet: u8,
    pub network_octet: u8,
    pub broadcast_octet: u8,
}

impl MagicMethod {
    /// `None` for a /32, where every mask octet is 255.
    pub fn new(address: Ipv4Addr, prefix: u8) -> Option<MagicMethod> {
        if prefix >= MAX_LENGTH {
            return None;
        }
        let index = (prefix / 8) as usize;
        let partial_bits = prefix % 8;
        let mask_octet = (0xFF00u16 >> partial_bits) as u8;
        let magic = 256 - mask_octet as u16;
        let address_octet = address.octets()[index];
        let network_octet = (address_octet as u16 / magic * magic) as u8;
        Some(MagicMethod {
            octet: index + 1,
            mask_octet,
            magic,
            address_octet,
            network_octet,
            broadcast_octet: (network_octet as u16 + magic - 1) as u8,
        })
    }

    /// Octets left of the interesting one copied, the rest filled with `fill`.
    fn rebuild(&self, address: Ipv4Addr, interesting: u8, fill: u8) -> Ipv4Addr {
        let mut octets = address.octets();
        let index = self.octet - 1;
        octets[index] = interesting;
        for octet in octets.iter_mut().skip(index + 1) {
            *octet = fill;
        }
        Ipv4Addr::from(octets)
    }

    pub fn network(&self, address: Ipv4Addr) -> Ipv4Addr {
        self.rebuild(address, self.network_octet, 0)
    }

    pub fn broadcast(&self, address: Ipv4Addr) -> Ipv4Addr {
        self.rebuild(address, self.broadcast_octet, 255)
    }

    /// Distance between consecutive networks, in addresses.
    pub fn increment(&self) -> u64 {
        (self.magic as u64) << (8 * (4 - self.octet))
    }

    fn record(&self, trace: &mut TraceData) {
        put(trace, "octet_of_interest", self.octet);
        put(trace, "mask_octet", self.mask_octet);
        put(trace, "magic_number", format!("256 - {} = {}", self.mask_octet, self.magic));
        put(
            trace,
            "network_octet",
            format!(
                "floor({} / {}) * {} = {}",
                self.address_octet, self.magic, self.magic, self.network_octet
            ),
        );
        put(
            trace,
            "broadcast_octet",
            format!("{} + {} - 1 = {}", self.network_octet, self.magic, self.broadcast_octet),
        );
    }
}

fn put(trace: &mut TraceData, key: &str, value: impl ToString) {
    trace.insert(key.to_string(), value.to_string());
}

fn mask_of(prefix: u8) -> u32 {
    ((u32::MAX as u64) << (MAX_LENGTH - prefix)) as u32
}

fn offset(addr: Ipv4Addr, by: u64) -> Option<Ipv4Addr> {
    u32::try_from(u32::from(addr) as u64 + by).ok().map(Ipv4Addr::from)
}

/// Smallest `bits >= floor` with `2^bits - 2 >= value`.
fn bits_for(value: u64, floor: u8) -> u8 {
    let mut bits = floor;
    while (1u64 << bits) - 2 < value {
        bits += 1;
    }
    bits
}

/// Derivation for the given exercise.
pub fn build_trace(payload: &ExercisePayload) -> TraceData {
    let mut trace = TraceData::new();
    match payload {
        ExercisePayload::IdentifyNetwork(e) => identify_steps(e, &mut trace),
        ExercisePayload::ClassfulLegacy(e) => classful_steps(e, &mut trace),
        ExercisePayload::CalculateMask(e) => mask_steps(e, &mut trace),
        ExercisePayload::Summarization(e) => summary_steps(e, &mut trace),
        ExercisePayload::NextNetwork(e) => next_steps(e, &mut trace),
        ExercisePayload::VlsmScenario(e) => vlsm_steps(e, &mut trace),
    }
    log::trace!("build_trace: {} keys for {}", trace.len(), payload.kind());
    trace
}

fn identify_steps(e: &IdentifyNetworkExercise, trace: &mut TraceData) {
    let (address, prefix) = (e.params.address, e.params.prefix);
    let mask = mask_of(prefix);
    put(trace, "mask", Ipv4Addr::from(mask));
    put(trace, "binary.address", split_binary(u32::from(address), prefix));
    put(trace, "binary.mask", split_binary(mask, prefix));

    let Some(magic) = MagicMethod::new(address, prefix) else {
        return;
    };
    magic.record(trace);
    let network = magic.network(address);
    let broadcast = magic.broadcast(address);
    put(trace, "network", network);
    put(trace, "broadcast", broadcast);
    put(trace, "binary.network", split_binary(u32::from(network), prefix));
    put(trace, "binary.broadcast", split_binary(u32::from(broadcast), prefix));
    if prefix <= MAX_ASSIGNABLE_PREFIX {
        put(trace, "first_usable", Ipv4Addr::from(u32::from(network) + 1));
        put(trace, "last_usable", Ipv4Addr::from(u32::from(broadcast) - 1));
    }
    let host_bits = MAX_LENGTH - prefix;
    put(
        trace,
        "usable_hosts",
        format!("2^{host_bits} - 2 = {}", (1u64 << host_bits).saturating_sub(2)),
    );
}

fn next_steps(e: &NextNetworkExercise, trace: &mut TraceData) {
    let (address, prefix) = (e.params.address, e.params.prefix);
    let Some(magic) = MagicMethod::new(address, prefix) else {
        return;
    };
    magic.record(trace);
    let network = magic.network(address);
    put(trace, "network", network);
    put(trace, "block_size", magic.increment());
    match offset(network, magic.increment()) {
        Some(next) => {
            put(
                trace,
                "next_network",
                format!("{network} + {} = {next}", magic.increment()),
            );
            put(trace, "next_network_address", next);
            if let Some(last) = offset(next, magic.increment() - 1) {
                put(trace, "next_broadcast", last);
            }
            put(trace, "binary.next_network", split_binary(u32::from(next), prefix));
        }
        None => put(trace, "next_network", "none (end of the address space)"),
    }
    put(trace, "binary.network", split_binary(u32::from(network), prefix));
}

fn classful_steps(e: &ClassfulExercise, trace: &mut TraceData) {
    let base = e.params.base;
    let requirement = e.params.requirement;
    let class = base.class();
    let Some(default_prefix) = class.default_prefix() else {
        return;
    };
    let default_host_bits = MAX_LENGTH - default_prefix;
    put(trace, "class", class);
    put(trace, "default_mask", Ipv4Addr::from(mask_of(default_prefix)));
    put(trace, "default_host_bits", default_host_bits);

    let value = requirement.value as u64;
    let borrowed = match requirement.kind {
        RequirementKind::Subnets => {
            let n = bits_for(value, 2);
            put(trace, "subnet_bits", format!("2^{n} - 2 = {} >= {value}", (1u64 << n) - 2));
            n
        }
        RequirementKind::Hosts => {
            let h = bits_for(value, 2);
            put(trace, "host_bits", format!("2^{h} - 2 = {} >= {value}", (1u64 << h) - 2));
            default_host_bits.saturating_sub(h)
        }
    };
    let new_prefix = default_prefix + borrowed;
    let new_mask = mask_of(new_prefix);
    let host_bits = MAX_LENGTH - new_prefix;
    put(trace, "bits_borrowed", borrowed);
    put(trace, "new_prefix", format!("/{default_prefix} + {borrowed} = /{new_prefix}"));
    put(trace, "new_mask", Ipv4Addr::from(new_mask));
    put(trace, "binary.new_mask", split_binary(new_mask, new_prefix));
    put(
        trace,
        "usable_subnets",
        format!("2^{borrowed} - 2 = {}", (1u64 << borrowed) - 2),
    );
    put(
        trace,
        "usable_hosts_per_subnet",
        format!("2^{host_bits} - 2 = {}", (1u64 << host_bits).saturating_sub(2)),
    );

    if let Some(magic) = MagicMethod::new(base.addr(), new_prefix) {
        magic.record(trace);
        let step = magic.increment();
        let total = 1u64 << borrowed;
        if let Some(first) = offset(base.addr(), step) {
            put(trace, "first_usable_subnet", format!("{first}/{new_prefix}"));
        }
        if let Some(last) = offset(base.addr(), step * total.saturating_sub(2)) {
            put(trace, "last_usable_subnet", format!("{last}/{new_prefix}"));
        }
    }
}

fn mask_steps(e: &CalculateMaskExercise, trace: &mut TraceData) {
    let hosts = e.params.hosts_needed as u64;
    let host_bits = bits_for(hosts, MAX_LENGTH - MAX_ASSIGNABLE_PREFIX);
    let prefix = MAX_LENGTH - host_bits;
    let mask = mask_of(prefix);
    put(trace, "addresses_needed", format!("{hosts} + 2 = {}", hosts + 2));
    put(
        trace,
        "host_bits",
        format!("2^{host_bits} = {} >= {}", 1u64 << host_bits, hosts + 2),
    );
    put(trace, "prefix", format!("32 - {host_bits} = /{prefix}"));
    put(trace, "mask", Ipv4Addr::from(mask));
    put(trace, "binary.mask", split_binary(mask, prefix));
    put(
        trace,
        "usable_hosts",
        format!("2^{host_bits} - 2 = {}", (1u64 << host_bits) - 2),
    );
    if let Some(magic) = MagicMethod::new(e.params.base.addr(), prefix) {
        magic.record(trace);
    }
}

fn summary_steps(e: &SummarizationExercise, trace: &mut TraceData) {
    let networks = &e.params.networks;
    let (Some(lowest), Some(highest)) = (
        networks.iter().map(Network::lo).min(),
        networks.iter().map(Network::hi).max(),
    ) else {
        return;
    };
    let common_bits = (u32::from(lowest) ^ u32::from(highest)).leading_zeros() as u8;
    let summary_mask = mask_of(common_bits);
    let summary = Ipv4Addr::from(u32::from(lowest) & summary_mask);
    put(trace, "lowest", lowest);
    put(trace, "highest", highest);
    put(trace, "binary.lowest", split_binary(u32::from(lowest), common_bits));
    put(trace, "binary.highest", split_binary(u32::from(highest), common_bits));
    put(trace, "common_bits", common_bits);
    put(trace, "summary", format!("{summary}/{common_bits}"));
    put(trace, "mask", Ipv4Addr::from(summary_mask));
    put(trace, "binary.mask", nibble_binary(summary_mask));

    // repeated or nested members cover no extra space
    let used: u64 = distinct_blocks(networks).iter().map(Network::block_size).sum();
    let size = 1u64 << (MAX_LENGTH - common_bits);
    put(
        trace,
        "efficiency",
        format!("{used} / {size} = {:.1}%", used as f64 / size as f64 * 100.0),
    );
}

fn vlsm_steps(e: &VlsmExercise, trace: &mut TraceData) {
    let base = e.params.base;
    let mut order: Vec<_> = e.params.requirements.iter().collect();
    order.sort_by_key(|r| Reverse(r.hosts_needed));
    put(trace, "base", base);
    put(
        trace,
        "order",
        order.iter().map(|r| r.name.as_str()).collect::<Vec<_>>().join(", "),
    );

    let end = u32::from(base.hi()) as u64;
    let mut cursor = u32::from(base.lo()) as u64;
    for (i, requirement) in order.iter().enumerate() {
        let key = |field: &str| format!("step.{:02}.{field}", i + 1);
        let hosts = requirement.hosts_needed as u64;
        let host_bits = bits_for(hosts, MAX_LENGTH - MAX_ASSIGNABLE_PREFIX);
        let size = 1u64 << host_bits;
        let prefix = MAX_LENGTH.saturating_sub(host_bits);
        put(trace, &key("name"), &requirement.name);
        put(
            trace,
            &key("block"),
            format!("{hosts} + 2 -> 2^{host_bits} = {size} -> /{prefix}"),
        );
        if prefix < base.prefix() || cursor + size - 1 > end {
            put(trace, &key("network"), "does not fit");
            continue;
        }
        put(trace, &key("network"), format!("{}/{prefix}", Ipv4Addr::from(cursor as u32)));
        cursor += size;
    }
    if cursor <= end {
        put(
            trace,
            "remaining",
            format!(
                "{} - {} ({} addresses)",
                Ipv4Addr::from(cursor as u32),
                Ipv4Addr::from(end as u32),
                end - cursor + 1
            ),
        );
    } else {
        put(trace, "remaining", "none");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exercise::{Exercise, SummaryParams, SummarySolution};
    use crate::processing::{aggregation_efficiency, find_summary_for_networks};

    #[test]
    fn test_summary_efficiency_counts_nested_members_once() {
        let networks: Vec<Network> = ["10.0.0.0/22", "10.0.1.0/24", "10.0.2.0/23", "10.0.2.0/23"]
            .iter()
            .map(|s| Network::new(s).unwrap())
            .collect();
        let summary = find_summary_for_networks(&networks).unwrap();
        let efficiency = aggregation_efficiency(&networks, &summary);
        assert_eq!(efficiency.used_addresses, 1024);
        let exercise = SummarizationExercise {
            params: SummaryParams { networks, holes: 0 },
            solution: SummarySolution {
                summary,
                mask: summary.netmask(),
                efficiency,
            },
        };
        let trace = build_trace(&ExercisePayload::Summarization(exercise));
        assert_eq!(trace["summary"], "10.0.0.0/22");
        assert_eq!(trace["efficiency"], "1024 / 1024 = 100.0%");
    }

    #[test]
    fn test_classful_trace_names_class() {
        let trace = build_trace(&ClassfulExercise::fallback().into_payload());
        assert_eq!(trace["class"], "C");
        assert_eq!(trace["default_mask"], "255.255.255.0");
    }

    #[test]
    fn test_magic_method() {
        let m = MagicMethod::new(Ipv4Addr::new(192, 168, 10, 77), 26).unwrap();
        assert_eq!(m.octet, 4);
        assert_eq!(m.mask_octet, 192);
        assert_eq!(m.magic, 64);
        assert_eq!(m.network_octet, 64);
        assert_eq!(m.broadcast_octet, 127);
        assert_eq!(m.network(Ipv4Addr::new(192, 168, 10, 77)), Ipv4Addr::new(192, 168, 10, 64));
        assert_eq!(m.increment(), 64);

        let m = MagicMethod::new(Ipv4Addr::new(172, 16, 45, 9), 20).unwrap();
        assert_eq!(m.octet, 3);
        assert_eq!(m.magic, 16);
        assert_eq!(m.network(Ipv4Addr::new(172, 16, 45, 9)), Ipv4Addr::new(172, 16, 32, 0));
        assert_eq!(m.broadcast(Ipv4Addr::new(172, 16, 45, 9)), Ipv4Addr::new(172, 16, 47, 255));
        assert_eq!(m.increment(), 4096);
    }

    #[test]
    fn test_magic_method_on_octet_boundary() {
        // /24: the mask stops at the fourth octet with a magic number of 256
        let m = MagicMethod::new(Ipv4Addr::new(10, 1, 2, 3), 24).unwrap();
        assert_eq!(m.octet, 4);
        assert_eq!(m.magic, 256);
        assert_eq!(m.network(Ipv4Addr::new(10, 1, 2, 3)), Ipv4Addr::new(10, 1, 2, 0));
        assert_eq!(m.broadcast(Ipv4Addr::new(10, 1, 2, 3)), Ipv4Addr::new(10, 1, 2, 255));

        let m = MagicMethod::new(Ipv4Addr::new(10, 1, 2, 3), 0).unwrap();
        assert_eq!(m.network(Ipv4Addr::new(10, 1, 2, 3)), Ipv4Addr::new(0, 0, 0, 0));
        assert!(MagicMethod::new(Ipv4Addr::new(10, 1, 2, 3), 32).is_none());
    }

    #[test]
    fn test_bits_for() {
        assert_eq!(bits_for(2, 2), 2);
        assert_eq!(bits_for(3, 2), 3);
        assert_eq!(bits_for(62, 2), 6);
        assert_eq!(bits_for(63, 2), 7);
        assert_eq!(bits_for(0, 2), 2);
    }
}
