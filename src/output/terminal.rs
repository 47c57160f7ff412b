//! Terminal output utilities.
//!
//! Renders results as aligned, coloured text. Every function returns a
//! `String` so the caller decides where it goes.

use crate::api::SummaryRoute;
use crate::error::SubnetError;
use crate::exercise::{AnswerReport, ExercisePayload, ExerciseProblem};
use crate::models::NetworkDetails;
use crate::processing::{
    AggregationEfficiency, ClassfulResult, EfficiencyRating, Reservation, VlsmResult, VlsmStatus,
};
use colored::Colorize;
use std::fmt::Write;

/// Format a value as a right-aligned field.
///
/// # Arguments
/// * `value` - The value to format
/// * `width` - The minimum width of the field
pub fn format_field<T: ToString>(value: T, width: usize) -> String {
    let value_str = value.to_string();
    format!("{value_str:>width$}")
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

/// Key/value listing of one network.
pub fn render_details(details: &NetworkDetails) -> String {
    let rows = [
        ("Network", details.cidr.clone()),
        ("Mask", details.mask.to_string()),
        ("Wildcard", details.wildcard.to_string()),
        ("Broadcast", details.broadcast.to_string()),
        ("First usable", or_dash(details.first_usable)),
        ("Last usable", or_dash(details.last_usable)),
        ("Addresses", details.block_size.to_string()),
        ("Usable hosts", details.usable_hosts.to_string()),
    ];
    let mut out = String::new();
    for (label, value) in rows {
        let _ = writeln!(out, "{:<14}{}", format!("{label}:").bold(), value);
    }
    out
}

fn table_row(details: &NetworkDetails) -> String {
    format!(
        "{cidr}{first}{last}{broadcast}{hosts}",
        cidr = format_field(&details.cidr, 20),
        first = format_field(or_dash(details.first_usable), 17),
        last = format_field(or_dash(details.last_usable), 17),
        broadcast = format_field(details.broadcast, 17),
        hosts = format_field(details.usable_hosts, 10),
    )
}

fn table_header(first: &str) -> String {
    format!(
        "{first}{cidr}{fu}{lu}{bc}{hosts}",
        cidr = format_field("network", 20),
        fu = format_field("first usable", 17),
        lu = format_field("last usable", 17),
        bc = format_field("broadcast", 17),
        hosts = format_field("hosts", 10),
    )
    .bold()
    .to_string()
}

pub fn render_classful(result: &ClassfulResult) -> String {
    let s = &result.summary;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} class {} {} -> {}",
        s.base.to_string().bold(),
        s.class,
        s.requirement,
        format!("/{} ({})", s.new_prefix, s.new_mask).green()
    );
    let _ = writeln!(
        out,
        "borrowed {} bits, {} host bits; {} subnets ({} usable), {} hosts each",
        s.bits_borrowed, s.host_bits, s.total_subnets, s.usable_subnets, s.usable_hosts_per_subnet
    );
    let _ = writeln!(out, "{}", table_header(&format_field("#", 8)));
    let mut previous: Option<u64> = None;
    for subnet in &result.subnets {
        if previous.is_some_and(|p| p + 1 != subnet.index) {
            let _ = writeln!(out, "{}", format_field("...", 8).dimmed());
        }
        previous = Some(subnet.index);
        let row = format!("{}{}", format_field(subnet.index, 8), table_row(&subnet.details));
        let row = match subnet.reserved {
            Reservation::None => row,
            Reservation::ZeroSubnet => format!("{row}  zero subnet").dimmed().to_string(),
            Reservation::AllOnesSubnet => format!("{row}  all-ones subnet").dimmed().to_string(),
        };
        let _ = writeln!(out, "{row}");
    }
    if result.truncated {
        let _ = writeln!(
            out,
            "{} listed {} of {} subnets",
            "NOTE".on_red(),
            result.subnets.len(),
            s.total_subnets
        );
    }
    out
}

pub fn render_vlsm(result: &VlsmResult) -> String {
    let mut out = String::new();
    let s = &result.summary;
    let _ = writeln!(out, "{} VLSM", s.base.to_string().bold());
    let _ = writeln!(out, "{}", table_header(&format!("{:<16}{:>8}", "name", "needed")));
    for entry in &result.entries {
        let lead = format!(
            "{:<16}{}",
            entry.requirement.name,
            format_field(entry.requirement.hosts_needed, 8)
        );
        match &entry.status {
            VlsmStatus::Assigned {
                details, efficiency, ..
            } => {
                let _ = writeln!(
                    out,
                    "{lead}{}{}",
                    table_row(details),
                    format_field(format!("{efficiency:.1}%"), 8)
                );
            }
            VlsmStatus::Error { reason } => {
                let _ = writeln!(out, "{lead}  {}", reason.to_string().red());
            }
        }
    }
    let _ = writeln!(
        out,
        "allocated {} of {} addresses ({:.1}%), host efficiency {:.1}%, {} assigned, {} failed",
        s.total_allocated,
        s.total_available,
        s.utilization_percent,
        s.host_efficiency_percent,
        s.assigned,
        s.failed
    );
    match &s.remaining {
        Some(r) => {
            let blocks: Vec<String> = r.blocks.iter().map(|b| b.to_string()).collect();
            let _ = writeln!(
                out,
                "remaining {} - {} ({} addresses): {}",
                r.first,
                r.last,
                r.size,
                blocks.join(", ")
            );
        }
        None => {
            let _ = writeln!(out, "remaining: none");
        }
    }
    out
}

fn rating_colored(rating: EfficiencyRating) -> String {
    let text = format!("{rating:?}");
    match rating {
        EfficiencyRating::Efficient => text.green().to_string(),
        EfficiencyRating::Acceptable => text.yellow().to_string(),
        EfficiencyRating::Inefficient => text.red().to_string(),
    }
}

pub fn render_summary(route: &SummaryRoute, efficiency: Option<&AggregationEfficiency>) -> String {
    let mut out = format!("{} mask {}\n", route.cidr.bold(), route.mask);
    if let Some(e) = efficiency {
        let _ = writeln!(
            out,
            "uses {} of {} addresses ({:.1}%): {}",
            e.used_addresses,
            e.summary_block_size,
            e.percent,
            rating_colored(e.rating)
        );
    }
    out
}

/// One-line problem statement.
pub fn prompt(payload: &ExercisePayload) -> String {
    match payload {
        ExercisePayload::IdentifyNetwork(e) => format!(
            "Host {}/{}: find the network, mask, broadcast, host range and usable host count.",
            e.params.address, e.params.prefix
        ),
        ExercisePayload::ClassfulLegacy(e) => format!(
            "Subnet {} for {} (zero and all-ones subnets are not usable).",
            e.params.base, e.params.requirement
        ),
        ExercisePayload::CalculateMask(e) => format!(
            "Inside {}, which mask gives the smallest subnets with at least {} hosts?",
            e.params.base, e.params.hosts_needed
        ),
        ExercisePayload::Summarization(e) => {
            let nets: Vec<String> = e.params.networks.iter().map(|n| n.to_string()).collect();
            format!("Find the summary route for {}.", nets.join(", "))
        }
        ExercisePayload::NextNetwork(e) => format!(
            "Host {}/{}: what is the next network and its broadcast address?",
            e.params.address, e.params.prefix
        ),
        ExercisePayload::VlsmScenario(e) => {
            let reqs: Vec<String> = e
                .params
                .requirements
                .iter()
                .map(|r| format!("{} {}", r.name, r.hosts_needed))
                .collect();
            format!("Allocate {} hosts inside {} with VLSM.", reqs.join(", "), e.params.base)
        }
    }
}

pub fn render_exercise(problem: &ExerciseProblem, show_solution: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} [{}]{}",
        problem.kind.to_string().bold(),
        problem.generated_difficulty,
        if problem.degraded { " (fallback)".yellow().to_string() } else { String::new() }
    );
    let _ = writeln!(out, "{}", prompt(&problem.payload));
    if show_solution {
        let _ = writeln!(out, "\n{}", "Solution".bold());
        for (field, value) in problem.solution_fields() {
            let _ = writeln!(out, "  {:<26}{}", field, value.green());
        }
        let _ = writeln!(out, "\n{}", "Working".bold());
        for (step, value) in &problem.trace {
            let _ = writeln!(out, "  {step:<26}{value}");
        }
    } else {
        let fields: Vec<String> = problem.solution_fields().into_keys().collect();
        let _ = writeln!(out, "answer fields: {}", fields.join(", ").dimmed());
    }
    out
}

pub fn render_report(report: &AnswerReport) -> String {
    let mut out = String::new();
    for f in &report.fields {
        let given = f.given.as_deref().unwrap_or("-");
        let mark = if f.correct { "ok".green() } else { "wrong".red() };
        let _ = writeln!(out, "  {:<26}{:<22}{} (expected {})", f.field, given, mark, f.expected);
    }
    let _ = writeln!(out, "{}/{} correct", report.correct, report.total);
    out
}

pub fn render_error(error: &SubnetError) -> String {
    format!("{} {}", "error:".red().bold(), error)
}
