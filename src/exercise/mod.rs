//! Randomized practice problems with verifiable solutions.
//!
//! Each exercise kind samples parameters inside difficulty-scaled bounds,
//! solves them with the allocators, and rejects instances that break the
//! kind's acceptability rules. Retries are bounded:
//! 1. up to `max_attempts` at the requested difficulty
//! 2. then up to `max_attempts` at [`Difficulty::Easy`]
//! 3. then a fixed known-good easy instance, flagged `degraded`
//!
//! so [`generate_exercise`] always returns a problem.

mod answers;
mod classful;
mod identify;
mod mask;
mod next;
mod sample;
mod summarize;
mod vlsm;

use crate::error::SubnetError;
use crate::feedback::{build_trace, TraceData};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub use answers::{AnswerReport, FieldResult};
pub use classful::{ClassfulExercise, ClassfulParams, ClassfulSolution};
pub use identify::{IdentifyNetworkExercise, IdentifyParams, IdentifySolution};
pub use mask::{CalculateMaskExercise, MaskParams, MaskSolution};
pub use next::{NextNetworkExercise, NextParams, NextSolution};
pub use summarize::{SummarizationExercise, SummaryParams, SummarySolution};
pub use vlsm::{VlsmExercise, VlsmParams};

/// The six exercise kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExerciseKind {
    IdentifyNetwork,
    ClassfulLegacy,
    CalculateMask,
    Summarization,
    NextNetwork,
    VlsmScenario,
}

impl ExerciseKind {
    pub const ALL: [ExerciseKind; 6] = [
        ExerciseKind::IdentifyNetwork,
        ExerciseKind::ClassfulLegacy,
        ExerciseKind::CalculateMask,
        ExerciseKind::Summarization,
        ExerciseKind::NextNetwork,
        ExerciseKind::VlsmScenario,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ExerciseKind::IdentifyNetwork => "identify-network",
            ExerciseKind::ClassfulLegacy => "classful-legacy",
            ExerciseKind::CalculateMask => "calculate-mask",
            ExerciseKind::Summarization => "summarization",
            ExerciseKind::NextNetwork => "next-network",
            ExerciseKind::VlsmScenario => "vlsm-scenario",
        }
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExerciseKind {
    type Err = SubnetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExerciseKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s.trim())
            .ok_or_else(|| SubnetError::invalid_format(s, "exercise kind"))
    }
}

/// Difficulty scales address class (C/B/A), prefix ranges and magnitudes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = SubnetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Difficulty::ALL
            .into_iter()
            .find(|d| d.as_str() == s.trim().to_ascii_lowercase())
            .ok_or_else(|| SubnetError::invalid_format(s, "difficulty (easy, medium, hard)"))
    }
}

/// Why a sampled instance was thrown away.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error(transparent)]
    Engine(#[from] SubnetError),
    #[error("{0}")]
    Rule(String),
}

pub(crate) fn reject<T>(rule: impl Into<String>) -> Result<T, Rejection> {
    Err(Rejection::Rule(rule.into()))
}

/// Bounded retry gave up.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeneratorError {
    #[error("no valid {kind} exercise at {difficulty} difficulty after {attempts} attempts")]
    ExhaustedAttempts {
        kind: ExerciseKind,
        difficulty: Difficulty,
        attempts: u32,
    },
}

/// One exercise strategy: sampling, solving and the acceptability rules.
pub trait Exercise: Sized + Clone + PartialEq {
    const KIND: ExerciseKind;

    /// Sample parameters and solve them.
    fn sample<R: Rng + ?Sized>(difficulty: Difficulty, rng: &mut R) -> Result<Self, Rejection>;

    /// Kind-specific acceptability rules.
    fn validate(&self) -> Result<(), Rejection>;

    /// Re-run the allocators on the stored parameters.
    fn recompute(&self) -> Result<Self, SubnetError>;

    /// Known-good easy instance used when every attempt was rejected.
    fn fallback() -> Self;

    /// Canonical answers keyed by field name.
    fn solution_fields(&self) -> BTreeMap<String, String>;

    fn into_payload(self) -> ExercisePayload;
}

/// Parameters plus canonical solution, one shape per kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExercisePayload {
    IdentifyNetwork(IdentifyNetworkExercise),
    ClassfulLegacy(ClassfulExercise),
    CalculateMask(CalculateMaskExercise),
    Summarization(SummarizationExercise),
    NextNetwork(NextNetworkExercise),
    VlsmScenario(VlsmExercise),
}

impl ExercisePayload {
    pub fn kind(&self) -> ExerciseKind {
        match self {
            ExercisePayload::IdentifyNetwork(_) => ExerciseKind::IdentifyNetwork,
            ExercisePayload::ClassfulLegacy(_) => ExerciseKind::ClassfulLegacy,
            ExercisePayload::CalculateMask(_) => ExerciseKind::CalculateMask,
            ExercisePayload::Summarization(_) => ExerciseKind::Summarization,
            ExercisePayload::NextNetwork(_) => ExerciseKind::NextNetwork,
            ExercisePayload::VlsmScenario(_) => ExerciseKind::VlsmScenario,
        }
    }

    pub fn validate(&self) -> Result<(), Rejection> {
        match self {
            ExercisePayload::IdentifyNetwork(e) => e.validate(),
            ExercisePayload::ClassfulLegacy(e) => e.validate(),
            ExercisePayload::CalculateMask(e) => e.validate(),
            ExercisePayload::Summarization(e) => e.validate(),
            ExercisePayload::NextNetwork(e) => e.validate(),
            ExercisePayload::VlsmScenario(e) => e.validate(),
        }
    }

    /// True when re-solving the parameters yields the stored solution.
    pub fn is_reproducible(&self) -> bool {
        match self {
            ExercisePayload::IdentifyNetwork(e) => e.recompute().as_ref() == Ok(e),
            ExercisePayload::ClassfulLegacy(e) => e.recompute().as_ref() == Ok(e),
            ExercisePayload::CalculateMask(e) => e.recompute().as_ref() == Ok(e),
            ExercisePayload::Summarization(e) => e.recompute().as_ref() == Ok(e),
            ExercisePayload::NextNetwork(e) => e.recompute().as_ref() == Ok(e),
            ExercisePayload::VlsmScenario(e) => e.recompute().as_ref() == Ok(e),
        }
    }

    pub fn solution_fields(&self) -> BTreeMap<String, String> {
        match self {
            ExercisePayload::IdentifyNetwork(e) => e.solution_fields(),
            ExercisePayload::ClassfulLegacy(e) => e.solution_fields(),
            ExercisePayload::CalculateMask(e) => e.solution_fields(),
            ExercisePayload::Summarization(e) => e.solution_fields(),
            ExercisePayload::NextNetwork(e) => e.solution_fields(),
            ExercisePayload::VlsmScenario(e) => e.solution_fields(),
        }
    }
}

/// A generated problem, ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseProblem {
    pub kind: ExerciseKind,
    /// Difficulty the caller asked for.
    pub difficulty: Difficulty,
    /// Difficulty the instance was actually sampled at.
    pub generated_difficulty: Difficulty,
    /// Attempts spent at `generated_difficulty`.
    pub attempts: u32,
    /// Set when the fixed fallback instance was used.
    pub degraded: bool,
    #[serde(flatten)]
    pub payload: ExercisePayload,
    pub trace: TraceData,
}

impl ExerciseProblem {
    fn new(
        payload: ExercisePayload,
        difficulty: Difficulty,
        generated_difficulty: Difficulty,
        attempts: u32,
        degraded: bool,
    ) -> Self {
        let trace = build_trace(&payload);
        ExerciseProblem {
            kind: payload.kind(),
            difficulty,
            generated_difficulty,
            attempts,
            degraded,
            payload,
            trace,
        }
    }

    /// Canonical answer fields the UI collects input for.
    pub fn solution_fields(&self) -> BTreeMap<String, String> {
        self.payload.solution_fields()
    }

    /// Compare user answers field by field.
    pub fn check_answers(&self, answers: &BTreeMap<String, String>) -> AnswerReport {
        answers::check(&self.solution_fields(), answers)
    }
}

fn attempt<E, R>(
    difficulty: Difficulty,
    rng: &mut R,
    max_attempts: u32,
) -> Result<(E, u32), GeneratorError>
where
    E: Exercise,
    R: Rng + ?Sized,
{
    for attempt in 1..=max_attempts {
        let candidate = E::sample(difficulty, rng).and_then(|e| e.validate().map(|_| e));
        match candidate {
            Ok(exercise) => return Ok((exercise, attempt)),
            Err(rejection) => {
                log::trace!("{} {difficulty} attempt {attempt} rejected: {rejection}", E::KIND)
            }
        }
    }
    Err(GeneratorError::ExhaustedAttempts {
        kind: E::KIND,
        difficulty,
        attempts: max_attempts,
    })
}

fn generate_kind<E, R>(difficulty: Difficulty, rng: &mut R, max_attempts: u32) -> ExerciseProblem
where
    E: Exercise,
    R: Rng + ?Sized,
{
    let mut levels = vec![difficulty];
    if difficulty != Difficulty::Easy {
        levels.push(Difficulty::Easy);
    }
    for level in levels {
        match attempt::<E, R>(level, rng, max_attempts) {
            Ok((exercise, attempts)) => {
                return ExerciseProblem::new(exercise.into_payload(), difficulty, level, attempts, false)
            }
            Err(e) => log::warn!("{e}; falling back"),
        }
    }
    log::warn!("{} using the fixed fallback instance", E::KIND);
    ExerciseProblem::new(E::fallback().into_payload(), difficulty, Difficulty::Easy, 0, true)
}

/// Sample at exactly `difficulty`, giving up after `max_attempts`.
pub fn try_generate<R: Rng + ?Sized>(
    kind: ExerciseKind,
    difficulty: Difficulty,
    rng: &mut R,
    max_attempts: u32,
) -> Result<ExerciseProblem, GeneratorError> {
    fn wrap<E: Exercise>(
        result: Result<(E, u32), GeneratorError>,
        difficulty: Difficulty,
    ) -> Result<ExerciseProblem, GeneratorError> {
        result.map(|(e, attempts)| {
            ExerciseProblem::new(e.into_payload(), difficulty, difficulty, attempts, false)
        })
    }
    match kind {
        ExerciseKind::IdentifyNetwork => {
            wrap(attempt::<IdentifyNetworkExercise, R>(difficulty, rng, max_attempts), difficulty)
        }
        ExerciseKind::ClassfulLegacy => {
            wrap(attempt::<ClassfulExercise, R>(difficulty, rng, max_attempts), difficulty)
        }
        ExerciseKind::CalculateMask => {
            wrap(attempt::<CalculateMaskExercise, R>(difficulty, rng, max_attempts), difficulty)
        }
        ExerciseKind::Summarization => {
            wrap(attempt::<SummarizationExercise, R>(difficulty, rng, max_attempts), difficulty)
        }
        ExerciseKind::NextNetwork => {
            wrap(attempt::<NextNetworkExercise, R>(difficulty, rng, max_attempts), difficulty)
        }
        ExerciseKind::VlsmScenario => {
            wrap(attempt::<VlsmExercise, R>(difficulty, rng, max_attempts), difficulty)
        }
    }
}

/// Always returns a valid problem; see the module docs for the fallback order.
pub fn generate_exercise<R: Rng + ?Sized>(
    kind: ExerciseKind,
    difficulty: Difficulty,
    rng: &mut R,
    max_attempts: u32,
) -> ExerciseProblem {
    let max_attempts = max_attempts.max(1);
    match kind {
        ExerciseKind::IdentifyNetwork => {
            generate_kind::<IdentifyNetworkExercise, R>(difficulty, rng, max_attempts)
        }
        ExerciseKind::ClassfulLegacy => {
            generate_kind::<ClassfulExercise, R>(difficulty, rng, max_attempts)
        }
        ExerciseKind::CalculateMask => {
            generate_kind::<CalculateMaskExercise, R>(difficulty, rng, max_attempts)
        }
        ExerciseKind::Summarization => {
            generate_kind::<SummarizationExercise, R>(difficulty, rng, max_attempts)
        }
        ExerciseKind::NextNetwork => {
            generate_kind::<NextNetworkExercise, R>(difficulty, rng, max_attempts)
        }
        ExerciseKind::VlsmScenario => generate_kind::<VlsmExercise, R>(difficulty, rng, max_attempts),
    }
}

/// Fixed fallback instance for `kind`.
pub fn fallback_exercise(kind: ExerciseKind) -> ExerciseProblem {
    let payload = match kind {
        ExerciseKind::IdentifyNetwork => IdentifyNetworkExercise::fallback().into_payload(),
        ExerciseKind::ClassfulLegacy => ClassfulExercise::fallback().into_payload(),
        ExerciseKind::CalculateMask => CalculateMaskExercise::fallback().into_payload(),
        ExerciseKind::Summarization => SummarizationExercise::fallback().into_payload(),
        ExerciseKind::NextNetwork => NextNetworkExercise::fallback().into_payload(),
        ExerciseKind::VlsmScenario => VlsmExercise::fallback().into_payload(),
    };
    ExerciseProblem::new(payload, Difficulty::Easy, Difficulty::Easy, 0, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_kind_and_difficulty_parse() {
        for kind in ExerciseKind::ALL {
            assert_eq!(kind.as_str().parse::<ExerciseKind>().unwrap(), kind);
        }
        assert!("subnet-soup".parse::<ExerciseKind>().is_err());
        assert_eq!("Hard".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert!("extreme".parse::<Difficulty>().is_err());
    }

    #[test]
    fn test_kind_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&ExerciseKind::VlsmScenario).unwrap(),
            "\"vlsm-scenario\""
        );
    }

    #[test]
    fn test_fallbacks_are_valid_and_reproducible() {
        for kind in ExerciseKind::ALL {
            let problem = fallback_exercise(kind);
            assert_eq!(problem.kind, kind);
            assert!(problem.degraded);
            assert_eq!(problem.payload.validate(), Ok(()), "{kind}");
            assert!(problem.payload.is_reproducible(), "{kind}");
        }
    }

    #[test]
    fn test_same_seed_same_problem() {
        for kind in ExerciseKind::ALL {
            let a = generate_exercise(kind, Difficulty::Hard, &mut StdRng::seed_from_u64(99), 30);
            let b = generate_exercise(kind, Difficulty::Hard, &mut StdRng::seed_from_u64(99), 30);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_generation_is_total_with_degenerate_rng() {
        // A constant RNG keeps producing the same rejected sample.
        for kind in ExerciseKind::ALL {
            for difficulty in Difficulty::ALL {
                let mut rng = StepRng::new(0, 0);
                let problem = generate_exercise(kind, difficulty, &mut rng, 3);
                assert_eq!(problem.kind, kind);
                assert_eq!(problem.payload.validate(), Ok(()));
                assert!(problem.payload.is_reproducible());
            }
        }
    }

    #[test]
    fn test_try_generate_reports_exhaustion() {
        let mut rng = StdRng::seed_from_u64(1);
        let result = try_generate(ExerciseKind::VlsmScenario, Difficulty::Easy, &mut rng, 0);
        assert_eq!(
            result.unwrap_err(),
            GeneratorError::ExhaustedAttempts {
                kind: ExerciseKind::VlsmScenario,
                difficulty: Difficulty::Easy,
                attempts: 0,
            }
        );
    }
}
