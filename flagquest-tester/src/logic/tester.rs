use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::logic::scenarios::TestScenario;
use crate::logic::simulation::{GameTester, SimulationPlan, SimulationSummary};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    /// Mean final score over iterations that produced a result.
    pub average_score: f64,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

pub struct LogicTester {
    tester: GameTester,
    verbose: bool,
}

impl LogicTester {
    pub const fn new(tester: GameTester, verbose: bool) -> Self {
        Self { tester, verbose }
    }

    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();

        for &seed in seeds {
            if self.verbose {
                println!(
                    "🧪 Testing scenario: {} (mode: {} strategy: {} seed: {})",
                    scenario.name.bright_white(),
                    scenario.plan.mode,
                    scenario.plan.strategy,
                    seed
                );
            }

            results.push(self.run_single_scenario(scenario, seed, iterations));
        }

        results
    }

    fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let outcome = self.run_simulation_iterations(&scenario.plan, seed, iterations);

        let average_duration = if outcome.durations.is_empty() {
            Duration::ZERO
        } else {
            outcome.durations.iter().sum::<Duration>()
                / u32::try_from(outcome.durations.len()).unwrap_or(1)
        };
        #[allow(clippy::cast_precision_loss)]
        let average_score = if outcome.scores.is_empty() {
            0.0
        } else {
            outcome.scores.iter().map(|&score| f64::from(score)).sum::<f64>()
                / outcome.scores.len() as f64
        };

        ScenarioResult {
            scenario_name: scenario.name.clone(),
            seed,
            passed: outcome.failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: outcome.successes,
            failures: outcome.failures,
            average_score,
            average_duration,
            performance_data: outcome.durations,
        }
    }

    fn run_simulation_iterations(
        &self,
        plan: &SimulationPlan,
        seed: u64,
        iterations: usize,
    ) -> IterationOutcome {
        let mut outcome = IterationOutcome::default();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));

            let failure = match self.tester.run_plan(plan, iteration_seed) {
                Ok(summary) => {
                    if summary.result.is_some() {
                        outcome.scores.push(summary.score());
                    }
                    evaluate_expectations(plan, &summary)
                        .map(|err| describe_failure(i + 1, &summary, &err))
                }
                Err(err) => Some(format!(
                    "Iteration {} (seed {iteration_seed}): {err:#}",
                    i + 1
                )),
            };

            if let Some(failure) = failure {
                if self.verbose {
                    println!(
                        "  ❌ Iteration {}/{} failed: {}",
                        i + 1,
                        iterations,
                        failure.clone().red()
                    );
                }
                outcome.failures.push(failure);
            } else {
                outcome.successes += 1;
                let duration = start_time.elapsed();
                outcome.durations.push(duration);

                if self.verbose {
                    println!(
                        "  ✅ Iteration {}/{} passed ({duration:?}) seed:{}",
                        i + 1,
                        iterations,
                        iteration_seed
                    );
                }
            }
        }

        outcome
    }
}

#[derive(Debug, Default)]
struct IterationOutcome {
    successes: usize,
    failures: Vec<String>,
    durations: Vec<Duration>,
    scores: Vec<u32>,
}

fn evaluate_expectations(plan: &SimulationPlan, summary: &SimulationSummary) -> Option<String> {
    for expectation in &plan.expectations {
        if let Err(err) = expectation.evaluate(summary) {
            return Some(err.to_string());
        }
    }
    None
}

fn describe_failure(iteration: usize, summary: &SimulationSummary, err: &str) -> String {
    format!(
        "Iteration {iteration} (mode {}, strategy {}, seed {}, rounds {}, outcome {}, score {}): {err} | {}",
        summary.mode,
        summary.strategy,
        summary.seed,
        summary.rounds.len(),
        summary.outcome_label(),
        summary.score(),
        summarize_rounds(summary)
    )
}

fn summarize_rounds(summary: &SimulationSummary) -> String {
    if summary.rounds.is_empty() {
        return "no rounds played".to_string();
    }

    summary
        .rounds
        .iter()
        .rev()
        .take(3)
        .map(|round| {
            let verdict = match round.correct {
                Some(true) => "correct",
                Some(false) => "wrong",
                None => "unanswered",
            };
            format!(
                "q{} {} [{}] {verdict} +{}",
                round.index + 1,
                round.flag_id,
                round.actions.join(", "),
                round.points
            )
        })
        .collect::<Vec<_>>()
        .join(" <- ")
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations.iter().map(Duration::as_millis).collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Vec::<u128>::deserialize(deserializer)?;
        Ok(millis
            .into_iter()
            .map(|ms| Duration::from_millis(u64::try_from(ms).unwrap_or(0)))
            .collect())
    }
}
