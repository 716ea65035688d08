//! Integration tests for streamed solver runs

use std::{num::NonZeroUsize, time::Duration};

use rustc_hash::FxHashSet;
use testresult::TestResult;
use tokio::time::timeout;

use squad_solver::{
    config::SolverConfig,
    events::{RunId, SolverEvent},
    predicate::is_target_rating,
    ratings::{Rating, RatingCombination},
    request::SolveRequestMessage,
    solvers::{
        engine::{ResultChannel, SolverEngine},
        run::RunStatus,
    },
};

fn message(existing: &[i64], to_try: &[i64], target: i64) -> SolveRequestMessage {
    SolveRequestMessage {
        existing_ratings: existing.to_vec(),
        ratings_to_try: to_try.to_vec(),
        target_rating: Some(target),
    }
}

fn config(chunk_size: usize) -> TestResult<SolverConfig> {
    Ok(SolverConfig {
        chunk_size: NonZeroUsize::new(chunk_size).ok_or("chunk size must be positive")?,
        ..SolverConfig::default()
    })
}

async fn collect_run(channel: &mut ResultChannel, run: RunId) -> TestResult<Vec<SolverEvent>> {
    let mut events = Vec::new();

    loop {
        let event = timeout(Duration::from_secs(30), channel.recv())
            .await?
            .ok_or("event channel closed")?;

        if event.run_id != run {
            continue;
        }

        let terminal = event.event.is_terminal();
        events.push(event.event);

        if terminal {
            return Ok(events);
        }
    }
}

fn combinations(events: &[SolverEvent]) -> Vec<RatingCombination> {
    events
        .iter()
        .flat_map(|event| event.chunk().iter().cloned())
        .collect()
}

/// Every ordered `k`-tuple over the candidates, collapsed to multisets and filtered.
fn brute_force(existing: &[i64], to_try: &[i64], target: i64) -> TestResult<FxHashSet<RatingCombination>> {
    let existing = existing
        .iter()
        .map(|&value| Rating::try_from(value))
        .collect::<Result<Vec<_>, _>>()?;
    let candidates = to_try
        .iter()
        .map(|&value| Rating::try_from(value))
        .collect::<Result<Vec<_>, _>>()?;
    let target = Rating::try_from(target)?;

    let mut tuples: Vec<Vec<Rating>> = vec![Vec::new()];

    for _ in 0..candidates.len() {
        tuples = tuples
            .into_iter()
            .flat_map(|tuple| {
                candidates.iter().map(move |&candidate| {
                    let mut next = tuple.clone();
                    next.push(candidate);
                    next
                })
            })
            .collect();
    }

    let mut expected = FxHashSet::default();

    for tuple in tuples {
        if is_target_rating(&existing, &tuple, target)? {
            expected.insert(RatingCombination::new(tuple).canonical());
        }
    }

    Ok(expected)
}

#[tokio::test]
async fn streamed_results_match_brute_force() -> TestResult {
    let existing = [84, 86, 79];
    let to_try = [80, 81, 83, 86, 88];
    let target = 83;

    let (mut engine, mut channel) = SolverEngine::new(&config(4)?)?;
    let run = engine.start(&message(&existing, &to_try, target))?;
    let events = collect_run(&mut channel, run).await?;

    let streamed = combinations(&events);
    let unique: FxHashSet<RatingCombination> =
        streamed.iter().map(RatingCombination::canonical).collect();

    assert_eq!(unique.len(), streamed.len(), "no combination may repeat");
    assert_eq!(unique, brute_force(&existing, &to_try, target)?);
    assert!(!unique.is_empty(), "scenario should have solutions");

    Ok(())
}

#[tokio::test]
async fn chunks_are_full_until_the_terminal_done() -> TestResult {
    let (mut engine, mut channel) = SolverEngine::new(&config(3)?)?;
    let run = engine.start(&message(&[], &[80, 81, 82, 83, 84, 85], 82))?;
    let events = collect_run(&mut channel, run).await?;

    let (last, rest) = events.split_last().ok_or("expected events")?;

    for event in rest {
        assert!(
            matches!(event, SolverEvent::InProgress { result_chunk } if result_chunk.len() == 3),
            "every non-terminal event carries a full chunk"
        );
    }

    assert!(matches!(
        last,
        SolverEvent::Done { result_chunk, cancelled: false } if result_chunk.len() <= 3
    ));

    let progress = engine.current_run().ok_or("no run")?.finished().await;
    assert_eq!(progress.status, RunStatus::Done);
    assert_eq!(
        usize::try_from(progress.matched)?,
        combinations(&events).len()
    );

    Ok(())
}

#[tokio::test]
async fn accepted_combinations_satisfy_the_target() -> TestResult {
    let existing = [90, 70];
    let (mut engine, mut channel) = SolverEngine::new(&config(5)?)?;
    let run = engine.start(&message(&existing, &[60, 75, 85, 95], 80))?;
    let events = collect_run(&mut channel, run).await?;

    let existing = existing
        .iter()
        .map(|&value| Rating::try_from(value))
        .collect::<Result<Vec<_>, _>>()?;
    let target = Rating::try_from(80_i64)?;

    for combination in combinations(&events) {
        assert_eq!(combination.len(), 4);
        assert!(is_target_rating(&existing, &combination, target)?);
    }

    Ok(())
}

#[tokio::test]
async fn identical_requests_stream_identical_sequences() -> TestResult {
    let request = message(&[81, 83], &[79, 80, 84, 86], 82);

    let (mut engine, mut channel) = SolverEngine::new(&config(2)?)?;
    let first = engine.start(&request)?;
    let first_events = collect_run(&mut channel, first).await?;

    let (mut other_engine, mut other_channel) = SolverEngine::new(&config(7)?)?;
    let second = other_engine.start(&request)?;
    let second_events = collect_run(&mut other_channel, second).await?;

    assert_eq!(combinations(&first_events), combinations(&second_events));

    Ok(())
}

#[tokio::test]
async fn the_split_pair_is_the_only_match() -> TestResult {
    let (mut engine, mut channel) = SolverEngine::new(&SolverConfig::default())?;
    let run = engine.start(&message(&[80, 82], &[75, 85], 80))?;
    let events = collect_run(&mut channel, run).await?;

    let values: Vec<Vec<u8>> = combinations(&events)
        .iter()
        .map(RatingCombination::values)
        .collect();

    assert_eq!(values, vec![vec![75, 85]]);

    let json = squad_solver::events::RunEvent::new(run, events.last().cloned().ok_or("no events")?)
        .to_json()?;

    assert_eq!(
        json,
        format!(r#"{{"runId":{},"status":"DONE","resultChunk":[[75,85]],"cancelled":false}}"#, run.value())
    );

    Ok(())
}
