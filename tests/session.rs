//! Integration tests for the caller-side solver session

use std::time::Duration;

use rusty_money::{Money, iso::GBP};
use testresult::TestResult;

use squad_solver::{
    config::SolverConfig,
    prices::PriceTable,
    ratings::Rating,
    request::SolveRequestMessage,
    solutions::session::{SessionUpdate, SolverSession},
    solvers::run::RunStatus,
};

fn message(existing: &[i64], to_try: &[i64], target: i64) -> SolveRequestMessage {
    SolveRequestMessage {
        existing_ratings: existing.to_vec(),
        ratings_to_try: to_try.to_vec(),
        target_rating: Some(target),
    }
}

fn prices(entries: &[(u8, i64)]) -> TestResult<PriceTable<'static>> {
    let mut table = PriceTable::new(GBP);

    for &(rating, minor) in entries {
        table.insert(Rating::try_from(rating)?, Money::from_minor(minor, GBP))?;
    }

    Ok(table)
}

#[tokio::test]
async fn solutions_arrive_cheapest_first() -> TestResult {
    let table = prices(&[(81, 100), (82, 250), (83, 600), (84, 1_500), (85, 4_000)])?;
    let mut session = SolverSession::new(&SolverConfig::default(), table)?;

    session.start(&message(&[83, 84, 82], &[81, 82, 83, 84, 85], 83))?;
    let outcome = session.run_to_completion(None).await?;

    assert_eq!(outcome.status, RunStatus::Done);
    assert!(outcome.solutions > 1);
    assert_eq!(outcome.solutions, session.solutions().len());

    let prices: Vec<i64> = session
        .solutions()
        .iter()
        .map(|solution| solution.price().to_minor_units())
        .collect();

    assert!(
        prices.windows(2).all(|pair| pair.first() <= pair.last()),
        "solutions must be sorted by price: {prices:?}"
    );

    for solution in session.solutions() {
        let expected = session.prices().price_of(solution.combination())?;
        assert_eq!(solution.price(), &expected);
    }

    Ok(())
}

#[tokio::test]
async fn equal_prices_keep_enumeration_order() -> TestResult {
    let mut session = SolverSession::new(&SolverConfig::default(), PriceTable::new(GBP))?;

    session.start(&message(&[], &[80, 81, 82, 83], 81))?;
    session.run_to_completion(None).await?;

    let ids: Vec<u64> = session.solutions().iter().map(|solution| solution.id()).collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();

    assert!(!ids.is_empty());
    assert_eq!(ids, sorted, "free solutions stay in enumeration order");

    Ok(())
}

#[tokio::test]
async fn timeout_stops_the_run_and_keeps_partial_results() -> TestResult {
    let mut session = SolverSession::new(&SolverConfig::default(), PriceTable::new(GBP))?;
    let to_try: Vec<i64> = (60..80).collect();

    let run = session.start(&message(&[], &to_try, 60))?;
    let outcome = session
        .run_to_completion(Some(Duration::from_millis(200)))
        .await?;

    assert_eq!(outcome.run, run);
    assert_eq!(outcome.status, RunStatus::Cancelled);
    assert_eq!(outcome.solutions, session.solutions().len());
    assert!(!session.is_running());
    assert!(!session.no_solutions());

    Ok(())
}

#[tokio::test]
async fn restarting_discards_the_previous_run() -> TestResult {
    let mut session = SolverSession::new(&SolverConfig::default(), PriceTable::new(GBP))?;
    let to_try: Vec<i64> = (60..80).collect();

    let first = session.start(&message(&[], &to_try, 60))?;

    // Let a few chunks of the first run arrive.
    while session.solutions().len() < 100 {
        session.next_update().await?;
    }

    let second = session.start(&message(&[80, 82], &[75, 85], 80))?;
    assert!(session.solutions().is_empty());

    let outcome = loop {
        match session.next_update().await? {
            SessionUpdate::Stale(run) => assert_eq!(run, first),
            SessionUpdate::Progress { run, .. } => assert_eq!(run, second),
            SessionUpdate::Finished(outcome) => break outcome,
        }
    };

    assert_eq!(outcome.run, second);
    assert_eq!(outcome.status, RunStatus::Done);
    assert_eq!(session.solutions().len(), 1);

    let solution = session.solutions().cheapest().ok_or("expected a solution")?;
    assert_eq!(solution.combination().values(), vec![75, 85]);

    Ok(())
}

#[tokio::test]
async fn no_solutions_is_reported_once_done() -> TestResult {
    let mut session = SolverSession::new(&SolverConfig::default(), PriceTable::new(GBP))?;

    session.start(&message(&[99, 99], &[50, 60], 90))?;
    assert!(!session.no_solutions(), "not reported while running");

    let outcome = session.run_to_completion(None).await?;

    assert_eq!(outcome.solutions, 0);
    assert!(session.no_solutions());
    assert_eq!(session.progress().status, RunStatus::Done);
    assert_eq!(session.progress().scanned, 3);

    Ok(())
}
