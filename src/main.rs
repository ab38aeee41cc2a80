use std::env::args;
use std::str::FromStr;

use anyhow::{anyhow, Context};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use sync_exercises::{
    config::Config, ex1_share_num, ex2_order, ex3_deadlock, ex3_deadlock::Scenario,
    ex4_producer_consumer, ex5_readers_writers, ex6_study_group, Error,
};
use tracing::info;

fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_target(false)
        .with_thread_names(true)
        .init();

    let exercises = Exercise::iter()
        .map(|e| e.to_string())
        .collect::<Vec<String>>()
        .join(",");
    let selector = args().nth(1).ok_or_else(|| {
        anyhow!("no exercise supplied, use one of {exercises} or see unit tests")
    })?;
    let exercise = Exercise::from_str(&selector)
        .with_context(|| format!("unknown exercise `{selector}', use one of {exercises}"))?;

    info!(%exercise, ?config, "starting");
    run(exercise, &config)?;
    Ok(())
}

fn run(exercise: Exercise, config: &Config) -> Result<(), Error> {
    match exercise {
        Exercise::ShareNum => ex1_share_num::run()?,
        Exercise::Order => ex2_order::run(config.rounds)?,
        Exercise::Deadlock => ex3_deadlock::run(Scenario::Racy)?,
        Exercise::DeadlockForced => ex3_deadlock::run(Scenario::Forced)?,
        Exercise::DeadlockFixed => ex3_deadlock::run(Scenario::Fixed)?,
        Exercise::ProducerConsumer => ex4_producer_consumer::run(config.items)?,
        Exercise::ReadersWriters => ex5_readers_writers::run(config.rounds)?,
        Exercise::StudyGroup => ex6_study_group::run(config.rounds)?,
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, EnumIter, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
enum Exercise {
    ShareNum,
    Order,
    Deadlock,
    DeadlockForced,
    DeadlockFixed,
    ProducerConsumer,
    ReadersWriters,
    StudyGroup,
}
