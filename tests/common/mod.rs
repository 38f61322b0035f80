#![allow(dead_code)]

use payflow::application::service::{LifecycleService, RetryPolicy};
use payflow::domain::action::{Action, Actor};
use payflow::domain::engine::{Pipeline, TransitionEngine};
use payflow::domain::item::{Amount, Item};
use payflow::infrastructure::in_memory::InMemoryLedgerStore;
use rust_decimal_macros::dec;
use std::io::Error;
use std::path::Path;

pub fn service_with_stages(stages: u32) -> LifecycleService {
    LifecycleService::new(
        Box::new(InMemoryLedgerStore::new()),
        TransitionEngine::new(Pipeline::new(stages).expect("valid pipeline")),
    )
}

pub fn contended_service(stages: u32, max_retries: u32) -> LifecycleService {
    service_with_stages(stages).with_retry_policy(RetryPolicy {
        max_retries,
        ..Default::default()
    })
}

pub fn ten() -> Amount {
    Amount::new(dec!(10.00)).expect("positive amount")
}

pub fn operator() -> Actor {
    Actor::operator("alice")
}

pub fn admin() -> Actor {
    Actor::admin("root")
}

/// Applies each action in order as `actor`, panicking on the first refusal.
pub async fn drive(service: &LifecycleService, item: &Item, actor: &Actor, actions: &[Action]) -> Item {
    let mut current = item.clone();
    for action in actions {
        current = service
            .apply_action(item.id, *action, actor)
            .await
            .unwrap_or_else(|r| panic!("{action} refused: {r}"));
    }
    current
}

/// Writes a batch file creating `items` items and pushing each one to completion.
pub fn generate_commands_csv(path: &Path, items: usize) -> Result<(), Error> {
    let mut wtr = csv::WriterBuilder::new().from_path(path)?;
    wtr.write_record(["command", "item", "actor", "role", "amount"])?;

    for i in 1..=items {
        let label = format!("item-{i}");
        wtr.write_record(["create", &label, "gen", "operator", "1.00"])?;
        wtr.write_record(["create_transaction", &label, "gen", "operator", ""])?;
        wtr.write_record(["move", &label, "gen", "operator", ""])?;
        wtr.write_record(["move", &label, "gen", "operator", ""])?;
    }

    wtr.flush()?;
    Ok(())
}
