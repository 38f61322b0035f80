use crate::application::service::LifecycleService;
use crate::domain::item::{Amount, Item, ItemId};
use crate::error::{LedgerError, Rejection};
use crate::interfaces::csv::command_reader::Command;
use std::collections::HashMap;
use tracing::{error, warn};

/// Replays batch commands against a [`LifecycleService`].
///
/// Labels are bound to item ids by `create` commands and live only as long as
/// the runner. A refused command is logged and the batch carries on.
pub struct CommandRunner<'a> {
    service: &'a LifecycleService,
    labels: HashMap<String, ItemId>,
    // Labels in creation order, for output.
    order: Vec<String>,
}

impl<'a> CommandRunner<'a> {
    pub fn new(service: &'a LifecycleService) -> Self {
        Self {
            service,
            labels: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Runs a single command, returning the item it touched.
    pub async fn execute(&mut self, command: Command) -> Result<Item, Rejection> {
        match command.command.action() {
            None => self.create(command).await,
            Some(action) => {
                let id = self.resolve(&command.item)?;
                self.service.apply_action(id, action, &command.actor()).await
            }
        }
    }

    /// Runs every command, logging the ones that are refused. Returns the number refused.
    pub async fn run<I>(&mut self, commands: I) -> usize
    where
        I: IntoIterator<Item = crate::error::Result<Command>>,
    {
        let mut refused = 0;
        for (row, result) in commands.into_iter().enumerate() {
            let outcome = match result {
                Ok(command) => self.execute(command).await,
                Err(e) => {
                    error!(row = row + 1, error = %e, "Error reading command");
                    refused += 1;
                    continue;
                }
            };
            if let Err(rejection) = outcome {
                warn!(
                    row = row + 1,
                    kind = ?rejection.kind(),
                    state = %rejection.item.as_ref().map(|i| i.state_label()).unwrap_or_default(),
                    "Error processing command: {}",
                    rejection
                );
                refused += 1;
            }
        }
        refused
    }

    /// Current state of every labelled item, in creation order.
    pub async fn results(&self) -> crate::error::Result<Vec<(String, Item)>> {
        let mut results = Vec::with_capacity(self.order.len());
        for label in &self.order {
            let item = self.service.item(self.labels[label]).await?;
            results.push((label.clone(), item));
        }
        Ok(results)
    }

    pub fn item_id(&self, label: &str) -> Option<ItemId> {
        self.labels.get(label).copied()
    }

    async fn create(&mut self, command: Command) -> Result<Item, Rejection> {
        if self.labels.contains_key(&command.item) {
            return Err(LedgerError::ValidationError(format!(
                "Label '{}' is already bound to an item",
                command.item
            ))
            .into());
        }
        let value = command.amount.ok_or_else(|| {
            LedgerError::ValidationError(format!("create '{}' needs an amount", command.item))
        })?;
        let item = self.service.create_item(Amount::new(value)?).await?;
        self.labels.insert(command.item.clone(), item.id);
        self.order.push(command.item);
        Ok(item)
    }

    fn resolve(&self, label: &str) -> Result<ItemId, Rejection> {
        self.item_id(label).ok_or_else(|| {
            LedgerError::ValidationError(format!("Unknown item label '{}'", label)).into()
        })
    }
}
