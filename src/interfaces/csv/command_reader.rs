use crate::domain::action::{Action, Actor, ActorRole};
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum CommandType {
    Create,
    CreateTransaction,
    Move,
    Error,
    Fix,
    Refund,
}

impl CommandType {
    /// The lifecycle action behind this command; `create` has none.
    pub fn action(&self) -> Option<Action> {
        match self {
            Self::Create => None,
            Self::CreateTransaction => Some(Action::CreateTransaction),
            Self::Move => Some(Action::Move),
            Self::Error => Some(Action::Error),
            Self::Fix => Some(Action::Fix),
            Self::Refund => Some(Action::Refund),
        }
    }
}

/// One row of a batch file: `command, item, actor, role, amount`.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct Command {
    pub command: CommandType,
    /// Caller-chosen label naming the item within the batch.
    pub item: String,
    pub actor: String,
    /// Empty means operator.
    pub role: Option<ActorRole>,
    pub amount: Option<Decimal>,
}

impl Command {
    pub fn actor(&self) -> Actor {
        Actor::new(self.actor.clone(), self.role.unwrap_or_default())
    }
}

/// Reads commands from a CSV source.
///
/// This reader wraps `csv::Reader` and provides an iterator over `Result<Command>`.
/// It handles whitespace trimming and flexible record lengths automatically.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    /// Creates a new `CommandReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes commands.
    pub fn commands(self) -> impl Iterator<Item = Result<Command>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(LedgerError::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reader_valid_stream() {
        let data = "command, item, actor, role, amount\n\
                    create, a, alice, operator, 10.00\n\
                    create_transaction, a, alice, operator,\n\
                    refund, a, root, admin,";
        let reader = CommandReader::new(data.as_bytes());
        let results: Vec<Result<Command>> = reader.commands().collect();

        assert_eq!(results.len(), 3);
        let create = results[0].as_ref().unwrap();
        assert_eq!(create.command, CommandType::Create);
        assert_eq!(create.item, "a");
        assert_eq!(create.amount, Some(dec!(10.00)));
        assert_eq!(create.command.action(), None);

        let bind = results[1].as_ref().unwrap();
        assert_eq!(bind.command.action(), Some(Action::CreateTransaction));
        assert_eq!(bind.amount, None);

        let refund = results[2].as_ref().unwrap();
        assert_eq!(refund.actor(), Actor::admin("root"));
    }

    #[test]
    fn test_reader_missing_role_defaults_to_operator() {
        let data = "command, item, actor, role, amount\nmove, a, bob, ,";
        let reader = CommandReader::new(data.as_bytes());
        let command = reader.commands().next().unwrap().unwrap();
        assert_eq!(command.role, None);
        assert_eq!(command.actor().role, ActorRole::Operator);
    }

    #[test]
    fn test_reader_malformed_line() {
        let data = "command, item, actor, role, amount\nteleport, a, bob, operator,";
        let reader = CommandReader::new(data.as_bytes());
        let results: Vec<Result<Command>> = reader.commands().collect();

        assert!(matches!(results[0], Err(LedgerError::CsvError(_))));
    }
}
