use crate::domain::item::{Item, ItemPhase};
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;
use uuid::Uuid;

#[derive(Debug, Serialize)]
struct ItemRecord<'a> {
    item: &'a str,
    id: Uuid,
    amount: Decimal,
    state: String,
    stage: u32,
    error_stage: Option<u32>,
    phase: ItemPhase,
    version: u64,
}

/// Writes the final state of labelled items as CSV.
pub struct ItemWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ItemWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// Writes one row per `(label, item)` pair, header first.
    pub fn write_items<'a, I>(&mut self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'a str, &'a Item)>,
    {
        for (label, item) in items {
            self.writer.serialize(ItemRecord {
                item: label,
                id: item.id,
                amount: item.amount.value().normalize(),
                state: item.state_label(),
                stage: item.current_stage,
                error_stage: item.error_stage,
                phase: item.phase(),
                version: item.version,
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::item::{Amount, ItemState};
    use rust_decimal_macros::dec;

    #[test]
    fn test_writes_header_and_rows() {
        let mut item = Item::new(Amount::new(dec!(10.50)).unwrap());
        item.state = ItemState::Error;
        item.current_stage = 1;
        item.error_stage = Some(1);
        item.has_errored = true;
        item.version = 3;

        let mut buf = Vec::new();
        ItemWriter::new(&mut buf)
            .write_items([("a", &item)])
            .unwrap();

        let out = String::from_utf8(buf).unwrap();
        let mut lines = out.lines();
        assert_eq!(
            lines.next(),
            Some("item,id,amount,state,stage,error_stage,phase,version")
        );
        assert_eq!(
            lines.next().unwrap(),
            format!("a,{},10.5,ERROR,1,1,error,3", item.id)
        );
    }

    #[test]
    fn test_empty_error_stage() {
        let item = Item::new(Amount::new(dec!(10.00)).unwrap());
        let mut buf = Vec::new();
        ItemWriter::new(&mut buf)
            .write_items([("x", &item)])
            .unwrap();

        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains(&format!("x,{},10,CREATED,0,,processing,0", item.id)));
    }
}
