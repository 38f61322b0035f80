pub mod command_reader;
pub mod item_writer;
