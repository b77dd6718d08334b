pub mod master_table;

#[cfg(test)]
pub mod fixtures;

pub use master_table::MasterTable;
