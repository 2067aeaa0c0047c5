pub mod employee;
pub mod table;
