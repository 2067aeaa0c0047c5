pub mod dates;
pub mod money;
pub mod session_store;
pub mod workbook;
