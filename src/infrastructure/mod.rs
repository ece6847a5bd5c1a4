pub mod csv;
pub mod db;
