pub mod db;
pub mod indexes;
pub mod types;
pub mod vector_index;
