pub mod error;
pub mod config;
pub mod transform;
pub mod eia;
pub mod nysdec;
pub mod db;
pub mod warehouse;
pub mod outputs;
pub mod geo;
pub mod pipeline;
