// Adapters layer: turn reports into output artifacts and persist the worker name map.

pub mod render;
pub mod user_map;
