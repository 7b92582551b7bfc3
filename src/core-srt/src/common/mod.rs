pub mod db_env;
pub mod env_config;
pub mod health;
pub mod hostname;
pub mod logging;
