//! Helpers for tests: throwaway SQLite databases and a scripted accrual service.
pub mod accrual_stub;
pub mod prepare_env;
