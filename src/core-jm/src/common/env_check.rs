/// True if the environment variable exists and is not blank.
pub fn is_env_set(var_name: &str) -> bool {
    std::env::var(var_name).map(|v| !v.trim().is_empty()).unwrap_or(false)
}
