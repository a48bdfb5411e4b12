use std::sync::OnceLock;

static QUIET: OnceLock<bool> = OnceLock::new();

/// Quiet mode suppresses decorative output (banners, spinners, info lines).
/// Set by `CAUSALITY_QUIET=1` or forced with [`set_quiet`].
pub fn is_quiet() -> bool {
    *QUIET.get_or_init(quiet_from_env)
}

/// Force quiet mode on top of the environment, e.g. for `--json` so that
/// stdout carries nothing but the JSON document. Has no effect once
/// [`is_quiet`] has been called.
pub fn set_quiet(quiet: bool) {
    let _ = QUIET.set(quiet || quiet_from_env());
}

fn quiet_from_env() -> bool {
    std::env::var("CAUSALITY_QUIET")
        .map(|v| is_truthy(&v))
        .unwrap_or(false)
}

fn is_truthy(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
