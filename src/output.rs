use std::sync::OnceLock;

static QUIET: OnceLock<bool> = OnceLock::new();

/// `VBABIND_QUIET=1` turns off colors and decorative output
pub fn is_quiet() -> bool {
    *QUIET.get_or_init(|| {
        std::env::var("VBABIND_QUIET")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    })
}
