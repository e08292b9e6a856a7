use crate::declaration::DeclarationType;

pub struct Icons;

impl Icons {
    pub const ROCKET: &str = "🚀";
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const STATS: &str = "📊";
    pub const DATABASE: &str = "🗄️";
    pub const FILE: &str = "📄";
    pub const NEW: &str = "✨";
    pub const MOD: &str = "📝";
    pub const UP: &str = "⬆️";
    pub const DOWN: &str = "⬇️";
    pub const PACKAGE: &str = "📦";
    pub const MODULE: &str = "📜";
    pub const CLASS: &str = "🔷";
    pub const TYPE: &str = "🧩";
    pub const MEMBER: &str = "🔹";

    /// Icon shown next to a declaration of the given kind
    pub fn for_kind(kind: DeclarationType) -> &'static str {
        match kind {
            DeclarationType::Project => Self::PACKAGE,
            DeclarationType::ProceduralModule => Self::MODULE,
            DeclarationType::ClassModule => Self::CLASS,
            _ if kind.is_module_type() => Self::TYPE,
            _ => Self::MEMBER,
        }
    }
}
