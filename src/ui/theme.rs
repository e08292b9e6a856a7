use crate::declaration::DeclarationType;
use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct Theme {
    pub header: Style,
    pub success: Style,
    pub error: Style,
    pub warn: Style,
    pub dim: Style,
    pub muted: Style,
    pub project: Style,
    pub module: Style,
    pub type_name: Style,
}

impl Theme {
    pub fn detect() -> Self {
        if crate::output::is_quiet() || !console::Term::stdout().is_term() {
            return Self::plain();
        }
        Self::colored()
    }

    pub fn colored() -> Self {
        Self {
            header: Style::new().cyan().bold(),
            success: Style::new().green().bold(),
            error: Style::new().red().bold(),
            warn: Style::new().yellow().bold(),
            dim: Style::new().white().dimmed(),
            muted: Style::new().bright_black(),
            project: Style::new().blue().bold(),
            module: Style::new().cyan(),
            type_name: Style::new().green(),
        }
    }

    pub fn plain() -> Self {
        Self {
            header: Style::new(),
            success: Style::new(),
            error: Style::new(),
            warn: Style::new(),
            dim: Style::new(),
            muted: Style::new(),
            project: Style::new(),
            module: Style::new(),
            type_name: Style::new(),
        }
    }

    /// Style for a declaration name of the given kind
    pub fn for_kind(&self, kind: DeclarationType) -> Style {
        match kind {
            DeclarationType::Project => self.project,
            DeclarationType::ProceduralModule | DeclarationType::ClassModule => self.module,
            _ if kind.is_module_type() => self.type_name,
            _ => self.dim,
        }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}
