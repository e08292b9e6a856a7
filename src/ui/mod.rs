pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{declaration, header, muted, section, snapshot_status, status, success, unresolved, warn};
pub use table::{chain_table, graph_stats_table, TableBuilder};
pub use theme::{theme, Theme};
