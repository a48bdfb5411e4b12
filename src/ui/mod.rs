pub mod icons;
pub mod output;
pub mod progress;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{dim, error, gene, header, info, muted, not_found, success, summary_row, timing};
pub use progress::Spinner;
pub use table::{TableBuilder, stats_table};
pub use theme::{theme, Theme};
