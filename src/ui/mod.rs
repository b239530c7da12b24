pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{error, field, header, info, muted, question_moved, question_removed, question_saved, section, success, warn};
pub use table::{questions_table, stats_table, topics_table};
pub use theme::{theme, Theme};
