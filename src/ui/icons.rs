pub struct Icons;

impl Icons {
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const INFO: &str = "ℹ️";
    pub const LINK: &str = "🔗";
    pub const EMPTY: &str = "∅";
    pub const FILE: &str = "📄";
    pub const DATABASE: &str = "🗄️";
    pub const CLOCK: &str = "⏱️";
    pub const RIGHT: &str = "➡️";
    pub const UP: &str = "⬆️";
    pub const DNA: &str = "🧬";
    pub const CHART: &str = "📈";
}
