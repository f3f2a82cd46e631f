/// Yes/no answer as captured in bulk uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    Yes,
    No,
}

impl Indicator {
    /// Interpret a free-text cell. Only `y`, `yes` and `true` (any case) count as yes.
    pub fn parse(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" | "true" => Indicator::Yes,
            _ => Indicator::No,
        }
    }

    pub fn is_yes(self) -> bool {
        self == Indicator::Yes
    }
}
