/// How many full animation cycles to play before signaling completion.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum LoopMode {
    /// Loops forever.
    #[default]
    Infinite,
    /// Plays a single cycle.
    Once,
    /// Plays `amount` cycles.
    Repeat { amount: u32 },
}

impl LoopMode {
    /// Normalize a numeric loop amount: 0 is infinite, 1 is once.
    pub fn from_amount(amount: u32) -> Self {
        match amount {
            0 => Self::Infinite,
            1 => Self::Once,
            amount => Self::Repeat { amount },
        }
    }

    pub fn amount(self) -> u32 {
        match self {
            Self::Infinite => 0,
            Self::Once => 1,
            Self::Repeat { amount } => amount,
        }
    }

    pub fn is_infinite(self) -> bool {
        self.amount() == 0
    }
}

impl std::fmt::Display for LoopMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Infinite => f.write_str("infinite"),
            Self::Once => f.write_str("once"),
            Self::Repeat { amount } => write!(f, "repeat({amount})"),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/loop_mode.rs"]
mod tests;
