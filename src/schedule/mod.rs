pub mod types;
pub mod assign;
pub mod attempt;
pub mod generate;
pub mod optimize;
pub mod verify;

pub use assign::RejectionCounts;
pub use types::{
    Game, GenerateOptions, HomeAwayCount, LockRequirement, LockRequirements, Pair,
    ScheduleResult, Slot,
};
pub use generate::generate;
pub use optimize::optimize;
pub use verify::{
    compute_home_away_balance, compute_slot_fairness, summarize_slot_distribution,
    total_imbalance, verify_no_doubleheaders, DoubleheaderReport, DoubleheaderViolation,
    FairnessRating, SlotFairness,
};
