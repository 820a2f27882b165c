//! Policy names and their selectors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DispatchError;
use crate::load_balancer::{
    least_load::LeastLoad, pick_first::PickFirst, round_robin::RoundRobin, LoadBalancer,
};

/// The configured selection rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Policy {
    PickFirst,
    RoundRobin,
    LeastLoad,
}

impl Policy {
    pub const ALL: [Policy; 3] = [Policy::PickFirst, Policy::RoundRobin, Policy::LeastLoad];

    pub fn as_str(&self) -> &'static str {
        match self {
            Policy::PickFirst => "PickFirst",
            Policy::RoundRobin => "RoundRobin",
            Policy::LeastLoad => "LeastLoad",
        }
    }

    /// Whether a successful selection must advance the registry cursor.
    pub fn rotates(&self) -> bool {
        matches!(self, Policy::RoundRobin)
    }

    pub(crate) fn balancer(&self) -> &'static dyn LoadBalancer {
        match self {
            Policy::PickFirst => &PickFirst,
            Policy::RoundRobin => &RoundRobin,
            Policy::LeastLoad => &LeastLoad,
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Policy {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Policy::ALL
            .into_iter()
            .find(|policy| policy.as_str() == s.trim())
            .ok_or_else(|| DispatchError::InvalidPolicy(s.to_string()))
    }
}
