use serde::{Deserialize, Serialize};

/// When a placed trigger or interactable fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Condition {
    /// Fires every frame while the player overlaps the object.
    OnStay,
    /// Fires on the first frame of overlap.
    OnEnter,
    /// Fires when the player attacks/uses the object.
    OnInteract,
    /// Fires without contact as soon as the level is running.
    AutoStart,
    /// Fires while overlapping, if the flag comparison in the params holds.
    IfFlag,
    /// No condition; interactables treat this like `OnInteract`.
    #[default]
    None,
}

impl Condition {
    /// Look up a condition keyword as written in level data.
    pub fn from_keyword(keyword: &str) -> Option<Condition> {
        match keyword {
            "OnStay" => Some(Self::OnStay),
            "OnEnter" => Some(Self::OnEnter),
            "OnInteract" => Some(Self::OnInteract),
            "AutoStart" => Some(Self::AutoStart),
            "IfFlag" => Some(Self::IfFlag),
            "None" | "" => Some(Self::None),
            _ => None,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Self::OnStay => "OnStay",
            Self::OnEnter => "OnEnter",
            Self::OnInteract => "OnInteract",
            Self::AutoStart => "AutoStart",
            Self::IfFlag => "IfFlag",
            Self::None => "None",
        }
    }

    /// Conditions whose objects are spent once they fire, unless the
    /// params say `kill=false`.
    pub fn is_one_shot(&self) -> bool {
        matches!(self, Self::OnEnter | Self::IfFlag | Self::AutoStart)
    }
}

/// How `IfFlag` combines two flags (`flag_a`, `flag_b`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlagOperator {
    /// Both flags equal `value`.
    And,
    /// Either flag equals `value`.
    Or,
    /// The two flags hold the same value.
    Equal,
    /// The two flags differ.
    NotEqual,
}

impl FlagOperator {
    pub fn from_keyword(keyword: &str) -> Option<FlagOperator> {
        match keyword {
            "AND" => Some(Self::And),
            "OR" => Some(Self::Or),
            "EQUAL" => Some(Self::Equal),
            "NOT_EQUAL" => Some(Self::NotEqual),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_keywords_round_trip() {
        for c in [
            Condition::OnStay,
            Condition::OnEnter,
            Condition::OnInteract,
            Condition::AutoStart,
            Condition::IfFlag,
            Condition::None,
        ] {
            assert_eq!(Condition::from_keyword(c.keyword()), Some(c));
        }
        assert_eq!(Condition::from_keyword("OnLeave"), None);
    }

    #[test]
    fn one_shot_conditions() {
        assert!(Condition::OnEnter.is_one_shot());
        assert!(Condition::IfFlag.is_one_shot());
        assert!(!Condition::OnStay.is_one_shot());
        assert!(!Condition::OnInteract.is_one_shot());
    }

    #[test]
    fn flag_operators() {
        assert_eq!(FlagOperator::from_keyword("AND"), Some(FlagOperator::And));
        assert_eq!(
            FlagOperator::from_keyword("NOT_EQUAL"),
            Some(FlagOperator::NotEqual)
        );
        assert_eq!(FlagOperator::from_keyword("and"), None);
    }
}
