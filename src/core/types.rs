//! Closed choice sets offered by the bot's keyboards.
//!
//! The string forms are what travels inside action tokens and what is
//! stored in the database.

use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

/// Name given to a workout whose type is not one of ours.
pub const DEFAULT_WORKOUT_NAME: &str = "Новая тренировка";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum WorkoutKind {
    Split,
    PushPull,
    #[strum(serialize = "fullbody")]
    FullBody,
    Custom,
}

impl WorkoutKind {
    pub fn display_name(self) -> &'static str {
        match self {
            WorkoutKind::Split => "Классический сплит",
            WorkoutKind::PushPull => "Push/Pull/Legs",
            WorkoutKind::FullBody => "Фулбади",
            WorkoutKind::Custom => "Кастомная тренировка",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            WorkoutKind::Split => "🏋️",
            WorkoutKind::PushPull => "🔄",
            WorkoutKind::FullBody => "💪",
            WorkoutKind::Custom => "🎯",
        }
    }

    /// Workout name for a raw type argument, never failing.
    pub fn name_for(raw: &str) -> &'static str {
        raw.parse::<WorkoutKind>()
            .map(WorkoutKind::display_name)
            .unwrap_or(DEFAULT_WORKOUT_NAME)
    }
}

/// Durations offered by the wizard, in minutes.
pub const WORKOUT_DURATIONS: [u32; 4] = [30, 45, 60, 90];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Goal {
    MuscleGain,
    Strength,
    Endurance,
    WeightLoss,
}

impl Goal {
    pub fn label(self) -> &'static str {
        match self {
            Goal::MuscleGain => "💪 Набор мышечной массы",
            Goal::Strength => "🏋️ Сила",
            Goal::Endurance => "🏃 Выносливость",
            Goal::WeightLoss => "⚖️ Похудение",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum EquipmentPreset {
    Home,
    Gym,
    #[strum(serialize = "none")]
    Bodyweight,
    /// Opens the detailed equipment sub-menu instead of saving
    Custom,
}

impl EquipmentPreset {
    /// Equipment ids saved for this preset; `None` for the custom sub-menu.
    pub fn equipment_ids(self) -> Option<Vec<i64>> {
        match self {
            EquipmentPreset::Home => Some(vec![1]),
            EquipmentPreset::Gym => Some(vec![2]),
            EquipmentPreset::Bodyweight => Some(vec![0]),
            EquipmentPreset::Custom => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EquipmentPreset::Home => "🏠 Дома",
            EquipmentPreset::Gym => "🏋️ Тренажерный зал",
            EquipmentPreset::Bodyweight => "🤸 Без оборудования",
            EquipmentPreset::Custom => "⚙️ Настроить",
        }
    }
}

/// Label for a stored equipment id.
pub fn equipment_label(id: i64) -> &'static str {
    match id {
        0 => "без оборудования",
        1 => "домашний инвентарь",
        2 => "тренажерный зал",
        _ => "другое",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, AsRefStr, EnumIter)]
pub enum ExperienceLevel {
    #[strum(serialize = "1")]
    Beginner,
    #[strum(serialize = "3")]
    Intermediate,
    #[strum(serialize = "5")]
    Advanced,
    #[strum(serialize = "7")]
    Expert,
}

impl ExperienceLevel {
    pub fn from_value(value: i64) -> Option<Self> {
        Self::iter().find(|level| level.value() == value)
    }

    pub fn value(self) -> i64 {
        match self {
            ExperienceLevel::Beginner => 1,
            ExperienceLevel::Intermediate => 3,
            ExperienceLevel::Advanced => 5,
            ExperienceLevel::Expert => 7,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExperienceLevel::Beginner => "🌱 Новичок",
            ExperienceLevel::Intermediate => "💪 Средний",
            ExperienceLevel::Advanced => "🔥 Продвинутый",
            ExperienceLevel::Expert => "🏆 Профи",
        }
    }
}

/// Exercise categories present in the catalogue, in menu order.
pub const EXERCISE_CATEGORIES: [&str; 4] = ["strength", "cardio", "flexibility", "core"];

pub fn category_label(category: &str) -> &str {
    match category {
        "strength" => "💪 Силовые",
        "cardio" => "🏃 Кардио",
        "flexibility" => "🧘 Гибкость",
        "core" => "🎯 Кор",
        other => other,
    }
}
