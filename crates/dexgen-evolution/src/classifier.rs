use dexgen_core::{EvolutionCondition, EvolutionMethod};

/// Maps a raw transition condition to its canonical method tag.
///
/// Rules are checked in a fixed order and the first match wins: level,
/// item use, trade (with or without a held item), friendship, time of day,
/// known move, known move type, location, then the raw trigger name.
/// The level value itself is carried separately on the transition record.
pub fn classify(condition: &EvolutionCondition) -> EvolutionMethod {
    if condition.min_level.is_some() {
        return EvolutionMethod::LevelUp;
    }

    if let Some(item) = condition.item_name() {
        return EvolutionMethod::UseItem(item.to_string());
    }

    if condition.trigger_name() == Some("trade") {
        return match condition.held_item_name() {
            Some(item) => EvolutionMethod::TradeHolding(item.to_string()),
            None => EvolutionMethod::Trade,
        };
    }

    if condition.min_happiness.is_some() {
        return EvolutionMethod::Friendship;
    }

    if let Some(time) = condition.time_of_day() {
        return EvolutionMethod::TimeOfDay(time.to_string());
    }

    if let Some(name) = condition.known_move_name() {
        return EvolutionMethod::KnowsMove(name.to_string());
    }

    if let Some(name) = condition.known_move_type_name() {
        return EvolutionMethod::KnowsMoveType(name.to_string());
    }

    if let Some(name) = condition.location_name() {
        return EvolutionMethod::Location(name.to_string());
    }

    match condition.trigger_name() {
        Some(trigger) => EvolutionMethod::Trigger(trigger.to_string()),
        None => EvolutionMethod::Unknown,
    }
}
