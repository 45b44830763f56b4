/*!
The option-group catalogs of the grouped select fields.

The interval field and the weekday field both present their choices
partitioned into labeled groups. This module is the single place where those
choices are defined. Nothing else in this crate invents choices; it only
enables or disables whole groups and picks among the options listed here.
*/

use jiff::civil::Weekday;

use crate::rule::{ByWeekday, Frequency, IntervalGroup, WeekdayGroup};

const YEARLY: &[u32] = &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10];

const MONTHLY: &[u32] =
    &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 18, 24, 36, 48];

const WEEKLY: &[u32] = &[
    1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21,
    22, 23, 24, 25, 26,
];

const DAILY: &[u32] = &[
    1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21,
    22, 23, 24, 25, 26, 27, 28, 29, 30,
];

/// The nth values offered by the `nth-weekday` group, in markup order.
const NTHS: [i8; 6] = [1, 2, 3, 4, 5, -1];

/// Weekdays in markup order. The form's weeks start on Monday.
const WEEKDAYS: [Weekday; 7] = [
    Weekday::Monday,
    Weekday::Tuesday,
    Weekday::Wednesday,
    Weekday::Thursday,
    Weekday::Friday,
    Weekday::Saturday,
    Weekday::Sunday,
];

/// A single selectable option.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Choice {
    /// The value submitted by the form.
    pub value: String,
    /// The human readable label shown for this option.
    pub label: String,
}

/// Returns the interval values offered for the given frequency.
pub fn interval_values(freq: Frequency) -> &'static [u32] {
    match freq {
        Frequency::Yearly => YEARLY,
        Frequency::Monthly => MONTHLY,
        Frequency::Weekly => WEEKLY,
        Frequency::Daily => DAILY,
    }
}

/// Returns the options of the given interval group.
pub fn interval_choices(group: IntervalGroup) -> Vec<Choice> {
    let unit = group.frequency().unit();
    group
        .values()
        .iter()
        .map(|&n| {
            let label = match n {
                1 => format!("Every {unit}"),
                2 => format!("Every other {unit}"),
                n => format!("Every {} {unit}", ordinal(n)),
            };
            Choice { value: n.to_string(), label }
        })
        .collect()
}

/// Returns every option of the weekday field, in markup order.
///
/// The `nth-weekday` group comes first, followed by the plain `weekdays`
/// group.
pub fn weekday_options() -> impl Iterator<Item = ByWeekday> {
    let numbered = NTHS.into_iter().flat_map(|nth| {
        WEEKDAYS
            .into_iter()
            .map(move |weekday| ByWeekday::Numbered { nth, weekday })
    });
    numbered.chain(WEEKDAYS.into_iter().map(ByWeekday::Any))
}

/// Returns the options of the given weekday group.
pub fn weekday_choices(group: WeekdayGroup) -> Vec<Choice> {
    weekday_options()
        .filter(|wd| wd.group() == group)
        .map(|wd| Choice { value: wd.to_string(), label: weekday_label(wd) })
        .collect()
}

fn weekday_label(wd: ByWeekday) -> String {
    let name = weekday_name(wd.weekday());
    match wd {
        ByWeekday::Any(Weekday::Monday) => "On Monday".to_string(),
        ByWeekday::Any(Weekday::Wednesday) => "The Wednesday".to_string(),
        ByWeekday::Any(_) => format!("{name}s"),
        ByWeekday::Numbered { nth: -1, .. } => format!("Last {name}"),
        ByWeekday::Numbered { nth, .. } => {
            let word = match nth {
                1 => "First",
                2 => "Second",
                3 => "Third",
                4 => "Fourth",
                5 => "Fifth",
                _ => return format!("{nth} {name}"),
            };
            format!("{word} {name}")
        }
    }
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Monday => "Monday",
        Weekday::Tuesday => "Tuesday",
        Weekday::Wednesday => "Wednesday",
        Weekday::Thursday => "Thursday",
        Weekday::Friday => "Friday",
        Weekday::Saturday => "Saturday",
        Weekday::Sunday => "Sunday",
    }
}

/// Formats `n` as an English ordinal, e.g., `3rd`, `11th` or `22nd`.
fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_group_starts_at_one() {
        for group in IntervalGroup::all() {
            assert_eq!(group.first(), 1, "group {group}");
            assert!(group.contains(1));
        }
        let monthly = IntervalGroup::new(Frequency::Monthly);
        assert!(monthly.contains(48));
        assert!(!monthly.contains(13));
        let yearly = IntervalGroup::new(Frequency::Yearly);
        assert!(!yearly.contains(11));
    }

    #[test]
    fn interval_labels() {
        let choices = interval_choices(IntervalGroup::new(Frequency::Weekly));
        assert_eq!(choices.len(), 26);
        assert_eq!(choices[0].label, "Every week");
        assert_eq!(choices[1].label, "Every other week");
        assert_eq!(choices[2].label, "Every 3rd week");
        assert_eq!(choices[10].label, "Every 11th week");
        assert_eq!(choices[20].label, "Every 21st week");
        assert_eq!(choices[21].label, "Every 22nd week");
        assert_eq!(choices[22].label, "Every 23rd week");
    }

    #[test]
    fn weekday_catalog() {
        assert_eq!(weekday_options().count(), 49);
        let nth = weekday_choices(WeekdayGroup::Nth);
        assert_eq!(nth.len(), 42);
        assert_eq!(nth[0].value, "1MO");
        assert_eq!(nth[0].label, "First Monday");
        assert_eq!(nth[41].value, "-1SU");
        assert_eq!(nth[41].label, "Last Sunday");

        let plain = weekday_choices(WeekdayGroup::Plain);
        assert_eq!(plain.len(), 7);
        assert_eq!(plain[1].value, "TU");
        assert_eq!(plain[1].label, "Tuesdays");
        assert_eq!(plain[0].label, "On Monday");
        assert_eq!(plain[2].label, "The Wednesday");
        assert_eq!(plain[6].label, "Sundays");
    }
}
