/*!
Decides which fields of a recurrence rule form row are visible.

The entry point is [`compute`]. It is a pure function of the watched values of
one form row, and it returns a complete set of directives for every field that
depends on them. Applying those directives to a live form is somebody else's
job (see `crate::form`).

The rules, in precedence order:

1. The year/month mode only applies to yearly and monthly rules. Otherwise it
   is hidden, cleared and treated as unset by the rules below.
2. Weekly rules always show the weekday field, but never offer numbered
   weekdays ("second Tuesday").
3. By date shows the month day field. By day shows the weekday field with
   numbered weekdays enabled. Everything else hides and clears both.
4. Only the interval group of the current frequency is enabled. The selected
   interval is kept when it belongs to that group and reset to the group's
   first option otherwise.
5. The set position field follows the advanced options checkbox.
6. The termination mode picks between the until field and the count field.
7. Once a weekday is picked, only its group stays enabled, so plain and
   numbered weekdays never get mixed. With picks in both groups, the group
   that comes first in the catalog wins.
*/

use std::collections::BTreeMap;

use crate::{
    choices,
    rule::{
        ByWeekday, Field, Frequency, IntervalGroup, Termination, WeekdayGroup,
        YearMonthMode,
    },
};

/// The fields whose state is derived from the watched fields.
pub const DEPENDENT_FIELDS: [Field; 6] = [
    Field::YearMonthMode,
    Field::ByMonthDay,
    Field::ByWeekday,
    Field::Count,
    Field::UtcUntil,
    Field::BySetPos,
];

/// The watched values of one form row, in typed form.
///
/// Anything that couldn't be made sense of at the boundary is represented
/// here as unset.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RecurrenceFormState {
    pub frequency: Option<Frequency>,
    pub year_month_mode: YearMonthMode,
    /// The currently selected interval option.
    pub interval: Option<IntervalChoice>,
    /// The currently selected weekday options, in selection order.
    pub byweekday: Vec<ByWeekday>,
    pub advanced: bool,
    pub termination: Termination,
}

/// An option of the interval field.
///
/// An interval option is identified by its group *and* its value. That is,
/// "every 2nd month" and "every 2nd day" are different options even though
/// both submit `2`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Serialize)]
pub struct IntervalChoice {
    pub group: IntervalGroup,
    pub value: u32,
}

/// What should happen to a single field.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize)]
pub struct FieldDirective {
    pub visible: bool,
    pub enabled: bool,
    /// Whether the field's value must be emptied.
    pub clear: bool,
}

impl FieldDirective {
    pub const SHOW: FieldDirective =
        FieldDirective { visible: true, enabled: true, clear: false };

    pub const HIDE_AND_CLEAR: FieldDirective =
        FieldDirective { visible: false, enabled: false, clear: true };

    fn show_if(yes: bool) -> FieldDirective {
        if yes { FieldDirective::SHOW } else { FieldDirective::HIDE_AND_CLEAR }
    }
}

impl std::fmt::Display for FieldDirective {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let visible = if self.visible { "visible" } else { "hidden" };
        let enabled = if self.enabled { "enabled" } else { "disabled" };
        write!(f, "{visible}, {enabled}")?;
        if self.clear {
            write!(f, ", cleared")?;
        }
        Ok(())
    }
}

/// What should happen to the interval field.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize)]
pub struct IntervalDirective {
    /// The only enabled group. Every other group is disabled. When this is
    /// `None`, every group is disabled.
    pub enabled: Option<IntervalGroup>,
    /// The option that must end up selected. When this is `None`, the
    /// selection is cleared.
    pub select: Option<IntervalChoice>,
}

impl IntervalDirective {
    pub fn is_enabled(&self, group: IntervalGroup) -> bool {
        self.enabled == Some(group)
    }
}

/// What should happen to the option groups of the weekday field.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize)]
pub struct WeekdayGroupsDirective {
    #[serde(rename = "nth-weekday")]
    pub nth: bool,
    #[serde(rename = "weekdays")]
    pub plain: bool,
}

impl WeekdayGroupsDirective {
    pub fn is_enabled(&self, group: WeekdayGroup) -> bool {
        match group {
            WeekdayGroup::Nth => self.nth,
            WeekdayGroup::Plain => self.plain,
        }
    }
}

/// The complete set of directives for one form row.
#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize)]
pub struct FieldDirectives {
    fields: BTreeMap<Field, FieldDirective>,
    interval: IntervalDirective,
    weekday_groups: WeekdayGroupsDirective,
}

impl FieldDirectives {
    /// Returns the directive for the given field.
    ///
    /// Fields that don't depend on any watched field are always visible and
    /// enabled, and are never cleared.
    pub fn get(&self, field: Field) -> FieldDirective {
        self.fields.get(&field).copied().unwrap_or(FieldDirective::SHOW)
    }

    /// Iterates over the directives of every dependent field, in form order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, FieldDirective)> + '_ {
        self.fields.iter().map(|(&field, &directive)| (field, directive))
    }

    pub fn interval(&self) -> &IntervalDirective {
        &self.interval
    }

    pub fn weekday_groups(&self) -> &WeekdayGroupsDirective {
        &self.weekday_groups
    }
}

/// Computes the directives for a form row in the given state.
///
/// This never fails. Calling it twice on the same state always produces the
/// same directives.
pub fn compute(state: &RecurrenceFormState) -> FieldDirectives {
    let freq = state.frequency;
    let weekly = freq == Some(Frequency::Weekly);
    let has_mode = freq.map_or(false, |f| f.has_year_month_mode());
    let mode =
        if has_mode { state.year_month_mode } else { YearMonthMode::Unset };

    let mut fields = BTreeMap::new();
    fields.insert(Field::YearMonthMode, FieldDirective::show_if(has_mode));
    fields.insert(
        Field::ByMonthDay,
        FieldDirective::show_if(mode == YearMonthMode::ByDate),
    );
    fields.insert(
        Field::ByWeekday,
        FieldDirective::show_if(weekly || mode == YearMonthMode::ByDay),
    );
    fields.insert(
        Field::Count,
        FieldDirective::show_if(state.termination == Termination::Count),
    );
    fields.insert(
        Field::UtcUntil,
        FieldDirective::show_if(state.termination == Termination::Until),
    );
    fields.insert(Field::BySetPos, FieldDirective::show_if(state.advanced));

    let interval = interval_directive(freq, state.interval);
    let weekday_groups = weekday_groups_directive(
        !weekly && mode == YearMonthMode::ByDay,
        &state.byweekday,
    );
    log::trace!(
        "computed directives for frequency {freq:?}, mode {mode:?}: \
         interval {interval:?}, weekday groups {weekday_groups:?}",
    );
    FieldDirectives { fields, interval, weekday_groups }
}

fn interval_directive(
    freq: Option<Frequency>,
    selected: Option<IntervalChoice>,
) -> IntervalDirective {
    let Some(freq) = freq else {
        return IntervalDirective { enabled: None, select: None };
    };
    let group = IntervalGroup::new(freq);
    let select = match selected {
        Some(choice)
            if choice.group == group && group.contains(choice.value) =>
        {
            choice
        }
        _ => IntervalChoice { group, value: group.first() },
    };
    IntervalDirective { enabled: Some(group), select: Some(select) }
}

fn weekday_groups_directive(
    nth_allowed: bool,
    selected: &[ByWeekday],
) -> WeekdayGroupsDirective {
    let allowed = |group: WeekdayGroup| match group {
        WeekdayGroup::Nth => nth_allowed,
        WeekdayGroup::Plain => true,
    };
    // The first selected option in catalog order wins, regardless of the
    // order it was picked in. Selections sitting in a group that is disabled
    // anyway don't count. They get dropped when the directives are applied.
    let narrowed = choices::weekday_options()
        .filter(|wd| selected.contains(wd))
        .map(|wd| wd.group())
        .find(|&g| allowed(g));
    let enabled = |group: WeekdayGroup| {
        allowed(group) && narrowed.map_or(true, |g| g == group)
    };
    WeekdayGroupsDirective {
        nth: enabled(WeekdayGroup::Nth),
        plain: enabled(WeekdayGroup::Plain),
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::Weekday;

    use super::*;

    fn state(freq: Frequency) -> RecurrenceFormState {
        RecurrenceFormState { frequency: Some(freq), ..Default::default() }
    }

    fn monday() -> ByWeekday {
        ByWeekday::Any(Weekday::Monday)
    }

    fn second_tuesday() -> ByWeekday {
        ByWeekday::Numbered { nth: 2, weekday: Weekday::Tuesday }
    }

    #[test]
    fn year_month_mode_follows_frequency() {
        for freq in [Frequency::Yearly, Frequency::Monthly] {
            let d = compute(&state(freq));
            assert_eq!(d.get(Field::YearMonthMode), FieldDirective::SHOW);
        }
        for freq in [Frequency::Weekly, Frequency::Daily] {
            let mut st = state(freq);
            st.year_month_mode = YearMonthMode::ByDate;
            let d = compute(&st);
            assert_eq!(
                d.get(Field::YearMonthMode),
                FieldDirective::HIDE_AND_CLEAR,
            );
        }
        let d = compute(&RecurrenceFormState::default());
        assert_eq!(
            d.get(Field::YearMonthMode),
            FieldDirective::HIDE_AND_CLEAR,
        );
    }

    #[test]
    fn weekly_never_offers_numbered_weekdays() {
        for mode in
            [YearMonthMode::Unset, YearMonthMode::ByDate, YearMonthMode::ByDay]
        {
            let mut st = state(Frequency::Weekly);
            st.year_month_mode = mode;
            let d = compute(&st);
            assert!(!d.weekday_groups().nth, "mode {mode:?}");
            assert!(d.weekday_groups().plain, "mode {mode:?}");
            assert_eq!(d.get(Field::ByWeekday), FieldDirective::SHOW);
            assert_eq!(
                d.get(Field::ByMonthDay),
                FieldDirective::HIDE_AND_CLEAR,
            );
        }
    }

    #[test]
    fn by_date_hides_and_clears_weekdays() {
        for freq in [Frequency::Yearly, Frequency::Monthly] {
            let mut st = state(freq);
            st.year_month_mode = YearMonthMode::ByDate;
            st.byweekday = vec![monday()];
            let d = compute(&st);
            assert_eq!(d.get(Field::ByMonthDay), FieldDirective::SHOW);
            assert_eq!(
                d.get(Field::ByWeekday),
                FieldDirective::HIDE_AND_CLEAR,
            );
        }
    }

    #[test]
    fn yearly_by_day() {
        let mut st = state(Frequency::Yearly);
        st.year_month_mode = YearMonthMode::ByDay;
        let d = compute(&st);
        assert_eq!(d.get(Field::ByWeekday), FieldDirective::SHOW);
        assert!(d.weekday_groups().nth);
        assert!(d.weekday_groups().plain);
        assert_eq!(d.get(Field::ByMonthDay), FieldDirective::HIDE_AND_CLEAR);
    }

    #[test]
    fn unset_mode_hides_both_day_fields() {
        let d = compute(&state(Frequency::Monthly));
        assert_eq!(d.get(Field::ByWeekday), FieldDirective::HIDE_AND_CLEAR);
        assert_eq!(d.get(Field::ByMonthDay), FieldDirective::HIDE_AND_CLEAR);
    }

    #[test]
    fn termination_picks_exactly_one_field() {
        let mut st = state(Frequency::Daily);

        st.termination = Termination::Until;
        let d = compute(&st);
        assert_eq!(d.get(Field::UtcUntil), FieldDirective::SHOW);
        assert_eq!(d.get(Field::Count), FieldDirective::HIDE_AND_CLEAR);

        st.termination = Termination::Count;
        let d = compute(&st);
        assert_eq!(d.get(Field::Count), FieldDirective::SHOW);
        assert_eq!(d.get(Field::UtcUntil), FieldDirective::HIDE_AND_CLEAR);

        st.termination = Termination::Never;
        let d = compute(&st);
        assert_eq!(d.get(Field::Count), FieldDirective::HIDE_AND_CLEAR);
        assert_eq!(d.get(Field::UtcUntil), FieldDirective::HIDE_AND_CLEAR);
    }

    #[test]
    fn advanced_options_gate_set_position() {
        let mut st = state(Frequency::Monthly);
        st.advanced = true;
        assert_eq!(compute(&st).get(Field::BySetPos), FieldDirective::SHOW);
        st.advanced = false;
        let d = compute(&st);
        assert_eq!(d.get(Field::BySetPos), FieldDirective::HIDE_AND_CLEAR);
        assert!(d.get(Field::BySetPos).clear);
    }

    #[test]
    fn interval_keeps_selection_within_group() {
        let monthly = IntervalGroup::new(Frequency::Monthly);
        let mut st = state(Frequency::Monthly);
        st.interval = Some(IntervalChoice { group: monthly, value: 18 });
        let d = compute(&st);
        assert_eq!(d.interval().enabled, Some(monthly));
        assert_eq!(
            d.interval().select,
            Some(IntervalChoice { group: monthly, value: 18 }),
        );
    }

    #[test]
    fn interval_resets_when_group_changes() {
        let monthly = IntervalGroup::new(Frequency::Monthly);
        let daily = IntervalGroup::new(Frequency::Daily);
        let mut st = state(Frequency::Daily);
        st.interval = Some(IntervalChoice { group: monthly, value: 2 });
        let d = compute(&st);
        assert_eq!(d.interval().enabled, Some(daily));
        assert!(d.interval().is_enabled(daily));
        assert!(!d.interval().is_enabled(monthly));
        assert_eq!(
            d.interval().select,
            Some(IntervalChoice { group: daily, value: 1 }),
        );
    }

    #[test]
    fn interval_value_outside_group_resets() {
        let yearly = IntervalGroup::new(Frequency::Yearly);
        let mut st = state(Frequency::Yearly);
        st.interval = Some(IntervalChoice { group: yearly, value: 11 });
        let d = compute(&st);
        assert_eq!(
            d.interval().select,
            Some(IntervalChoice { group: yearly, value: 1 }),
        );
    }

    #[test]
    fn no_frequency_disables_every_interval_group() {
        let st = RecurrenceFormState {
            interval: Some(IntervalChoice {
                group: IntervalGroup::new(Frequency::Weekly),
                value: 3,
            }),
            ..Default::default()
        };
        let d = compute(&st);
        assert_eq!(d.interval().enabled, None);
        assert_eq!(d.interval().select, None);
        for group in IntervalGroup::all() {
            assert!(!d.interval().is_enabled(group));
        }
    }

    #[test]
    fn monthly_by_date_to_daily() {
        let monthly = IntervalGroup::new(Frequency::Monthly);
        let mut st = state(Frequency::Monthly);
        st.year_month_mode = YearMonthMode::ByDate;
        st.interval = Some(IntervalChoice { group: monthly, value: 3 });
        let before = compute(&st);
        assert_eq!(before.get(Field::ByMonthDay), FieldDirective::SHOW);

        st.frequency = Some(Frequency::Daily);
        let after = compute(&st);
        assert_eq!(
            after.get(Field::YearMonthMode),
            FieldDirective::HIDE_AND_CLEAR,
        );
        assert_eq!(
            after.get(Field::ByMonthDay),
            FieldDirective::HIDE_AND_CLEAR,
        );
        let daily = IntervalGroup::new(Frequency::Daily);
        assert_eq!(after.interval().enabled, Some(daily));
        assert_eq!(
            after.interval().select,
            Some(IntervalChoice { group: daily, value: 1 }),
        );
    }

    #[test]
    fn narrowing_to_plain_weekdays() {
        let mut st = state(Frequency::Weekly);
        st.byweekday = vec![monday()];
        let d = compute(&st);
        assert!(!d.weekday_groups().nth);
        assert!(d.weekday_groups().plain);

        let mut st = state(Frequency::Monthly);
        st.year_month_mode = YearMonthMode::ByDay;
        st.byweekday = vec![monday()];
        let d = compute(&st);
        assert!(!d.weekday_groups().nth);
        assert!(d.weekday_groups().plain);
    }

    #[test]
    fn narrowing_to_numbered_weekdays() {
        let mut st = state(Frequency::Monthly);
        st.year_month_mode = YearMonthMode::ByDay;
        st.byweekday = vec![second_tuesday(), monday()];
        let d = compute(&st);
        assert!(d.weekday_groups().nth);
        assert!(!d.weekday_groups().plain);

        st.byweekday.clear();
        let d = compute(&st);
        assert!(d.weekday_groups().nth);
        assert!(d.weekday_groups().plain);
    }

    #[test]
    fn narrowing_follows_catalog_order() {
        let mut st = state(Frequency::Monthly);
        st.year_month_mode = YearMonthMode::ByDay;
        st.byweekday = vec![monday(), second_tuesday()];
        let d = compute(&st);
        assert!(d.weekday_groups().nth);
        assert!(!d.weekday_groups().plain);
    }

    #[test]
    fn stale_numbered_weekday_does_not_narrow_weekly() {
        let mut st = state(Frequency::Weekly);
        st.byweekday = vec![second_tuesday()];
        let d = compute(&st);
        assert!(!d.weekday_groups().nth);
        assert!(d.weekday_groups().plain);
    }

    #[test]
    fn dependent_fields_are_all_covered() {
        let d = compute(&RecurrenceFormState::default());
        let fields: Vec<Field> = d.iter().map(|(field, _)| field).collect();
        assert_eq!(fields, DEPENDENT_FIELDS.to_vec());
        assert_eq!(d.get(Field::Freq), FieldDirective::SHOW);
    }

    #[test]
    fn idempotent() {
        let mut st = state(Frequency::Yearly);
        st.year_month_mode = YearMonthMode::ByDay;
        st.byweekday = vec![second_tuesday()];
        st.termination = Termination::Count;
        st.advanced = true;
        assert_eq!(compute(&st), compute(&st));
    }
}
