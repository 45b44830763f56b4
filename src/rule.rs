/*!
The vocabulary of a recurrence rule form.

Everything in here corresponds to a value that can be submitted by one row
of the recurrence rule form. The form itself only ever deals in strings, so
every type here knows how to parse itself from the form's representation and
how to render itself back into it.
*/

use jiff::civil::Weekday;

use crate::args::Usage;

/// A field of one recurrence rule form row.
///
/// The declaration order matches the order in which the fields are laid out
/// in the form, and that's the order used whenever fields are listed.
#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    Hash,
    PartialEq,
    PartialOrd,
    Ord,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Freq,
    YearMonthMode,
    Interval,
    #[serde(rename = "bymonthday")]
    ByMonthDay,
    #[serde(rename = "byweekday")]
    ByWeekday,
    FreqType,
    Count,
    UtcUntil,
    AdvanceOptions,
    #[serde(rename = "bysetpos")]
    BySetPos,
}

impl Field {
    pub const ALL: [Field; 10] = [
        Field::Freq,
        Field::YearMonthMode,
        Field::Interval,
        Field::ByMonthDay,
        Field::ByWeekday,
        Field::FreqType,
        Field::Count,
        Field::UtcUntil,
        Field::AdvanceOptions,
        Field::BySetPos,
    ];

    /// The name of this field as it appears in the form markup.
    pub fn name(&self) -> &'static str {
        match *self {
            Field::Freq => "freq",
            Field::YearMonthMode => "year_month_mode",
            Field::Interval => "interval",
            Field::ByMonthDay => "bymonthday",
            Field::ByWeekday => "byweekday",
            Field::FreqType => "freq_type",
            Field::Count => "count",
            Field::UtcUntil => "utc_until",
            Field::AdvanceOptions => "advance_options",
            Field::BySetPos => "bysetpos",
        }
    }

    /// Returns true when this field is rendered as a group of radio inputs.
    ///
    /// Radio inputs are addressed by their shared `name` attribute instead of
    /// an element id.
    pub fn is_radio(&self) -> bool {
        matches!(*self, Field::FreqType)
    }

    /// Looks up a field by its form name.
    pub fn from_name(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.name() == name)
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The frequency of a recurrence rule, as offered by the form.
///
/// The form only offers the four calendar-sized frequencies. In the form
/// markup they are the integers `0` through `3`, in declaration order.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum Frequency {
    Yearly,
    Monthly,
    Weekly,
    Daily,
}

impl Frequency {
    pub const ALL: [Frequency; 4] = [
        Frequency::Yearly,
        Frequency::Monthly,
        Frequency::Weekly,
        Frequency::Daily,
    ];

    pub const USAGE: Usage = Usage::flag(
        "--freq <frequency>",
        "Restrict output to the given frequency.",
        r#"
Restrict output to the given frequency.

Valid values are:

yearly, year, yr, y, 0

monthly, month, mo, 1

weekly, week, wk, w, 2

daily, day, d, 3
"#,
    );

    /// The integer used for this frequency in the form markup.
    pub fn form_value(&self) -> u8 {
        match *self {
            Frequency::Yearly => 0,
            Frequency::Monthly => 1,
            Frequency::Weekly => 2,
            Frequency::Daily => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match *self {
            Frequency::Yearly => "yearly",
            Frequency::Monthly => "monthly",
            Frequency::Weekly => "weekly",
            Frequency::Daily => "daily",
        }
    }

    /// The unit word used when describing an interval at this frequency.
    pub fn unit(&self) -> &'static str {
        match *self {
            Frequency::Yearly => "year",
            Frequency::Monthly => "month",
            Frequency::Weekly => "week",
            Frequency::Daily => "day",
        }
    }

    /// Whether the year/month mode (by date or by day) applies.
    pub fn has_year_month_mode(&self) -> bool {
        matches!(*self, Frequency::Yearly | Frequency::Monthly)
    }
}

impl std::str::FromStr for Frequency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Frequency> {
        use self::Frequency::*;

        let freq = match &*s.trim().to_lowercase() {
            "0" | "yearly" | "year" | "yr" | "y" => Yearly,
            "1" | "monthly" | "month" | "mo" => Monthly,
            "2" | "weekly" | "week" | "wk" | "w" => Weekly,
            "3" | "daily" | "day" | "d" => Daily,
            unk => anyhow::bail!("unrecognized frequency: `{unk}`"),
        };
        Ok(freq)
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a yearly or monthly rule picks days by date or by weekday.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum YearMonthMode {
    #[default]
    Unset,
    ByDate,
    ByDay,
}

impl std::str::FromStr for YearMonthMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<YearMonthMode> {
        let mode = match &*s.trim().to_lowercase() {
            "" => YearMonthMode::Unset,
            "1" | "by-date" | "by_date" | "bydate" | "date" => {
                YearMonthMode::ByDate
            }
            "2" | "by-day" | "by_day" | "byday" | "day" => {
                YearMonthMode::ByDay
            }
            unk => anyhow::bail!("unrecognized year/month mode: `{unk}`"),
        };
        Ok(mode)
    }
}

/// How a recurrence rule ends.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Termination {
    #[default]
    Never,
    Until,
    Count,
}

impl std::str::FromStr for Termination {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Termination> {
        let termination = match &*s.trim().to_lowercase() {
            "" | "forever" | "never" => Termination::Never,
            "until" => Termination::Until,
            "count" => Termination::Count,
            unk => anyhow::bail!("unrecognized termination mode: `{unk}`"),
        };
        Ok(termination)
    }
}

/// One of the labeled option groups of the interval field.
///
/// There is one group per frequency. Groups are labeled `frequency + 1`
/// because a group labeled `0` doesn't render in the markup the form is
/// served with. The label is only ever exposed at the boundary. Internally,
/// a group is just its frequency.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct IntervalGroup(Frequency);

impl IntervalGroup {
    pub fn new(freq: Frequency) -> IntervalGroup {
        IntervalGroup(freq)
    }

    /// Returns the group with the given markup label, if one exists.
    pub fn from_label(label: u8) -> Option<IntervalGroup> {
        Frequency::ALL
            .into_iter()
            .map(IntervalGroup)
            .find(|group| group.label() == label)
    }

    pub fn all() -> impl Iterator<Item = IntervalGroup> {
        Frequency::ALL.into_iter().map(IntervalGroup)
    }

    pub fn frequency(&self) -> Frequency {
        self.0
    }

    /// The label of this group in the form markup.
    pub fn label(&self) -> u8 {
        self.0.form_value() + 1
    }

    /// The interval values offered in this group, in markup order.
    pub fn values(&self) -> &'static [u32] {
        crate::choices::interval_values(self.0)
    }

    /// The option selected by default when this group becomes enabled.
    pub fn first(&self) -> u32 {
        self.values()[0]
    }

    pub fn contains(&self, value: u32) -> bool {
        self.values().contains(&value)
    }
}

impl std::fmt::Display for IntervalGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl serde::Serialize for IntervalGroup {
    fn serialize<S: serde::Serializer>(
        &self,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        s.serialize_u8(self.label())
    }
}

impl<'de> serde::Deserialize<'de> for IntervalGroup {
    fn deserialize<D: serde::Deserializer<'de>>(
        d: D,
    ) -> Result<IntervalGroup, D::Error> {
        let label = u8::deserialize(d)?;
        IntervalGroup::from_label(label).ok_or_else(|| {
            serde::de::Error::custom(format_args!(
                "unrecognized interval group label `{label}`, \
                 expected 1, 2, 3 or 4",
            ))
        })
    }
}

/// One of the labeled option groups of the weekday field.
#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    Hash,
    PartialEq,
    PartialOrd,
    Ord,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum WeekdayGroup {
    /// Numbered weekdays, e.g., "second Tuesday" or "last Friday".
    #[serde(rename = "nth-weekday")]
    Nth,
    /// Plain weekdays, e.g., "Tuesdays".
    #[serde(rename = "weekdays")]
    Plain,
}

impl WeekdayGroup {
    pub const ALL: [WeekdayGroup; 2] =
        [WeekdayGroup::Nth, WeekdayGroup::Plain];

    pub fn label(&self) -> &'static str {
        match *self {
            WeekdayGroup::Nth => "nth-weekday",
            WeekdayGroup::Plain => "weekdays",
        }
    }
}

impl std::fmt::Display for WeekdayGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A single option of the weekday field.
///
/// In the markup, these use the RFC 5545 `BYDAY` spelling: `MO` for any
/// Monday, `2TU` for the second Tuesday and `-1FR` for the last Friday.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ByWeekday {
    Any(Weekday),
    Numbered { nth: i8, weekday: Weekday },
}

impl ByWeekday {
    /// The option group this choice is listed under.
    pub fn group(&self) -> WeekdayGroup {
        match *self {
            ByWeekday::Any(_) => WeekdayGroup::Plain,
            ByWeekday::Numbered { .. } => WeekdayGroup::Nth,
        }
    }

    pub fn weekday(&self) -> Weekday {
        match *self {
            ByWeekday::Any(weekday) => weekday,
            ByWeekday::Numbered { weekday, .. } => weekday,
        }
    }
}

impl std::str::FromStr for ByWeekday {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<ByWeekday> {
        let s = s.trim();
        anyhow::ensure!(
            s.len() >= 2 && s.is_char_boundary(s.len() - 2),
            "invalid weekday choice `{s}`",
        );
        let (nth, code) = s.split_at(s.len() - 2);
        let weekday = weekday_from_code(code).ok_or_else(|| {
            anyhow::anyhow!(
                "unrecognized weekday `{code}` in `{s}`, \
                 expected one of MO, TU, WE, TH, FR, SA or SU",
            )
        })?;
        if nth.is_empty() {
            return Ok(ByWeekday::Any(weekday));
        }
        let nth: i8 = nth.parse().map_err(|_| {
            anyhow::anyhow!("failed to parse `{nth}` as a weekday number")
        })?;
        anyhow::ensure!(
            nth != 0 && (-5..=5).contains(&nth),
            "weekday number in `{s}` must be in the range -5..=5 \
             and not zero",
        );
        Ok(ByWeekday::Numbered { nth, weekday })
    }
}

impl std::fmt::Display for ByWeekday {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            ByWeekday::Any(weekday) => f.write_str(weekday_code(weekday)),
            ByWeekday::Numbered { nth, weekday } => {
                write!(f, "{nth}{}", weekday_code(weekday))
            }
        }
    }
}

/// Returns the two letter RFC 5545 code for the given weekday.
pub fn weekday_code(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Monday => "MO",
        Weekday::Tuesday => "TU",
        Weekday::Wednesday => "WE",
        Weekday::Thursday => "TH",
        Weekday::Friday => "FR",
        Weekday::Saturday => "SA",
        Weekday::Sunday => "SU",
    }
}

fn weekday_from_code(code: &str) -> Option<Weekday> {
    let weekday = match &*code.to_uppercase() {
        "MO" => Weekday::Monday,
        "TU" => Weekday::Tuesday,
        "WE" => Weekday::Wednesday,
        "TH" => Weekday::Thursday,
        "FR" => Weekday::Friday,
        "SA" => Weekday::Saturday,
        "SU" => Weekday::Sunday,
        _ => return None,
    };
    Some(weekday)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_accepts_form_values_and_names() {
        assert_eq!("0".parse::<Frequency>().unwrap(), Frequency::Yearly);
        assert_eq!("1".parse::<Frequency>().unwrap(), Frequency::Monthly);
        assert_eq!("weekly".parse::<Frequency>().unwrap(), Frequency::Weekly);
        assert_eq!("D".parse::<Frequency>().unwrap(), Frequency::Daily);
        assert!("4".parse::<Frequency>().is_err());
        assert!("".parse::<Frequency>().is_err());
    }

    #[test]
    fn interval_group_labels_are_offset_by_one() {
        let labels: Vec<u8> =
            IntervalGroup::all().map(|g| g.label()).collect();
        assert_eq!(labels, vec![1, 2, 3, 4]);
        assert_eq!(
            IntervalGroup::from_label(1),
            Some(IntervalGroup::new(Frequency::Yearly)),
        );
        assert_eq!(
            IntervalGroup::from_label(4),
            Some(IntervalGroup::new(Frequency::Daily)),
        );
        assert_eq!(IntervalGroup::from_label(0), None);
        assert_eq!(IntervalGroup::from_label(5), None);
    }

    #[test]
    fn modes() {
        assert_eq!("".parse::<YearMonthMode>().unwrap(), YearMonthMode::Unset);
        assert_eq!(
            "1".parse::<YearMonthMode>().unwrap(),
            YearMonthMode::ByDate
        );
        assert_eq!(
            "by-day".parse::<YearMonthMode>().unwrap(),
            YearMonthMode::ByDay
        );
        assert!("3".parse::<YearMonthMode>().is_err());

        assert_eq!("".parse::<Termination>().unwrap(), Termination::Never);
        assert_eq!(
            "forever".parse::<Termination>().unwrap(),
            Termination::Never
        );
        let until: Termination = "until".parse().unwrap();
        assert_eq!(until, Termination::Until);
        let count: Termination = "COUNT".parse().unwrap();
        assert_eq!(count, Termination::Count);
        assert!("sometimes".parse::<Termination>().is_err());
    }

    #[test]
    fn weekday_choices() {
        let wd: ByWeekday = "MO".parse().unwrap();
        assert_eq!(wd, ByWeekday::Any(Weekday::Monday));
        assert_eq!(wd.group(), WeekdayGroup::Plain);
        assert_eq!(wd.to_string(), "MO");

        let wd: ByWeekday = "2TU".parse().unwrap();
        assert_eq!(
            wd,
            ByWeekday::Numbered { nth: 2, weekday: Weekday::Tuesday }
        );
        assert_eq!(wd.group(), WeekdayGroup::Nth);
        assert_eq!(wd.to_string(), "2TU");

        let wd: ByWeekday = "-1su".parse().unwrap();
        assert_eq!(
            wd,
            ByWeekday::Numbered { nth: -1, weekday: Weekday::Sunday }
        );
        assert_eq!(wd.to_string(), "-1SU");

        assert!("0MO".parse::<ByWeekday>().is_err());
        assert!("6MO".parse::<ByWeekday>().is_err());
        assert!("XX".parse::<ByWeekday>().is_err());
        assert!("M".parse::<ByWeekday>().is_err());
        assert!("".parse::<ByWeekday>().is_err());
    }

    #[test]
    fn fields_round_trip_through_names() {
        for field in Field::ALL {
            assert_eq!(Field::from_name(field.name()), Some(field));
        }
        assert_eq!(Field::from_name("dtstart"), None);
        assert!(Field::FreqType.is_radio());
    }
}
