/*!
A live recurrence rule form row, and the events that change it.

A formset contains any number of rows, each one an independent recurrence
rule sub-form. Every element of a row is identified through the row's prefix,
so that one row can never observe or change another. A [`RowContext`] carries
that prefix for the duration of one event.

A row reacts to two kinds of events: its initialization and a change to one
of its watched fields. Either way, the directives are recomputed from scratch
from the row's current values and then applied back to the row.
*/

use std::collections::BTreeSet;

use crate::{
    rule::{
        ByWeekday, Field, Frequency, IntervalGroup, Termination, WeekdayGroup,
        YearMonthMode,
    },
    visibility::{self, FieldDirectives, IntervalChoice, RecurrenceFormState},
};

/// The fields that trigger a recomputation when they change.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Watched {
    Frequency,
    YearMonthMode,
    ByWeekday,
    AdvancedOptions,
    Termination,
}

impl Watched {
    /// Returns the watched field corresponding to the given form field, if
    /// that field is watched at all.
    pub fn from_field(field: Field) -> Option<Watched> {
        let watched = match field {
            Field::Freq => Watched::Frequency,
            Field::YearMonthMode => Watched::YearMonthMode,
            Field::ByWeekday => Watched::ByWeekday,
            Field::AdvanceOptions => Watched::AdvancedOptions,
            Field::FreqType => Watched::Termination,
            _ => return None,
        };
        Some(watched)
    }

    pub fn field(&self) -> Field {
        match *self {
            Watched::Frequency => Field::Freq,
            Watched::YearMonthMode => Field::YearMonthMode,
            Watched::ByWeekday => Field::ByWeekday,
            Watched::AdvancedOptions => Field::AdvanceOptions,
            Watched::Termination => Field::FreqType,
        }
    }
}

/// Something that happened to a form row.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Event {
    /// The row was just added to the formset.
    Init,
    /// The value of a watched field changed.
    Changed(Watched),
}

/// The per-row context of a single event.
///
/// This knows how the elements of one row are identified in the markup:
/// element ids look like `id_<prefix>-<field>`, while radio inputs are
/// addressed by their shared name, `<prefix>-<field>`.
#[derive(Clone, Copy, Debug)]
pub struct RowContext<'a> {
    prefix: &'a str,
}

impl<'a> RowContext<'a> {
    pub fn new(prefix: &'a str) -> RowContext<'a> {
        RowContext { prefix }
    }

    pub fn prefix(&self) -> &'a str {
        self.prefix
    }

    /// Returns the element id of the given field in this row.
    pub fn id(&self, field: Field) -> String {
        format!("id_{}-{}", self.prefix, field.name())
    }

    /// Returns the element name of the given field in this row.
    pub fn name(&self, field: Field) -> String {
        format!("{}-{}", self.prefix, field.name())
    }

    /// Returns the way the given field's element is addressed: its name for
    /// radio inputs and its id for everything else.
    pub fn target(&self, field: Field) -> String {
        if field.is_radio() { self.name(field) } else { self.id(field) }
    }

    /// Resolves an element id or name to a field of this row.
    ///
    /// Returns `None` when the target doesn't belong to this row, or doesn't
    /// name a recurrence form field at all.
    pub fn resolve(&self, target: &str) -> Option<Field> {
        let rest = target.strip_prefix("id_").unwrap_or(target);
        let name = rest.strip_prefix(self.prefix)?.strip_prefix("-")?;
        Field::from_name(name)
    }
}

/// The option group state of the grouped select fields of a row.
///
/// Only disabled groups are recorded. Every other group is enabled.
#[derive(
    Clone, Debug, Default, Eq, PartialEq, serde::Serialize, serde::Deserialize,
)]
#[serde(default)]
pub struct DisabledGroups {
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub interval: BTreeSet<IntervalGroup>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub byweekday: BTreeSet<WeekdayGroup>,
}

impl DisabledGroups {
    pub fn is_empty(&self) -> bool {
        self.interval.is_empty() && self.byweekday.is_empty()
    }
}

/// The selected option of the interval field, as found in the markup.
///
/// This is kept raw, i.e., the group label isn't checked, so that a row with
/// a bogus selection can still be read (and then fixed).
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize,
)]
pub struct IntervalSelection {
    pub group: u8,
    pub value: u32,
}

impl From<IntervalChoice> for IntervalSelection {
    fn from(choice: IntervalChoice) -> IntervalSelection {
        IntervalSelection { group: choice.group.label(), value: choice.value }
    }
}

/// One row of a recurrence rule formset.
///
/// Values are kept exactly as the form would submit them. They are only
/// interpreted when the directives are computed.
#[derive(
    Clone, Debug, Default, Eq, PartialEq, serde::Serialize, serde::Deserialize,
)]
#[serde(default)]
pub struct FormRow {
    pub prefix: String,
    #[serde(deserialize_with = "raw_value")]
    pub freq: String,
    #[serde(deserialize_with = "raw_value")]
    pub year_month_mode: String,
    pub interval: Option<IntervalSelection>,
    #[serde(deserialize_with = "raw_values")]
    pub bymonthday: Vec<String>,
    #[serde(deserialize_with = "raw_values")]
    pub byweekday: Vec<String>,
    #[serde(deserialize_with = "raw_value")]
    pub freq_type: String,
    #[serde(deserialize_with = "raw_value")]
    pub count: String,
    #[serde(deserialize_with = "raw_value")]
    pub utc_until: String,
    #[serde(deserialize_with = "raw_check")]
    pub advance_options: bool,
    #[serde(deserialize_with = "raw_values")]
    pub bysetpos: Vec<String>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub hidden: BTreeSet<Field>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub disabled: BTreeSet<Field>,
    #[serde(skip_serializing_if = "DisabledGroups::is_empty")]
    pub disabled_groups: DisabledGroups,
}

impl FormRow {
    /// Returns the context for events on this row.
    pub fn context(&self) -> RowContext<'_> {
        RowContext::new(&self.prefix)
    }

    /// Handles an event on this row and returns the directives that were
    /// applied to it.
    pub fn handle(&mut self, event: Event) -> FieldDirectives {
        match event {
            Event::Init => {
                // A row saved with advanced options opens with them showing.
                if !self.advance_options && !self.bysetpos.is_empty() {
                    log::debug!(
                        "{}: advanced option has a value, checking {}",
                        self.prefix,
                        self.context().id(Field::AdvanceOptions),
                    );
                    self.advance_options = true;
                }
            }
            Event::Changed(watched) => {
                log::debug!(
                    "{}: {} changed",
                    self.prefix,
                    self.context().target(watched.field()),
                );
            }
        }
        let mut state = self.state();
        // Switching to a weekly rule starts over with the weekdays, even
        // though the field stays visible.
        if event == Event::Changed(Watched::Frequency)
            && state.frequency == Some(Frequency::Weekly)
            && !self.byweekday.is_empty()
        {
            log::debug!(
                "{}: frequency is now weekly, clearing {}",
                self.prefix,
                self.context().id(Field::ByWeekday),
            );
            self.byweekday.clear();
            state.byweekday.clear();
        }
        let directives = visibility::compute(&state);
        self.apply(&directives);
        directives
    }

    /// Sets the raw value of a field, and dispatches a change event when the
    /// field is watched.
    ///
    /// Multi-valued fields accept a comma separated list. The interval field
    /// accepts an interval value, which selects that value in the group of
    /// the row's current frequency.
    ///
    /// This returns the directives applied as a result of the change, if
    /// any.
    pub fn set(
        &mut self,
        field: Field,
        value: &str,
    ) -> anyhow::Result<Option<FieldDirectives>> {
        let value = value.trim();
        match field {
            Field::Freq => self.freq = value.to_string(),
            Field::YearMonthMode => self.year_month_mode = value.to_string(),
            Field::Interval => self.interval = self.interval_selection(value)?,
            Field::ByMonthDay => self.bymonthday = split_multi(value),
            Field::ByWeekday => self.byweekday = split_multi(value),
            Field::FreqType => self.freq_type = value.to_string(),
            Field::Count => self.count = value.to_string(),
            Field::UtcUntil => self.utc_until = value.to_string(),
            Field::AdvanceOptions => {
                self.advance_options = parse_check(value)?;
            }
            Field::BySetPos => self.bysetpos = split_multi(value),
        }
        let Some(watched) = Watched::from_field(field) else {
            log::debug!(
                "{}: {} is not watched, not recomputing",
                self.prefix,
                self.context().target(field),
            );
            return Ok(None);
        };
        Ok(Some(self.handle(Event::Changed(watched))))
    }

    /// Reads the watched values of this row.
    ///
    /// Values that can't be interpreted are treated as unset.
    pub fn state(&self) -> RecurrenceFormState {
        let cx = self.context();
        let frequency = lenient(&cx, Field::Freq, &self.freq, |v| {
            if v.is_empty() {
                return Ok(None);
            }
            v.parse::<Frequency>().map(Some)
        })
        .flatten();
        let year_month_mode =
            lenient(&cx, Field::YearMonthMode, &self.year_month_mode, |v| {
                v.parse::<YearMonthMode>()
            })
            .unwrap_or_default();
        let termination = lenient(&cx, Field::FreqType, &self.freq_type, |v| {
            v.parse::<Termination>()
        })
        .unwrap_or_default();
        let interval = self.interval.and_then(|sel| {
            let Some(group) = IntervalGroup::from_label(sel.group) else {
                log::debug!(
                    "{}: unrecognized interval group `{}`, treating as unset",
                    cx.id(Field::Interval),
                    sel.group,
                );
                return None;
            };
            Some(IntervalChoice { group, value: sel.value })
        });
        let byweekday = self
            .byweekday
            .iter()
            .filter_map(|v| {
                lenient(&cx, Field::ByWeekday, v, |v| v.parse::<ByWeekday>())
            })
            .collect();
        RecurrenceFormState {
            frequency,
            year_month_mode,
            interval,
            byweekday,
            advanced: self.advance_options,
            termination,
        }
    }

    /// Applies the given directives to this row.
    pub fn apply(&mut self, directives: &FieldDirectives) {
        for (field, directive) in directives.iter() {
            set_membership(&mut self.hidden, field, !directive.visible);
            set_membership(&mut self.disabled, field, !directive.enabled);
            if directive.clear {
                self.clear(field);
            }
        }

        let interval = directives.interval();
        self.disabled_groups.interval = IntervalGroup::all()
            .filter(|&group| !interval.is_enabled(group))
            .collect();
        self.interval = interval.select.map(IntervalSelection::from);

        let groups = directives.weekday_groups();
        self.disabled_groups.byweekday = WeekdayGroup::ALL
            .into_iter()
            .filter(|&group| !groups.is_enabled(group))
            .collect();
        // Options in a disabled group can't stay selected.
        let cx = RowContext::new(&self.prefix);
        self.byweekday.retain(|v| match v.parse::<ByWeekday>() {
            Ok(wd) => {
                let keep = groups.is_enabled(wd.group());
                if !keep {
                    log::debug!(
                        "{}: deselecting `{v}`, its group `{}` is disabled",
                        cx.id(Field::ByWeekday),
                        wd.group(),
                    );
                }
                keep
            }
            Err(_) => false,
        });
    }

    fn clear(&mut self, field: Field) {
        match field {
            Field::Freq => self.freq.clear(),
            Field::YearMonthMode => self.year_month_mode.clear(),
            Field::Interval => self.interval = None,
            Field::ByMonthDay => self.bymonthday.clear(),
            Field::ByWeekday => self.byweekday.clear(),
            Field::FreqType => self.freq_type.clear(),
            Field::Count => self.count.clear(),
            Field::UtcUntil => self.utc_until.clear(),
            Field::AdvanceOptions => self.advance_options = false,
            Field::BySetPos => self.bysetpos.clear(),
        }
    }

    /// Returns the raw value of the given field as it would be displayed.
    ///
    /// Multi-valued fields are comma separated. An interval selection is
    /// just its value.
    pub fn value(&self, field: Field) -> String {
        match field {
            Field::Freq => self.freq.clone(),
            Field::YearMonthMode => self.year_month_mode.clone(),
            Field::Interval => self
                .interval
                .map(|sel| sel.value.to_string())
                .unwrap_or_default(),
            Field::ByMonthDay => self.bymonthday.join(","),
            Field::ByWeekday => self.byweekday.join(","),
            Field::FreqType => self.freq_type.clone(),
            Field::Count => self.count.clone(),
            Field::UtcUntil => self.utc_until.clone(),
            Field::AdvanceOptions => self.advance_options.to_string(),
            Field::BySetPos => self.bysetpos.join(","),
        }
    }

    fn interval_selection(
        &self,
        value: &str,
    ) -> anyhow::Result<Option<IntervalSelection>> {
        if value.is_empty() {
            return Ok(None);
        }
        let value: u32 = value.parse().map_err(|_| {
            anyhow::anyhow!("failed to parse interval `{value}` as an integer")
        })?;
        let freq: Frequency = self.freq.parse().map_err(|_| {
            anyhow::anyhow!(
                "{}: cannot select an interval without a valid frequency \
                 (current frequency is `{}`)",
                self.prefix,
                self.freq,
            )
        })?;
        let group = IntervalGroup::new(freq);
        anyhow::ensure!(
            group.contains(value),
            "interval `{value}` is not offered for {freq} rules",
        );
        Ok(Some(IntervalSelection { group: group.label(), value }))
    }
}

/// Parses a single watched value, logging and discarding it when it can't
/// be interpreted.
fn lenient<T>(
    cx: &RowContext<'_>,
    field: Field,
    value: &str,
    parse: impl FnOnce(&str) -> anyhow::Result<T>,
) -> Option<T> {
    match parse(value) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            log::debug!(
                "{}: treating `{value}` as unset: {err}",
                cx.target(field),
            );
            None
        }
    }
}

/// A single form value as found in a row.
///
/// Saved rows store some values as integers and leave optional ones as
/// `null`. Both are accepted, with `null` meaning unset.
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum RawValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Check(bool),
}

impl RawValue {
    fn into_string(self) -> String {
        match self {
            RawValue::Text(text) => text,
            RawValue::Integer(n) => n.to_string(),
            RawValue::Float(n) => n.to_string(),
            RawValue::Check(b) => b.to_string(),
        }
    }
}

fn raw_value<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<RawValue> =
        serde::Deserialize::deserialize(deserializer)?;
    Ok(value.map(RawValue::into_string).unwrap_or_default())
}

fn raw_values<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values: Option<Vec<Option<RawValue>>> =
        serde::Deserialize::deserialize(deserializer)?;
    Ok(values
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .map(RawValue::into_string)
        .collect())
}

fn raw_check<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<RawValue> =
        serde::Deserialize::deserialize(deserializer)?;
    let checked = match value {
        None => false,
        Some(RawValue::Check(b)) => b,
        Some(raw) => parse_check(&raw.into_string()).unwrap_or_else(|err| {
            log::debug!("treating advance_options as unchecked: {err}");
            false
        }),
    };
    Ok(checked)
}

fn set_membership(set: &mut BTreeSet<Field>, field: Field, member: bool) {
    if member {
        set.insert(field);
    } else {
        set.remove(&field);
    }
}

fn split_multi(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .collect()
}

fn parse_check(value: &str) -> anyhow::Result<bool> {
    let checked = match &*value.to_lowercase() {
        "" | "false" | "off" | "no" | "0" => false,
        "true" | "on" | "yes" | "1" => true,
        unk => anyhow::bail!(
            "unrecognized checkbox value `{unk}`, expected `on` or `off`"
        ),
    };
    Ok(checked)
}
