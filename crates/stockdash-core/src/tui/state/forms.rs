//! Editable popup forms: column range filter and crawl schedule.

use crate::controller::bound_text;
use crate::models::{FilterRange, Schedule, ScheduleKind};

/// Which bound of a range filter has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RangeField {
    #[default]
    Min,
    Max,
}

/// Range editor for one column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterForm {
    pub key: String,
    pub label: String,
    /// Text columns match a substring on `min` only.
    pub text_only: bool,
    pub min: String,
    pub max: String,
    pub focus: RangeField,
    pub error: Option<String>,
}

impl FilterForm {
    pub fn new(key: &str, label: &str, text_only: bool, current: Option<&FilterRange>) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            text_only,
            min: current.map(|r| bound_text(&r.min)).unwrap_or_default(),
            max: current.map(|r| bound_text(&r.max)).unwrap_or_default(),
            focus: RangeField::Min,
            error: None,
        }
    }

    pub fn toggle_focus(&mut self) {
        if self.text_only {
            return;
        }
        self.focus = match self.focus {
            RangeField::Min => RangeField::Max,
            RangeField::Max => RangeField::Min,
        };
    }

    fn field_mut(&mut self) -> &mut String {
        match self.focus {
            RangeField::Min => &mut self.min,
            RangeField::Max => &mut self.max,
        }
    }

    pub fn push(&mut self, c: char) {
        self.error = None;
        self.field_mut().push(c);
    }

    pub fn backspace(&mut self) {
        self.error = None;
        self.field_mut().pop();
    }

    pub fn clear(&mut self) {
        self.min.clear();
        self.max.clear();
        self.error = None;
    }
}

/// Fields of the schedule editor, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScheduleField {
    #[default]
    Kind,
    Hour,
    Minute,
    Day,
}

impl ScheduleField {
    fn next(self) -> Self {
        match self {
            ScheduleField::Kind => ScheduleField::Hour,
            ScheduleField::Hour => ScheduleField::Minute,
            ScheduleField::Minute => ScheduleField::Day,
            ScheduleField::Day => ScheduleField::Kind,
        }
    }
}

/// Editable copy of the crawl schedule.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScheduleForm {
    /// False until `GET /schedule` has answered.
    pub loaded: bool,
    pub weekly: bool,
    pub hour: String,
    pub minute: String,
    pub day_of_week: String,
    pub focus: ScheduleField,
    pub error: Option<String>,
}

impl ScheduleForm {
    pub fn loading() -> Self {
        Self::default()
    }

    pub fn from_schedule(s: &Schedule) -> Self {
        Self {
            loaded: true,
            weekly: s.kind == ScheduleKind::Weekly,
            hour: s.hour.to_string(),
            minute: format!("{:02}", s.minute),
            day_of_week: s.day_of_week.clone(),
            focus: ScheduleField::Kind,
            error: None,
        }
    }

    pub fn next_field(&mut self) {
        self.focus = self.focus.next();
        if self.focus == ScheduleField::Day && !self.weekly {
            self.focus = self.focus.next();
        }
    }

    pub fn push(&mut self, c: char) {
        self.error = None;
        match self.focus {
            ScheduleField::Kind => {
                if c == ' ' {
                    self.weekly = !self.weekly;
                }
            }
            ScheduleField::Hour if c.is_ascii_digit() && self.hour.len() < 2 => self.hour.push(c),
            ScheduleField::Minute if c.is_ascii_digit() && self.minute.len() < 2 => {
                self.minute.push(c)
            }
            ScheduleField::Day if c.is_ascii_digit() && self.day_of_week.is_empty() => {
                self.day_of_week.push(c)
            }
            _ => {}
        }
    }

    pub fn backspace(&mut self) {
        self.error = None;
        match self.focus {
            ScheduleField::Kind => {}
            ScheduleField::Hour => {
                self.hour.pop();
            }
            ScheduleField::Minute => {
                self.minute.pop();
            }
            ScheduleField::Day => {
                self.day_of_week.pop();
            }
        }
    }

    /// Parses the fields; range checks are left to [`Schedule::validate`].
    pub fn to_schedule(&self) -> Result<Schedule, String> {
        let hour = self
            .hour
            .trim()
            .parse::<u8>()
            .map_err(|_| format!("invalid hour '{}'", self.hour))?;
        let minute = self
            .minute
            .trim()
            .parse::<u8>()
            .map_err(|_| format!("invalid minute '{}'", self.minute))?;
        let day_of_week = if self.day_of_week.trim().is_empty() {
            Schedule::default().day_of_week
        } else {
            self.day_of_week.trim().to_string()
        };
        Ok(Schedule {
            hour,
            minute,
            kind: if self.weekly {
                ScheduleKind::Weekly
            } else {
                ScheduleKind::Daily
            },
            day_of_week,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_form_prefills_and_edits_focused_field() {
        let range = FilterRange::numeric(Some(0.0), Some(0.5));
        let mut form = FilterForm::new("PEG", "PEG", false, Some(&range));
        assert_eq!((form.min.as_str(), form.max.as_str()), ("0", "0.5"));

        form.toggle_focus();
        form.backspace();
        form.push('8');
        assert_eq!(form.max, "0.8");

        let mut text = FilterForm::new("所属行业", "行业", true, None);
        text.toggle_focus();
        assert_eq!(text.focus, RangeField::Min);
    }

    #[test]
    fn schedule_form_round_trips() {
        let s = Schedule {
            hour: 9,
            minute: 5,
            kind: ScheduleKind::Weekly,
            day_of_week: "2".into(),
        };
        let form = ScheduleForm::from_schedule(&s);
        assert_eq!(form.minute, "05");
        assert_eq!(form.to_schedule().unwrap(), s);
    }

    #[test]
    fn schedule_form_skips_day_when_daily() {
        let mut form = ScheduleForm::from_schedule(&Schedule::default());
        form.next_field();
        form.next_field();
        assert_eq!(form.focus, ScheduleField::Minute);
        form.next_field();
        assert_eq!(form.focus, ScheduleField::Kind);

        form.hour.clear();
        assert!(form.to_schedule().is_err());
    }
}
