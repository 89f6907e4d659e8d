use std::path::{Path, PathBuf};

use anyhow::Context as _;
use time::{Date, Month, PrimitiveDateTime, Time};

use crate::error::{DriftwallError, DriftwallResult};

/// One scheduled unit of the playlist: a still display or a timed crossfade
/// between two images.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    Static {
        duration: i64, // seconds, > 0
        file: PathBuf,
    },
    Transition {
        duration: i64, // seconds, > 0
        from: PathBuf,
        to: PathBuf,
    },
}

impl Event {
    pub fn duration(&self) -> i64 {
        match self {
            Self::Static { duration, .. } | Self::Transition { duration, .. } => *duration,
        }
    }

    /// Crossfade progress in [0, 1] for a transition at `elapsed` seconds
    /// into the event. Statics have no progress concept.
    pub fn progress(&self, elapsed: i64) -> Option<f64> {
        match self {
            Self::Static { .. } => None,
            Self::Transition { duration, .. } => {
                Some((elapsed as f64 / *duration as f64).clamp(0.0, 1.0))
            }
        }
    }
}

/// Ordered, cyclic sequence of events plus the absolute anchor that marks
/// cycle position zero. Immutable after construction.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Timeline {
    anchor: PrimitiveDateTime,
    events: Vec<Event>,
}

/// Placeholder duration for the degenerate one-still timeline; the schedule
/// never advances past its only event.
const SINGLE_STILL_DURATION: i64 = i64::MAX;

impl Timeline {
    /// Build a validated timeline. Rejects an empty event list and any
    /// non-positive duration (the schema does not forbid them, the core does).
    pub fn new(anchor: PrimitiveDateTime, events: Vec<Event>) -> DriftwallResult<Self> {
        if events.is_empty() {
            return Err(DriftwallError::EmptySchedule);
        }
        for (i, event) in events.iter().enumerate() {
            if event.duration() <= 0 {
                return Err(DriftwallError::schedule_format(format!(
                    "event {i} has non-positive duration {}",
                    event.duration()
                )));
            }
        }
        Ok(Self { anchor, events })
    }

    /// One-`Static`-event timeline for a bare image input. Progress and
    /// cycling do not apply; the caller renders once.
    pub fn single_image(path: impl Into<PathBuf>) -> Self {
        Self {
            anchor: PrimitiveDateTime::new(Date::MIN, Time::MIDNIGHT),
            events: vec![Event::Static {
                duration: SINGLE_STILL_DURATION,
                file: path.into(),
            }],
        }
    }

    /// Read and parse a schedule XML file.
    pub fn load(path: &Path) -> DriftwallResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read schedule '{}'", path.display()))?;
        Self::from_xml_str(&text)
    }

    /// Parse a `<background>` schedule document: a `<starttime>` anchor and
    /// zero or more `<static>`/`<transition>` events in document order.
    pub fn from_xml_str(text: &str) -> DriftwallResult<Self> {
        let doc = roxmltree::Document::parse(text)
            .map_err(|e| DriftwallError::schedule_format(format!("malformed xml: {e}")))?;

        let root = doc.root_element();
        if root.tag_name().name() != "background" {
            return Err(DriftwallError::schedule_format(format!(
                "expected <background> root, got <{}>",
                root.tag_name().name()
            )));
        }

        let mut anchor = None;
        let mut events = Vec::new();

        for node in root.children().filter(roxmltree::Node::is_element) {
            match node.tag_name().name() {
                "starttime" => anchor = Some(parse_starttime(node)?),
                "static" => events.push(Event::Static {
                    duration: child_i64(node, "duration")?,
                    file: PathBuf::from(child_text(node, "file")?),
                }),
                // A `type` attribute may be present; there is only one blend
                // algorithm, so it carries no distinction here.
                "transition" => events.push(Event::Transition {
                    duration: child_i64(node, "duration")?,
                    from: PathBuf::from(child_text(node, "from")?),
                    to: PathBuf::from(child_text(node, "to")?),
                }),
                _ => {}
            }
        }

        let anchor =
            anchor.ok_or_else(|| DriftwallError::schedule_format("missing <starttime>"))?;
        Self::new(anchor, events)
    }

    pub fn anchor(&self) -> PrimitiveDateTime {
        self.anchor
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Event> {
        self.events.get(index)
    }

    /// Cycle period: the playlist repeats with this total length in seconds.
    pub fn total_duration(&self) -> i64 {
        self.events.iter().map(Event::duration).sum()
    }
}

/// True when `path` names an existing still image rather than a schedule:
/// `.png`/`.jpg`/`.jpeg`, case-insensitive.
pub fn is_single_image_path(path: &Path) -> bool {
    path.is_file() && has_image_extension(path)
}

pub(crate) fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            ext == "png" || ext == "jpg" || ext == "jpeg"
        })
}

fn parse_starttime(node: roxmltree::Node<'_, '_>) -> DriftwallResult<PrimitiveDateTime> {
    let year = child_i64(node, "year")?;
    let month = child_i64(node, "month")?;
    let day = child_i64(node, "day")?;
    let hour = child_i64(node, "hour")?;
    let minute = child_i64(node, "minute")?;
    let second = child_i64(node, "second")?;

    let month = u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .ok_or_else(|| DriftwallError::schedule_format(format!("invalid month {month}")))?;
    let date = Date::from_calendar_date(
        i32::try_from(year)
            .map_err(|_| DriftwallError::schedule_format(format!("invalid year {year}")))?,
        month,
        u8::try_from(day)
            .map_err(|_| DriftwallError::schedule_format(format!("invalid day {day}")))?,
    )
    .map_err(|e| DriftwallError::schedule_format(format!("invalid starttime date: {e}")))?;
    let time = Time::from_hms(
        u8::try_from(hour)
            .map_err(|_| DriftwallError::schedule_format(format!("invalid hour {hour}")))?,
        u8::try_from(minute)
            .map_err(|_| DriftwallError::schedule_format(format!("invalid minute {minute}")))?,
        u8::try_from(second)
            .map_err(|_| DriftwallError::schedule_format(format!("invalid second {second}")))?,
    )
    .map_err(|e| DriftwallError::schedule_format(format!("invalid starttime clock: {e}")))?;

    Ok(PrimitiveDateTime::new(date, time))
}

fn child_text<'a>(node: roxmltree::Node<'a, '_>, name: &str) -> DriftwallResult<&'a str> {
    node.children()
        .find(|c| c.has_tag_name(name))
        .and_then(|c| c.text())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            DriftwallError::schedule_format(format!(
                "<{}> is missing <{name}>",
                node.tag_name().name()
            ))
        })
}

fn child_i64(node: roxmltree::Node<'_, '_>, name: &str) -> DriftwallResult<i64> {
    let text = child_text(node, name)?;
    text.parse::<i64>().map_err(|_| {
        DriftwallError::schedule_format(format!("<{name}> is not an integer: '{text}'"))
    })
}
