//! Filter → sort → paginate over an in-memory record set.
//!
//! [`project`] never mutates its input and borrows every returned item, so
//! the same query over the same records always yields the same page.

use std::borrow::Cow;
use std::cmp::Ordering;

use board_core::{Booking, Job, Resource};
use chrono::{DateTime, SecondsFormat, Utc};

/// One field value as seen by filters, search, sorting and export.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<'a> {
    Text(Cow<'a, str>),
    Number(f64),
    Missing,
}

impl<'a> FieldValue<'a> {
    pub fn text(value: impl Into<Cow<'a, str>>) -> Self {
        FieldValue::Text(value.into())
    }

    /// Empty strings count as missing.
    pub fn optional_text(value: Option<&'a str>) -> Self {
        match value {
            Some(v) if !v.is_empty() => FieldValue::Text(Cow::Borrowed(v)),
            _ => FieldValue::Missing,
        }
    }

    pub fn time(value: Option<DateTime<Utc>>) -> Self {
        match value {
            Some(at) => FieldValue::Text(Cow::Owned(
                at.to_rfc3339_opts(SecondsFormat::Secs, true),
            )),
            None => FieldValue::Missing,
        }
    }

    pub fn list(values: &[String]) -> Self {
        if values.is_empty() {
            FieldValue::Missing
        } else {
            FieldValue::Text(Cow::Owned(values.join(", ")))
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, FieldValue::Missing)
    }

    /// Display form; numbers drop a trailing `.0`.
    pub fn render(&self) -> Cow<'_, str> {
        match self {
            FieldValue::Text(s) => Cow::Borrowed(s.as_ref()),
            FieldValue::Number(n) => Cow::Owned(n.to_string()),
            FieldValue::Missing => Cow::Borrowed(""),
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse().ok(),
            FieldValue::Missing => None,
        }
    }
}

/// Something the projection pipeline can look into by field name.
pub trait Record {
    /// Value of `name`, or [`FieldValue::Missing`] for unknown names.
    fn field(&self, name: &str) -> FieldValue<'_>;

    /// Fields the global search box looks at.
    fn search_fields() -> &'static [&'static str];
}

impl Record for Resource {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "id" => FieldValue::text(self.id.as_str()),
            "kind" => FieldValue::text(self.kind.as_str()),
            "label" => FieldValue::optional_text(Some(self.label.as_str())),
            "zone" => FieldValue::optional_text(Some(self.zone.as_str())),
            "type" => FieldValue::optional_text(Some(self.resource_type.as_str())),
            "status" => FieldValue::text(self.status().as_str()),
            "capacity" => FieldValue::Number(self.capacity),
            "equipment" => FieldValue::list(&self.equipment),
            "tags" => FieldValue::list(&self.tags),
            "occupant" => {
                FieldValue::optional_text(self.current_occupant().map(|o| o.label.as_str()))
            }
            "job_id" => match self.current_occupant() {
                Some(o) => FieldValue::text(o.job_id.to_string()),
                None => FieldValue::Missing,
            },
            "block_reason" => {
                FieldValue::optional_text(self.block_info().map(|b| b.reason.as_str()))
            }
            "blocked_until" => FieldValue::time(self.block_info().and_then(|b| b.expires_at)),
            "created_at" => FieldValue::time(Some(self.created_at)),
            "updated_at" => FieldValue::time(Some(self.updated_at)),
            _ => FieldValue::Missing,
        }
    }

    fn search_fields() -> &'static [&'static str] {
        &["id", "label", "zone", "type", "equipment", "occupant", "tags"]
    }
}

impl Record for Job {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "id" => FieldValue::text(self.id.to_string()),
            "title" => FieldValue::text(self.title.as_str()),
            "customer" => FieldValue::text(self.customer.as_str()),
            "subject" => FieldValue::optional_text(Some(self.subject.as_str())),
            "priority" => FieldValue::text(self.priority.as_str()),
            "priority_rank" => FieldValue::Number(f64::from(self.priority.rank())),
            "estimated_hours" => FieldValue::Number(self.estimated_hours),
            "status" => FieldValue::text(self.status.as_str()),
            "resource" => {
                FieldValue::optional_text(self.assigned_resource_id().map(|id| id.as_str()))
            }
            "progress" => match self.status.progress() {
                Some(p) => FieldValue::Number(f64::from(p)),
                None => FieldValue::Missing,
            },
            "started_at" => FieldValue::time(self.status.started_at()),
            "held_at" => FieldValue::time(self.status.held_at()),
            "completed_at" => FieldValue::time(self.status.completed_at()),
            "tags" => FieldValue::list(&self.tags),
            "created_at" => FieldValue::time(Some(self.created_at)),
            "updated_at" => FieldValue::time(Some(self.updated_at)),
            _ => FieldValue::Missing,
        }
    }

    fn search_fields() -> &'static [&'static str] {
        &["title", "customer", "subject", "tags"]
    }
}

impl Record for Booking {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "id" => FieldValue::text(self.id.to_string()),
            "resource" => FieldValue::text(self.resource_id.as_str()),
            "job_id" => match self.job_id {
                Some(id) => FieldValue::text(id.to_string()),
                None => FieldValue::Missing,
            },
            "customer" => FieldValue::text(self.customer.as_str()),
            "starts_at" => FieldValue::time(Some(self.starts_at)),
            "ends_at" => FieldValue::time(Some(self.ends_at)),
            "duration_minutes" => FieldValue::Number(self.duration_minutes() as f64),
            "notes" => FieldValue::optional_text(self.notes.as_deref()),
            _ => FieldValue::Missing,
        }
    }

    fn search_fields() -> &'static [&'static str] {
        &["resource", "customer", "notes"]
    }
}

/// Predicate applied to one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Case-insensitive substring, or whole-value match when `exact`.
    Text { value: String, exact: bool },
    /// Multi-select: the value equals one of these, ignoring case.
    AnyOf(Vec<String>),
    /// Inclusive numeric bounds.
    Range { min: Option<f64>, max: Option<f64> },
}

impl Filter {
    pub fn contains(value: impl Into<String>) -> Self {
        Filter::Text {
            value: value.into(),
            exact: false,
        }
    }

    pub fn exact(value: impl Into<String>) -> Self {
        Filter::Text {
            value: value.into(),
            exact: true,
        }
    }

    pub fn any_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Filter::AnyOf(values.into_iter().map(Into::into).collect())
    }

    pub fn range(min: Option<f64>, max: Option<f64>) -> Self {
        Filter::Range { min, max }
    }

    /// An empty filter matches every record, including ones missing the field.
    pub fn is_empty(&self) -> bool {
        match self {
            Filter::Text { value, .. } => value.trim().is_empty(),
            Filter::AnyOf(values) => values.iter().all(|v| v.trim().is_empty()),
            Filter::Range { min, max } => min.is_none() && max.is_none(),
        }
    }

    pub fn matches(&self, value: &FieldValue<'_>) -> bool {
        if self.is_empty() {
            return true;
        }
        if value.is_missing() {
            return false;
        }
        match self {
            Filter::Text { value: needle, exact } => {
                let hay = value.render().to_lowercase();
                let needle = needle.trim().to_lowercase();
                if *exact {
                    hay == needle
                } else {
                    hay.contains(&needle)
                }
            }
            Filter::AnyOf(options) => {
                let hay = value.render().to_lowercase();
                options
                    .iter()
                    .filter(|o| !o.trim().is_empty())
                    .any(|o| o.trim().to_lowercase() == hay)
            }
            Filter::Range { min, max } => match value.as_number() {
                Some(n) => min.is_none_or(|lo| n >= lo) && max.is_none_or(|hi| n <= hi),
                None => false,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl std::str::FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            other => Err(format!("unknown sort direction {other:?} (expected asc|desc)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

/// Everything that shapes one page of a list view.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewQuery {
    pub filters: Vec<(String, Filter)>,
    pub search: Option<String>,
    pub sort: Option<SortSpec>,
    /// 1-indexed; clamped into range.
    pub page: usize,
    pub page_size: usize,
}

impl Default for ViewQuery {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            search: None,
            sort: None,
            page: 1,
            page_size: usize::MAX,
        }
    }
}

impl ViewQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, field: impl Into<String>, filter: Filter) -> Self {
        self.filters.push((field.into(), filter));
        self
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    pub fn sort_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort = Some(SortSpec {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn page(mut self, page: usize, page_size: usize) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }
}

/// One page of results plus the totals a pager needs.
#[derive(Debug, PartialEq)]
pub struct Projection<'a, R> {
    pub items: Vec<&'a R>,
    /// Matches before pagination.
    pub total_count: usize,
    pub total_pages: usize,
    pub page: usize,
    pub page_size: usize,
}

/// Run `query` over `records`.
pub fn project<'a, R: Record>(records: &'a [R], query: &ViewQuery) -> Projection<'a, R> {
    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let mut matched: Vec<&R> = records
        .iter()
        .filter(|r| {
            query
                .filters
                .iter()
                .all(|(field, filter)| filter.matches(&r.field(field)))
        })
        .filter(|r| match &search {
            Some(needle) => R::search_fields()
                .iter()
                .any(|f| r.field(f).render().to_lowercase().contains(needle.as_str())),
            None => true,
        })
        .collect();

    if let Some(sort) = &query.sort {
        // `sort_by` is stable, so ties keep input order.
        matched.sort_by(|a, b| {
            compare_fields(&a.field(&sort.field), &b.field(&sort.field), sort.direction)
        });
    }

    let total_count = matched.len();
    let page_size = query.page_size.max(1);
    let total_pages = total_count.div_ceil(page_size);
    let page = query.page.clamp(1, total_pages.max(1));

    let items = matched
        .into_iter()
        .skip((page - 1).saturating_mul(page_size))
        .take(page_size)
        .collect();

    Projection {
        items,
        total_count,
        total_pages,
        page,
        page_size,
    }
}

/// Missing values go last whatever the direction.
fn compare_fields(a: &FieldValue<'_>, b: &FieldValue<'_>, direction: SortDirection) -> Ordering {
    let ordering = match (a, b) {
        (FieldValue::Missing, FieldValue::Missing) => return Ordering::Equal,
        (FieldValue::Missing, _) => return Ordering::Greater,
        (_, FieldValue::Missing) => return Ordering::Less,
        (FieldValue::Number(x), FieldValue::Number(y)) => x.total_cmp(y),
        (FieldValue::Number(_), FieldValue::Text(_)) => Ordering::Less,
        (FieldValue::Text(_), FieldValue::Number(_)) => Ordering::Greater,
        (FieldValue::Text(x), FieldValue::Text(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
    };
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}
