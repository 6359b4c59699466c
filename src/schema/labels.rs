//! Human-authored field metadata from the `<table>_labels` side table.

use crate::error::AppError;
use crate::schema::FieldType;
use crate::sql::{cell_bool, cell_text, label_row, labels_table, TypedValue, LABEL_ROW_SHAPE};
use crate::store::FormStore;
use pulldown_cmark::{html, CowStr, Event, Parser, Tag};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldMetadata {
    pub label: String,
    /// Rendered, sanitized HTML.
    pub description: String,
    pub placeholder: String,
    pub options: Vec<String>,
    pub options_as_radio: bool,
    pub section_heading: String,
    pub linebreak_after: bool,
    pub include_in_summary: bool,
}

impl FieldMetadata {
    /// Metadata for a column with no labels row.
    pub fn defaults_for(column: &str) -> Self {
        FieldMetadata {
            label: default_label(column),
            ..Default::default()
        }
    }

    /// A non-empty option list turns the field into a Select, or a Radio when flagged.
    pub fn field_type_override(&self) -> Option<FieldType> {
        if self.options.is_empty() {
            None
        } else if self.options_as_radio {
            Some(FieldType::Radio)
        } else {
            Some(FieldType::Select)
        }
    }
}

/// `column_name` -> `Column name`.
pub fn default_label(column: &str) -> String {
    let spaced = column.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Split on raw commas. Embedded commas cannot be escaped.
pub fn split_options(options: &str) -> Vec<String> {
    if options.is_empty() {
        return Vec::new();
    }
    options.split(',').map(str::to_string).collect()
}

fn is_unsafe_url(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    lower.starts_with("javascript:") || lower.starts_with("vbscript:") || lower.starts_with("data:")
}

/// Render markdown to HTML, dropping raw HTML and script URLs.
pub fn render_description(source: &str) -> String {
    let events = Parser::new(source).filter_map(|event| match event {
        Event::Html(_) | Event::InlineHtml(_) => None,
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) if is_unsafe_url(&dest_url) => Some(Event::Start(Tag::Link {
            link_type,
            dest_url: CowStr::Borrowed("#"),
            title,
            id,
        })),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) if is_unsafe_url(&dest_url) => Some(Event::Start(Tag::Image {
            link_type,
            dest_url: CowStr::Borrowed(""),
            title,
            id,
        })),
        other => Some(other),
    });
    let mut out = String::new();
    html::push_html(&mut out, events);
    out
}

/// Labels row for `column`, or defaults when the side table has no row for it.
pub async fn load_field_meta(store: &dyn FormStore, table: &str, column: &str) -> Result<FieldMetadata, AppError> {
    let q = label_row(store.dialect(), table, column)?;
    let row = store
        .fetch_optional(&q, LABEL_ROW_SHAPE)
        .await
        .map_err(|source| AppError::MetadataQueryFailed {
            labels_table: labels_table(table).unwrap_or_else(|_| table.to_string()),
            source,
        })?;
    let Some(row) = row else {
        return Ok(FieldMetadata::defaults_for(column));
    };

    let label = cell_text(&row, 0);
    let description = cell_text(&row, 1);
    Ok(FieldMetadata {
        label: if row.first().map_or(true, TypedValue::is_null) { default_label(column) } else { label },
        description: if description.is_empty() {
            description
        } else {
            render_description(&description)
        },
        placeholder: cell_text(&row, 2),
        options: split_options(&cell_text(&row, 3)),
        options_as_radio: cell_bool(&row, 4),
        section_heading: cell_text(&row, 5),
        linebreak_after: cell_bool(&row, 6),
        include_in_summary: cell_bool(&row, 7),
    })
}
