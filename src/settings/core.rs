use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::layout::{DashboardFeatures, Layout, WidgetInstance};

/// Tile size used before per-cell width/height existed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegacySize {
    Small,
    Medium,
    Large,
    Full,
}

impl LegacySize {
    /// Grid columns the legacy size stood for.
    pub fn columns(&self) -> u16 {
        match self {
            LegacySize::Small => 1,
            LegacySize::Medium => 2,
            LegacySize::Large => 3,
            LegacySize::Full => 4,
        }
    }

    pub fn from_width(width: u16) -> Self {
        match width {
            0 | 1 => LegacySize::Small,
            2 => LegacySize::Medium,
            3 => LegacySize::Large,
            _ => LegacySize::Full,
        }
    }
}

/// One widget entry as it appears on the wire.
///
/// Only `id` is required; older documents omit geometry entirely. Numbers are
/// kept wide so out-of-range values survive parsing and can be reported.
///
/// Parsing never fails. A field holding the wrong kind of value is left unset
/// and its key is listed in `malformed`; a missing id leaves `id` empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedWidget {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<LegacySize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_x: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_y: Option<i64>,
    /// Wire keys whose values could not be used.
    #[serde(skip)]
    pub malformed: Vec<&'static str>,
}

impl SavedWidget {
    /// Entry carrying nothing but its id.
    pub fn bare(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            visible: None,
            order: None,
            size: None,
            width: None,
            height: None,
            grid_x: None,
            grid_y: None,
            malformed: Vec::new(),
        }
    }

    /// Read one entry out of an arbitrary JSON value.
    pub fn from_value(value: &Value) -> Self {
        let Some(fields) = value.as_object() else {
            let mut entry = Self::bare("");
            entry.malformed.push("entry");
            return entry;
        };

        let mut entry = Self::bare(
            fields
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or_default(),
        );
        if entry.id.is_empty() {
            entry.malformed.push("id");
        }
        entry.visible = entry.read(fields, "visible", Value::as_bool);
        entry.order = entry.read(fields, "order", |v| {
            v.as_i64().and_then(|order| i32::try_from(order).ok())
        });
        entry.size = entry.read(fields, "size", |v| {
            serde_json::from_value::<LegacySize>(v.clone()).ok()
        });
        entry.width = entry.read(fields, "width", Value::as_i64);
        entry.height = entry.read(fields, "height", Value::as_i64);
        entry.grid_x = entry.read(fields, "gridX", Value::as_i64);
        entry.grid_y = entry.read(fields, "gridY", Value::as_i64);
        entry
    }

    fn read<T>(
        &mut self,
        fields: &Map<String, Value>,
        key: &'static str,
        parse: impl Fn(&Value) -> Option<T>,
    ) -> Option<T> {
        match fields.get(key) {
            None | Some(Value::Null) => None,
            Some(raw) => {
                let parsed = parse(raw);
                if parsed.is_none() {
                    self.malformed.push(key);
                }
                parsed
            }
        }
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_geometry(mut self, grid_x: i64, grid_y: i64, width: i64, height: i64) -> Self {
        self.grid_x = Some(grid_x);
        self.grid_y = Some(grid_y);
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}

impl From<&WidgetInstance> for SavedWidget {
    fn from(widget: &WidgetInstance) -> Self {
        Self {
            id: widget.id.as_str().to_string(),
            visible: Some(widget.visible),
            order: Some(widget.order),
            size: Some(LegacySize::from_width(widget.width)),
            width: Some(widget.width as i64),
            height: Some(widget.height as i64),
            grid_x: Some(widget.grid_x as i64),
            grid_y: Some(widget.grid_y as i64),
            malformed: Vec::new(),
        }
    }
}

impl<'de> Deserialize<'de> for SavedWidget {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

/// Accept any JSON value, falling back to the default when it does not fit.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// `dashboardLayout` field of the settings document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardLayoutDoc {
    #[serde(default, deserialize_with = "lenient")]
    pub widgets: Vec<SavedWidget>,
}

impl From<&Layout> for DashboardLayoutDoc {
    fn from(layout: &Layout) -> Self {
        Self {
            widgets: layout.widgets().iter().map(SavedWidget::from).collect(),
        }
    }
}

/// `reviewSettings` field; only the on/off switch matters to the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewSettings {
    #[serde(default, deserialize_with = "lenient")]
    pub enabled: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Whole settings document.
///
/// Keys this crate does not model are kept in `extra` and written back
/// untouched. Only invalid JSON or a non-object document fails to parse; a
/// modelled field of the wrong shape reads as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub dashboard_layout: Option<DashboardLayoutDoc>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub review_settings: Option<ReviewSettings>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Content hash of the compact JSON form.
    pub fn fingerprint(&self) -> Result<blake3::Hash> {
        let bytes = serde_json::to_vec(self)?;
        Ok(blake3::hash(&bytes))
    }

    /// Saved widget entries; empty when nothing was ever saved.
    pub fn saved_widgets(&self) -> &[SavedWidget] {
        self.dashboard_layout
            .as_ref()
            .map(|doc| doc.widgets.as_slice())
            .unwrap_or(&[])
    }

    /// Replace the whole layout field.
    pub fn set_layout(&mut self, layout: &Layout) {
        self.dashboard_layout = Some(DashboardLayoutDoc::from(layout));
    }

    pub fn features(&self) -> DashboardFeatures {
        DashboardFeatures {
            review_enabled: self.review_settings.as_ref().is_some_and(|r| r.enabled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::WidgetType;

    const OLD_DOCUMENT: &str = r##"{
        "targetHours": 300,
        "startDate": "2025-04-01",
        "categories": [{ "id": 0, "name": "Math", "color": "#EF4444" }],
        "reviewSettings": { "enabled": true, "intervals": [1, 3, 7] },
        "dashboardLayout": {
            "widgets": [
                { "id": "progress", "visible": true, "order": 0, "size": "full" },
                { "id": "today_study", "visible": false, "order": 2 }
            ]
        }
    }"##;

    #[test]
    fn parses_documents_without_geometry() {
        let settings = Settings::from_json(OLD_DOCUMENT).unwrap();
        let widgets = settings.saved_widgets();

        assert_eq!(widgets.len(), 2);
        assert_eq!(widgets[0].size, Some(LegacySize::Full));
        assert_eq!(widgets[0].width, None);
        assert_eq!(widgets[1].visible, Some(false));
        assert!(settings.features().review_enabled);
    }

    #[test]
    fn unmodelled_keys_survive_a_rewrite() {
        let mut settings = Settings::from_json(OLD_DOCUMENT).unwrap();
        let layout = Layout::new(vec![WidgetInstance::new(WidgetType::Progress, 0, 1, 4, 1)]);
        settings.set_layout(&layout);

        let value: Value = serde_json::from_str(&settings.to_json_pretty().unwrap()).unwrap();
        assert_eq!(value["targetHours"], 300);
        assert_eq!(value["categories"][0]["name"], "Math");
        assert_eq!(value["reviewSettings"]["intervals"][2], 7);
        assert_eq!(
            value["dashboardLayout"]["widgets"][0],
            serde_json::json!({
                "id": "progress",
                "visible": true,
                "order": 0,
                "size": "full",
                "width": 4,
                "height": 1,
                "gridX": 0,
                "gridY": 1
            })
        );
    }

    #[test]
    fn bad_entries_do_not_sink_the_document() {
        let document = r##"{
            "targetHours": 300,
            "categories": [{ "id": 0, "name": "Math", "color": "#EF4444" }],
            "dashboardLayout": {
                "widgets": [
                    { "id": "today_study", "visible": false },
                    { "visible": true, "order": 9 },
                    { "id": "progress", "order": 9999999999, "size": "huge", "width": "wide" },
                    { "id": "streak", "visible": "yes", "gridX": 1 },
                    42
                ]
            }
        }"##;
        let settings = Settings::from_json(document).unwrap();
        let widgets = settings.saved_widgets();

        assert_eq!(settings.extra["targetHours"], 300);
        assert_eq!(widgets.len(), 5);
        assert_eq!(widgets[0].visible, Some(false));
        assert!(widgets[0].malformed.is_empty());
        assert_eq!(widgets[1].id, "");
        assert_eq!(widgets[1].malformed, vec!["id"]);
        assert_eq!(widgets[1].order, Some(9));
        assert_eq!(widgets[2].order, None);
        assert_eq!(widgets[2].size, None);
        assert_eq!(widgets[2].width, None);
        assert_eq!(widgets[2].malformed, vec!["order", "size", "width"]);
        assert_eq!(widgets[3].visible, None);
        assert_eq!(widgets[3].grid_x, Some(1));
        assert_eq!(widgets[3].malformed, vec!["visible"]);
        assert_eq!(widgets[4].malformed, vec!["entry"]);
    }

    #[test]
    fn misshapen_sections_read_as_absent() {
        let settings = Settings::from_json(
            r#"{ "dashboardLayout": { "widgets": "none" }, "reviewSettings": [1], "theme": "dark" }"#,
        )
        .unwrap();
        assert!(settings.saved_widgets().is_empty());
        assert_eq!(settings.review_settings, None);
        assert_eq!(settings.extra["theme"], "dark");

        let settings = Settings::from_json(r#"{ "dashboardLayout": 7 }"#).unwrap();
        assert_eq!(settings.dashboard_layout, None);
        assert!(Settings::from_json("[]").is_err());
    }

    #[test]
    fn missing_layout_reads_as_empty() {
        let settings = Settings::from_json("{}").unwrap();
        assert!(settings.saved_widgets().is_empty());
        assert_eq!(settings.features(), DashboardFeatures::default());
    }

    #[test]
    fn fingerprint_tracks_content() {
        let mut settings = Settings::default();
        let before = settings.fingerprint().unwrap();
        settings.set_layout(&Layout::new(vec![WidgetInstance::new(
            WidgetType::Streak,
            0,
            0,
            1,
            1,
        )]));
        assert_ne!(before, settings.fingerprint().unwrap());
        assert_eq!(settings.fingerprint().unwrap(), settings.clone().fingerprint().unwrap());
    }
}
