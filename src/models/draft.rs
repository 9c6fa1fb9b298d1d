use crate::models::lootbox::{BoxProps, ImageMode, OverlaySettings, SourceKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Best-effort numeric coercion for hand-authored JSON: accepts numbers and
/// numeric strings, rejects everything else (NaN and infinities included).
pub fn value_to_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn de_numberish<'de, D>(de: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(de)?;
    Ok(v.as_ref().and_then(value_to_f64))
}

// Anything that is not exactly "local" means a URL image, typos included.
fn de_image_mode<'de, D>(de: D) -> Result<Option<ImageMode>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<String>::deserialize(de)?;
    Ok(v.map(|s| {
        if s == "local" {
            ImageMode::Local
        } else {
            ImageMode::Url
        }
    }))
}

/// Incoming item payload from a sync source or the manager surface.
///
/// Every field is optional; the engine fills the gaps from the existing item
/// or from type defaults. Numeric fields tolerate quoted numbers since
/// hand-kept source files often carry them as strings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemDraft {
    pub id: Option<String>,
    pub label: Option<String>,
    pub value: Option<String>,
    pub subtitle: Option<String>,
    #[serde(deserialize_with = "de_numberish")]
    pub weight: Option<f64>,
    /// Raw cap input, normalized by the engine (negative or missing means
    /// unlimited, valid values are floored)
    #[serde(deserialize_with = "de_numberish")]
    pub max_wins: Option<f64>,
    #[serde(deserialize_with = "de_image_mode")]
    pub image_mode: Option<ImageMode>,
    pub image_url: Option<String>,
    pub image_file: Option<String>,
    pub accent_color: Option<String>,
}

impl ItemDraft {
    /// A draft with no usable display identity cannot render on the reveal,
    /// so sources drop it before sync.
    pub fn has_identity(&self) -> bool {
        let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        filled(&self.label)
            || filled(&self.value)
            || filled(&self.image_url)
            || filled(&self.image_file)
    }
}

/// Field-by-field patch for an existing item. `None` keeps the current
/// value. `max_wins` is doubled up so a patch can distinguish "keep the
/// cap" (`None`) from "lift the cap" (`Some(None)`).
#[derive(Debug, Clone, Default)]
pub struct ItemUpdate {
    pub label: Option<String>,
    pub value: Option<String>,
    pub subtitle: Option<String>,
    pub weight: Option<f64>,
    pub max_wins: Option<Option<u32>>,
    pub wins: Option<u32>,
    pub last_won_at: Option<Option<DateTime<Utc>>>,
    pub image_mode: Option<ImageMode>,
    pub image_url: Option<String>,
    pub image_file: Option<String>,
    pub accent_color: Option<String>,
}

impl ItemUpdate {
    pub fn max_wins(max_wins: Option<u32>) -> Self {
        Self {
            max_wins: Some(max_wins),
            ..Self::default()
        }
    }
}

/// Defined-fields-only merge for a box's overlay dispatch settings.
#[derive(Debug, Clone, Default)]
pub struct OverlayPatch {
    pub length_seconds: Option<u32>,
    pub duration_ms: Option<u64>,
    /// `Some("")` clears the pinned instance
    pub overlay_instance: Option<String>,
}

/// Defined-fields-only merge for a box's visual props.
#[derive(Debug, Clone, Default)]
pub struct PropsPatch {
    pub background_gradient_start: Option<String>,
    pub background_gradient_end: Option<String>,
    pub hide_background: Option<bool>,
    pub glow_color: Option<String>,
    pub accent_color: Option<String>,
    pub text_color: Option<String>,
    pub subtitle_color: Option<String>,
    pub value_color: Option<String>,
    pub font_family: Option<String>,
    pub reveal_delay_ms: Option<u64>,
    pub reveal_hold_ms: Option<u64>,
    pub show_confetti: Option<bool>,
}

/// Bulk edit of a box's non-inventory fields. Only what is set gets merged;
/// the rest of the record is untouched.
#[derive(Debug, Clone, Default)]
pub struct BoxDetailsUpdate {
    pub display_name: Option<String>,
    pub overlay_settings: Option<OverlayPatch>,
    pub props: Option<PropsPatch>,
}

impl OverlayPatch {
    /// Merges the defined fields into `target` and reports whether anything
    /// actually changed. An instance string that trims to empty unpins the
    /// overlay.
    pub fn apply(&self, target: &mut OverlaySettings) -> bool {
        let mut changed = false;
        if let Some(v) = self.length_seconds {
            if target.length_seconds != v {
                target.length_seconds = v;
                changed = true;
            }
        }
        if let Some(v) = self.duration_ms {
            if target.duration_ms != v {
                target.duration_ms = v;
                changed = true;
            }
        }
        if let Some(raw) = &self.overlay_instance {
            let trimmed = raw.trim();
            let next = if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            };
            if target.overlay_instance != next {
                target.overlay_instance = next;
                changed = true;
            }
        }
        changed
    }
}

fn merge_field<T: PartialEq + Clone>(dst: &mut T, src: &Option<T>, changed: &mut bool) {
    if let Some(v) = src {
        if dst != v {
            *dst = v.clone();
            *changed = true;
        }
    }
}

impl PropsPatch {
    /// Merges the defined fields into `target` and reports whether anything
    /// actually changed.
    pub fn apply(&self, target: &mut BoxProps) -> bool {
        let mut changed = false;
        merge_field(
            &mut target.background_gradient_start,
            &self.background_gradient_start,
            &mut changed,
        );
        merge_field(
            &mut target.background_gradient_end,
            &self.background_gradient_end,
            &mut changed,
        );
        merge_field(&mut target.hide_background, &self.hide_background, &mut changed);
        merge_field(&mut target.glow_color, &self.glow_color, &mut changed);
        merge_field(&mut target.accent_color, &self.accent_color, &mut changed);
        merge_field(&mut target.text_color, &self.text_color, &mut changed);
        merge_field(&mut target.subtitle_color, &self.subtitle_color, &mut changed);
        merge_field(&mut target.value_color, &self.value_color, &mut changed);
        merge_field(&mut target.font_family, &self.font_family, &mut changed);
        merge_field(&mut target.reveal_delay_ms, &self.reveal_delay_ms, &mut changed);
        merge_field(&mut target.reveal_hold_ms, &self.reveal_hold_ms, &mut changed);
        merge_field(&mut target.show_confetti, &self.show_confetti, &mut changed);
        changed
    }
}

/// Narrow editor for the timing knobs, converging on the same merge as
/// [`BoxDetailsUpdate`].
#[derive(Debug, Clone, Default)]
pub struct TimingUpdate {
    pub length_seconds: Option<u32>,
    pub reveal_delay_ms: Option<u64>,
    pub reveal_hold_ms: Option<u64>,
}

impl From<TimingUpdate> for BoxDetailsUpdate {
    fn from(t: TimingUpdate) -> Self {
        Self {
            display_name: None,
            overlay_settings: Some(OverlayPatch {
                length_seconds: t.length_seconds,
                ..OverlayPatch::default()
            }),
            props: Some(PropsPatch {
                reveal_delay_ms: t.reveal_delay_ms,
                reveal_hold_ms: t.reveal_hold_ms,
                ..PropsPatch::default()
            }),
        }
    }
}

/// Full argument set for a sync upsert: one call reconciles identity,
/// presentation, and the item batch from whichever source feeds the box.
#[derive(Debug, Clone, Default)]
pub struct SyncRequest {
    pub id: String,
    pub display_name: Option<String>,
    pub source: SourceKind,
    pub props: BoxProps,
    pub items: Vec<ItemDraft>,
    pub overlay_settings: Option<OverlaySettings>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drafts_accept_quoted_numbers() {
        let draft: ItemDraft =
            serde_json::from_str(r#"{"label":"Gold","weight":"2.5","maxWins":"3"}"#).unwrap();
        assert_eq!(draft.weight, Some(2.5));
        assert_eq!(draft.max_wins, Some(3.0));
    }

    #[test]
    fn junk_numbers_become_absent() {
        let draft: ItemDraft =
            serde_json::from_str(r#"{"label":"Gold","weight":"heavy","maxWins":null}"#).unwrap();
        assert_eq!(draft.weight, None);
        assert_eq!(draft.max_wins, None);
    }

    #[test]
    fn unknown_image_modes_fall_back_to_url() {
        let draft: ItemDraft =
            serde_json::from_str(r#"{"label":"Gold","imageMode":"LOCAL"}"#).unwrap();
        assert_eq!(draft.image_mode, Some(ImageMode::Url));

        let draft: ItemDraft =
            serde_json::from_str(r#"{"label":"Gold","imageMode":"local"}"#).unwrap();
        assert_eq!(draft.image_mode, Some(ImageMode::Local));
    }

    #[test]
    fn identity_needs_some_display_field() {
        let named: ItemDraft = serde_json::from_str(r#"{"label":"Gold"}"#).unwrap();
        assert!(named.has_identity());

        let pictured: ItemDraft = serde_json::from_str(r#"{"imageUrl":"https://x/y.png"}"#).unwrap();
        assert!(pictured.has_identity());

        let blank: ItemDraft = serde_json::from_str(r#"{"weight":4}"#).unwrap();
        assert!(!blank.has_identity());
    }
}
