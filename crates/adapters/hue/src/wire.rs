//! CLIP v2 payloads exchanged with the bridge.
//!
//! Only the fields the randomizer reads or writes are modelled; everything
//! else in a resource is ignored on deserialization.

use std::time::Duration;

use randomizer_domain::color::{Color, Xy};
use randomizer_domain::light::DesiredState;
use serde::{Deserialize, Serialize};

/// Every CLIP v2 response: a list of errors and a list of resources.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub errors: Vec<ApiError>,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

impl<T> Envelope<T> {
    /// Joined error descriptions, `None` when the bridge reported none.
    pub fn error_message(&self) -> Option<String> {
        if self.errors.is_empty() {
            return None;
        }
        let descriptions: Vec<&str> = self.errors.iter().map(|e| e.description.as_str()).collect();
        Some(descriptions.join("; "))
    }
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub description: String,
}

/// Typed link to another resource.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceRef {
    pub rid: String,
    pub rtype: String,
}

#[derive(Debug, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct On {
    pub on: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Dimming {
    pub brightness: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct XyPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ColorXy {
    pub xy: XyPoint,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ColorTemperature {
    #[serde(default)]
    pub mirek: Option<u16>,
    #[serde(default)]
    pub mirek_valid: Option<bool>,
}

/// `GET /resource/light[/{id}]` item.
#[derive(Debug, Deserialize)]
pub struct LightResource {
    pub id: String,
    #[serde(default)]
    pub owner: Option<ResourceRef>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
    #[serde(default)]
    pub on: Option<On>,
    #[serde(default)]
    pub dimming: Option<Dimming>,
    #[serde(default)]
    pub color: Option<ColorXy>,
    #[serde(default)]
    pub color_temperature: Option<ColorTemperature>,
}

impl LightResource {
    /// Color in the mode the light reports, chromaticity first.
    pub fn color(&self) -> Color {
        let xy = self.color.map(|c| Xy::new(c.xy.x, c.xy.y));
        let mirek = self
            .color_temperature
            .filter(|ct| ct.mirek_valid.unwrap_or(true))
            .and_then(|ct| ct.mirek);
        Color::select(xy, mirek, None)
    }
}

/// `GET /resource/{room|zone}[/{id}]` item.
#[derive(Debug, Deserialize)]
pub struct GroupResource {
    pub id: String,
    #[serde(default)]
    pub metadata: Option<Metadata>,
    #[serde(default)]
    pub children: Vec<ResourceRef>,
    #[serde(default)]
    pub services: Vec<ResourceRef>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MirekUpdate {
    pub mirek: u16,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Dynamics {
    /// Transition time in milliseconds.
    pub duration: u64,
}

/// Body of `PUT /resource/light/{id}` and `PUT /resource/grouped_light/{id}`.
#[derive(Debug, Default, Serialize)]
pub struct LightUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on: Option<On>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimming: Option<Dimming>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<ColorXy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_temperature: Option<MirekUpdate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamics: Option<Dynamics>,
}

impl From<&DesiredState> for LightUpdate {
    fn from(state: &DesiredState) -> Self {
        let mut update = Self {
            on: state.on.map(|on| On { on }),
            dimming: state.brightness.map(|b| Dimming {
                brightness: b.value(),
            }),
            dynamics: state.transition.map(dynamics),
            ..Self::default()
        };
        match state.color {
            Some(Color::Temperature { mirek }) => {
                update.color_temperature = Some(MirekUpdate { mirek });
            }
            // The v2 API has no hue/saturation mode.
            Some(color) => {
                let xy = color.to_xy();
                update.color = Some(ColorXy {
                    xy: XyPoint { x: xy.x, y: xy.y },
                });
            }
            None => {}
        }
        update
    }
}

fn dynamics(transition: Duration) -> Dynamics {
    Dynamics {
        duration: u64::try_from(transition.as_millis()).unwrap_or(u64::MAX),
    }
}
