use kinema_core::ParameterRegistry;

use crate::model::TimelineModel;
use crate::values::ParameterValues;

/// Output of one interpolation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterpolatedFrame {
    /// Denormalized value per parameter. Tracks without keyframes are absent.
    pub values: ParameterValues,
    /// Query time in milliseconds.
    pub time: f32,
    pub playing: bool,
}

/// Computes every track's value at `time`.
///
/// Each track is sampled independently (see [`Track::sample`]) and the result
/// is denormalized through the registry. Tracks that are not in the registry
/// are skipped. The only mutation is the idempotent sort of unsorted tracks.
///
/// [`Track::sample`]: crate::tracks::Track::sample
pub fn interpolate(
    model: &mut TimelineModel,
    registry: &ParameterRegistry,
    time: f32,
    playing: bool,
) -> InterpolatedFrame {
    let mut values = ParameterValues::default();

    for track in &mut model.tracks {
        if track.ensure_sorted() {
            log::trace!("Sorted keyframes of '{}'", track.name);
        }

        let Some(normalized) = track.sample(time) else {
            continue;
        };

        match registry.get(&track.name) {
            Some(param) => {
                values.insert(track.name.clone(), param.denormalize(normalized));
            }
            None => log::debug!("Skipping track '{}': not a registered parameter", track.name),
        }
    }

    InterpolatedFrame {
        values,
        time,
        playing,
    }
}
